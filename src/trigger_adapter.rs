use aws_lambda_events::event::sqs::SqsEvent;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;
use crate::{
    application::{context::ContextFactory, record_processor},
    domain::error::ProcessingError,
};

/// Entry point for a managed queue trigger.
///
/// Only the first record of the event is processed. Acknowledgement
/// belongs to the host platform, so nothing is deleted here and every
/// failure is returned unchanged.
#[derive(Clone)]
pub struct TriggerAdapter {
    contexts: ContextFactory,
}

impl TriggerAdapter {
    pub fn new(contexts: ContextFactory) -> Self {
        Self { contexts }
    }

    pub async fn handle(&self, event: SqsEvent) -> Result<bool, ProcessingError> {
        debug!("Received event with {} records", event.records.len());
        if event.records.len() > 1 {
            warn!(
                "Event carried {} records; only the first is processed",
                event.records.len()
            );
        }

        let record = event
            .records
            .into_iter()
            .next()
            .ok_or_else(|| ProcessingError::InvalidInput("event carried no records".to_string()))?;
        let body = record
            .body
            .ok_or_else(|| ProcessingError::InvalidInput("message has no body".to_string()))?;

        let span = tracing::info_span!(
            "attempt",
            id = %Uuid::new_v4(),
            message_id = record.message_id.as_deref().unwrap_or("unknown")
        );

        async move {
            debug!("Message body: {}", body);
            let loaded = self
                .contexts
                .build()
                .scoped(move |context| Box::pin(async move { record_processor::run(&body, context).await }))
                .await?;
            info!("Invocation finished: loaded={}", loaded);
            Ok(loaded)
        }
        .instrument(span)
        .await
    }
}
