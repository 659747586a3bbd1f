//! Self-hosted stand-in for a managed queue trigger: poll, process each
//! message in its own context, delete on success, sleep, repeat.
//!
//! A failed message is never deleted, so the queue's visibility timeout
//! and redrive policy decide what happens to it next.

use std::time::Duration;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;
use crate::{
    application::{context::ContextFactory, record_processor},
    config::ConfigurationBag,
    domain::{
        error::{ProcessingError, QueueError, SettingError},
        models::QueueMessage,
        ports::MessageQueue,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpSettings {
    pub queue_name: String,
    pub batch_size: i32,
    pub poll_interval: Duration,
}

impl PumpSettings {
    pub fn from_config(config: &ConfigurationBag) -> Result<Self, SettingError> {
        let batch_size: i32 = config.require_parsed("poll_batch_size")?;
        if batch_size < 1 {
            return Err(SettingError::Invalid {
                key: "poll_batch_size".to_string(),
                reason: format!("must be at least 1, got {}", batch_size),
            });
        }
        Ok(Self {
            queue_name: config.require_text("read_queue")?,
            batch_size,
            poll_interval: Duration::from_secs(config.require_parsed("poll_interval")?),
        })
    }
}

/// Outcome counts for one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub received: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub deleted: usize,
}

pub struct QueuePump<Q> {
    queue: Q,
    contexts: ContextFactory,
    settings: PumpSettings,
}

impl<Q: MessageQueue> QueuePump<Q> {
    pub fn new(queue: Q, contexts: ContextFactory, settings: PumpSettings) -> Self {
        Self { queue, contexts, settings }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Runs until the process is terminated.
    pub async fn run(&self) {
        info!(
            "Starting queue pump on {} (batch size {}, interval {:?})",
            self.settings.queue_name, self.settings.batch_size, self.settings.poll_interval
        );

        let mut poll_count: u64 = 0;
        loop {
            poll_count += 1;
            debug!("Polling queue (cycle {})", poll_count);

            match self.run_cycle().await {
                Ok(report) if report.received > 0 => info!(
                    "Cycle {}: received {}, succeeded {}, failed {}, deleted {}",
                    poll_count, report.received, report.succeeded, report.failed, report.deleted
                ),
                Ok(_) => debug!("No messages received"),
                Err(e) => error!("Poll cycle {} failed: {:?}", poll_count, anyhow::Error::new(e)),
            }

            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    /// One poll: resolve the queue, receive a batch and process it in order.
    ///
    /// Only queue lookup and receive failures are returned; every
    /// per-message failure is logged and counted.
    pub async fn run_cycle(&self) -> Result<CycleReport, QueueError> {
        let address = self.queue.resolve_queue_address(&self.settings.queue_name).await?;
        let messages = self.queue.receive(&address, self.settings.batch_size).await?;

        let mut report = CycleReport {
            received: messages.len(),
            ..CycleReport::default()
        };

        for (i, message) in messages.iter().enumerate() {
            let attempt_id = Uuid::new_v4();
            let span = tracing::info_span!(
                "attempt",
                id = %attempt_id,
                message_id = message.id.as_deref().unwrap_or("unknown")
            );
            async {
                debug!("Processing message {} of {}", i + 1, messages.len());
                match self.process_message(message).await {
                    Ok(true) => {
                        report.succeeded += 1;
                        if self.acknowledge(&address, message).await {
                            report.deleted += 1;
                        }
                    }
                    Ok(false) => {
                        report.failed += 1;
                        warn!("Message {} was not loaded; leaving it for redelivery", i + 1);
                    }
                    Err(e) => {
                        report.failed += 1;
                        error!(
                            "Failed to process message {}; leaving it for redelivery: {:?}",
                            i + 1,
                            anyhow::Error::new(e)
                        );
                    }
                }
            }
            .instrument(span)
            .await;
        }

        Ok(report)
    }

    async fn process_message(&self, message: &QueueMessage) -> Result<bool, ProcessingError> {
        let body = match &message.body {
            Some(body) => body.clone(),
            None => {
                warn!("Received message without body");
                return Err(ProcessingError::InvalidInput("message has no body".to_string()));
            }
        };
        debug!("Message body: {}", body);

        self.contexts
            .build()
            .scoped(move |context| Box::pin(async move { record_processor::run(&body, context).await }))
            .await
    }

    /// Deletes a processed message. Failures are logged and not retried.
    async fn acknowledge(&self, address: &str, message: &QueueMessage) -> bool {
        let Some(receipt_handle) = &message.receipt_handle else {
            warn!("Processed message has no receipt handle and cannot be deleted");
            return false;
        };

        match self.queue.delete(address, receipt_handle).await {
            Ok(()) => {
                debug!("Message deleted from queue");
                true
            }
            Err(e) => {
                error!("Failed to delete message from queue: {}", e);
                false
            }
        }
    }
}
