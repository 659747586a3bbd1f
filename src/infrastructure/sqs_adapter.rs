use async_trait::async_trait;
use aws_sdk_sqs::Client;
use tracing::debug;
use crate::domain::{error::QueueError, models::QueueMessage, ports::MessageQueue};

#[derive(Clone)]
pub struct SqsQueue {
    client: Client,
}

impl SqsQueue {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn resolve_queue_address(&self, name: &str) -> Result<String, QueueError> {
        let response = self.client
            .get_queue_url()
            .queue_name(name)
            .send()
            .await
            .map_err(|e| QueueError::AddressLookup {
                name: name.to_string(),
                reason: format!("{:?}", e),
            })?;

        response
            .queue_url()
            .map(str::to_string)
            .ok_or_else(|| QueueError::AddressLookup {
                name: name.to_string(),
                reason: "response carried no queue url".to_string(),
            })
    }

    async fn receive(&self, address: &str, max_messages: i32) -> Result<Vec<QueueMessage>, QueueError> {
        debug!("Receiving up to {} messages from {}", max_messages, address);

        let response = self.client
            .receive_message()
            .queue_url(address)
            .max_number_of_messages(max_messages)
            .send()
            .await
            .map_err(|e| QueueError::Receive(format!("{:?}", e)))?;

        Ok(response
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|message| QueueMessage {
                id: message.message_id,
                body: message.body,
                receipt_handle: message.receipt_handle,
            })
            .collect())
    }

    async fn delete(&self, address: &str, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(address)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Delete(format!("{:?}", e)))?;
        Ok(())
    }
}
