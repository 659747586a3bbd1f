use async_trait::async_trait;
use crate::domain::{
    error::{DatabaseError, QueueError, StoreError},
    models::{DbSettings, InsertBatch, QueueMessage},
};

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;
}

/// Opens database connections. Shared across processing attempts.
#[async_trait]
pub trait DbConnector: Send + Sync {
    async fn open(&self, settings: &DbSettings) -> Result<Box<dyn DbConnection>, DatabaseError>;
}

/// One open connection, owned by exactly one processing attempt.
#[async_trait]
pub trait DbConnection: Send {
    /// Runs `statement` once per record inside a single transaction and
    /// returns the number of rows affected. Nothing is committed on error.
    async fn execute_many(&mut self, statement: &str, batch: &InsertBatch) -> Result<u64, DatabaseError>;

    /// Closes the connection. Calling it again is a no-op.
    async fn close(&mut self) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn resolve_queue_address(&self, name: &str) -> Result<String, QueueError>;

    async fn receive(&self, address: &str, max_messages: i32) -> Result<Vec<QueueMessage>, QueueError>;

    async fn delete(&self, address: &str, receipt_handle: &str) -> Result<(), QueueError>;
}
