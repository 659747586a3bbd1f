#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use etl_worker::{
    application::context::{ContextFactory, ProcessingContext},
    config::{ConfigLayer, ConfigResolver, ConfigValue, ConfigurationBag, Environment},
    domain::{
        error::{DatabaseError, ProcessingError, QueueError, StoreError},
        models::{DbSettings, InsertBatch, QueueMessage},
        ports::{DbConnection, DbConnector, MessageQueue, ObjectStore},
    },
};

pub const COMMA_BLOB: &[u8] = b"1234567,http://web.uk,left,2019-01-01T00:01:000Z,87646675465\n8901234,https://web.com,right,2020-01-01T00:00:000Z,99999999999";
pub const BANG_BLOB: &[u8] = b"1234567!http://web.uk!left!2019-01-01T00:01:000Z!87646675465\n8901234!https://web.com!right!2020-01-01T00:00:000Z!99999999999";
pub const WORK_MESSAGE: &str = r#"{ "bucket": "nothing", "key": "here" }"#;

#[derive(Default)]
pub struct InMemoryStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl InMemoryStore {
    pub fn with_object(bucket: &str, key: &str, bytes: &[u8]) -> Self {
        let store = Self::default();
        store.put(bucket, key, bytes);
        store
    }

    pub fn put(&self, bucket: &str, key: &str, bytes: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), bytes.to_vec());
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

/// Everything the recording database saw.
#[derive(Debug, Default)]
pub struct DbLog {
    pub opened: usize,
    pub closed: usize,
    pub statements: Vec<String>,
    pub batches: Vec<InsertBatch>,
}

#[derive(Clone, Default)]
pub struct RecordingConnector {
    pub log: Arc<Mutex<DbLog>>,
    pub fail_open: bool,
    pub fail_insert: bool,
}

impl RecordingConnector {
    pub fn failing_open() -> Self {
        Self { fail_open: true, ..Self::default() }
    }

    pub fn failing_insert() -> Self {
        Self { fail_insert: true, ..Self::default() }
    }

    pub fn opened(&self) -> usize {
        self.log.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.log.lock().unwrap().closed
    }

    pub fn batches(&self) -> Vec<InsertBatch> {
        self.log.lock().unwrap().batches.clone()
    }
}

#[async_trait]
impl DbConnector for RecordingConnector {
    async fn open(&self, _settings: &DbSettings) -> Result<Box<dyn DbConnection>, DatabaseError> {
        if self.fail_open {
            return Err(DatabaseError::Backend("connection refused".to_string()));
        }
        self.log.lock().unwrap().opened += 1;
        Ok(Box::new(RecordingConnection {
            log: Arc::clone(&self.log),
            fail_insert: self.fail_insert,
            open: true,
        }))
    }
}

pub struct RecordingConnection {
    log: Arc<Mutex<DbLog>>,
    fail_insert: bool,
    open: bool,
}

impl RecordingConnection {
    pub fn standalone(log: Arc<Mutex<DbLog>>, fail_insert: bool) -> Self {
        Self { log, fail_insert, open: true }
    }
}

#[async_trait]
impl DbConnection for RecordingConnection {
    async fn execute_many(&mut self, statement: &str, batch: &InsertBatch) -> Result<u64, DatabaseError> {
        if !self.open {
            return Err(DatabaseError::NotConnected);
        }
        if self.fail_insert {
            return Err(DatabaseError::Backend("column count doesn't match value count".to_string()));
        }
        let mut log = self.log.lock().unwrap();
        log.statements.push(statement.to_string());
        log.batches.push(batch.clone());
        Ok(batch.len() as u64)
    }

    async fn close(&mut self) -> Result<(), DatabaseError> {
        if self.open {
            self.open = false;
            self.log.lock().unwrap().closed += 1;
        }
        Ok(())
    }
}

/// Hands out pre-scripted batches, then empty receives. The first
/// `failing_receives` calls to `receive` fail.
#[derive(Default)]
pub struct ScriptedQueue {
    pub batches: Mutex<VecDeque<Vec<QueueMessage>>>,
    pub deleted: Mutex<Vec<String>>,
    pub requested_sizes: Mutex<Vec<i32>>,
    pub receive_calls: AtomicUsize,
    pub failing_receives: usize,
    pub fail_delete: bool,
}

impl ScriptedQueue {
    pub fn with_batch(messages: Vec<QueueMessage>) -> Self {
        let queue = Self::default();
        queue.batches.lock().unwrap().push_back(messages);
        queue
    }

    pub fn then_batch(self, messages: Vec<QueueMessage>) -> Self {
        self.batches.lock().unwrap().push_back(messages);
        self
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn receive_calls(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageQueue for ScriptedQueue {
    async fn resolve_queue_address(&self, name: &str) -> Result<String, QueueError> {
        Ok(format!("http://localhost:4576/queue/{}", name))
    }

    async fn receive(&self, _address: &str, max_messages: i32) -> Result<Vec<QueueMessage>, QueueError> {
        let call = self.receive_calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failing_receives {
            return Err(QueueError::Receive("service unavailable".to_string()));
        }
        self.requested_sizes.lock().unwrap().push(max_messages);
        Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn delete(&self, _address: &str, receipt_handle: &str) -> Result<(), QueueError> {
        if self.fail_delete {
            return Err(QueueError::Delete("access denied".to_string()));
        }
        self.deleted.lock().unwrap().push(receipt_handle.to_string());
        Ok(())
    }
}

pub fn message(id: &str, body: &str) -> QueueMessage {
    QueueMessage {
        id: Some(id.to_string()),
        body: Some(body.to_string()),
        receipt_handle: Some(format!("receipt-{}", id)),
    }
}

pub fn work_message(bucket: &str, key: &str) -> String {
    format!(r#"{{"bucket": "{}", "key": "{}"}}"#, bucket, key)
}

pub fn base_layer(delimiter: &str) -> ConfigLayer {
    let mut layer = ConfigLayer::new();
    for (key, value) in [
        ("newline", "\\n"),
        ("delimiter", delimiter),
        ("insert_statement", "insert into `activity` (`id`, `url`, `side`, `at`, `size`) values (?, ?, ?, ?, ?)"),
        ("db_host", "localhost"),
        ("db_name", "activity"),
        ("db_user", "root"),
        ("db_pass", "password"),
        ("read_queue", "work"),
    ] {
        layer.insert(key.to_string(), ConfigValue::from(value));
    }
    layer.insert("db_port".to_string(), ConfigValue::Integer(3306));
    layer.insert("poll_batch_size".to_string(), ConfigValue::Integer(10));
    layer.insert("poll_interval".to_string(), ConfigValue::Integer(0));
    layer
}

/// A factory that never reads a real file or the process environment.
pub fn factory(overrides: ConfigLayer, store: InMemoryStore, connector: RecordingConnector) -> ContextFactory {
    let resolver = ConfigResolver::new(PathBuf::from("/nonexistent/const.yml"))
        .with_environment(Environment::Fixed(Vec::new()));
    ContextFactory::new(resolver, overrides, Arc::new(store), Arc::new(connector))
}

/// Stand-in context with canned collaborators, used instead of a
/// `RuntimeContext` when the processor is exercised on its own.
pub struct StubContext {
    pub layer: ConfigLayer,
    pub config: ConfigurationBag,
    pub store: InMemoryStore,
    pub connection: Option<RecordingConnection>,
    pub log: Arc<Mutex<DbLog>>,
}

impl StubContext {
    pub fn new(delimiter: &str, store: InMemoryStore) -> Self {
        let log = Arc::new(Mutex::new(DbLog::default()));
        let layer = base_layer(delimiter);
        Self {
            config: ConfigurationBag::from_layers([layer.clone()]),
            layer,
            store,
            connection: Some(RecordingConnection::standalone(Arc::clone(&log), false)),
            log,
        }
    }

    pub fn failing_insert(mut self) -> Self {
        self.connection = Some(RecordingConnection::standalone(Arc::clone(&self.log), true));
        self
    }

    pub fn without_connection(mut self) -> Self {
        self.connection = None;
        self
    }

    pub fn with_setting(mut self, key: &str, value: &str) -> Self {
        self.layer.insert(key.to_string(), ConfigValue::from(value));
        self.config = ConfigurationBag::from_layers([self.layer.clone()]);
        self
    }

    pub fn without_setting(mut self, key: &str) -> Self {
        self.layer.remove(key);
        self.config = ConfigurationBag::from_layers([self.layer.clone()]);
        self
    }

    pub fn batches(&self) -> Vec<InsertBatch> {
        self.log.lock().unwrap().batches.clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.log.lock().unwrap().statements.clone()
    }
}

impl ProcessingContext for StubContext {
    fn config(&self) -> &ConfigurationBag {
        &self.config
    }

    fn object_store(&self) -> &dyn ObjectStore {
        &self.store
    }

    fn connection(&mut self) -> Result<&mut dyn DbConnection, ProcessingError> {
        match self.connection.as_mut() {
            Some(connection) => Ok(connection),
            None => Err(ProcessingError::Connection(DatabaseError::NotConnected)),
        }
    }
}
