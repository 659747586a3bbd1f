use std::sync::Arc;
use futures_util::future::BoxFuture;
use tracing::{debug, warn};
use crate::{
    config::{ConfigLayer, ConfigResolver, ConfigurationBag},
    domain::{
        error::{DatabaseError, ProcessingError},
        ports::{DbConnection, DbConnector, ObjectStore},
    },
};

/// What the record processor needs from its surroundings.
pub trait ProcessingContext: Send {
    fn config(&self) -> &ConfigurationBag;

    fn object_store(&self) -> &dyn ObjectStore;

    /// The connection opened for this attempt. Fails if none is open.
    fn connection(&mut self) -> Result<&mut dyn DbConnection, ProcessingError>;
}

/// Configuration plus collaborators for one processing attempt.
///
/// The database connection is opened by [`RuntimeContext::enter`] and
/// closed by [`RuntimeContext::exit`]; [`RuntimeContext::scoped`] pairs
/// the two around a body so the connection is released on every path.
pub struct RuntimeContext {
    config: ConfigurationBag,
    object_store: Arc<dyn ObjectStore>,
    connector: Arc<dyn DbConnector>,
    connection: Option<Box<dyn DbConnection>>,
}

impl RuntimeContext {
    pub fn new(
        config: ConfigurationBag,
        object_store: Arc<dyn ObjectStore>,
        connector: Arc<dyn DbConnector>,
    ) -> Self {
        Self {
            config,
            object_store,
            connector,
            connection: None,
        }
    }

    pub async fn enter(&mut self) -> Result<(), ProcessingError> {
        if self.connection.is_some() {
            warn!("Database connection already open for this context");
            return Ok(());
        }
        let settings = self.config.db_settings()?;
        let connection = self.connector
            .open(&settings)
            .await
            .map_err(ProcessingError::Connection)?;
        self.connection = Some(connection);
        debug!("Entered runtime context");
        Ok(())
    }

    /// Close failures are logged only; they never replace the body's outcome.
    pub async fn exit(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            if let Err(e) = connection.close().await {
                warn!("Failed to close database connection: {}", e);
            }
            debug!("Exited runtime context");
        }
    }

    pub async fn scoped<T, F>(mut self, body: F) -> Result<T, ProcessingError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut RuntimeContext) -> BoxFuture<'c, Result<T, ProcessingError>> + Send,
    {
        self.enter().await?;
        let outcome = body(&mut self).await;
        self.exit().await;
        outcome
    }
}

impl ProcessingContext for RuntimeContext {
    fn config(&self) -> &ConfigurationBag {
        &self.config
    }

    fn object_store(&self) -> &dyn ObjectStore {
        self.object_store.as_ref()
    }

    fn connection(&mut self) -> Result<&mut dyn DbConnection, ProcessingError> {
        match self.connection.as_mut() {
            Some(connection) => Ok(&mut **connection),
            None => Err(ProcessingError::Connection(DatabaseError::NotConnected)),
        }
    }
}

/// Builds a fresh [`RuntimeContext`] per message from shared clients.
#[derive(Clone)]
pub struct ContextFactory {
    resolver: ConfigResolver,
    overrides: ConfigLayer,
    object_store: Arc<dyn ObjectStore>,
    connector: Arc<dyn DbConnector>,
}

impl ContextFactory {
    pub fn new(
        resolver: ConfigResolver,
        overrides: ConfigLayer,
        object_store: Arc<dyn ObjectStore>,
        connector: Arc<dyn DbConnector>,
    ) -> Self {
        Self {
            resolver,
            overrides,
            object_store,
            connector,
        }
    }

    pub fn resolve_config(&self) -> ConfigurationBag {
        self.resolver.resolve(&self.overrides)
    }

    pub fn build(&self) -> RuntimeContext {
        RuntimeContext::new(
            self.resolve_config(),
            Arc::clone(&self.object_store),
            Arc::clone(&self.connector),
        )
    }
}
