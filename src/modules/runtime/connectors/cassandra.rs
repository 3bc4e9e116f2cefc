//! Cassandra connector implementation

use async_trait::async_trait;
use cqlbridge_core::error::Result;
use cqlbridge_core::{ConnectorConfig, Statement};
use cqlbridge_dialect::{CqlFormatter, Dialect, TypeFormatter};
use cqlbridge_types::Field;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::traits::{Connector, RawConnection, Rows, Transport};
use crate::schema::{Keyspace, Table};

/// Cassandra / ScyllaDB connector
///
/// Holds at most one session. The session is opened lazily by the first
/// statement, dropped after any failed statement and reopened by the next one.
pub struct CassandraConnector {
    config: ConnectorConfig,
    transport: Arc<dyn Transport>,
    formatter: CqlFormatter,
    connection: RwLock<Option<Arc<dyn RawConnection>>>,
}

impl CassandraConnector {
    /// Create a connector backed by the ScyllaDB driver
    #[cfg(feature = "scylla")]
    pub fn new(config: ConnectorConfig) -> Result<Self> {
        Self::with_transport(config, Arc::new(super::driver::ScyllaTransport::new()))
    }

    /// Create a connector over a custom transport
    pub fn with_transport(config: ConnectorConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            formatter: CqlFormatter::new(),
            connection: RwLock::new(None),
        })
    }

    /// Use a custom formatter, e.g. one built over a neutral formatter with
    /// an application-specific name validator
    pub fn with_formatter(mut self, formatter: CqlFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn formatter(&self) -> &CqlFormatter {
        &self.formatter
    }

    /// Returns true while a session is held
    pub async fn is_open(&self) -> bool {
        self.connection.read().await.is_some()
    }

    /// Open the connection. Does nothing if it is already open.
    pub async fn open(&self) -> Result<()> {
        self.connection().await.map(|_| ())
    }

    /// Get the current session, connecting first if there is none
    async fn connection(&self) -> Result<Arc<dyn RawConnection>> {
        if let Some(connection) = self.connection.read().await.as_ref() {
            return Ok(connection.clone());
        }

        // Concurrent callers queue here behind the handshake in progress
        let mut guard = self.connection.write().await;
        if let Some(connection) = guard.as_ref() {
            return Ok(connection.clone());
        }

        info!("Connecting to Cassandra at {:?}", self.config.contact_points);
        let connection = self.transport.connect(&self.config).await.map_err(|e| {
            error!("Cassandra connection failed: {}", e);
            e
        })?;
        info!("Connected to Cassandra");

        *guard = Some(connection.clone());
        Ok(connection)
    }

    /// Close the connection. Does nothing if it is already closed.
    ///
    /// The handle is released before shutdown completes; a shutdown error is
    /// still returned. The driver transport's shutdown only releases its
    /// reference (the session closes when the last one is dropped), so with
    /// that transport this never fails.
    pub async fn close(&self) -> Result<()> {
        let connection = self.connection.write().await.take();
        match connection {
            Some(connection) => {
                connection.shutdown().await?;
                info!("Cassandra connection closed");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Drop a session after a failure, unless another caller already replaced it
    async fn force_close(&self, failed: &Arc<dyn RawConnection>) {
        {
            let mut guard = self.connection.write().await;
            let is_current = guard
                .as_ref()
                .map_or(false, |current| Arc::ptr_eq(current, failed));
            if !is_current {
                return;
            }
            guard.take();
        }

        if let Err(e) = failed.shutdown().await {
            warn!("Error closing failed Cassandra connection: {}", e);
        }
    }

    /// Compile a statement to CQL text
    pub fn render(&self, statement: &Statement) -> Result<String> {
        match statement {
            Statement::Text(text) => Ok(text.clone()),
            Statement::Query(query) => self.formatter.format(query),
        }
    }

    /// Execute a statement and return its rows.
    ///
    /// Opens the connection if needed. Query expressions are compiled first;
    /// everything is sent as a prepared statement with positional `params`.
    /// Any failure closes the connection before the error is returned, so the
    /// next call starts over with a fresh session.
    pub async fn execute(&self, statement: impl Into<Statement>, params: &[Value]) -> Result<Rows> {
        let statement = statement.into();
        let connection = self.connection().await?;

        let cql = match self.render(&statement) {
            Ok(cql) => cql,
            Err(e) => {
                error!("Failed to compile statement: {}", e);
                self.force_close(&connection).await;
                return Err(e.into_render());
            }
        };

        debug!("Executing CQL: {}", cql);
        match connection.execute(&cql, params).await {
            Ok(response) => {
                for warning in &response.warnings {
                    warn!("Cassandra warning for '{}': {}", cql, warning);
                }
                Ok(response.rows.unwrap_or_default())
            }
            Err(e) => {
                error!("CQL '{}' failed: {}", cql, e);
                self.force_close(&connection).await;
                Err(e)
            }
        }
    }

    /// Map a field descriptor to its CQL column type
    pub fn format_type(&self, field: &Field) -> Result<String> {
        self.formatter.format_type(field)
    }

    /// Handle for a keyspace
    pub fn keyspace(&self, name: impl Into<String>) -> Keyspace<'_> {
        Keyspace::new(self, name)
    }

    /// Handle for a table of the configured keyspace
    pub fn table(&self, name: impl Into<String>) -> Table<'_> {
        Table::new(self, self.config.keyspace().map(str::to_string), name)
    }
}

#[async_trait]
impl Connector for CassandraConnector {
    async fn open(&self) -> Result<()> {
        CassandraConnector::open(self).await
    }

    async fn execute(&self, statement: Statement, params: &[Value]) -> Result<Rows> {
        CassandraConnector::execute(self, statement, params).await
    }

    async fn close(&self) -> Result<()> {
        CassandraConnector::close(self).await
    }

    async fn health_check(&self) -> Result<()> {
        CassandraConnector::execute(self, "SELECT release_version FROM system.local", &[]).await?;
        Ok(())
    }

    fn connector_type(&self) -> &'static str {
        "cassandra"
    }
}
