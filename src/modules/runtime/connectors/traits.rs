//! Connector and transport trait definitions

use async_trait::async_trait;
use cqlbridge_core::error::Result;
use cqlbridge_core::{ConnectorConfig, Statement};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A result row, keyed by column name
pub type Row = HashMap<String, Value>;

/// Rows returned by a statement
pub type Rows = Vec<Row>;

/// Raw response of the transport for one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    /// Result rows; `None` for statements that return no result set
    pub rows: Option<Rows>,

    /// Warnings attached to the response by the server
    pub warnings: Vec<String>,
}

impl Response {
    pub fn with_rows(rows: Rows) -> Self {
        Self {
            rows: Some(rows),
            warnings: Vec::new(),
        }
    }
}

/// An established session with the cluster
#[async_trait]
pub trait RawConnection: Send + Sync {
    /// Run a statement with prepared-statement semantics.
    ///
    /// # Arguments
    /// * `cql` - Statement text with positional `?` markers
    /// * `params` - One value per marker, in order
    async fn execute(&self, cql: &str, params: &[Value]) -> Result<Response>;

    /// Release the session
    async fn shutdown(&self) -> Result<()>;
}

/// Establishes sessions
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self, config: &ConnectorConfig) -> Result<Arc<dyn RawConnection>>;
}

/// Trait for database connectors
///
/// Object-safe surface of a connector, for callers that hold connectors
/// behind `Arc<dyn Connector>`.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open the connection if it is not open yet
    async fn open(&self) -> Result<()>;

    /// Execute a statement and return the result rows
    ///
    /// # Arguments
    /// * `statement` - Raw CQL text or a query expression
    /// * `params` - Positional parameters
    async fn execute(&self, statement: Statement, params: &[Value]) -> Result<Rows>;

    /// Close the connection and release resources
    async fn close(&self) -> Result<()>;

    /// Check if the connection is healthy
    async fn health_check(&self) -> Result<()>;

    /// Get the connector type name
    fn connector_type(&self) -> &'static str;
}
