//! Keyspace administration

use cqlbridge_core::error::Result;
use cqlbridge_dialect::NameEscaper;
use cqlbridge_types::KeyspaceOptions;
use serde_json::Value;
use tracing::info;

use super::table::Table;
use crate::connectors::CassandraConnector;

const KEYSPACE_EXISTS: &str =
    "SELECT keyspace_name FROM system_schema.keyspaces WHERE keyspace_name = ?";

/// A keyspace of the connected cluster
pub struct Keyspace<'a> {
    connector: &'a CassandraConnector,
    name: String,
}

impl<'a> Keyspace<'a> {
    pub(crate) fn new(connector: &'a CassandraConnector, name: impl Into<String>) -> Self {
        Self {
            connector,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the keyspace is present in the schema catalog
    pub async fn exists(&self) -> Result<bool> {
        let rows = self
            .connector
            .execute(KEYSPACE_EXISTS, &[Value::String(self.name.clone())])
            .await?;
        Ok(!rows.is_empty())
    }

    /// Create the keyspace unless it exists.
    ///
    /// Without options the keyspace uses `SimpleStrategy` with a replication
    /// factor of 1.
    pub async fn create(&self, options: Option<&KeyspaceOptions>) -> Result<()> {
        let cql = self.render_create(options)?;
        self.connector.execute(cql, &[]).await?;
        info!("Keyspace '{}' ready", self.name);
        Ok(())
    }

    fn render_create(&self, options: Option<&KeyspaceOptions>) -> Result<String> {
        let formatter = self.connector.formatter();
        let default_options = KeyspaceOptions::default();
        let options = options.unwrap_or(&default_options);
        Ok(format!(
            "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {}",
            formatter.escape_name(&self.name)?,
            formatter.stringify(&options.replication)?
        ))
    }

    /// Handle for a table of this keyspace
    pub fn table(&self, name: impl Into<String>) -> Table<'a> {
        Table::new(self.connector, Some(self.name.clone()), name)
    }
}
