//! Table administration

use cqlbridge_core::error::Result;
use cqlbridge_core::CqlError;
use cqlbridge_dialect::{NameEscaper, TypeFormatter};
use cqlbridge_types::{Column, ColumnKind, Field};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::info;

use crate::connectors::CassandraConnector;

const TABLE_EXISTS: &str =
    "SELECT table_name FROM system_schema.tables WHERE keyspace_name = ? AND table_name = ?";

const TABLE_COLUMNS: &str = "SELECT column_name AS name, type, kind FROM system_schema.columns \
                             WHERE table_name = ? AND keyspace_name = ?";

/// Row of the column catalog query
#[derive(Deserialize)]
struct CatalogColumn {
    name: String,
    #[serde(rename = "type")]
    column_type: String,
    #[serde(default)]
    kind: Option<ColumnKind>,
}

/// A table of a keyspace
pub struct Table<'a> {
    connector: &'a CassandraConnector,
    keyspace: Option<String>,
    name: String,
}

impl<'a> Table<'a> {
    pub(crate) fn new(
        connector: &'a CassandraConnector,
        keyspace: Option<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            keyspace,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }

    fn require_keyspace(&self) -> Result<&str> {
        self.keyspace().ok_or_else(|| {
            CqlError::Configuration(format!(
                "Table '{}' has no keyspace. Configure a keyspace or use a keyspace handle.",
                self.name
            ))
        })
    }

    /// Escaped `"keyspace"."table"`
    fn qualified_name(&self) -> Result<String> {
        let formatter = self.connector.formatter();
        Ok(format!(
            "{}.{}",
            formatter.escape_name(self.require_keyspace()?)?,
            formatter.escape_name(&self.name)?
        ))
    }

    fn column_definition(&self, field: &Field) -> Result<String> {
        let formatter = self.connector.formatter();
        Ok(format!(
            "{} {}",
            formatter.escape_name(&field.name)?,
            formatter.format_type(field)?
        ))
    }

    /// Returns true if the table is present in the schema catalog
    pub async fn exists(&self) -> Result<bool> {
        let keyspace = self.require_keyspace()?;
        let rows = self
            .connector
            .execute(
                TABLE_EXISTS,
                &[
                    Value::String(keyspace.to_string()),
                    Value::String(self.name.clone()),
                ],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    /// List the columns of the table.
    ///
    /// A column is primary when it is a partition key component.
    pub async fn columns(&self) -> Result<Vec<Column>> {
        let keyspace = self.require_keyspace()?;
        let rows = self
            .connector
            .execute(
                TABLE_COLUMNS,
                &[
                    Value::String(self.name.clone()),
                    Value::String(keyspace.to_string()),
                ],
            )
            .await?;

        rows.into_iter()
            .map(|row| -> Result<Column> {
                let column: CatalogColumn =
                    serde_json::from_value(Value::Object(row.into_iter().collect()))?;
                Ok(Column::new(column.name, column.column_type, column.kind))
            })
            .collect()
    }

    /// Create the table unless it exists
    pub async fn create(&self, fields: &[Field]) -> Result<()> {
        let cql = self.render_create(fields)?;
        self.connector.execute(cql, &[]).await?;
        info!("Table '{}' ready", self.name);
        Ok(())
    }

    fn render_create(&self, fields: &[Field]) -> Result<String> {
        if fields.is_empty() {
            return Err(CqlError::Configuration(format!(
                "Table '{}' must define at least one field",
                self.name
            )));
        }

        let formatter = self.connector.formatter();
        let mut definitions = fields
            .iter()
            .map(|field| self.column_definition(field))
            .collect::<Result<Vec<_>>>()?;

        let primary = fields
            .iter()
            .filter(|field| field.primary)
            .map(|field| formatter.escape_name(&field.name))
            .collect::<Result<Vec<_>>>()?;
        if !primary.is_empty() {
            definitions.push(format!("PRIMARY KEY ({})", primary.join(", ")));
        }

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.qualified_name()?,
            definitions.join(", ")
        ))
    }

    /// Bring the table in line with `fields`.
    ///
    /// A missing table is created. Otherwise every field without a column is
    /// added; existing columns are left as they are. The primary key of an
    /// existing table cannot be extended.
    pub async fn change(&self, fields: &[Field]) -> Result<()> {
        let qualified_name = self.qualified_name()?;
        if !self.exists().await? {
            return self.create(fields).await;
        }

        let existing: HashSet<String> = self
            .columns()
            .await?
            .into_iter()
            .map(|column| column.name)
            .collect();

        let statements = fields
            .iter()
            .filter(|field| !existing.contains(&field.name))
            .map(|field| -> Result<String> {
                if field.primary {
                    return Err(CqlError::Configuration(format!(
                        "Cannot add primary key column '{}' to existing table '{}'",
                        field.name, self.name
                    )));
                }
                Ok(format!(
                    "ALTER TABLE {} ADD {}",
                    qualified_name,
                    self.column_definition(field)?
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        for cql in &statements {
            self.connector.execute(cql.as_str(), &[]).await?;
        }
        if !statements.is_empty() {
            info!("Table '{}' changed: {} column(s) added", self.name, statements.len());
        }
        Ok(())
    }
}
