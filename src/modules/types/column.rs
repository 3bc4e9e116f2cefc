//! Catalog column definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column kinds as reported by `system_schema.columns`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Partition key component
    PartitionKey,
    /// Clustering column
    Clustering,
    /// Regular column
    Regular,
    /// Static column
    Static,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::PartitionKey => write!(f, "partition_key"),
            ColumnKind::Clustering => write!(f, "clustering"),
            ColumnKind::Regular => write!(f, "regular"),
            ColumnKind::Static => write!(f, "static"),
        }
    }
}

impl FromStr for ColumnKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "partition_key" => Ok(ColumnKind::PartitionKey),
            "clustering" => Ok(ColumnKind::Clustering),
            "regular" => Ok(ColumnKind::Regular),
            "static" => Ok(ColumnKind::Static),
            _ => Err(format!("Unknown column kind: {}", s)),
        }
    }
}

/// A column of an existing table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// CQL type as stored in the catalog (e.g. `text`, `list<int>`)
    #[serde(rename = "type")]
    pub column_type: String,

    /// Whether the column is a partition key component
    pub primary: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>, kind: Option<ColumnKind>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            primary: kind == Some(ColumnKind::PartitionKey),
        }
    }
}
