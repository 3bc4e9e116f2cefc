//! Field descriptors used for table definitions

use serde::{Deserialize, Serialize};

/// A column definition for table creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Column name
    pub name: String,

    /// Neutral type name (see [`crate::CQL_DIALECT_TYPES`])
    #[serde(rename = "type")]
    pub field_type: String,

    /// Whether this column is part of the partition key
    #[serde(default)]
    pub primary: bool,

    /// Optional size for sized types such as `Text`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,

    /// Optional scale for `Decimal`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<i64>,

    /// Whether the column holds an ordered list of the base type
    #[serde(default)]
    pub many: bool,
}

impl Field {
    /// Create a new non-key field
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            primary: false,
            size: None,
            scale: None,
            many: false,
        }
    }

    /// Create a new partition key field
    pub fn primary(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self::new(name, field_type).with_primary(true)
    }

    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_scale(mut self, scale: i64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_many(mut self, many: bool) -> Self {
        self.many = many;
        self
    }
}
