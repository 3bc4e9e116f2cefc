//! Formatter capability traits
//!
//! A dialect is assembled from small capabilities. The neutral
//! [`SqlFormatter`] provides a default for each one; a dialect overrides what
//! its grammar needs and delegates the rest back to the neutral formatter,
//! passing itself along so nested nodes still go through its overrides.

use cqlbridge_core::error::Result;
use cqlbridge_core::{QueryExpression, QueryField, SelectQuery};
use cqlbridge_types::Field;

use crate::sql::SqlFormatter;

/// Context a field is rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    /// Select list entry; aliases are rendered
    Select,
    /// Plain reference (filters, ordering); aliases are dropped
    Reference,
}

/// Escapes database object names
pub trait NameEscaper {
    fn escape_name(&self, name: &str) -> Result<String>;
}

/// Renders field references and select list entries
pub trait FieldFormatter {
    fn format_field_ex(&self, field: &QueryField, format: FieldFormat) -> Result<String>;
}

/// Renders SELECT queries
pub trait SelectFormatter {
    fn format_select(&self, select: &SelectQuery) -> Result<String>;
}

/// Maps field descriptors to column types
pub trait TypeFormatter {
    fn format_type(&self, field: &Field) -> Result<String>;
}

/// A complete statement dialect
pub trait Dialect: NameEscaper + FieldFormatter + SelectFormatter + Send + Sync {
    /// The neutral formatter this dialect delegates to
    fn base(&self) -> &SqlFormatter;

    /// Compile a query expression to statement text
    fn format(&self, query: &QueryExpression) -> Result<String>
    where
        Self: Sized,
    {
        self.base().format_with(self, query)
    }
}
