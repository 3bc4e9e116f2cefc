//! Cassandra CQL formatter
//!
//! CQL has no schema-qualified names and no table aliases, and it rejects a
//! column aliased with its own name. This formatter bridges those gaps over
//! the neutral [`SqlFormatter`] and adds column type mapping.

use cqlbridge_core::error::Result;
use cqlbridge_core::{CqlError, Expr, NameExpr, QueryField, SelectQuery};
use cqlbridge_types::{Field, TypeTemplate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;

use crate::sql::{SqlFormatter, SqlFormatterOptions};
use crate::traits::{
    Dialect, FieldFormat, FieldFormatter, NameEscaper, SelectFormatter, TypeFormatter,
};

/// Regex pattern for qualified names: `schema.table`, `schema.table.column`
static QUALIFIED_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w+(?:\.\w+)+$").unwrap());

/// Regex pattern for an aliased expression: `<expr> AS <alias>`
static SAME_ALIAS_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*)\sAS\s(.*)$").unwrap());

/// A double quote not preceded by a backslash
static UNESCAPED_DOUBLE_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"([^\\])""#).unwrap());

/// CQL dialect formatter
pub struct CqlFormatter {
    base: SqlFormatter,
}

impl CqlFormatter {
    pub fn new() -> Self {
        Self::with_base(SqlFormatter::with_options(SqlFormatterOptions {
            name_format: "\"$1\"".to_string(),
            force_alias: false,
        }))
    }

    /// Build on a preconfigured neutral formatter (e.g. a custom validator)
    pub fn with_base(base: SqlFormatter) -> Self {
        Self { base }
    }

    /// Escape a name given either as a string or as a `{"$name": ...}` wrapper
    pub fn escape_name_value(&self, name: &Value) -> Result<String> {
        let name = NameExpr::try_from(name)?;
        self.escape_name(&name.name)
    }

    /// Serialize a value as a literal embeddable in DDL text.
    ///
    /// JSON strings become single-quoted, single quotes inside them are
    /// backslash-escaped and escaped double quotes are left bare.
    pub fn stringify<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let json = serde_json::to_string(value)?;
        let escaped = json.replace('\'', "\\'");
        let quoted = UNESCAPED_DOUBLE_QUOTE.replace_all(&escaped, "${1}'");
        Ok(quoted.replace("\\\"", "\""))
    }
}

impl Default for CqlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl NameEscaper for CqlFormatter {
    /// Qualifying segments are dropped; only the last identifier is escaped
    fn escape_name(&self, name: &str) -> Result<String> {
        if QUALIFIED_NAME_PATTERN.is_match(name) {
            let member = name.rsplit('.').next().unwrap_or(name);
            return self.escape_name(member);
        }
        self.base.quote_name(name)
    }
}

impl FieldFormatter for CqlFormatter {
    fn format_field_ex(&self, field: &QueryField, format: FieldFormat) -> Result<String> {
        if field.alias.is_none() {
            if let Expr::Name(name) = &field.expr {
                if QUALIFIED_NAME_PATTERN.is_match(&name.name) {
                    return self.escape_name(name.member());
                }
            }
        }

        let result = self.base.format_field_with(self, field, format)?;
        if let Some(captures) = SAME_ALIAS_PATTERN.captures(&result) {
            if captures[1] == captures[2] {
                return Ok(captures[1].to_string());
            }
        }
        Ok(result)
    }
}

impl SelectFormatter for CqlFormatter {
    /// The `$ref` alias is stripped on a copy; the caller's query is untouched
    fn format_select(&self, select: &SelectQuery) -> Result<String> {
        let select = if select.entity.alias.is_some() {
            Cow::Owned(SelectQuery {
                entity: select.entity.unaliased(),
                ..select.clone()
            })
        } else {
            Cow::Borrowed(select)
        };
        self.base.format_select_with(self, &select)
    }
}

impl TypeFormatter for CqlFormatter {
    fn format_type(&self, field: &Field) -> Result<String> {
        let template = TypeTemplate::lookup(&field.field_type).ok_or_else(|| {
            CqlError::Configuration(format!(
                "Type {} is not supported by Cassandra CQL formatter.",
                field.field_type
            ))
        })?;

        let column_type = template.render(field.size, field.scale);
        if field.many {
            return Ok(format!("LIST<{}>", column_type));
        }
        Ok(column_type)
    }
}

impl Dialect for CqlFormatter {
    fn base(&self) -> &SqlFormatter {
        &self.base
    }
}
