//! Neutral type name to CQL type mapping

use std::fmt;

/// Mapping from neutral data types to CQL type templates.
///
/// `(?)` marks a size placeholder and `(?,?)` a size and scale pair.
/// Lookups use the first entry whose neutral name matches exactly.
pub const CQL_DIALECT_TYPES: &[(&str, &str)] = &[
    ("Boolean", "BOOLEAN"),
    ("Byte", "BLOB(1)"),
    ("Number", "FLOAT"),
    ("Number", "FLOAT"),
    ("Counter", "COUNTER"),
    ("Currency", "DECIMAL(19,4)"),
    ("Decimal", "DECIMAL(?,?)"),
    ("Date", "DATE"),
    ("DateTime", "TIMESTAMP"),
    ("Time", "TIME"),
    ("Long", "BIGINT"),
    ("Duration", "DURATION"),
    ("Integer", "INT"),
    ("Url", "TEXT(?)"),
    ("Text", "TEXT(?)"),
    ("Note", "TEXT(?)"),
    ("Image", "BLOB"),
    ("Binary", "BLOB"),
    ("Guid", "UUID"),
    ("Short", "SMALLINT"),
];

const SIZE_PLACEHOLDER: &str = "(?)";
const SIZE_AND_SCALE_PLACEHOLDER: &str = "(?,?)";

/// A CQL type template resolved from the mapping table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeTemplate {
    template: &'static str,
}

impl TypeTemplate {
    /// Find the template for a neutral type name
    pub fn lookup(neutral_type: &str) -> Option<Self> {
        CQL_DIALECT_TYPES
            .iter()
            .find(|(name, _)| *name == neutral_type)
            .map(|(_, template)| Self { template })
    }

    /// The raw template text, placeholders included
    pub fn as_str(&self) -> &'static str {
        self.template
    }

    /// Render the template for the given size and scale.
    ///
    /// A size placeholder is kept only for a positive size; a size and scale
    /// pair only for a positive size and a non-negative scale. Otherwise the
    /// placeholder is dropped together with its parentheses.
    pub fn render(&self, size: Option<i64>, scale: Option<i64>) -> String {
        let size = size.filter(|s| *s > 0);

        if self.template.contains(SIZE_AND_SCALE_PLACEHOLDER) {
            return match (size, scale.filter(|s| *s >= 0)) {
                (Some(size), Some(scale)) => self
                    .template
                    .replace(SIZE_AND_SCALE_PLACEHOLDER, &format!("({},{})", size, scale)),
                _ => self.template.replace(SIZE_AND_SCALE_PLACEHOLDER, ""),
            };
        }

        if self.template.contains(SIZE_PLACEHOLDER) {
            return match size {
                Some(size) => self
                    .template
                    .replace(SIZE_PLACEHOLDER, &format!("({})", size)),
                None => self.template.replace(SIZE_PLACEHOLDER, ""),
            };
        }

        self.template.to_string()
    }
}

impl fmt::Display for TypeTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template)
    }
}

/// Returns the distinct neutral type names, in table order
pub fn neutral_type_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for (name, _) in CQL_DIALECT_TYPES {
        if !names.contains(name) {
            names.push(name);
        }
    }
    names
}
