//! Database object name validation

use once_cell::sync::Lazy;
use regex::Regex;

/// Regex pattern for a single identifier
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Regex pattern for dot-qualified identifiers (`schema.table.column`)
static QUALIFIED_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap()
});

/// Decides whether a name may be embedded in a statement.
///
/// Embedding applications can register their own rules through
/// [`crate::SqlFormatter::with_validator`].
pub trait NameValidator: Send + Sync {
    /// Test `name`, allowing dot-qualified names when `qualified` is set
    fn test(&self, name: &str, qualified: bool) -> bool;
}

/// Accepts word identifiers, optionally dot-qualified
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNameValidator;

impl NameValidator for DefaultNameValidator {
    fn test(&self, name: &str, qualified: bool) -> bool {
        if qualified {
            QUALIFIED_NAME_PATTERN.is_match(name)
        } else {
            NAME_PATTERN.is_match(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validator() {
        let validator = DefaultNameValidator;
        assert!(validator.test("Products", false));
        assert!(validator.test("_id", false));
        assert!(!validator.test("dbo.Products", false));
        assert!(validator.test("dbo.Products", true));
        assert!(validator.test("dbo.Products.id", true));
        assert!(!validator.test("", true));
        assert!(!validator.test("1abc", true));
        assert!(!validator.test("Products\"; DROP", true));
        assert!(!validator.test("dbo..Products", true));
    }
}
