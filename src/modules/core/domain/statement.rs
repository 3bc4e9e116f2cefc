//! Statements accepted by a connector

use super::query::{DeleteQuery, InsertQuery, QueryExpression, SelectQuery, UpdateQuery};

/// Either raw CQL text, passed through untouched, or a query expression
/// compiled by the formatter before it is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Text(String),
    Query(QueryExpression),
}

impl Statement {
    /// Returns the raw text if this statement needs no compilation
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Statement::Text(text) => Some(text),
            Statement::Query(_) => None,
        }
    }
}

impl From<&str> for Statement {
    fn from(text: &str) -> Self {
        Statement::Text(text.to_string())
    }
}

impl From<String> for Statement {
    fn from(text: String) -> Self {
        Statement::Text(text)
    }
}

impl From<QueryExpression> for Statement {
    fn from(query: QueryExpression) -> Self {
        Statement::Query(query)
    }
}

macro_rules! statement_from_query {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Statement {
                fn from(query: $ty) -> Self {
                    Statement::Query(query.into())
                }
            }
        )*
    };
}

statement_from_query!(SelectQuery, InsertQuery, UpdateQuery, DeleteQuery);
