//! Domain models for cqlbridge

mod config;
mod query;
mod statement;

pub use config::ConnectorConfig;
pub use query::{
    CompareOp, DeleteQuery, Expr, InsertQuery, NameExpr, OrderBy, QueryEntity, QueryExpression,
    QueryField, SelectQuery, UpdateQuery,
};
pub use statement::Statement;
