//! Statement formatters for cqlbridge
//!
//! This crate compiles the structured query model into statement text. The
//! neutral [`SqlFormatter`] renders standard SQL; [`CqlFormatter`] adapts it
//! to the Cassandra Query Language.

pub mod cql;
pub mod sql;
pub mod traits;
pub mod validator;

pub use cql::CqlFormatter;
pub use sql::{SqlFormatter, SqlFormatterOptions};
pub use traits::{
    Dialect, FieldFormat, FieldFormatter, NameEscaper, SelectFormatter, TypeFormatter,
};
pub use validator::{DefaultNameValidator, NameValidator};
