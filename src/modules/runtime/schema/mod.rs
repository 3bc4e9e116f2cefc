//! Schema administration handles
//!
//! Keyspace and table handles borrow a connector and run catalog queries and
//! DDL through it. They hold no state of their own.

mod keyspace;
mod table;

pub use keyspace::Keyspace;
pub use table::Table;
