//! Cassandra connector runtime for cqlbridge
//!
//! This crate provides the connection lifecycle of a Cassandra connector,
//! statement execution through the CQL formatter, keyspace and table
//! administration, and callback adapters for the async API.

pub mod callback;
pub mod connectors;
pub mod schema;

pub use callback::{lift, spawn_with_callback, Callback, CallbackExt};
pub use connectors::{CassandraConnector, Connector, RawConnection, Response, Rows, Transport};
pub use schema::{Keyspace, Table};
