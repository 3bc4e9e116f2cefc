//! Database connectors for cqlbridge
//!
//! This module provides the Cassandra connector and the transport traits it
//! runs on. The ScyllaDB driver transport is available behind the `scylla`
//! feature.

mod cassandra;
#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "scylla")]
mod driver;
mod traits;

pub use cassandra::CassandraConnector;
#[cfg(feature = "scylla")]
pub use driver::ScyllaTransport;
pub use traits::{Connector, RawConnection, Response, Row, Rows, Transport};
