//! Type definitions for cqlbridge
//!
//! This crate contains the shared type definitions used across the cqlbridge
//! workspace: the neutral-to-CQL type mapping table, field descriptors for
//! table definitions, catalog columns and keyspace replication options.

pub mod column;
pub mod field;
pub mod replication;
pub mod type_map;

pub use column::{Column, ColumnKind};
pub use field::Field;
pub use replication::{KeyspaceOptions, Replication, ReplicationStrategy};
pub use type_map::{neutral_type_names, TypeTemplate, CQL_DIALECT_TYPES};
