//! Core domain logic for cqlbridge
//!
//! This crate contains the connector configuration, the structured query
//! model consumed by the dialect formatters, and the error type shared by
//! the whole workspace.

pub mod domain;
pub mod error;

pub use domain::*;
pub use error::CqlError;
