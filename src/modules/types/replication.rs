//! Keyspace replication options

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Replication strategy class of a keyspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplicationStrategy {
    SimpleStrategy,
    NetworkTopologyStrategy,
}

impl fmt::Display for ReplicationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicationStrategy::SimpleStrategy => write!(f, "SimpleStrategy"),
            ReplicationStrategy::NetworkTopologyStrategy => write!(f, "NetworkTopologyStrategy"),
        }
    }
}

/// Replication map embedded into `CREATE KEYSPACE`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replication {
    /// Strategy class
    pub class: ReplicationStrategy,

    /// Cluster-wide replication factor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_factor: Option<u32>,

    /// Per-datacenter replication factors (`NetworkTopologyStrategy`)
    #[serde(flatten)]
    pub datacenters: BTreeMap<String, u32>,
}

impl Replication {
    /// `SimpleStrategy` with the given replication factor
    pub fn simple(replication_factor: u32) -> Self {
        Self {
            class: ReplicationStrategy::SimpleStrategy,
            replication_factor: Some(replication_factor),
            datacenters: BTreeMap::new(),
        }
    }

    /// `NetworkTopologyStrategy` with per-datacenter factors
    pub fn network_topology<I, S>(datacenters: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            class: ReplicationStrategy::NetworkTopologyStrategy,
            replication_factor: None,
            datacenters: datacenters.into_iter().map(|(dc, n)| (dc.into(), n)).collect(),
        }
    }
}

impl Default for Replication {
    fn default() -> Self {
        Self::simple(1)
    }
}

/// Options accepted when creating a keyspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyspaceOptions {
    #[serde(default)]
    pub replication: Replication,
}

impl KeyspaceOptions {
    pub fn new(replication: Replication) -> Self {
        Self { replication }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_replication() {
        let value = serde_json::to_value(Replication::default()).unwrap();
        assert_eq!(value, json!({ "class": "SimpleStrategy", "replication_factor": 1 }));
    }

    #[test]
    fn test_network_topology_serde() {
        let replication = Replication::network_topology([("dc1", 3), ("dc2", 2)]);
        let value = serde_json::to_value(&replication).unwrap();
        assert_eq!(value, json!({ "class": "NetworkTopologyStrategy", "dc1": 3, "dc2": 2 }));

        let parsed: Replication = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, replication);
    }

    #[test]
    fn test_keyspace_options_default() {
        let options: KeyspaceOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options.replication, Replication::simple(1));
    }
}
