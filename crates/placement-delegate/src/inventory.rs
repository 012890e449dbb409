//! Live host inventory and the destination join.
//!
//! Bridges the engine's host names to the caller's inventory records. The
//! engine may know hosts the inventory does not (or no longer) list; those
//! are dropped without error.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::Destination;

/// One host known to the live inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostRecord {
    pub host: String,
    pub node_name: String,
}

impl HostRecord {
    pub fn new(host: impl Into<String>, node_name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            node_name: node_name.into(),
        }
    }
}

/// Source of currently known hosts.
pub trait HostInventory: Send + Sync {
    fn list_hosts(&self) -> anyhow::Result<Vec<HostRecord>>;
}

/// A fixed host list, e.g. loaded from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    hosts: Vec<HostRecord>,
}

impl StaticInventory {
    pub fn new(hosts: Vec<HostRecord>) -> Self {
        Self { hosts }
    }

    /// Load a JSON array of `{host, node_name}` records.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read inventory {}", path.display()))?;
        let hosts: Vec<HostRecord> = serde_json::from_str(&content)
            .with_context(|| format!("parse inventory {}", path.display()))?;
        Ok(Self { hosts })
    }
}

impl HostInventory for StaticInventory {
    fn list_hosts(&self) -> anyhow::Result<Vec<HostRecord>> {
        Ok(self.hosts.clone())
    }
}

/// Match selected host names against inventory records.
///
/// Output follows inventory order. A host selected more than once yields one
/// destination per selection.
pub fn join_destinations(selected: &[String], inventory: &[HostRecord]) -> Vec<Destination> {
    let mut destinations = Vec::new();

    for record in inventory {
        for host in selected.iter().filter(|h| **h == record.host) {
            destinations.push(Destination::new(host.clone(), record.node_name.clone()));
        }
    }

    for host in selected {
        if !inventory.iter().any(|r| r.host == *host) {
            debug!(%host, "selected host not in inventory, dropping");
        }
    }

    destinations
}
