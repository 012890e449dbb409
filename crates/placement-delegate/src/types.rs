//! Domain types for a single placement decision.
//!
//! Everything here lives for exactly one call to the orchestrator. Requests
//! and destinations are serializable so they can be read from and written
//! to JSON by the CLI.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of generated reservation names.
pub const REQUEST_NAME_PREFIX: &str = "placement-request-";

/// Generate a unique reservation name.
pub fn generate_request_name() -> String {
    format!("{REQUEST_NAME_PREFIX}{}", Uuid::new_v4())
}

// ── Request ────────────────────────────────────────────────────────

/// A placement request as handed over by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementRequest {
    /// Unique reservation name for this call.
    #[serde(default = "generate_request_name")]
    pub name: String,
    /// Flavor / resource template name.
    pub template_name: String,
    /// Availability zone.
    #[serde(default)]
    pub zone: Option<String>,
    /// Image or deployment profile identifier.
    #[serde(default)]
    pub deployment_profile_id: Option<String>,
    /// Number of workloads to place.
    pub count: u32,
    /// Affinity group identifiers, passed through in order.
    #[serde(default)]
    pub affinity_group_ids: Vec<String>,
    /// Hosts that bypass engine-driven placement.
    #[serde(default)]
    pub forced_hosts: Vec<String>,
}

impl PlacementRequest {
    pub fn new(template_name: impl Into<String>, count: u32) -> Self {
        Self {
            name: generate_request_name(),
            template_name: template_name.into(),
            zone: None,
            deployment_profile_id: None,
            count,
            affinity_group_ids: Vec::new(),
            forced_hosts: Vec::new(),
        }
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_deployment_profile(mut self, id: impl Into<String>) -> Self {
        self.deployment_profile_id = Some(id.into());
        self
    }

    pub fn with_affinity_groups<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affinity_group_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_forced_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forced_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Forced host names, skipping blank entries. Names are kept verbatim.
    pub fn forced_host_names(&self) -> Vec<String> {
        self.forced_hosts
            .iter()
            .filter(|h| !h.trim().is_empty())
            .cloned()
            .collect()
    }
}

/// Caller context accompanying a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestContext {
    /// Address the request originated from.
    #[serde(default)]
    pub origin_address: Option<String>,
}

impl RequestContext {
    pub fn new(origin_address: impl Into<String>) -> Self {
        Self {
            origin_address: Some(origin_address.into()),
        }
    }
}

// ── Resolution ─────────────────────────────────────────────────────

/// Engine-side identifiers resolved for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext {
    pub datacenter_id: String,
    pub region_id: String,
    pub template_id: String,
}

// ── Result ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStatus {
    Succeeded,
    Failed,
}

/// The engine's decision, flattened to host names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementResult {
    pub status: PlacementStatus,
    /// Hosts in the order the engine listed them. May be empty even on
    /// success.
    pub selected_hosts: Vec<String>,
}

impl PlacementResult {
    pub fn succeeded(selected_hosts: Vec<String>) -> Self {
        Self {
            status: PlacementStatus::Succeeded,
            selected_hosts,
        }
    }

    pub fn failed() -> Self {
        Self {
            status: PlacementStatus::Failed,
            selected_hosts: Vec::new(),
        }
    }
}

// ── Destination ────────────────────────────────────────────────────

/// A host the caller should instantiate a workload on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Destination {
    pub host: String,
    pub node_name: String,
    /// Resource limits; always empty.
    pub limits: BTreeMap<String, serde_json::Value>,
}

impl Destination {
    pub fn new(host: impl Into<String>, node_name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            node_name: node_name.into(),
            limits: BTreeMap::new(),
        }
    }
}
