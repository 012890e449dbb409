//! Reservation payloads submitted to the placement engine.
//!
//! Pure transformation from a request and its resolved identifiers to the
//! engine's wire shape. No I/O.

use serde::{Deserialize, Serialize};

use crate::types::{PlacementRequest, ResolvedContext};

/// The only action this delegate submits.
pub const PLACEMENT_ACTION: &str = "PLACEMENT";

/// Body of `POST /reservations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationPayload {
    pub demand_name: String,
    pub action: String,
    pub parameters: Vec<ReservationParameters>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationParameters {
    pub placement_parameters: PlacementParameters,
    pub deployment_parameters: DeploymentParameters,
}

/// Where to place: how many, which template, inside which datacenter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementParameters {
    pub count: u32,
    #[serde(rename = "templateID")]
    pub template_id: String,
    #[serde(rename = "constraintIDs", default, skip_serializing_if = "Vec::is_empty")]
    pub constraint_ids: Vec<String>,
}

/// How to deploy: profile plus affinity constraints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentParameters {
    /// Empty string when the request carries no profile; the engine
    /// expects the key to be present.
    #[serde(rename = "deploymentProfileID", default)]
    pub deployment_profile_id: String,
    #[serde(rename = "constraintIDs", default, skip_serializing_if = "Vec::is_empty")]
    pub constraint_ids: Vec<String>,
}

/// Build the reservation for `request` using the resolved identifiers.
pub fn build_reservation(request: &PlacementRequest, resolved: &ResolvedContext) -> ReservationPayload {
    let placement_constraints = if resolved.datacenter_id.is_empty() {
        Vec::new()
    } else {
        vec![resolved.datacenter_id.clone()]
    };

    ReservationPayload {
        demand_name: request.name.clone(),
        action: PLACEMENT_ACTION.to_string(),
        parameters: vec![ReservationParameters {
            placement_parameters: PlacementParameters {
                count: request.count,
                template_id: resolved.template_id.clone(),
                constraint_ids: placement_constraints,
            },
            deployment_parameters: DeploymentParameters {
                deployment_profile_id: request.deployment_profile_id.clone().unwrap_or_default(),
                constraint_ids: request.affinity_group_ids.clone(),
            },
        }],
    }
}
