//! Reservation submission and response parsing.
//!
//! The engine's reservation response is loosely typed. Every level of the
//! `demandEntities -> placements -> computeResources -> provider` chain may be
//! missing; a missing level contributes no hosts instead of failing the
//! parse.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{DelegateError, DelegateResult, PlacementErrorKind};
use crate::reservation::ReservationPayload;
use crate::session::Session;
use crate::transport::{EngineTransport, TransportFailure};
use crate::types::PlacementResult;

/// Top-level `status` of a successful reservation.
pub const PLACEMENT_SUCCEEDED: &str = "PLACEMENT_SUCCEEDED";
/// Provider class of physical hosts.
pub const PHYSICAL_MACHINE_CLASS: &str = "PhysicalMachine";

const RESERVATIONS_PATH: &str = "reservations";

/// Submits reservations to the engine.
#[derive(Debug, Clone)]
pub struct PlacementClient {
    transport: EngineTransport,
}

impl PlacementClient {
    pub fn new(transport: EngineTransport) -> Self {
        Self { transport }
    }

    /// Submit one reservation. A timeout is terminal; nothing is retried.
    pub async fn submit(
        &self,
        payload: &ReservationPayload,
        session: &Session,
    ) -> DelegateResult<PlacementResult> {
        info!(demand = %payload.demand_name, "submitting reservation");

        let response = self
            .transport
            .post_json(session, RESERVATIONS_PATH, payload)
            .await
            .map_err(placement_failure)?;

        if response.status != reqwest::StatusCode::OK {
            let detail = response
                .message()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("HTTP {}", response.status));
            warn!(demand = %payload.demand_name, status = %response.status, %detail, "engine rejected reservation");
            return Err(DelegateError::placement(PlacementErrorKind::EngineRejected, detail));
        }

        let result = parse_placement_response(&response.body);
        info!(
            demand = %payload.demand_name,
            status = ?result.status,
            hosts = result.selected_hosts.len(),
            "reservation answered"
        );
        Ok(result)
    }
}

/// Flatten a reservation response into the hosts it selected.
pub fn parse_placement_response(body: &Value) -> PlacementResult {
    let status = body.get("status").and_then(Value::as_str);
    if status != Some(PLACEMENT_SUCCEEDED) {
        debug!(?status, "placement not successful");
        return PlacementResult::failed();
    }

    let hosts = items(body, "demandEntities")
        .iter()
        .filter_map(|entity| entity.get("placements"))
        .flat_map(|placements| items(placements, "computeResources"))
        .filter_map(|resource| resource.get("provider"))
        .filter(|provider| provider.get("className").and_then(Value::as_str) == Some(PHYSICAL_MACHINE_CLASS))
        .filter_map(|provider| provider.get("displayName").and_then(Value::as_str))
        .inspect(|host| debug!(%host, "engine selected host"))
        .map(str::to_owned)
        .collect();

    PlacementResult::succeeded(hosts)
}

/// Array under `key`, or an empty slice when absent or not an array.
fn items<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn placement_failure(failure: TransportFailure) -> DelegateError {
    let kind = if failure.timed_out {
        warn!(detail = %failure.detail, "reservation request timed out");
        PlacementErrorKind::Timeout
    } else {
        PlacementErrorKind::Transport
    };
    DelegateError::placement(kind, failure.detail)
}
