//! Decision notifications.
//!
//! Notifiers are fire-and-forget: the orchestrator logs a failed
//! notification and carries on.

use serde::Serialize;
use tracing::info;

use crate::error::DelegateResult;
use crate::types::{Destination, PlacementRequest};

/// Lifecycle event of one placement decision.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DecisionEvent {
    Started {
        request_name: String,
        template_name: String,
        count: u32,
        zone: Option<String>,
    },
    Finished {
        request_name: String,
        outcome: DecisionOutcome,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DecisionOutcome {
    Placed { hosts: Vec<String> },
    Failed { error: String },
}

impl DecisionEvent {
    pub fn started(request: &PlacementRequest) -> Self {
        Self::Started {
            request_name: request.name.clone(),
            template_name: request.template_name.clone(),
            count: request.count,
            zone: request.zone.clone(),
        }
    }

    pub fn finished(request: &PlacementRequest, result: &DelegateResult<Vec<Destination>>) -> Self {
        let outcome = match result {
            Ok(destinations) => DecisionOutcome::Placed {
                hosts: destinations.iter().map(|d| d.host.clone()).collect(),
            },
            Err(e) => DecisionOutcome::Failed {
                error: e.to_string(),
            },
        };
        Self::Finished {
            request_name: request.name.clone(),
            outcome,
        }
    }
}

/// Sink for decision events.
pub trait DecisionNotifier: Send + Sync {
    fn notify(&self, event: &DecisionEvent) -> anyhow::Result<()>;
}

/// Emits events as structured log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl DecisionNotifier for TracingNotifier {
    fn notify(&self, event: &DecisionEvent) -> anyhow::Result<()> {
        let payload = serde_json::to_string(event)?;
        info!(event = %payload, "placement decision event");
        Ok(())
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl DecisionNotifier for NoopNotifier {
    fn notify(&self, _event: &DecisionEvent) -> anyhow::Result<()> {
        Ok(())
    }
}
