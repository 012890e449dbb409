//! Scheduler orchestrator: one placement decision, end to end.
//!
//! The orchestrator is the entry point for callers. For each request it:
//! - Validates the request and applies the forced-host short-circuit
//! - Otherwise logs in, resolves zone and template, builds and submits
//!   a reservation
//! - Joins the selected hosts against the live inventory
//!
//! ```text
//! VALIDATE ─┬─ forced hosts ─────────────────────────────────────────┐
//!           └─ AUTHENTICATE → RESOLVE_ZONE → RESOLVE_TEMPLATE        │
//!                → BUILD → SUBMIT ───────────────────────────────── JOIN
//! ```
//!
//! Nothing is shared between decisions except the immutable config and the
//! HTTP connection pool. Sessions live for one decision only.

use std::sync::Arc;

use tracing::{info, warn};

use crate::client::PlacementClient;
use crate::config::EngineConfig;
use crate::error::{DelegateError, DelegateResult};
use crate::inventory::{HostInventory, HostRecord, join_destinations};
use crate::notify::{DecisionEvent, DecisionNotifier};
use crate::reservation::build_reservation;
use crate::resolver::ResourceResolver;
use crate::session::SessionManager;
use crate::transport::EngineTransport;
use crate::types::{Destination, PlacementRequest, RequestContext};

/// Delegates placement decisions to the external engine.
pub struct SchedulerOrchestrator {
    sessions: SessionManager,
    resolver: ResourceResolver,
    client: PlacementClient,
    inventory: Arc<dyn HostInventory>,
    notifier: Arc<dyn DecisionNotifier>,
}

impl SchedulerOrchestrator {
    /// Create an orchestrator. Fails if the config is invalid.
    pub fn new(
        config: &EngineConfig,
        inventory: Arc<dyn HostInventory>,
        notifier: Arc<dyn DecisionNotifier>,
    ) -> DelegateResult<Self> {
        config.validate()?;
        let transport = EngineTransport::new(config)?;

        info!(
            endpoint = %config.rest_endpoint(),
            target_address = %config.target_address,
            verify_ssl = config.verify_ssl,
            timeout_secs = config.timeout_secs,
            "placement delegate initialized"
        );

        Ok(Self {
            sessions: SessionManager::new(transport.clone(), config),
            resolver: ResourceResolver::new(transport.clone(), config.target_address.clone()),
            client: PlacementClient::new(transport),
            inventory,
            notifier,
        })
    }

    /// Select destinations for `request`.
    ///
    /// Fails with [`DelegateError::NoValidHost`] when no selected host is
    /// present in the inventory.
    pub async fn select_destinations(
        &self,
        request: &PlacementRequest,
        context: &RequestContext,
    ) -> DelegateResult<Vec<Destination>> {
        self.notify(&DecisionEvent::started(request));
        info!(
            request = %request.name,
            template = %request.template_name,
            count = request.count,
            origin = ?context.origin_address,
            "selecting destinations"
        );

        let outcome = self.decide(request, context).await;

        match &outcome {
            Ok(destinations) => {
                let hosts: Vec<&str> = destinations.iter().map(|d| d.host.as_str()).collect();
                info!(request = %request.name, ?hosts, "destinations selected");
            }
            Err(e) => warn!(request = %request.name, error = %e, "placement decision failed"),
        }

        self.notify(&DecisionEvent::finished(request, &outcome));
        outcome
    }

    async fn decide(
        &self,
        request: &PlacementRequest,
        context: &RequestContext,
    ) -> DelegateResult<Vec<Destination>> {
        validate_request(request)?;

        let forced = request.forced_host_names();
        let selected = if forced.is_empty() {
            self.engine_placement(request, context).await?
        } else {
            info!(request = %request.name, hosts = ?forced, "using forced hosts");
            forced
        };

        let destinations = join_destinations(&selected, &self.live_inventory());
        if destinations.is_empty() {
            return Err(DelegateError::NoValidHost {
                reason: format!(
                    "no suitable host found for template {}, number of workloads: {}",
                    request.template_name, request.count
                ),
            });
        }

        Ok(destinations)
    }

    /// Ask the engine. Returns an empty list when the engine found no
    /// placement.
    async fn engine_placement(
        &self,
        request: &PlacementRequest,
        context: &RequestContext,
    ) -> DelegateResult<Vec<String>> {
        let zone = required(request.zone.as_deref(), "availability zone not set")?;
        required(context.origin_address.as_deref(), "remote address not set")?;

        let session = self.sessions.acquire().await?;

        let resolved = self
            .resolver
            .resolve(&session, zone, &request.template_name)
            .await?;

        let payload = build_reservation(request, &resolved);
        info!(
            request = %request.name,
            deployment_profile = ?request.deployment_profile_id,
            affinity_groups = ?request.affinity_group_ids,
            template_id = %resolved.template_id,
            datacenter = %resolved.datacenter_id,
            "creating placement"
        );

        let result = self.client.submit(&payload, &session).await?;
        Ok(result.selected_hosts)
    }

    fn live_inventory(&self) -> Vec<HostRecord> {
        self.inventory.list_hosts().unwrap_or_else(|e| {
            warn!(error = %e, "failed to list inventory hosts");
            Vec::new()
        })
    }

    fn notify(&self, event: &DecisionEvent) {
        if let Err(e) = self.notifier.notify(event) {
            warn!(error = %e, "decision notification failed");
        }
    }
}

fn validate_request(request: &PlacementRequest) -> DelegateResult<()> {
    if request.template_name.trim().is_empty() {
        return Err(DelegateError::InvalidRequest("template name not set".to_string()));
    }
    if request.count == 0 {
        return Err(DelegateError::InvalidRequest(
            "workload count must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn required<'a>(value: Option<&'a str>, message: &str) -> DelegateResult<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| DelegateError::InvalidRequest(message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::inventory::StaticInventory;
    use crate::notify::{DecisionOutcome, NoopNotifier};

    /// Nothing listens here; any network call fails.
    fn unreachable_config() -> EngineConfig {
        let mut config = EngineConfig::new("127.0.0.1:1", "10.0.0.10", "pw");
        config.protocol = "http".to_string();
        config.timeout_secs = 1;
        config
    }

    fn inventory() -> Arc<StaticInventory> {
        Arc::new(StaticInventory::new(vec![
            HostRecord::new("host-a", "node-a"),
            HostRecord::new("host-b", "node-b"),
        ]))
    }

    fn orchestrator() -> SchedulerOrchestrator {
        SchedulerOrchestrator::new(&unreachable_config(), inventory(), Arc::new(NoopNotifier)).unwrap()
    }

    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<DecisionEvent>>,
    }

    impl DecisionNotifier for RecordingNotifier {
        fn notify(&self, event: &DecisionEvent) -> anyhow::Result<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    impl DecisionNotifier for FailingNotifier {
        fn notify(&self, _event: &DecisionEvent) -> anyhow::Result<()> {
            anyhow::bail!("sink unavailable")
        }
    }

    struct BrokenInventory;

    impl HostInventory for BrokenInventory {
        fn list_hosts(&self) -> anyhow::Result<Vec<HostRecord>> {
            anyhow::bail!("inventory offline")
        }
    }

    #[test]
    fn creation_rejects_invalid_config() {
        let mut config = unreachable_config();
        config.address.clear();
        let result = SchedulerOrchestrator::new(&config, inventory(), Arc::new(NoopNotifier));
        assert!(matches!(result, Err(DelegateError::Config(_))));
    }

    #[tokio::test]
    async fn forced_hosts_skip_the_engine() {
        let request = PlacementRequest::new("m1.small", 1).with_forced_hosts(["host-b", "host-x"]);

        let dests = orchestrator()
            .select_destinations(&request, &RequestContext::default())
            .await
            .unwrap();

        assert_eq!(dests, vec![Destination::new("host-b", "node-b")]);
    }

    #[tokio::test]
    async fn forced_hosts_missing_from_inventory_fail() {
        let request = PlacementRequest::new("m1.small", 1).with_forced_hosts(["host-x"]);

        let result = orchestrator()
            .select_destinations(&request, &RequestContext::default())
            .await;

        assert!(matches!(result, Err(DelegateError::NoValidHost { .. })));
    }

    #[tokio::test]
    async fn padded_forced_host_does_not_match_inventory() {
        let request = PlacementRequest::new("m1.small", 1).with_forced_hosts([" host-a "]);

        let result = orchestrator()
            .select_destinations(&request, &RequestContext::default())
            .await;

        assert!(matches!(result, Err(DelegateError::NoValidHost { .. })));
    }

    #[tokio::test]
    async fn blank_forced_hosts_do_not_short_circuit() {
        let request = PlacementRequest::new("m1.small", 1).with_forced_hosts([""]);

        let result = orchestrator()
            .select_destinations(&request, &RequestContext::new("10.1.1.1"))
            .await;

        assert!(matches!(result, Err(DelegateError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn missing_zone_fails_before_network() {
        let request = PlacementRequest::new("m1.small", 1);

        let result = orchestrator()
            .select_destinations(&request, &RequestContext::new("10.1.1.1"))
            .await;

        assert!(matches!(result, Err(DelegateError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn empty_zone_fails_before_network() {
        let request = PlacementRequest::new("m1.small", 1).with_zone("");

        let result = orchestrator()
            .select_destinations(&request, &RequestContext::new("10.1.1.1"))
            .await;

        assert!(matches!(result, Err(DelegateError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn missing_origin_fails_before_network() {
        let request = PlacementRequest::new("m1.small", 1).with_zone("nova");

        let result = orchestrator()
            .select_destinations(&request, &RequestContext::default())
            .await;

        assert!(matches!(result, Err(DelegateError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn zero_count_is_invalid() {
        let request = PlacementRequest::new("m1.small", 0).with_forced_hosts(["host-a"]);

        let result = orchestrator()
            .select_destinations(&request, &RequestContext::default())
            .await;

        assert!(matches!(result, Err(DelegateError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn empty_template_is_invalid() {
        let request = PlacementRequest::new(" ", 1).with_forced_hosts(["host-a"]);

        let result = orchestrator()
            .select_destinations(&request, &RequestContext::default())
            .await;

        assert!(matches!(result, Err(DelegateError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn unreachable_engine_fails_authentication() {
        let request = PlacementRequest::new("m1.small", 1).with_zone("nova");

        let result = orchestrator()
            .select_destinations(&request, &RequestContext::new("10.1.1.1"))
            .await;

        assert!(matches!(result, Err(DelegateError::Authentication { .. })));
    }

    #[tokio::test]
    async fn inventory_failure_means_no_valid_host() {
        let orchestrator = SchedulerOrchestrator::new(
            &unreachable_config(),
            Arc::new(BrokenInventory),
            Arc::new(NoopNotifier),
        )
        .unwrap();
        let request = PlacementRequest::new("m1.small", 1).with_forced_hosts(["host-a"]);

        let result = orchestrator
            .select_destinations(&request, &RequestContext::default())
            .await;

        assert!(matches!(result, Err(DelegateError::NoValidHost { .. })));
    }

    #[tokio::test]
    async fn no_valid_host_reason_names_template_and_count() {
        let request = PlacementRequest::new("m1.tiny", 3).with_forced_hosts(["host-x"]);

        let err = orchestrator()
            .select_destinations(&request, &RequestContext::default())
            .await
            .unwrap_err();

        let DelegateError::NoValidHost { reason } = &err else {
            panic!("expected NoValidHost, got {err:?}");
        };
        assert!(reason.contains("m1.tiny"));
        assert!(reason.contains('3'));
    }

    #[tokio::test]
    async fn notifier_sees_start_and_finish() {
        let notifier = Arc::new(RecordingNotifier::default());
        let orchestrator =
            SchedulerOrchestrator::new(&unreachable_config(), inventory(), notifier.clone()).unwrap();
        let request = PlacementRequest::new("m1.small", 1).with_forced_hosts(["host-a"]);

        orchestrator
            .select_destinations(&request, &RequestContext::default())
            .await
            .unwrap();

        let events = notifier.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], DecisionEvent::Started { .. }));
        assert_eq!(
            events[1],
            DecisionEvent::Finished {
                request_name: request.name.clone(),
                outcome: DecisionOutcome::Placed {
                    hosts: vec!["host-a".to_string()],
                },
            }
        );
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_decision() {
        let orchestrator =
            SchedulerOrchestrator::new(&unreachable_config(), inventory(), Arc::new(FailingNotifier))
                .unwrap();
        let request = PlacementRequest::new("m1.small", 1).with_forced_hosts(["host-a"]);

        let result = orchestrator
            .select_destinations(&request, &RequestContext::default())
            .await;

        assert!(result.is_ok());
    }
}
