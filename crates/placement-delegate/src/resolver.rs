//! Resolution of zone and template names to engine identifiers.
//!
//! Datacenters are discovered through the engine's entity search. Their
//! identifiers are composite strings of the form
//! `namespace:target:region:type:zone`, parsed into a [`DatacenterUuid`] as
//! soon as they come off the wire. Templates are matched by their fully
//! qualified display name `{target}:{region}::TMP-{name}`.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::{DelegateError, DelegateResult, ResolutionErrorKind};
use crate::session::Session;
use crate::transport::{EngineTransport, TransportFailure};
use crate::types::ResolvedContext;

/// Namespace of datacenters discovered from this kind of deployment.
pub const DATACENTER_NAMESPACE: &str = "OSS";
/// Entity type tag of datacenter identifiers.
pub const DATACENTER_ENTITY_TYPE: &str = "DC";

const UUID_DELIMITER: char = ':';

const DATACENTER_SEARCH_PATH: &str = "search?types=DataCenter";
const TEMPLATES_PATH: &str = "templates";

// ── Datacenter identifiers ─────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed datacenter identifier: {0}")]
pub struct MalformedDatacenterUuid(String);

/// A parsed datacenter identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatacenterUuid {
    pub namespace: String,
    pub target: String,
    pub region: String,
    pub entity_type: String,
    pub zone: String,
}

impl DatacenterUuid {
    /// Whether this is a datacenter of `target` serving `zone`.
    pub fn matches(&self, target: &str, zone: &str) -> bool {
        self.namespace == DATACENTER_NAMESPACE
            && self.entity_type == DATACENTER_ENTITY_TYPE
            && self.target == target
            && self.zone == zone
    }
}

impl FromStr for DatacenterUuid {
    type Err = MalformedDatacenterUuid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(UUID_DELIMITER).collect();
        let [namespace, target, region, entity_type, zone] = parts.as_slice() else {
            return Err(MalformedDatacenterUuid(s.to_string()));
        };

        Ok(Self {
            namespace: namespace.to_string(),
            target: target.to_string(),
            region: region.to_string(),
            entity_type: entity_type.to_string(),
            zone: zone.to_string(),
        })
    }
}

impl fmt::Display for DatacenterUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.namespace, self.target, self.region, self.entity_type, self.zone
        )
    }
}

/// First datacenter entity of `target` serving `zone`.
///
/// Entries without a `uuid` or with an identifier that does not parse are
/// skipped. Uniqueness is not checked.
pub fn select_datacenter(entities: &[Value], target: &str, zone: &str) -> Option<DatacenterUuid> {
    entities
        .iter()
        .filter_map(|entity| entity.get("uuid").and_then(Value::as_str))
        .filter_map(|uuid| uuid.parse::<DatacenterUuid>().ok())
        .find(|dc| dc.matches(target, zone))
}

// ── Templates ──────────────────────────────────────────────────────

/// Fully qualified template display name.
pub fn qualified_template_name(target: &str, region: &str, template_name: &str) -> String {
    format!("{target}:{region}::TMP-{template_name}")
}

/// Identifier of the first template whose display name equals
/// `qualified_name` exactly. Templates with an empty identifier never match.
pub fn select_template(templates: &[Value], qualified_name: &str) -> Option<String> {
    templates
        .iter()
        .find(|t| t.get("displayName").and_then(Value::as_str) == Some(qualified_name))
        .and_then(|t| t.get("uuid").and_then(Value::as_str))
        .filter(|uuid| !uuid.is_empty())
        .map(str::to_owned)
}

// ── Resolver ───────────────────────────────────────────────────────

/// Looks up datacenter and template identifiers for a request.
#[derive(Debug, Clone)]
pub struct ResourceResolver {
    transport: EngineTransport,
    target_address: String,
}

impl ResourceResolver {
    pub fn new(transport: EngineTransport, target_address: impl Into<String>) -> Self {
        Self {
            transport,
            target_address: target_address.into(),
        }
    }

    pub fn target_address(&self) -> &str {
        &self.target_address
    }

    /// Find the datacenter of the configured target serving `zone`.
    pub async fn resolve_datacenter(
        &self,
        session: &Session,
        zone: &str,
    ) -> DelegateResult<DatacenterUuid> {
        info!(target_address = %self.target_address, %zone, "searching for datacenter");

        let entities = self.fetch_collection(session, DATACENTER_SEARCH_PATH).await?;
        let datacenter = select_datacenter(&entities, &self.target_address, zone).ok_or_else(|| {
            DelegateError::resolution(
                ResolutionErrorKind::DatacenterNotFound,
                format!(
                    "region not found for target {}, zone {zone}",
                    self.target_address
                ),
            )
        })?;

        info!(datacenter = %datacenter, region = %datacenter.region, "datacenter resolved");
        Ok(datacenter)
    }

    /// Find the identifier of `template_name` in `region`.
    pub async fn resolve_template(
        &self,
        session: &Session,
        template_name: &str,
        region: &str,
    ) -> DelegateResult<String> {
        let qualified = qualified_template_name(&self.target_address, region, template_name);
        debug!(template = %qualified, "searching for template");

        let templates = self.fetch_collection(session, TEMPLATES_PATH).await?;
        let template_id = select_template(&templates, &qualified).ok_or_else(|| {
            DelegateError::resolution(
                ResolutionErrorKind::TemplateNotFound,
                format!("no template found for {qualified}"),
            )
        })?;

        info!(template = %qualified, %template_id, "template resolved");
        Ok(template_id)
    }

    /// Resolve both identifiers for a zone and template.
    pub async fn resolve(
        &self,
        session: &Session,
        zone: &str,
        template_name: &str,
    ) -> DelegateResult<ResolvedContext> {
        let datacenter = self.resolve_datacenter(session, zone).await?;
        let template_id = self
            .resolve_template(session, template_name, &datacenter.region)
            .await?;

        Ok(ResolvedContext {
            datacenter_id: datacenter.to_string(),
            region_id: datacenter.region,
            template_id,
        })
    }

    /// GET a collection. A body that is not a JSON array counts as empty.
    async fn fetch_collection(&self, session: &Session, path: &str) -> DelegateResult<Vec<Value>> {
        let response = self
            .transport
            .get_json(session, path)
            .await
            .map_err(resolution_failure)?;

        if !response.status.is_success() {
            let mut detail = format!("GET {} returned HTTP {}", self.transport.url(path), response.status);
            if let Some(message) = response.message() {
                detail.push_str(": ");
                detail.push_str(message);
            }
            return Err(DelegateError::resolution(ResolutionErrorKind::Transport, detail));
        }

        match response.body {
            Value::Array(items) => Ok(items),
            _ => {
                debug!(%path, "engine collection is not an array, treating as empty");
                Ok(Vec::new())
            }
        }
    }
}

fn resolution_failure(failure: TransportFailure) -> DelegateError {
    let kind = if failure.timed_out {
        warn!(detail = %failure.detail, "resolution request timed out");
        ResolutionErrorKind::Timeout
    } else {
        ResolutionErrorKind::Transport
    };
    DelegateError::resolution(kind, failure.detail)
}
