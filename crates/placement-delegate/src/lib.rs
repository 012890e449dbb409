//! placement-delegate: hands host selection to an external placement engine.
//!
//! Instead of filtering and weighing hosts locally, the delegate forwards a
//! placement request (template, count, zone, affinity groups) to the engine
//! over HTTP and turns the engine's decision into destinations drawn from
//! the live host inventory.
//!
//! # Architecture
//!
//! ```text
//! SchedulerOrchestrator
//!   ├── SessionManager    (POST /login → JSESSIONID)
//!   ├── ResourceResolver  (GET /search?types=DataCenter, GET /templates)
//!   ├── build_reservation (pure payload construction)
//!   ├── PlacementClient   (POST /reservations, response walk)
//!   └── HostInventory     (join selected hosts → destinations)
//! ```
//!
//! Every engine call is a single attempt bounded by the configured timeout.

pub mod client;
pub mod config;
pub mod error;
pub mod inventory;
pub mod notify;
pub mod orchestrator;
pub mod reservation;
pub mod resolver;
pub mod session;
pub mod transport;
pub mod types;

pub use client::{PlacementClient, parse_placement_response};
pub use config::{DelegateConfig, EngineConfig};
pub use error::{AuthErrorKind, DelegateError, DelegateResult, PlacementErrorKind, ResolutionErrorKind};
pub use inventory::{HostInventory, HostRecord, StaticInventory, join_destinations};
pub use notify::{DecisionEvent, DecisionNotifier, DecisionOutcome, NoopNotifier, TracingNotifier};
pub use orchestrator::SchedulerOrchestrator;
pub use reservation::{ReservationPayload, build_reservation};
pub use resolver::{DatacenterUuid, ResourceResolver};
pub use session::{Session, SessionManager};
pub use transport::EngineTransport;
pub use types::{
    Destination, PlacementRequest, PlacementResult, PlacementStatus, RequestContext, ResolvedContext,
};
