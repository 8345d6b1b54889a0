//! Boom Infrastructure Library
//!
//! Shared infrastructure used by the API binary:
//! - Middleware (request ID)
//! - Telemetry initialization
//! - Reconciliation of orphaned remote assets

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "reconcile")]
pub mod reconcile;

#[cfg(feature = "middleware")]
pub use middleware::{get_request_id, request_id_middleware, RequestId};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

#[cfg(feature = "reconcile")]
pub use reconcile::{ReconciliationService, SweepReport};
