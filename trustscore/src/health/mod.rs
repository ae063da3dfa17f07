//! Dependency health monitoring.
//!
//! ## Architecture
//!
//! ```text
//! HealthMonitor (timer task, cancellable)
//!   └─ HealthRegistry::run_probe_cycle
//!        ├─ DependencyProbe ─┐
//!        ├─ DependencyProbe ─┼─ concurrent, each bounded by probe_timeout
//!        └─ DependencyProbe ─┘
//!   └─ HealthRegistry::snapshot → healthy / degraded / down
//! ```
//!
//! A probe failure only ever marks its own dependency as `error`; nothing in
//! this module returns an error from a probe cycle.

mod monitor;
mod probe;
mod registry;
mod tcp;

pub use monitor::HealthMonitor;
pub use probe::{DependencyProbe, HealthCheck, ProbeOutcome};
pub use registry::{Dependency, DependencyStatus, HealthRegistry, HealthSnapshot, HealthStatus};
pub use tcp::TcpCheck;
