//! Tenant site provisioning pipeline.
//!
//! A fixed ordered sequence of phases runs against external services
//! (Supabase, Fly.io, Google, the Doubleclicker content pipeline, Resend),
//! each phase catching its own failures into a per-request report that the
//! HTTP layer always returns to the caller.

pub mod audit;
pub mod clients;
pub mod config;
pub mod context;
pub mod metrics;
pub mod phases;
pub mod report;
pub mod request;
pub mod runner;

pub use config::ProvisionConfig;
pub use context::ProvisionContext;
pub use report::{DnsRecord, Notification, PhaseStatus, ProvisionReport};
pub use request::{ProvisionRequest, ValidationError};
pub use runner::{run_phases, FatalPhaseError, Phase};
