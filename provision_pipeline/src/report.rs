//! Per-request provisioning report — one tagged status per phase.
//!
//! The report is the only record of partial failure: every phase writes its
//! outcome here and the handler returns the whole map with HTTP 200, so the
//! caller sees exactly which phases succeeded.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Terminal status of one provisioning phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Created,
    Triggered,
    Deployed,
    RegistrationPending,
    CertificatesRequested,
    Added,
    Configured,
    Sent,
    Skipped,
    Deferred,
    Error,
    Failed,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::Created => "created",
            PhaseStatus::Triggered => "triggered",
            PhaseStatus::Deployed => "deployed",
            PhaseStatus::RegistrationPending => "registration_pending",
            PhaseStatus::CertificatesRequested => "certificates_requested",
            PhaseStatus::Added => "added",
            PhaseStatus::Configured => "configured",
            PhaseStatus::Sent => "sent",
            PhaseStatus::Skipped => "skipped",
            PhaseStatus::Deferred => "deferred",
            PhaseStatus::Error => "error",
            PhaseStatus::Failed => "failed",
        }
    }
}

/// One phase outcome: a status tag plus phase-specific fields.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub status: PhaseStatus,
    #[serde(flatten)]
    pub detail: serde_json::Map<String, Value>,
}

impl Notification {
    pub fn new(status: PhaseStatus) -> Self {
        Self {
            status,
            detail: serde_json::Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.detail.insert(key.to_string(), value.into());
        self
    }

    pub fn skipped(reason: &str) -> Self {
        Self::new(PhaseStatus::Skipped).with("reason", reason)
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::new(PhaseStatus::Error).with("error", message.to_string())
    }
}

/// A DNS record the tenant must (or the registrar will) configure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub value: String,
}

impl DnsRecord {
    pub fn new(record_type: &str, name: &str, value: impl Into<String>) -> Self {
        Self {
            record_type: record_type.to_string(),
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// The accumulated per-phase notification map for one request.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct ProvisionReport {
    notifications: BTreeMap<&'static str, Notification>,
}

impl ProvisionReport {
    /// Record a phase outcome. Later writes under the same key replace
    /// earlier ones.
    pub fn record(&mut self, key: &'static str, notification: Notification) {
        let status = notification.status.as_str();
        match notification.status {
            PhaseStatus::Error | PhaseStatus::Failed => {
                tracing::warn!(phase = key, status, "Provision phase did not complete");
            }
            _ => {
                tracing::info!(phase = key, status, "Provision phase recorded");
            }
        }
        crate::metrics::phase_recorded(key, status);
        self.notifications.insert(key, notification);
    }

    pub fn get(&self, key: &str) -> Option<&Notification> {
        self.notifications.get(key)
    }

    pub fn status(&self, key: &str) -> Option<PhaseStatus> {
        self.notifications.get(key).map(|n| n.status)
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}
