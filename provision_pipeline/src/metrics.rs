//! Prometheus metrics for the provisioning service.

use metrics::{counter, histogram};

/// Record a provision request outcome (accepted / rejected / fatal).
pub fn request_finished(outcome: &str) {
    counter!("provision_requests_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a phase reaching a terminal status.
pub fn phase_recorded(phase: &str, status: &str) {
    counter!(
        "provision_phases_total",
        "phase" => phase.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record phase duration.
pub fn phase_duration(phase: &str, duration_ms: u64) {
    histogram!("provision_phase_duration_ms", "phase" => phase.to_string())
        .record(duration_ms as f64);
}

/// Record whole-pipeline duration.
pub fn pipeline_duration(duration_ms: u64) {
    histogram!("provision_duration_ms").record(duration_ms as f64);
}
