//! Sequential phase runner.
//!
//! Phases run in a fixed order. Each phase's error is caught at the phase
//! boundary and recorded under its key; a failure never stops later phases
//! unless the phase is fatal (only the brand seed is).

use std::time::Instant;

use async_trait::async_trait;

use crate::context::ProvisionContext;
use crate::report::Notification;

/// One discrete external-service interaction step.
#[async_trait]
pub trait Phase: Send + Sync {
    /// Notification key this phase reports under.
    fn key(&self) -> &'static str;

    /// A fatal phase aborts the whole run on error (surfaced as HTTP 500).
    fn fatal(&self) -> bool {
        false
    }

    /// Execute against the shared context. Phases record their own
    /// notifications; a returned error is recorded by the runner.
    async fn run(&self, cx: &mut ProvisionContext) -> anyhow::Result<()>;
}

/// A fatal phase failed; the pipeline was aborted.
#[derive(Debug, thiserror::Error)]
#[error("fatal provisioning phase '{phase}' failed: {source}")]
pub struct FatalPhaseError {
    pub phase: &'static str,
    #[source]
    pub source: anyhow::Error,
}

/// Run every phase in order, merging outcomes into the context's report.
pub async fn run_phases(
    phases: &[Box<dyn Phase>],
    cx: &mut ProvisionContext,
) -> Result<(), FatalPhaseError> {
    let pipeline_start = Instant::now();

    for phase in phases {
        let key = phase.key();
        let start = Instant::now();

        tracing::info!(phase = key, username = %cx.req.username, "Running phase");

        let result = phase.run(cx).await;
        crate::metrics::phase_duration(key, start.elapsed().as_millis() as u64);

        if let Err(e) = result {
            if phase.fatal() {
                tracing::error!(phase = key, error = %e, "Fatal phase failed, aborting");
                crate::metrics::phase_recorded(key, "fatal");
                return Err(FatalPhaseError {
                    phase: key,
                    source: e,
                });
            }
            cx.report.record(key, Notification::error(&e));
        }
    }

    crate::metrics::pipeline_duration(pipeline_start.elapsed().as_millis() as u64);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvisionConfig;
    use crate::report::{Notification, PhaseStatus};
    use crate::request::ProvisionRequest;

    struct Ok1;
    struct Boom {
        fatal: bool,
    }
    struct After;

    #[async_trait]
    impl Phase for Ok1 {
        fn key(&self) -> &'static str {
            "first"
        }
        async fn run(&self, cx: &mut ProvisionContext) -> anyhow::Result<()> {
            cx.report
                .record("first", Notification::new(PhaseStatus::Created));
            Ok(())
        }
    }

    #[async_trait]
    impl Phase for Boom {
        fn key(&self) -> &'static str {
            "boom"
        }
        fn fatal(&self) -> bool {
            self.fatal
        }
        async fn run(&self, _cx: &mut ProvisionContext) -> anyhow::Result<()> {
            anyhow::bail!("upstream exploded")
        }
    }

    #[async_trait]
    impl Phase for After {
        fn key(&self) -> &'static str {
            "after"
        }
        async fn run(&self, cx: &mut ProvisionContext) -> anyhow::Result<()> {
            cx.report
                .record("after", Notification::new(PhaseStatus::Sent));
            Ok(())
        }
    }

    fn context() -> ProvisionContext {
        let req = ProvisionRequest {
            username: "acme".to_string(),
            display_name: "Acme".to_string(),
            contact_email: "a@b.c".to_string(),
            niche: Some("tools".to_string()),
            ..Default::default()
        };
        ProvisionContext::new(req, ProvisionConfig::default())
    }

    #[tokio::test]
    async fn failure_does_not_stop_later_phases() {
        let phases: Vec<Box<dyn Phase>> =
            vec![Box::new(Ok1), Box::new(Boom { fatal: false }), Box::new(After)];
        let mut cx = context();

        run_phases(&phases, &mut cx).await.unwrap();

        assert_eq!(cx.report.status("first"), Some(PhaseStatus::Created));
        assert_eq!(cx.report.status("boom"), Some(PhaseStatus::Error));
        assert_eq!(cx.report.status("after"), Some(PhaseStatus::Sent));
        assert_eq!(
            cx.report.get("boom").unwrap().detail["error"],
            "upstream exploded"
        );
    }

    #[tokio::test]
    async fn fatal_failure_aborts_run() {
        let phases: Vec<Box<dyn Phase>> =
            vec![Box::new(Boom { fatal: true }), Box::new(After)];
        let mut cx = context();

        let err = run_phases(&phases, &mut cx).await.unwrap_err();
        assert_eq!(err.phase, "boom");
        assert_eq!(cx.report.status("after"), None);
    }
}
