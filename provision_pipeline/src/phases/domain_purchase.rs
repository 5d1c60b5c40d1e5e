//! Phase 5 — optionally purchase the tenant's domain via Cloud Domains.

use async_trait::async_trait;

use crate::clients::google::GoogleClient;
use crate::context::ProvisionContext;
use crate::report::{Notification, PhaseStatus};
use crate::runner::Phase;

pub struct DomainPurchasePhase;

#[async_trait]
impl Phase for DomainPurchasePhase {
    fn key(&self) -> &'static str {
        "domain_purchase"
    }

    async fn run(&self, cx: &mut ProvisionContext) -> anyhow::Result<()> {
        // Every missing precondition gets its own skip reason so the caller
        // can tell which knob was absent.
        if !cx.req.purchase_domain {
            cx.report
                .record("domain_purchase", Notification::skipped("not requested"));
            return Ok(());
        }
        let Some(domain) = cx.req.domain.clone().filter(|d| !d.is_empty()) else {
            cx.report
                .record("domain_purchase", Notification::skipped("no domain supplied"));
            return Ok(());
        };
        let Some(price) = cx.req.domain_price_usd else {
            cx.report.record(
                "domain_purchase",
                Notification::skipped("no domain_price_usd supplied"),
            );
            return Ok(());
        };
        if cx.config.google_service_account_json.is_empty()
            || cx.config.google_cloud_project.is_empty()
        {
            cx.report.record(
                "domain_purchase",
                Notification::skipped("google cloud not configured"),
            );
            return Ok(());
        }

        let google = GoogleClient::from_config(&cx.config, cx.http.clone())?;
        let operation = google
            .register_domain(&cx.config.google_cloud_project, &domain, price)
            .await?;

        cx.report.record(
            "domain_purchase",
            Notification::new(PhaseStatus::RegistrationPending)
                .with("domain", domain.as_str())
                .with("operation", operation.as_str()),
        );
        cx.domain_operation = Some(operation);
        Ok(())
    }
}
