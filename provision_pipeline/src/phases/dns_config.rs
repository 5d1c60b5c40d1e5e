//! Phase 8 — push DNS records to the registrar for a freshly purchased
//! domain.
//!
//! A failure here is `deferred`, not `error`: the registration is usually
//! still pending, and the user gets the same records by email anyway.

use async_trait::async_trait;

use crate::clients::google::GoogleClient;
use crate::context::ProvisionContext;
use crate::report::{Notification, PhaseStatus};
use crate::runner::Phase;

pub struct DnsConfigPhase;

#[async_trait]
impl Phase for DnsConfigPhase {
    fn key(&self) -> &'static str {
        "dns_auto_config"
    }

    async fn run(&self, cx: &mut ProvisionContext) -> anyhow::Result<()> {
        if cx.domain_operation.is_none() {
            cx.report.record(
                "dns_auto_config",
                Notification::skipped("no pending domain registration"),
            );
            return Ok(());
        }
        let Some(domain) = cx.req.domain.clone().filter(|d| !d.is_empty()) else {
            cx.report
                .record("dns_auto_config", Notification::skipped("no domain supplied"));
            return Ok(());
        };
        if cx.fly.is_none() {
            cx.report.record(
                "dns_auto_config",
                Notification::skipped("no fly addresses to point at"),
            );
            return Ok(());
        }

        let records = cx.dns_records.clone();
        let google = GoogleClient::from_config(&cx.config, cx.http.clone())?;
        match google
            .configure_dns(&cx.config.google_cloud_project, &domain, &records)
            .await
        {
            Ok(()) => {
                cx.report.record(
                    "dns_auto_config",
                    Notification::new(PhaseStatus::Configured)
                        .with("records", records.len()),
                );
            }
            Err(e) => {
                // Newly purchased domains often are not active yet.
                cx.report.record(
                    "dns_auto_config",
                    Notification::new(PhaseStatus::Deferred).with("error", format!("{e:#}")),
                );
            }
        }
        Ok(())
    }
}
