//! Phase 7 — register the site in Search Console and queue its DNS TXT
//! verification record.

use async_trait::async_trait;

use crate::clients::google::GoogleClient;
use crate::context::ProvisionContext;
use crate::report::{DnsRecord, Notification, PhaseStatus};
use crate::runner::Phase;

pub struct SearchConsolePhase;

#[async_trait]
impl Phase for SearchConsolePhase {
    fn key(&self) -> &'static str {
        "search_console"
    }

    async fn run(&self, cx: &mut ProvisionContext) -> anyhow::Result<()> {
        if !cx.req.setup_search_console {
            cx.report
                .record("search_console", Notification::skipped("not requested"));
            return Ok(());
        }
        if cx.config.google_service_account_json.is_empty() {
            cx.report.record(
                "search_console",
                Notification::skipped("google service account not configured"),
            );
            return Ok(());
        }

        let google = GoogleClient::from_config(&cx.config, cx.http.clone())?;
        let token = google.site_verification_token(&cx.site_url).await?;
        google.add_search_console_site(&cx.site_url).await?;

        cx.dns_records
            .push(DnsRecord::new("TXT", "@", token.clone()));
        cx.report.record(
            "search_console",
            Notification::new(PhaseStatus::Added)
                .with("site_url", cx.site_url.as_str())
                .with("verification_token", token),
        );
        Ok(())
    }
}
