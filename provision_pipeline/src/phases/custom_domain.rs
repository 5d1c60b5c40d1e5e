//! Phase 6 — TLS certificates and the DNS records the user must create.
//!
//! Only runs once the Fly phase reported a live deployment; the certificate
//! hostnames and DNS targets all hang off that app.

use async_trait::async_trait;

use crate::clients::fly::FlyClient;
use crate::context::ProvisionContext;
use crate::report::{DnsRecord, Notification, PhaseStatus};
use crate::runner::Phase;

pub struct CustomDomainPhase;

#[async_trait]
impl Phase for CustomDomainPhase {
    fn key(&self) -> &'static str {
        "domain"
    }

    async fn run(&self, cx: &mut ProvisionContext) -> anyhow::Result<()> {
        let Some(domain) = cx.req.domain.clone().filter(|d| !d.is_empty()) else {
            cx.report
                .record("domain", Notification::skipped("no domain supplied"));
            return Ok(());
        };
        let Some(fly) = cx.fly.clone() else {
            cx.report
                .record("domain", Notification::skipped("fly app not deployed"));
            return Ok(());
        };

        let client = FlyClient::new(&cx.config, cx.http.clone());
        client.add_certificate(&fly.app, &domain).await?;
        client
            .add_certificate(&fly.app, &format!("www.{domain}"))
            .await?;

        // Accumulation order matters: the notification email renders rows in
        // exactly this order.
        cx.dns_records
            .push(DnsRecord::new("CNAME", "www", format!("{}.fly.dev", fly.app)));
        cx.dns_records.push(DnsRecord::new("A", "@", fly.ipv4));
        cx.dns_records.push(DnsRecord::new("AAAA", "@", fly.ipv6));

        cx.report.record(
            "domain",
            Notification::new(PhaseStatus::CertificatesRequested)
                .with("hostnames", vec![domain.clone(), format!("www.{domain}")]),
        );
        Ok(())
    }
}
