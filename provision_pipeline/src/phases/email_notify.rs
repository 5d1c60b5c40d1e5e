//! Phase 9 — email the tenant the DNS records they must configure.

use async_trait::async_trait;

use crate::clients::resend::ResendClient;
use crate::context::ProvisionContext;
use crate::report::{DnsRecord, Notification, PhaseStatus};
use crate::runner::Phase;

pub struct EmailNotifyPhase;

#[async_trait]
impl Phase for EmailNotifyPhase {
    fn key(&self) -> &'static str {
        "email"
    }

    async fn run(&self, cx: &mut ProvisionContext) -> anyhow::Result<()> {
        if cx.dns_records.is_empty() {
            cx.report
                .record("email", Notification::skipped("no DNS records to send"));
            return Ok(());
        }
        if cx.config.resend_api_key.is_empty() {
            cx.report
                .record("email", Notification::skipped("RESEND_API_KEY not configured"));
            return Ok(());
        }

        let html = render_dns_email(&cx.req.display_name, &cx.site_url, &cx.dns_records);
        let subject = format!("DNS setup for {}", cx.req.display_name);
        let client = ResendClient::new(&cx.config, cx.http.clone());

        match client.send_html(&cx.req.contact_email, &subject, &html).await {
            Ok(message_id) => {
                cx.report.record(
                    "email",
                    Notification::new(PhaseStatus::Sent)
                        .with("to", cx.req.contact_email.as_str())
                        .with("message_id", message_id),
                );
            }
            Err(e) => {
                cx.report.record(
                    "email",
                    Notification::new(PhaseStatus::Failed).with("error", format!("{e:#}")),
                );
            }
        }
        Ok(())
    }
}

/// Render the notification email: one table row per DNS record, in the order
/// the records were accumulated.
pub fn render_dns_email(display_name: &str, site_url: &str, records: &[DnsRecord]) -> String {
    let mut rows = String::new();
    for record in records {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            record.record_type, record.name, record.value
        ));
    }

    format!(
        "<html><body>\
         <p>Your site <strong>{display_name}</strong> is being set up at \
         <a href=\"{site_url}\">{site_url}</a>.</p>\
         <p>Add the following DNS records at your domain registrar:</p>\
         <table border=\"1\" cellpadding=\"6\">\
         <tr><th>Type</th><th>Name</th><th>Value</th></tr>\n{rows}</table>\
         <p>Once the records propagate, visit \
         <a href=\"{site_url}/api/verify-dns\">{site_url}/api/verify-dns</a> \
         to confirm.</p>\
         </body></html>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvisionConfig;
    use crate::request::ProvisionRequest;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn records() -> Vec<DnsRecord> {
        vec![
            DnsRecord::new("CNAME", "www", "acme-blog.fly.dev"),
            DnsRecord::new("A", "@", "66.0.0.1"),
            DnsRecord::new("AAAA", "@", "2a09::1"),
            DnsRecord::new("TXT", "@", "google-site-verification=tok"),
        ]
    }

    #[test]
    fn renders_one_row_per_record_in_order() {
        let html = render_dns_email("Acme", "https://www.acme.com", &records());

        let positions: Vec<usize> = [
            "<tr><td>CNAME</td><td>www</td><td>acme-blog.fly.dev</td></tr>",
            "<tr><td>A</td><td>@</td><td>66.0.0.1</td></tr>",
            "<tr><td>AAAA</td><td>@</td><td>2a09::1</td></tr>",
            "<tr><td>TXT</td><td>@</td><td>google-site-verification=tok</td></tr>",
        ]
        .iter()
        .map(|row| html.find(row).expect("row missing"))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]), "rows out of order");
        assert_eq!(html.matches("<tr><td>").count(), 4);
    }

    fn context(server: Option<&MockServer>) -> ProvisionContext {
        let config = ProvisionConfig {
            resend_api_key: server.map(|_| "re-key".to_string()).unwrap_or_default(),
            resend_base: server.map(|s| s.uri()).unwrap_or_default(),
            ..Default::default()
        };
        let req = ProvisionRequest {
            username: "acme".to_string(),
            display_name: "Acme".to_string(),
            contact_email: "owner@acme.test".to_string(),
            niche: Some("tools".to_string()),
            ..Default::default()
        };
        ProvisionContext::new(req, config)
    }

    #[tokio::test]
    async fn sends_exactly_once_when_records_exist() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "email-123"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut cx = context(Some(&server));
        cx.dns_records = records();
        EmailNotifyPhase.run(&mut cx).await.unwrap();

        let n = cx.report.get("email").unwrap();
        assert_eq!(n.status, PhaseStatus::Sent);
        assert_eq!(n.detail["message_id"], "email-123");
    }

    #[tokio::test]
    async fn skipped_without_records() {
        let mut cx = context(None);
        EmailNotifyPhase.run(&mut cx).await.unwrap();
        assert_eq!(
            cx.report.get("email").unwrap().detail["reason"],
            "no DNS records to send"
        );
    }

    #[tokio::test]
    async fn provider_rejection_is_failed_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad from"))
            .mount(&server)
            .await;

        let mut cx = context(Some(&server));
        cx.dns_records = records();
        EmailNotifyPhase.run(&mut cx).await.unwrap();
        assert_eq!(cx.report.status("email"), Some(PhaseStatus::Failed));
    }
}
