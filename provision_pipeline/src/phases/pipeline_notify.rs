//! Phase 3 — hand the tenant to the Doubleclicker content pipeline.

use async_trait::async_trait;
use serde_json::json;

use crate::clients::doubleclicker::DoubleclickerClient;
use crate::context::ProvisionContext;
use crate::report::{Notification, PhaseStatus};
use crate::runner::Phase;

pub struct PipelineNotifyPhase;

#[async_trait]
impl Phase for PipelineNotifyPhase {
    fn key(&self) -> &'static str {
        "doubleclicker"
    }

    async fn run(&self, cx: &mut ProvisionContext) -> anyhow::Result<()> {
        if cx.req.skip_pipeline {
            cx.report
                .record("doubleclicker", Notification::skipped("skip_pipeline set"));
            return Ok(());
        }
        if cx.config.doubleclicker_api_url.is_empty() {
            cx.report.record(
                "doubleclicker",
                Notification::skipped("DOUBLECLICKER_API_URL not configured"),
            );
            return Ok(());
        }

        // The first approved product becomes the primary; the rest feed the
        // knowledge-base scraper.
        let mut products = cx.req.approved_products.iter();
        let primary_product_url = products.next().cloned();
        let additional_urls: Vec<String> = products.cloned().collect();

        let payload = json!({
            "username": &cx.req.username,
            "display_name": &cx.req.display_name,
            "contact_email": &cx.req.contact_email,
            "website_url": &cx.req.website_url,
            "niche": &cx.req.niche,
            "keywords": &cx.req.keywords,
            "primary_product_url": primary_product_url,
            "additional_urls": additional_urls,
        });

        let client = DoubleclickerClient::new(&cx.config, cx.http.clone());
        match client.auto_onboard(&payload).await {
            Ok(resp) if (200..300).contains(&resp.status) => {
                cx.report.record(
                    "doubleclicker",
                    Notification::new(PhaseStatus::Triggered)
                        .with("response_status", resp.status)
                        .with("response", resp.body),
                );
            }
            Ok(resp) => {
                cx.report.record(
                    "doubleclicker",
                    Notification::new(PhaseStatus::Failed)
                        .with("response_status", resp.status)
                        .with("response", resp.body),
                );
            }
            Err(e) => {
                cx.report.record("doubleclicker", Notification::error(&e));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvisionConfig;
    use crate::request::ProvisionRequest;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context(base: &str) -> ProvisionContext {
        let config = ProvisionConfig {
            provision_secret: "shared-secret".to_string(),
            doubleclicker_api_url: base.to_string(),
            ..Default::default()
        };
        let req = ProvisionRequest {
            username: "acme".to_string(),
            display_name: "Acme".to_string(),
            contact_email: "a@acme.test".to_string(),
            niche: Some("tools".to_string()),
            approved_products: vec![
                "https://shop.acme.test/saw".to_string(),
                "https://shop.acme.test/drill".to_string(),
                "https://shop.acme.test/lathe".to_string(),
            ],
            ..Default::default()
        };
        ProvisionContext::new(req, config)
    }

    #[tokio::test]
    async fn promotes_first_product_to_primary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/strategy/auto-onboard"))
            .and(header("Authorization", "Bearer shared-secret"))
            .and(body_partial_json(serde_json::json!({
                "primary_product_url": "https://shop.acme.test/saw",
                "additional_urls": [
                    "https://shop.acme.test/drill",
                    "https://shop.acme.test/lathe"
                ],
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"queued": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut cx = context(&server.uri());
        PipelineNotifyPhase.run(&mut cx).await.unwrap();
        let n = cx.report.get("doubleclicker").unwrap();
        assert_eq!(n.status, PhaseStatus::Triggered);
        assert_eq!(n.detail["response_status"], 200);
    }

    #[tokio::test]
    async fn non_2xx_is_recorded_as_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/strategy/auto-onboard"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({"error": "niche unsupported"})),
            )
            .mount(&server)
            .await;

        let mut cx = context(&server.uri());
        PipelineNotifyPhase.run(&mut cx).await.unwrap();
        let n = cx.report.get("doubleclicker").unwrap();
        assert_eq!(n.status, PhaseStatus::Failed);
        assert_eq!(n.detail["response_status"], 422);
        assert_eq!(n.detail["response"]["error"], "niche unsupported");
    }

    #[tokio::test]
    async fn skip_pipeline_makes_no_call() {
        let mut cx = context("http://127.0.0.1:9");
        cx.req.skip_pipeline = true;
        PipelineNotifyPhase.run(&mut cx).await.unwrap();
        assert_eq!(cx.report.status("doubleclicker"), Some(PhaseStatus::Skipped));
    }

    #[tokio::test]
    async fn transport_error_is_recorded_as_error() {
        // Nothing listens on this port.
        let mut cx = context("http://127.0.0.1:9");
        PipelineNotifyPhase.run(&mut cx).await.unwrap();
        assert_eq!(cx.report.status("doubleclicker"), Some(PhaseStatus::Error));
    }
}
