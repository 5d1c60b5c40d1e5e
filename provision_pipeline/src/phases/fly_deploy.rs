//! Phase 4 — deploy the tenant's Fly app.
//!
//! Image lookup, app creation, secrets, IP allocation, machine creation as
//! one sub-sequence with a single catch. No rollback of already-created
//! resources on failure; the error notification names the app so an operator
//! can reap orphans.

use async_trait::async_trait;
use serde_json::json;

use crate::clients::fly::FlyClient;
use crate::context::{FlyDeployment, ProvisionContext};
use crate::report::{Notification, PhaseStatus};
use crate::runner::Phase;

pub struct FlyDeployPhase;

#[async_trait]
impl Phase for FlyDeployPhase {
    fn key(&self) -> &'static str {
        "fly"
    }

    async fn run(&self, cx: &mut ProvisionContext) -> anyhow::Result<()> {
        if cx.req.skip_deploy {
            cx.report
                .record("fly", Notification::skipped("skip_deploy set"));
            return Ok(());
        }
        if cx.config.fly_api_token.is_empty() || cx.config.fly_base_app.is_empty() {
            cx.report
                .record("fly", Notification::skipped("fly not configured"));
            return Ok(());
        }

        let app_name = cx.req.fly_app_name();
        match deploy(cx, &app_name).await {
            Ok(deployment) => {
                cx.report.record(
                    "fly",
                    Notification::new(PhaseStatus::Deployed)
                        .with("app", deployment.app.as_str())
                        .with("image", deployment.image.as_str())
                        .with("ipv4", deployment.ipv4.as_str())
                        .with("ipv6", deployment.ipv6.as_str())
                        .with("machine_id", deployment.machine_id.as_str()),
                );
                cx.fly = Some(deployment);
            }
            Err(e) => {
                tracing::warn!(app = %app_name, error = %e, "Fly deployment failed");
                cx.report.record(
                    "fly",
                    Notification::error(format!("{e:#}")).with("app", app_name.as_str()),
                );
            }
        }

        Ok(())
    }
}

async fn deploy(cx: &ProvisionContext, app_name: &str) -> anyhow::Result<FlyDeployment> {
    let fly = FlyClient::new(&cx.config, cx.http.clone());

    let image = fly.base_image(&cx.config.fly_base_app).await?;
    fly.create_app(app_name).await?;

    fly.set_secrets(
        app_name,
        &[
            ("SUPABASE_URL", cx.config.supabase_url.as_str()),
            ("SUPABASE_ANON_KEY", cx.config.supabase_anon_key.as_str()),
            (
                "SUPABASE_SERVICE_ROLE_KEY",
                cx.config.supabase_service_role_key.as_str(),
            ),
            ("RESEND_API_KEY", cx.config.resend_api_key.as_str()),
        ],
    )
    .await?;

    let ipv4 = fly.allocate_ip(app_name, "v4").await?;
    let ipv6 = fly.allocate_ip(app_name, "v6").await?;

    // Public env for the tenant Next.js app; GA/GTM ids only when phase 2
    // produced them.
    let mut env = json!({
        "SITE_URL": &cx.site_url,
        "SITE_NAME": &cx.req.display_name,
        "CONTACT_EMAIL": &cx.req.contact_email,
    });
    if let Some(id) = &cx.ga_measurement_id {
        env["NEXT_PUBLIC_GA_MEASUREMENT_ID"] = json!(id);
    }
    if let Some(id) = &cx.gtm_container_id {
        env["NEXT_PUBLIC_GTM_ID"] = json!(id);
    }

    let machine_id = fly.create_machine(app_name, &image, &env).await?;

    Ok(FlyDeployment {
        app: app_name.to_string(),
        image,
        ipv4,
        ipv6,
        machine_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvisionConfig;
    use crate::request::ProvisionRequest;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context(server: Option<&MockServer>) -> ProvisionContext {
        let (api_base, graphql_base) = match server {
            Some(s) => (s.uri(), format!("{}/graphql", s.uri())),
            None => (String::new(), String::new()),
        };
        let config = ProvisionConfig {
            fly_api_token: "fly-token".to_string(),
            fly_base_app: "base-blog".to_string(),
            supabase_url: "https://proj.supabase.co".to_string(),
            supabase_service_role_key: "svc".to_string(),
            supabase_anon_key: "anon".to_string(),
            fly_api_base: api_base,
            fly_graphql_base: graphql_base,
            ..Default::default()
        };
        let req = ProvisionRequest {
            username: "acme".to_string(),
            display_name: "Acme".to_string(),
            contact_email: "a@acme.test".to_string(),
            niche: Some("tools".to_string()),
            ..Default::default()
        };
        ProvisionContext::new(req, config)
    }

    async fn mount_happy_path(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/apps/base-blog/machines"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "config": { "image": "registry.fly.io/base:v1" } }
            ])))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/apps"))
            .respond_with(ResponseTemplate::new(201))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "setSecrets": { "release": { "id": "r1" } },
                    "allocateIpAddress": { "ipAddress": { "address": "66.0.0.1" } }
                }
            })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/apps/acme-blog/machines"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": "mach-1" })),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn deploys_and_records_addresses() {
        let server = MockServer::start().await;
        mount_happy_path(&server).await;

        let mut cx = context(Some(&server));
        FlyDeployPhase.run(&mut cx).await.unwrap();

        let n = cx.report.get("fly").unwrap();
        assert_eq!(n.status, PhaseStatus::Deployed);
        assert_eq!(n.detail["app"], "acme-blog");
        assert_eq!(n.detail["machine_id"], "mach-1");
        assert!(cx.fly_deployed());
    }

    #[tokio::test]
    async fn machine_env_carries_ga_ids_when_present() {
        let server = MockServer::start().await;
        mount_happy_path(&server).await;
        Mock::given(method("POST"))
            .and(path("/apps/acme-blog/machines"))
            .and(body_partial_json(json!({
                "config": { "env": {
                    "NEXT_PUBLIC_GA_MEASUREMENT_ID": "G-TEST1",
                    "NEXT_PUBLIC_GTM_ID": "GTM-TEST1"
                } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "mach-2" })))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;

        let mut cx = context(Some(&server));
        cx.ga_measurement_id = Some("G-TEST1".to_string());
        cx.gtm_container_id = Some("GTM-TEST1".to_string());
        FlyDeployPhase.run(&mut cx).await.unwrap();
        assert_eq!(cx.report.status("fly"), Some(PhaseStatus::Deployed));
    }

    #[tokio::test]
    async fn skip_deploy_short_circuits() {
        let mut cx = context(None);
        cx.req.skip_deploy = true;
        FlyDeployPhase.run(&mut cx).await.unwrap();
        assert_eq!(cx.report.status("fly"), Some(PhaseStatus::Skipped));
        assert!(!cx.fly_deployed());
    }

    #[tokio::test]
    async fn mid_sequence_failure_records_error_with_app_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apps/base-blog/machines"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "config": { "image": "registry.fly.io/base:v1" } }
            ])))
            .mount(&server)
            .await;
        // App creation succeeds, then secrets fail: orphaned app.
        Mock::given(method("POST"))
            .and(path("/apps"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut cx = context(Some(&server));
        FlyDeployPhase.run(&mut cx).await.unwrap();

        let n = cx.report.get("fly").unwrap();
        assert_eq!(n.status, PhaseStatus::Error);
        assert_eq!(n.detail["app"], "acme-blog");
        assert!(!cx.fly_deployed());
    }
}
