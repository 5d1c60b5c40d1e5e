//! Phase 2 — create Google Analytics / Tag Manager assets.
//!
//! The two sub-steps are independent and run concurrently; each records its
//! own notification so one failing never hides the other's result.

use async_trait::async_trait;

use crate::clients::google::GoogleClient;
use crate::context::ProvisionContext;
use crate::report::{Notification, PhaseStatus};
use crate::runner::Phase;

pub struct GoogleSetupPhase;

#[async_trait]
impl Phase for GoogleSetupPhase {
    fn key(&self) -> &'static str {
        "google_analytics"
    }

    async fn run(&self, cx: &mut ProvisionContext) -> anyhow::Result<()> {
        if !cx.req.setup_google_analytics && !cx.req.setup_google_tag_manager {
            cx.report
                .record("google_analytics", Notification::skipped("not requested"));
            cx.report
                .record("google_tag_manager", Notification::skipped("not requested"));
            return Ok(());
        }

        if cx.config.google_service_account_json.is_empty() {
            let skipped = Notification::skipped("google service account not configured");
            cx.report.record("google_analytics", skipped.clone());
            cx.report.record("google_tag_manager", skipped);
            return Ok(());
        }

        let google = match GoogleClient::from_config(&cx.config, cx.http.clone()) {
            Ok(g) => g,
            Err(e) => {
                cx.report.record("google_analytics", Notification::error(&e));
                cx.report
                    .record("google_tag_manager", Notification::error(&e));
                return Ok(());
            }
        };

        let (ga, gtm) = tokio::join!(
            create_analytics(&google, cx),
            create_tag_manager(&google, cx)
        );

        match ga {
            GaOutcome::Created { property, measurement_id } => {
                cx.report.record(
                    "google_analytics",
                    Notification::new(PhaseStatus::Created)
                        .with("property", property.as_str())
                        .with("measurement_id", measurement_id.as_str()),
                );
                cx.ga_property = Some(property);
                cx.ga_measurement_id = Some(measurement_id);
            }
            GaOutcome::Skipped(reason) => {
                cx.report
                    .record("google_analytics", Notification::skipped(reason));
            }
            GaOutcome::Failed(e) => {
                cx.report.record("google_analytics", Notification::error(e));
            }
        }

        match gtm {
            GtmOutcome::Created(container_id) => {
                cx.report.record(
                    "google_tag_manager",
                    Notification::new(PhaseStatus::Created)
                        .with("container_id", container_id.as_str()),
                );
                cx.gtm_container_id = Some(container_id);
            }
            GtmOutcome::Skipped(reason) => {
                cx.report
                    .record("google_tag_manager", Notification::skipped(reason));
            }
            GtmOutcome::Failed(e) => {
                cx.report.record("google_tag_manager", Notification::error(e));
            }
        }

        Ok(())
    }
}

enum GaOutcome {
    Created { property: String, measurement_id: String },
    Skipped(&'static str),
    Failed(anyhow::Error),
}

enum GtmOutcome {
    Created(String),
    Skipped(&'static str),
    Failed(anyhow::Error),
}

async fn create_analytics(google: &GoogleClient, cx: &ProvisionContext) -> GaOutcome {
    if !cx.req.setup_google_analytics {
        return GaOutcome::Skipped("not requested");
    }
    if cx.config.google_analytics_account.is_empty() {
        return GaOutcome::Skipped("GOOGLE_ANALYTICS_ACCOUNT not configured");
    }

    let result = async {
        let property = google
            .create_ga_property(&cx.config.google_analytics_account, &cx.req.display_name)
            .await?;
        let measurement_id = google
            .create_ga_web_stream(&property, &cx.site_url)
            .await?;
        anyhow::Ok((property, measurement_id))
    }
    .await;

    match result {
        Ok((property, measurement_id)) => GaOutcome::Created {
            property,
            measurement_id,
        },
        Err(e) => GaOutcome::Failed(e),
    }
}

async fn create_tag_manager(google: &GoogleClient, cx: &ProvisionContext) -> GtmOutcome {
    if !cx.req.setup_google_tag_manager {
        return GtmOutcome::Skipped("not requested");
    }
    if cx.config.gtm_account_id.is_empty() {
        return GtmOutcome::Skipped("GTM_ACCOUNT_ID not configured");
    }

    match google
        .create_gtm_container(&cx.config.gtm_account_id, &cx.req.display_name)
        .await
    {
        Ok(container_id) => GtmOutcome::Created(container_id),
        Err(e) => GtmOutcome::Failed(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvisionConfig;
    use crate::request::ProvisionRequest;

    fn context(config: ProvisionConfig, setup_ga: bool, setup_gtm: bool) -> ProvisionContext {
        let req = ProvisionRequest {
            username: "acme".to_string(),
            display_name: "Acme".to_string(),
            contact_email: "a@acme.test".to_string(),
            niche: Some("tools".to_string()),
            setup_google_analytics: setup_ga,
            setup_google_tag_manager: setup_gtm,
            ..Default::default()
        };
        ProvisionContext::new(req, config)
    }

    #[tokio::test]
    async fn skips_both_when_not_requested() {
        let mut cx = context(ProvisionConfig::default(), false, false);
        GoogleSetupPhase.run(&mut cx).await.unwrap();
        assert_eq!(
            cx.report.status("google_analytics"),
            Some(PhaseStatus::Skipped)
        );
        assert_eq!(
            cx.report.status("google_tag_manager"),
            Some(PhaseStatus::Skipped)
        );
    }

    #[tokio::test]
    async fn skips_when_no_service_account() {
        let mut cx = context(ProvisionConfig::default(), true, true);
        GoogleSetupPhase.run(&mut cx).await.unwrap();
        assert_eq!(
            cx.report.get("google_analytics").unwrap().detail["reason"],
            "google service account not configured"
        );
    }

    #[tokio::test]
    async fn bad_service_account_json_records_errors_not_failure() {
        let config = ProvisionConfig {
            google_service_account_json: "{not json".to_string(),
            google_analytics_account: "accounts/1".to_string(),
            ..Default::default()
        };
        let mut cx = context(config, true, true);
        // Phase itself succeeds; the errors live in the notifications.
        GoogleSetupPhase.run(&mut cx).await.unwrap();
        assert_eq!(
            cx.report.status("google_analytics"),
            Some(PhaseStatus::Error)
        );
        assert_eq!(
            cx.report.status("google_tag_manager"),
            Some(PhaseStatus::Error)
        );
        assert!(cx.ga_measurement_id.is_none());
    }
}
