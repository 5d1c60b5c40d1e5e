//! Doubleclicker client — hands a freshly provisioned tenant to the content
//! pipeline for keyword/content generation.

use anyhow::Context;
use serde_json::Value;

use crate::config::ProvisionConfig;

/// Outcome of the auto-onboard call. Status and body are reported to the
/// caller whether or not the upstream accepted the request.
pub struct OnboardResponse {
    pub status: u16,
    pub body: Value,
}

#[derive(Clone)]
pub struct DoubleclickerClient {
    http: reqwest::Client,
    base: String,
    secret: String,
}

impl DoubleclickerClient {
    /// Authenticates with the shared provisioning secret.
    pub fn new(config: &ProvisionConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            base: config.doubleclicker_api_url.trim_end_matches('/').to_string(),
            secret: config.provision_secret.clone(),
        }
    }

    pub async fn auto_onboard(&self, payload: &Value) -> anyhow::Result<OnboardResponse> {
        let url = format!("{}/api/strategy/auto-onboard", self.base);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.secret))
            .json(payload)
            .send()
            .await
            .context("doubleclicker auto-onboard")?;

        let status = resp.status().as_u16();
        let body = resp.json().await.unwrap_or(Value::Null);
        Ok(OnboardResponse { status, body })
    }
}
