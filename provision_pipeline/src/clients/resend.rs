//! Resend transactional email client.

use anyhow::Context;
use serde_json::{json, Value};

use crate::config::ProvisionConfig;

#[derive(Clone)]
pub struct ResendClient {
    http: reqwest::Client,
    base: String,
    api_key: String,
    from: String,
}

impl ResendClient {
    pub fn new(config: &ProvisionConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            base: config.resend_base.trim_end_matches('/').to_string(),
            api_key: config.resend_api_key.clone(),
            from: config.resend_from_email.clone(),
        }
    }

    /// Send one HTML email. Returns the provider message id.
    pub async fn send_html(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> anyhow::Result<String> {
        let url = format!("{}/emails", self.base);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .context("send email")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("email send failed: {status} {body}");
        }

        let body: Value = resp.json().await.context("decode email response")?;
        Ok(body["id"].as_str().unwrap_or_default().to_string())
    }
}
