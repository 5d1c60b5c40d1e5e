//! Fly.io control-plane client.
//!
//! App and machine operations go through the Machines REST API; secrets, IP
//! allocation, and certificates go through the GraphQL API, the same split
//! flyctl uses.

use anyhow::Context;
use serde_json::{json, Value};

use crate::config::ProvisionConfig;

#[derive(Clone)]
pub struct FlyClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
    graphql_base: String,
    org_slug: String,
}

impl FlyClient {
    pub fn new(config: &ProvisionConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            token: config.fly_api_token.clone(),
            api_base: config.fly_api_base.trim_end_matches('/').to_string(),
            graphql_base: config.fly_graphql_base.clone(),
            org_slug: config.fly_org_slug.clone(),
        }
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("Authorization", format!("Bearer {}", self.token))
    }

    /// Resolve the Docker image the base app's first machine runs. New tenant
    /// machines are created from the same image.
    pub async fn base_image(&self, base_app: &str) -> anyhow::Result<String> {
        let url = format!("{}/apps/{}/machines", self.api_base, base_app);
        let resp = self
            .authed(self.http.get(&url))
            .send()
            .await
            .context("list base app machines")?;

        if !resp.status().is_success() {
            anyhow::bail!("listing machines for {base_app} failed: {}", resp.status());
        }

        let machines: Vec<Value> = resp.json().await.context("decode machine list")?;
        machines
            .first()
            .and_then(|m| m["config"]["image"].as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("base app {base_app} has no machines to copy"))
    }

    /// Create a new app under the configured organization.
    pub async fn create_app(&self, app_name: &str) -> anyhow::Result<()> {
        let url = format!("{}/apps", self.api_base);
        let resp = self
            .authed(self.http.post(&url))
            .json(&json!({ "app_name": app_name, "org_slug": self.org_slug }))
            .send()
            .await
            .context("create app")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("creating app {app_name} failed: {status} {body}");
        }
        Ok(())
    }

    /// Set app secrets (staged; applied when the first machine starts).
    pub async fn set_secrets(
        &self,
        app_name: &str,
        secrets: &[(&str, &str)],
    ) -> anyhow::Result<()> {
        let secret_inputs: Vec<Value> = secrets
            .iter()
            .map(|(key, value)| json!({ "key": key, "value": value }))
            .collect();

        self.graphql(
            "mutation($input: SetSecretsInput!) { setSecrets(input: $input) { release { id } } }",
            json!({ "input": { "appId": app_name, "secrets": secret_inputs } }),
        )
        .await
        .map(|_| ())
        .context("set app secrets")
    }

    /// Allocate a public IP. `addr_type` is "v4" or "v6".
    pub async fn allocate_ip(&self, app_name: &str, addr_type: &str) -> anyhow::Result<String> {
        let data = self
            .graphql(
                "mutation($input: AllocateIPAddressInput!) { allocateIpAddress(input: $input) { ipAddress { address } } }",
                json!({ "input": { "appId": app_name, "type": addr_type.to_uppercase() } }),
            )
            .await
            .with_context(|| format!("allocate {addr_type} address"))?;

        data["allocateIpAddress"]["ipAddress"]["address"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("no {addr_type} address in allocation response"))
    }

    /// Create one machine running the given image with the given public env.
    pub async fn create_machine(
        &self,
        app_name: &str,
        image: &str,
        env: &Value,
    ) -> anyhow::Result<String> {
        let url = format!("{}/apps/{}/machines", self.api_base, app_name);
        let body = json!({
            "config": {
                "image": image,
                "env": env,
                "services": [{
                    "protocol": "tcp",
                    "internal_port": 3000,
                    "ports": [
                        { "port": 80, "handlers": ["http"] },
                        { "port": 443, "handlers": ["tls", "http"] }
                    ]
                }]
            }
        });

        let resp = self
            .authed(self.http.post(&url))
            .json(&body)
            .send()
            .await
            .context("create machine")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("creating machine for {app_name} failed: {status} {text}");
        }

        let machine: Value = resp.json().await.context("decode machine")?;
        machine["id"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("machine response missing id"))
    }

    /// Request a TLS certificate for a hostname on the app.
    pub async fn add_certificate(&self, app_name: &str, hostname: &str) -> anyhow::Result<()> {
        self.graphql(
            "mutation($appId: ID!, $hostname: String!) { addCertificate(appId: $appId, hostname: $hostname) { certificate { id } } }",
            json!({ "appId": app_name, "hostname": hostname }),
        )
        .await
        .map(|_| ())
        .with_context(|| format!("request certificate for {hostname}"))
    }

    async fn graphql(&self, query: &str, variables: Value) -> anyhow::Result<Value> {
        let resp = self
            .authed(self.http.post(&self.graphql_base))
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .context("fly graphql request")?;

        if !resp.status().is_success() {
            anyhow::bail!("fly graphql request failed: {}", resp.status());
        }

        let body: Value = resp.json().await.context("decode graphql response")?;
        if let Some(errors) = body.get("errors").and_then(|e| e.as_array()) {
            if !errors.is_empty() {
                let message = errors[0]["message"].as_str().unwrap_or("unknown error");
                anyhow::bail!("fly graphql error: {message}");
            }
        }
        Ok(body["data"].clone())
    }
}
