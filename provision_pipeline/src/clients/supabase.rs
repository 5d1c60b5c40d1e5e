//! Supabase PostgREST client — the only path to the tenant database.
//!
//! The brand tables have no unique constraint on `username`, so "upsert" here
//! is select-then-update-or-insert, matching the invariant the seeding phase
//! enforces itself.

use anyhow::Context;
use serde_json::Value;

use crate::config::ProvisionConfig;

#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &ProvisionConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            base: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_role_key.clone(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    /// Fetch at most one row matching all `eq` filters.
    pub async fn select_one(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> anyhow::Result<Option<Value>> {
        let mut query: Vec<(String, String)> = filters
            .iter()
            .map(|(col, val)| (col.to_string(), format!("eq.{val}")))
            .collect();
        query.push(("limit".to_string(), "1".to_string()));

        let resp = self
            .authed(self.http.get(self.table_url(table)))
            .query(&query)
            .send()
            .await
            .with_context(|| format!("select from {table}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("select from {table} failed: {status} {body}");
        }

        let rows: Vec<Value> = resp.json().await.with_context(|| format!("decode {table}"))?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row.
    pub async fn insert(&self, table: &str, row: &Value) -> anyhow::Result<()> {
        let resp = self
            .authed(self.http.post(self.table_url(table)))
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await
            .with_context(|| format!("insert into {table}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("insert into {table} failed: {status} {body}");
        }
        Ok(())
    }

    /// Update all rows matching the `eq` filters.
    pub async fn update(
        &self,
        table: &str,
        filters: &[(&str, &str)],
        row: &Value,
    ) -> anyhow::Result<()> {
        let query: Vec<(String, String)> = filters
            .iter()
            .map(|(col, val)| (col.to_string(), format!("eq.{val}")))
            .collect();

        let resp = self
            .authed(self.http.patch(self.table_url(table)))
            .header("Prefer", "return=minimal")
            .query(&query)
            .json(row)
            .send()
            .await
            .with_context(|| format!("update {table}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("update {table} failed: {status} {body}");
        }
        Ok(())
    }

    /// Select-then-write upsert keyed by the given filters. Returns true when
    /// an existing row was updated, false when a new row was inserted.
    pub async fn upsert_by(
        &self,
        table: &str,
        filters: &[(&str, &str)],
        row: &Value,
    ) -> anyhow::Result<bool> {
        if self.select_one(table, filters).await?.is_some() {
            self.update(table, filters, row).await?;
            Ok(true)
        } else {
            self.insert(table, row).await?;
            Ok(false)
        }
    }
}
