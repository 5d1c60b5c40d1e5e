//! Phase 1 — seed the tenant's brand rows.
//!
//! Four tables, each upserted by business key. Only the `brand_guidelines`
//! write is fatal; the other three are best-effort.

use async_trait::async_trait;
use serde_json::json;

use crate::clients::supabase::SupabaseClient;
use crate::context::ProvisionContext;
use crate::report::{Notification, PhaseStatus};
use crate::runner::Phase;

pub struct BrandSeedPhase;

#[async_trait]
impl Phase for BrandSeedPhase {
    fn key(&self) -> &'static str {
        "brand_guidelines"
    }

    fn fatal(&self) -> bool {
        true
    }

    async fn run(&self, cx: &mut ProvisionContext) -> anyhow::Result<()> {
        let db = SupabaseClient::new(&cx.config, cx.http.clone());
        let req = &cx.req;
        let username = req.username.as_str();
        let now = chrono::Utc::now().to_rfc3339();

        // Fatal: without brand guidelines the tenant site cannot render.
        let guidelines = json!({
            "username": username,
            "primary_color": &req.brand_colors.primary,
            "secondary_color": &req.brand_colors.secondary,
            "accent_color": &req.brand_colors.accent,
            "logo_url": &req.logo_url,
            "tone_of_voice": &req.tone_of_voice,
            "updated_at": &now,
        });
        let updated = db
            .upsert_by("brand_guidelines", &[("username", username)], &guidelines)
            .await?;

        cx.report.record(
            "brand_guidelines",
            Notification::new(PhaseStatus::Created).with("updated", updated),
        );

        // Best-effort companions.
        let specifications = json!({
            "username": username,
            "description": &req.description,
            "target_audience": &req.target_audience,
            "updated_at": &now,
        });
        if let Err(e) = db
            .upsert_by("brand_specifications", &[("username", username)], &specifications)
            .await
        {
            tracing::warn!(username, error = %e, "brand_specifications seed failed");
        }

        let company = json!({
            "username": username,
            "display_name": &req.display_name,
            "contact_email": &req.contact_email,
            "website_url": &req.website_url,
            "niche": &req.niche,
            "updated_at": &now,
        });
        if let Err(e) = db
            .upsert_by("company_information", &[("username", username)], &company)
            .await
        {
            tracing::warn!(username, error = %e, "company_information seed failed");
        }

        let author = json!({
            "username": username,
            "slug": username,
            "name": req.author_name.clone().unwrap_or_else(|| req.display_name.clone()),
            "bio": &req.author_bio,
            "avatar_url": &req.author_avatar_url,
            "updated_at": &now,
        });
        if let Err(e) = db.upsert_by("authors", &[("slug", username)], &author).await {
            tracing::warn!(username, error = %e, "authors seed failed");
        }

        Ok(())
    }
}
