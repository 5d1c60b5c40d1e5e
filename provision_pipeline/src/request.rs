//! Provision request payload and validation.

use serde::{Deserialize, Serialize};

/// Brand color palette forwarded into the tenant's brand guidelines row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandColors {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub accent: Option<String>,
}

/// One tenant provisioning request, as POSTed to `/api/provision`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvisionRequest {
    // Required.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub contact_email: String,

    // At least one of these two is required.
    pub website_url: Option<String>,
    pub niche: Option<String>,

    // Optional branding / seeding.
    pub domain: Option<String>,
    pub domain_price_usd: Option<f64>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub approved_products: Vec<String>,
    #[serde(default)]
    pub brand_colors: BrandColors,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub tone_of_voice: Option<String>,
    pub target_audience: Option<String>,
    pub author_name: Option<String>,
    pub author_bio: Option<String>,
    pub author_avatar_url: Option<String>,

    // Feature toggles.
    #[serde(default)]
    pub skip_pipeline: bool,
    #[serde(default)]
    pub skip_deploy: bool,
    #[serde(default)]
    pub setup_google_analytics: bool,
    #[serde(default)]
    pub setup_google_tag_manager: bool,
    #[serde(default)]
    pub setup_search_console: bool,
    #[serde(default)]
    pub purchase_domain: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("at least one of website_url or niche is required")]
    MissingSiteContext,
    #[error("username must be 1-40 lowercase letters, digits, or hyphens")]
    InvalidUsername,
}

impl ProvisionRequest {
    /// Validate and normalize in place. Runs before any phase; failures map
    /// to HTTP 400.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        self.username = self.username.trim().to_lowercase();

        if self.username.is_empty() {
            return Err(ValidationError::MissingField("username"));
        }
        if self.username.len() > 40
            || !self
                .username
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ValidationError::InvalidUsername);
        }
        if self.display_name.trim().is_empty() {
            return Err(ValidationError::MissingField("display_name"));
        }
        if self.contact_email.trim().is_empty() {
            return Err(ValidationError::MissingField("contact_email"));
        }
        if self.website_url.as_deref().unwrap_or("").is_empty()
            && self.niche.as_deref().unwrap_or("").is_empty()
        {
            return Err(ValidationError::MissingSiteContext);
        }

        Ok(())
    }

    /// Fly app name derived from the tenant username.
    pub fn fly_app_name(&self) -> String {
        format!("{}-blog", self.username)
    }

    /// Public site URL: custom domain wins, then the supplied website, then
    /// the default Fly subdomain.
    pub fn site_url(&self) -> String {
        if let Some(domain) = self.domain.as_deref().filter(|d| !d.is_empty()) {
            return format!("https://www.{domain}");
        }
        if let Some(url) = self.website_url.as_deref().filter(|u| !u.is_empty()) {
            return url.to_string();
        }
        format!("https://{}.fly.dev", self.fly_app_name())
    }
}
