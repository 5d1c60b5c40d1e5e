//! Provisioning service configuration — loaded from environment variables.
//!
//! Upstream base URLs are plain fields with production defaults so tests can
//! point clients at a local mock server.

#[derive(Clone, Debug)]
pub struct ProvisionConfig {
    /// Static bearer secret callers must present.
    pub provision_secret: String,
    /// Supabase PostgREST base URL.
    pub supabase_url: String,
    /// Supabase service-role key (full read/write).
    pub supabase_service_role_key: String,
    /// Supabase anon key, forwarded to tenant apps as a secret.
    pub supabase_anon_key: String,
    /// Doubleclicker content-pipeline base URL. Empty disables the phase.
    pub doubleclicker_api_url: String,
    /// Fly.io API token. Empty disables deployment.
    pub fly_api_token: String,
    /// Fly.io organization slug new apps are created under.
    pub fly_org_slug: String,
    /// Fly app whose machine image seeds new tenant machines.
    pub fly_base_app: String,
    /// Resend API key. Empty disables the notification email.
    pub resend_api_key: String,
    /// Sender address for notification emails.
    pub resend_from_email: String,
    /// Google service-account key JSON (inline). Empty disables Google phases.
    pub google_service_account_json: String,
    /// GA4 parent account resource name, e.g. "accounts/123456".
    pub google_analytics_account: String,
    /// Tag Manager account id.
    pub gtm_account_id: String,
    /// Cloud project for domain registrations.
    pub google_cloud_project: String,

    // Upstream endpoints (overridable in tests).
    pub fly_api_base: String,
    pub fly_graphql_base: String,
    pub google_oauth_base: String,
    pub google_analytics_base: String,
    pub google_tagmanager_base: String,
    pub google_searchconsole_base: String,
    pub google_siteverification_base: String,
    pub google_domains_base: String,
    pub resend_base: String,
}

impl Default for ProvisionConfig {
    /// Empty credentials, production upstream endpoints.
    fn default() -> Self {
        Self {
            provision_secret: String::new(),
            supabase_url: String::new(),
            supabase_service_role_key: String::new(),
            supabase_anon_key: String::new(),
            doubleclicker_api_url: String::new(),
            fly_api_token: String::new(),
            fly_org_slug: "personal".to_string(),
            fly_base_app: String::new(),
            resend_api_key: String::new(),
            resend_from_email: "noreply@localhost".to_string(),
            google_service_account_json: String::new(),
            google_analytics_account: String::new(),
            gtm_account_id: String::new(),
            google_cloud_project: String::new(),
            fly_api_base: "https://api.machines.dev/v1".to_string(),
            fly_graphql_base: "https://api.fly.io/graphql".to_string(),
            google_oauth_base: "https://oauth2.googleapis.com".to_string(),
            google_analytics_base: "https://analyticsadmin.googleapis.com".to_string(),
            google_tagmanager_base: "https://tagmanager.googleapis.com".to_string(),
            google_searchconsole_base: "https://www.googleapis.com/webmasters/v3".to_string(),
            google_siteverification_base: "https://www.googleapis.com/siteVerification/v1"
                .to_string(),
            google_domains_base: "https://domains.googleapis.com/v1".to_string(),
            resend_base: "https://api.resend.com".to_string(),
        }
    }
}

impl ProvisionConfig {
    pub fn from_env() -> Self {
        let config = Self {
            provision_secret: std::env::var("PROVISION_SECRET").unwrap_or_default(),
            supabase_url: std::env::var("SUPABASE_URL").unwrap_or_default(),
            supabase_service_role_key: std::env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_default(),
            supabase_anon_key: std::env::var("SUPABASE_ANON_KEY").unwrap_or_default(),
            doubleclicker_api_url: std::env::var("DOUBLECLICKER_API_URL").unwrap_or_default(),
            fly_api_token: std::env::var("FLY_API_TOKEN").unwrap_or_default(),
            fly_org_slug: std::env::var("FLY_ORG_SLUG")
                .unwrap_or_else(|_| "personal".to_string()),
            fly_base_app: std::env::var("FLY_BASE_APP").unwrap_or_default(),
            resend_api_key: std::env::var("RESEND_API_KEY").unwrap_or_default(),
            resend_from_email: std::env::var("RESEND_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@localhost".to_string()),
            google_service_account_json: std::env::var("GOOGLE_SERVICE_ACCOUNT_JSON")
                .unwrap_or_default(),
            google_analytics_account: std::env::var("GOOGLE_ANALYTICS_ACCOUNT")
                .unwrap_or_default(),
            gtm_account_id: std::env::var("GTM_ACCOUNT_ID").unwrap_or_default(),
            google_cloud_project: std::env::var("GOOGLE_CLOUD_PROJECT").unwrap_or_default(),
            ..Self::default()
        };

        if config.provision_secret.is_empty() {
            tracing::warn!("PROVISION_SECRET not set -- all provision requests will be rejected");
        }
        if config.supabase_url.is_empty() || config.supabase_service_role_key.is_empty() {
            tracing::warn!("Supabase credentials not set -- provisioning disabled");
        }
        if config.fly_api_token.is_empty() {
            tracing::warn!("FLY_API_TOKEN not set -- tenant deployment disabled");
        }
        if config.google_service_account_json.is_empty() {
            tracing::warn!("GOOGLE_SERVICE_ACCOUNT_JSON not set -- Google integrations disabled");
        }
        if config.resend_api_key.is_empty() {
            tracing::warn!("RESEND_API_KEY not set -- DNS notification emails disabled");
        }

        config
    }

    /// True when the minimum server-side configuration for running any phase
    /// is present. Checked before phase 1; failure is a 500, not a phase error.
    pub fn is_operational(&self) -> bool {
        !self.provision_secret.is_empty()
            && !self.supabase_url.is_empty()
            && !self.supabase_service_role_key.is_empty()
    }
}
