//! Cross-phase provisioning state.
//!
//! One `ProvisionContext` lives for one request. Phases read what earlier
//! phases produced (Fly IPs, GA ids, DNS records) and append their own
//! results; nothing here outlives the response.

use std::time::Duration;

use serde::Serialize;

use crate::config::ProvisionConfig;
use crate::report::{DnsRecord, ProvisionReport};
use crate::request::ProvisionRequest;

/// What the Fly deployment phase produced.
#[derive(Debug, Clone, Serialize)]
pub struct FlyDeployment {
    pub app: String,
    pub image: String,
    pub ipv4: String,
    pub ipv6: String,
    pub machine_id: String,
}

pub struct ProvisionContext {
    pub req: ProvisionRequest,
    pub config: ProvisionConfig,
    pub http: reqwest::Client,

    // Accumulated across phases, append-only.
    pub site_url: String,
    pub fly: Option<FlyDeployment>,
    pub ga_property: Option<String>,
    pub ga_measurement_id: Option<String>,
    pub gtm_container_id: Option<String>,
    pub domain_operation: Option<String>,
    pub dns_records: Vec<DnsRecord>,
    pub report: ProvisionReport,
}

impl ProvisionContext {
    /// Build a context for a validated request. The shared client carries a
    /// 30s timeout so no single upstream call can wedge the pipeline.
    pub fn new(req: ProvisionRequest, config: ProvisionConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        let site_url = req.site_url();

        Self {
            req,
            config,
            http,
            site_url,
            fly: None,
            ga_property: None,
            ga_measurement_id: None,
            gtm_container_id: None,
            domain_operation: None,
            dns_records: Vec::new(),
            report: ProvisionReport::default(),
        }
    }

    /// True once the Fly phase reported a live deployment.
    pub fn fly_deployed(&self) -> bool {
        self.fly.is_some()
    }
}
