//! The provisioning phases, in execution order.

pub mod brand_seed;
pub mod custom_domain;
pub mod dns_config;
pub mod domain_purchase;
pub mod email_notify;
pub mod fly_deploy;
pub mod google_setup;
pub mod pipeline_notify;
pub mod search_console;

use crate::runner::Phase;

/// The fixed production phase sequence.
pub fn standard_phases() -> Vec<Box<dyn Phase>> {
    vec![
        Box::new(brand_seed::BrandSeedPhase),
        Box::new(google_setup::GoogleSetupPhase),
        Box::new(pipeline_notify::PipelineNotifyPhase),
        Box::new(fly_deploy::FlyDeployPhase),
        Box::new(domain_purchase::DomainPurchasePhase),
        Box::new(custom_domain::CustomDomainPhase),
        Box::new(search_console::SearchConsolePhase),
        Box::new(dns_config::DnsConfigPhase),
        Box::new(email_notify::EmailNotifyPhase),
    ]
}
