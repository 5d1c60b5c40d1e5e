//! Best-effort audit logging — one `analytics_events` row per provision run.

use serde_json::json;

use crate::clients::supabase::SupabaseClient;
use crate::context::ProvisionContext;

/// Insert the audit row. Failures are debug-logged and ignored; the audit
/// trail never affects the response.
pub async fn log_provision_event(cx: &ProvisionContext) {
    let db = SupabaseClient::new(&cx.config, cx.http.clone());
    let row = json!({
        "event_type": "site_provisioned",
        "username": &cx.req.username,
        "payload": &cx.report,
        "created_at": chrono::Utc::now().to_rfc3339(),
    });

    if let Err(e) = db.insert("analytics_events", &row).await {
        tracing::debug!(username = %cx.req.username, error = %e, "audit insert failed");
    }
}
