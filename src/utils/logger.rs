use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug)]
pub struct StructuredLogger;

impl StructuredLogger {
    pub fn log_request(&self, method: &str, path: &str, member_id: Option<Uuid>, status: u16) {
        let log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "http_request",
            "method": method,
            "path": path,
            "member_id": member_id,
            "status_code": status,
            "service": "resume-screening-backend"
        });

        info!("{}", log_entry);
    }

    pub fn log_collection_query(
        &self,
        collection: &str,
        query: &str,
        duration_ms: u128,
        result_count: Option<usize>,
    ) {
        let log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "collection_query",
            "collection": collection,
            "query_hash": format!("{:x}", md5::compute(query)),
            "query_preview": if query.len() > 100 {
                format!("{}...", &query[..100])
            } else {
                query.to_string()
            },
            "duration_ms": duration_ms,
            "result_count": result_count,
            "service": "resume-screening-backend"
        });

        if duration_ms > 1000 {
            warn!("Slow query detected: {}", log_entry);
        } else {
            info!("{}", log_entry);
        }
    }

    pub fn log_error(&self, error: &str, context: HashMap<String, serde_json::Value>) {
        let mut log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "error",
            "error_message": error,
            "service": "resume-screening-backend"
        });

        for (key, value) in context {
            log_entry[key] = value;
        }

        error!("{}", log_entry);
    }

    pub fn log_performance_metric(
        &self,
        metric_name: &str,
        value: f64,
        tags: HashMap<String, String>,
    ) {
        let log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "performance_metric",
            "metric_name": metric_name,
            "value": value,
            "tags": tags,
            "service": "resume-screening-backend"
        });

        info!("{}", log_entry);
    }

    pub fn log_business_event(
        &self,
        event_name: &str,
        member_id: Option<Uuid>,
        metadata: HashMap<String, serde_json::Value>,
    ) {
        let mut log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "business_event",
            "event_name": event_name,
            "member_id": member_id,
            "service": "resume-screening-backend"
        });

        for (key, value) in metadata {
            log_entry[key] = value;
        }

        info!("{}", log_entry);
    }
}

pub static LOGGER: StructuredLogger = StructuredLogger;
