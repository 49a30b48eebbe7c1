use std::sync::Arc;
use serde_json::{json, Value};

use shared_config::AppConfig;

pub const TEST_TOKEN: &str = "tok_3f9a1c7e5b";

pub struct TestConfig {
    pub backend_url: String,
    pub request_timeout_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 5,
        }
    }
}

impl TestConfig {
    pub fn with_backend(url: &str) -> Self {
        Self {
            backend_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            macro_period_api_url: self.backend_url.clone(),
            request_timeout_secs: self.request_timeout_secs,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Canned JSON bodies shaped like the public macro period endpoints.
pub struct MockBackendResponses;

impl MockBackendResponses {
    pub fn unit_response(id: i64, name: &str, total_days: u32) -> Value {
        json!({
            "id": id,
            "macro_period_id": 1,
            "unit_id": id * 10,
            "unit_name": name,
            "unit_city": "Campinas",
            "total_days": total_days,
            "order_position": id,
            "config_turnos": {
                "morning": { "start": "08:00", "end": "12:00" },
                "afternoon": { "start": "13:00", "end": "17:00" }
            }
        })
    }

    pub fn selection_response(unit_id: i64, date: &str, part_of_day: &str, block_id: Option<&str>) -> Value {
        json!({
            "macro_period_unit_id": unit_id,
            "date": date,
            "part_of_day": part_of_day,
            "custom_start": null,
            "custom_end": null,
            "block_id": block_id
        })
    }

    pub fn custom_selection_response(unit_id: i64, date: &str, start: &str, end: &str) -> Value {
        json!({
            "macro_period_unit_id": unit_id,
            "date": date,
            "part_of_day": "CUSTOM",
            "custom_start": start,
            "custom_end": end,
            "block_id": null
        })
    }

    pub fn public_view(
        start_date: &str,
        end_date: &str,
        status: &str,
        can_edit: bool,
        units: Vec<Value>,
        selections: Vec<Value>,
    ) -> Value {
        json!({
            "id": 1,
            "doctor_name": "Dra. Helena Prado",
            "start_date": start_date,
            "end_date": end_date,
            "status": status,
            "can_edit": can_edit,
            "units": units,
            "selections": selections
        })
    }

    /// Two units (A needs 2 days, B needs 1) over 2025-04-01..2025-04-10.
    pub fn two_unit_view(selections: Vec<Value>) -> Value {
        Self::public_view(
            "2025-04-01",
            "2025-04-10",
            "AGUARDANDO",
            true,
            vec![
                Self::unit_response(1, "Unidade A", 2),
                Self::unit_response(2, "Unidade B", 1),
            ],
            selections,
        )
    }

    pub fn submit_response(status: &str) -> Value {
        json!({
            "message": "Response submitted successfully",
            "status": status
        })
    }

    pub fn error_response(detail: &str) -> Value {
        json!({
            "detail": detail
        })
    }
}
