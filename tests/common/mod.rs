use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use governai::config::{ApiConfig, CopilotConfig};
use governai::storage::SqliteUsageStore;

#[allow(dead_code)]
pub fn create_temp_store() -> (Arc<SqliteUsageStore>, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = SqliteUsageStore::new_with_path(tmp.path().join("usage.db"))
        .expect("failed to create usage store");
    (Arc::new(store), tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        timeout_seconds: 5,
    }
}

#[allow(dead_code)]
pub fn instant_copilot() -> CopilotConfig {
    CopilotConfig {
        reveal_enabled: false,
        ..CopilotConfig::default()
    }
}

#[allow(dead_code)]
pub fn contract_json() -> Value {
    json!({
        "id": 42,
        "title": "Cloud Services Agreement",
        "contract_number": "CSA-2025-014",
        "status": "active",
        "type": "vendor",
        "risk_score": 63.4,
        "party_a": "Acme Corp",
        "party_b": "Nimbus Hosting",
        "contract_value": 480000.0,
        "currency": "EUR",
        "expiration_date": "2027-01-31T00:00:00",
        "risk_factors": ["Auto-renewal without notice"],
        "extracted_clauses": [{"type": "termination", "text": "90 days notice"}]
    })
}
