use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Minimal exchange response body
#[allow(dead_code)]
pub fn exchange_body(step: &str, prompt_type: &str, message: &str) -> Value {
    json!({
        "session_id": "sess-1",
        "current_step": step,
        "prompt": { "type": prompt_type, "message": message }
    })
}

/// Diagnosing response with a yes/no question at the given turn
#[allow(dead_code)]
pub fn diagnosing_body(turn: u32, message: &str) -> Value {
    json!({
        "session_id": "sess-1",
        "current_step": "diagnosing",
        "prompt": {
            "type": "single_choice",
            "message": message,
            "choices": [
                { "value": "yes", "label": "はい" },
                { "value": "no", "label": "いいえ" }
            ]
        },
        "diagnostic_turn": turn
    })
}

#[allow(dead_code)]
pub fn vehicle_results() -> Value {
    json!({
        "results": [{
            "vehicle": {
                "id": "prius-2021",
                "make": "Toyota",
                "model": "Prius",
                "year": 2021,
                "trim": "S",
                "photo_url": "/photos/prius.jpg",
                "manual_available": true
            },
            "score": 0.92
        }]
    })
}

#[allow(dead_code)]
pub fn provider_listing() -> Value {
    json!({
        "providers": [
            { "name": "claude", "display_name": "Claude", "is_configured": true, "is_active": true },
            { "name": "local", "display_name": "Local model", "is_configured": false, "is_active": false }
        ],
        "active": "claude"
    })
}
