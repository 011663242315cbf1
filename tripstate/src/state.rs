//! Initial shape of the trip planner's state document.

use serde_json::{Map, Value, json};

/// Document the page starts with when no initial document file is given.
pub fn default_document() -> Map<String, Value> {
    let document = json!({
        "user": {
            "isLoggedIn": false,
            "profile": null,
            "preferences": {
                "language": "en",
                "currency": "USD"
            }
        },
        "trip": {
            "destination": null,
            "startDate": null,
            "endDate": null,
            "days": []
        },
        "search": {
            "query": "",
            "suggestion": null
        },
        "ui": {
            "loading": false,
            "notifications": []
        }
    });
    match document {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
