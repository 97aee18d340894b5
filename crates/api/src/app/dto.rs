use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Map, Value};

use registry_infra::residents::StoredResident;

/// Request body as JSON, with a missing or unparsable body read as `{}`.
///
/// Every operation then answers such a request with its own 400.
pub fn body_or_empty(body: Option<Json<Value>>) -> Value {
    body.map(|Json(v)| v)
        .unwrap_or_else(|| Value::Object(Map::new()))
}

pub fn message(status: StatusCode, message: &'static str) -> axum::response::Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// `{id, ...fields}`; a stored field named `id` wins over the key suffix.
pub fn stored_resident_to_json(resident: StoredResident) -> Value {
    let mut obj = Map::new();
    obj.insert("id".to_string(), Value::String(resident.id.as_str().to_string()));
    for (field, value) in resident.fields {
        obj.insert(field, Value::String(value));
    }
    Value::Object(obj)
}
