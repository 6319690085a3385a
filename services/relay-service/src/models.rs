use serde::{Deserialize, Serialize};
use serde_json::Value;

// Loose field types: absent or mistyped values become missing-field complaints.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub api_token: Option<Value>,
    pub collection_id: Option<Value>,
    pub item_data: Option<Value>,
}

pub struct NewItem {
    pub api_token: String,
    pub collection_id: String,
    pub fields: Value,
}

#[derive(Serialize)]
pub struct ItemEnvelope<'a> {
    pub fields: &'a Value,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
