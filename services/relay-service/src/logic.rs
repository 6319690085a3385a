use serde_json::Value;

use crate::error::RelayError;
use crate::models::{CreateItemRequest, NewItem};

pub const FIELD_API_TOKEN: &str = "apiToken";
pub const FIELD_COLLECTION_ID: &str = "collectionId";
pub const FIELD_ITEM_DATA: &str = "itemData";

pub fn parse_request(body: Value) -> Result<CreateItemRequest, RelayError> {
    // A top-level array would otherwise deserialize into the struct by position.
    if !body.is_object() {
        return Err(RelayError::InvalidBody("expected a JSON object".to_string()));
    }
    serde_json::from_value(body).map_err(|err| RelayError::InvalidBody(err.to_string()))
}

/// Missing fields are reported together, in wire naming and declaration order.
pub fn validate(request: CreateItemRequest) -> Result<NewItem, RelayError> {
    let api_token = scalar_text(request.api_token);
    let collection_id = scalar_text(request.collection_id);
    let fields = request.item_data.filter(|value| !is_blank(value));

    match (api_token, collection_id, fields) {
        (Some(api_token), Some(collection_id), Some(fields)) => Ok(NewItem {
            api_token,
            collection_id,
            fields,
        }),
        (api_token, collection_id, fields) => {
            let mut missing = Vec::with_capacity(3);
            if api_token.is_none() {
                missing.push(FIELD_API_TOKEN);
            }
            if collection_id.is_none() {
                missing.push(FIELD_COLLECTION_ID);
            }
            if fields.is_none() {
                missing.push(FIELD_ITEM_DATA);
            }
            Err(RelayError::MissingFields(missing))
        }
    }
}

// Truthy scalars are forwarded as text; objects and arrays are not identifiers.
fn scalar_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.is_empty() => Some(text),
        Value::Number(number) if number.as_f64() != Some(0.0) => Some(number.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Null, false, zero, and empty strings, arrays or objects carry nothing to forward.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
