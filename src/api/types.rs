//! Wire types for the Revue API
//!
//! Field names are camelCase on the wire.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /User/Authentication`
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful authentication response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Create/edit payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevuePayload {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub url: String,
}

impl RevuePayload {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            url: String::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

/// `{ "msg": ... }` body returned by create, edit and delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub msg: String,
}

/// One record from `GET /Revue/All`
///
/// Only `id` is required. Fields the server adds beyond the payload are kept
/// in `extra` and not interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevueRecord {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accept string or numeric ids; the rest of the tool treats them as opaque
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_serializes_empty_url() {
        let payload = RevuePayload::new("Exam Test Revue", "This is created during exam");
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "title": "Exam Test Revue",
                "description": "This is created during exam",
                "url": ""
            })
        );
    }

    #[test]
    fn test_auth_response_camel_case() {
        let auth: AuthResponse =
            serde_json::from_value(json!({ "accessToken": "abc", "email": "x" })).unwrap();
        assert_eq!(auth.access_token.as_deref(), Some("abc"));

        let auth: AuthResponse = serde_json::from_value(json!({})).unwrap();
        assert!(auth.access_token.is_none());
    }

    #[test]
    fn test_record_keeps_extra_fields_and_numeric_ids() {
        let record: RevueRecord = serde_json::from_value(json!({
            "id": 17,
            "title": "t",
            "url": null,
            "ownerId": "u-1"
        }))
        .unwrap();

        assert_eq!(record.id, "17");
        assert_eq!(record.title.as_deref(), Some("t"));
        assert!(record.url.is_none());
        assert_eq!(record.extra["ownerId"], "u-1");
    }

    #[test]
    fn test_record_rejects_object_id() {
        let result: Result<RevueRecord, _> = serde_json::from_value(json!({ "id": {} }));
        assert!(result.is_err());
    }
}
