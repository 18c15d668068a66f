//! The uniform response envelope.
//!
//! Every API response, successful or not, has the shape
//! `{ "success": bool, "data": ..., "message": "..." }`.

use serde::{Deserialize, Serialize};

/// Response wrapper shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// The server-provided message, or `fallback` when absent or blank.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success_with_data() {
        let envelope: ApiEnvelope<Vec<u32>> =
            serde_json::from_str(r#"{"success":true,"data":[1,2]}"#).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data, Some(vec![1, 2]));
        assert!(envelope.message.is_none());
    }

    #[test]
    fn test_decode_failure_without_data() {
        let envelope: ApiEnvelope<Vec<u32>> =
            serde_json::from_str(r#"{"success":false,"message":"Out of stock"}"#).unwrap();
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.message_or("failed"), "Out of stock");
    }

    #[test]
    fn test_message_or_falls_back_on_blank() {
        let envelope: ApiEnvelope<()> =
            serde_json::from_str(r#"{"success":false,"message":"  "}"#).unwrap();
        assert_eq!(envelope.message_or("Request failed"), "Request failed");
    }
}
