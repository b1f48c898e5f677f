//! API response types for the HTTP surface.

use serde::{Deserialize, Serialize};

// ============================================================================
// Response Types
// ============================================================================

/// API response wrapper for consistent JSON structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present when success=true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present when success=false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Result of a dispatched action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Whether the command was accepted for delivery
    pub accepted: bool,
    /// Human-readable confirmation
    pub result: String,
}

impl CommandResponse {
    /// Create an accepted response
    pub fn accepted(result: impl Into<String>) -> Self {
        Self {
            accepted: true,
            result: result.into(),
        }
    }
}

/// Result of the registration handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationResponse {
    /// The GUID minted for this client
    pub guid: String,
    /// The long-lived token bound to that GUID
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_ok_omits_error() {
        let response = ApiResponse::ok(CommandResponse::accepted("dispatched"));
        assert!(response.success);
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("error"));
        assert!(json.contains("dispatched"));
    }

    #[test]
    fn api_response_err_omits_data() {
        let response: ApiResponse<CommandResponse> = ApiResponse::err("nope");
        assert!(!response.success);
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("data"));
        assert!(json.contains("nope"));
    }

    #[test]
    fn registration_response_serde() {
        let response = RegistrationResponse {
            guid: "g".into(),
            token: "t".into(),
        };
        let json = serde_json::to_string(&response).unwrap();
        let back: RegistrationResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.guid, "g");
        assert_eq!(back.token, "t");
    }
}
