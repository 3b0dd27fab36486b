//! Response envelope and error codes returned to lobby clients.

use serde::{Deserialize, Serialize};

// =============================================================================
// Response Result
// =============================================================================

/// Result of a lobby operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResponseResult {
    /// Operation succeeded
    Success {
        /// Optional data payload (varies by operation)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
    /// Operation failed
    Error {
        /// Error classification code
        code: ErrorCode,
        /// Human-readable error message
        message: String,
        /// Machine-readable reason within the code (e.g. `room_full`)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl ResponseResult {
    /// Create a success response with data
    pub fn success<T: Serialize>(data: T) -> Self {
        ResponseResult::Success {
            data: serde_json::to_value(data).ok(),
        }
    }

    /// Create a success response without data
    pub fn success_empty() -> Self {
        ResponseResult::Success { data: None }
    }

    /// Create an error response
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ResponseResult::Error {
            code,
            message: message.into(),
            reason: None,
        }
    }

    /// Create an error response carrying a reason tag
    pub fn error_with_reason(
        code: ErrorCode,
        message: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ResponseResult::Error {
            code,
            message: message.into(),
            reason: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseResult::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResponseResult::Error { .. })
    }
}

// =============================================================================
// Error Codes
// =============================================================================

/// Error classification codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // === Client Errors (4xx) ===
    /// Request was malformed or failed validation
    BadRequest,
    /// Caller may not perform this operation
    Forbidden,
    /// Requested resource not found
    NotFound,
    /// Operation conflicts with current state
    Conflict,

    // === Server Errors (5xx) ===
    /// A peer service failed or is unavailable
    UpstreamError,
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Suggested HTTP status for transports that speak HTTP.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::BadRequest => 400,
            ErrorCode::Forbidden => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict => 409,
            ErrorCode::UpstreamError => 502,
            ErrorCode::InternalError => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_serializes_with_status_tag() {
        let json = serde_json::to_value(ResponseResult::error_with_reason(
            ErrorCode::Conflict,
            "Room is full",
            "room_full",
        ))
        .unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "conflict");
        assert_eq!(json["reason"], "room_full");
    }

    #[test]
    fn success_without_data_omits_field() {
        let json = serde_json::to_value(ResponseResult::success_empty()).unwrap();
        assert_eq!(json, serde_json::json!({"status": "success"}));
    }
}
