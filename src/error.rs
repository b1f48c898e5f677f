//! Crate-wide error taxonomy.
//!
//! One variant per way a caller needs to react:
//!
//! | Variant | Meaning | HTTP status |
//! |---------|---------|-------------|
//! | [`Error::Validation`] | bad id, bad parameter, out-of-range value | 400 |
//! | [`Error::Unsupported`] | option has no mapping for the active dialect | 400 |
//! | [`Error::NotFound`] | component has no known state | 404 |
//! | [`Error::Unauthorized`] | missing/invalid credential | 401 |
//! | [`Error::ExpiredToken`] | signed token past its expiry | 498 |
//! | [`Error::Dispatch`] | submission to the layout failed | 502 |
//!
//! Expired and otherwise-invalid tokens are deliberately distinct so a
//! caller can tell "log in again" apart from "credential corrupt". No error
//! is retried by this layer; every one is terminal for the request that
//! produced it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::scope::CommandScope;

/// Errors produced by translation, authentication, and dispatch.
#[derive(Debug, Error)]
pub enum Error {
    /// The request itself is malformed: id out of range, numeric parameter
    /// outside its declared bounds, and so on. The message names the
    /// offending value and the correct bound.
    #[error("{detail}")]
    Validation {
        /// Human-readable description naming the offending value.
        detail: String,
    },

    /// The requested option exists but has no mapping for the component's
    /// dialect (e.g. quilling horn on a classic engine).
    #[error("{detail}")]
    Unsupported {
        /// Names the unsupported scope/dialect/option combination.
        detail: String,
    },

    /// No state is known for the addressed component.
    #[error("{} {id} not found", scope.title())]
    NotFound {
        /// Scope that was queried.
        scope: CommandScope,
        /// Identifier that had no state.
        id: u16,
    },

    /// Credential missing, malformed, or failed verification.
    #[error("{detail}")]
    Unauthorized {
        /// Why the credential was rejected.
        detail: String,
    },

    /// Signed token verified but is past its expiry.
    #[error("token has expired")]
    ExpiredToken,

    /// The external submission interface failed. Logged at the boundary and
    /// reported generically; never propagated as an unhandled fault.
    #[error("command dispatch failed: {detail}")]
    Dispatch {
        /// Underlying failure description (for logs; callers see the
        /// generic message).
        detail: String,
    },
}

impl Error {
    /// Convenience constructor for validation errors.
    pub fn validation(detail: impl Into<String>) -> Self {
        Error::Validation {
            detail: detail.into(),
        }
    }

    /// Convenience constructor for unsupported dialect/option combinations.
    pub fn unsupported(detail: impl Into<String>) -> Self {
        Error::Unsupported {
            detail: detail.into(),
        }
    }

    /// Convenience constructor for authentication rejections.
    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Error::Unauthorized {
            detail: detail.into(),
        }
    }

    /// Convenience constructor for dispatch failures.
    pub fn dispatch(detail: impl Into<String>) -> Self {
        Error::Dispatch {
            detail: detail.into(),
        }
    }

    /// HTTP status this error maps to.
    ///
    /// 498 is the de-facto "token expired" status the reference service
    /// used; kept so existing clients can distinguish re-auth from failure.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation { .. } | Error::Unsupported { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Error::ExpiredToken => StatusCode::from_u16(498).unwrap_or(StatusCode::UNAUTHORIZED),
            Error::Dispatch { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(
            Error::validation("bad").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotFound {
                scope: CommandScope::Engine,
                id: 7
            }
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::unauthorized("nope").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(Error::ExpiredToken.status().as_u16(), 498);
        assert_eq!(Error::dispatch("down").status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn expired_and_invalid_are_distinct() {
        let expired = Error::ExpiredToken;
        let invalid = Error::unauthorized("signature mismatch");
        assert_ne!(expired.status(), invalid.status());
    }

    #[test]
    fn not_found_message() {
        let err = Error::NotFound {
            scope: CommandScope::Train,
            id: 42,
        };
        assert_eq!(err.to_string(), "Train 42 not found");
    }
}
