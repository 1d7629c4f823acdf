//! Drive API error reasons and error body parsing.

use serde_json::Value;

use crate::error::DriveError;

/// Drive API error reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorReason {
    /// Malformed request
    BadRequest,
    /// Invalid or expired credentials
    AuthError,
    /// Caller lacks permission on the item
    InsufficientPermissions,
    /// Per-user rate limit
    UserRateLimitExceeded,
    /// Project rate limit
    RateLimitExceeded,
    /// Sharing rate limit
    SharingRateLimitExceeded,
    /// Daily quota exhausted
    DailyLimitExceeded,
    /// Item does not exist
    NotFound,
    /// Ownership change needs consent or is not allowed
    ConsentRequiredForOwnershipTransfer,
    /// Parent limit for the item reached
    TeamDrivesParentLimit,
    /// Backend failure
    BackendError,
    /// Internal failure
    InternalError,
    /// Unknown error
    Unknown,
}

impl From<&str> for ApiErrorReason {
    fn from(reason: &str) -> Self {
        match reason {
            "badRequest" | "invalid" | "required" => ApiErrorReason::BadRequest,
            "authError" => ApiErrorReason::AuthError,
            "insufficientPermissions" | "insufficientFilePermissions" | "forbidden" => {
                ApiErrorReason::InsufficientPermissions
            }
            "userRateLimitExceeded" => ApiErrorReason::UserRateLimitExceeded,
            "rateLimitExceeded" => ApiErrorReason::RateLimitExceeded,
            "sharingRateLimitExceeded" => ApiErrorReason::SharingRateLimitExceeded,
            "dailyLimitExceeded" => ApiErrorReason::DailyLimitExceeded,
            "notFound" => ApiErrorReason::NotFound,
            "consentRequiredForOwnershipTransfer" => {
                ApiErrorReason::ConsentRequiredForOwnershipTransfer
            }
            "teamDrivesParentLimit" => ApiErrorReason::TeamDrivesParentLimit,
            "backendError" => ApiErrorReason::BackendError,
            "internalError" => ApiErrorReason::InternalError,
            _ => ApiErrorReason::Unknown,
        }
    }
}

impl ApiErrorReason {
    /// Get human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ApiErrorReason::BadRequest => "Bad request",
            ApiErrorReason::AuthError => "Invalid credentials",
            ApiErrorReason::InsufficientPermissions => "Insufficient permissions",
            ApiErrorReason::UserRateLimitExceeded => "User rate limit exceeded",
            ApiErrorReason::RateLimitExceeded => "Rate limit exceeded",
            ApiErrorReason::SharingRateLimitExceeded => "Sharing rate limit exceeded",
            ApiErrorReason::DailyLimitExceeded => "Daily limit exceeded",
            ApiErrorReason::NotFound => "File not found",
            ApiErrorReason::ConsentRequiredForOwnershipTransfer => {
                "Ownership transfer requires consent"
            }
            ApiErrorReason::TeamDrivesParentLimit => "Parent limit reached",
            ApiErrorReason::BackendError => "Backend error",
            ApiErrorReason::InternalError => "Internal error",
            ApiErrorReason::Unknown => "Unknown error",
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiErrorReason::UserRateLimitExceeded
                | ApiErrorReason::RateLimitExceeded
                | ApiErrorReason::SharingRateLimitExceeded
                | ApiErrorReason::BackendError
                | ApiErrorReason::InternalError
        )
    }
}

/// Whether a status/body pair should be retried.
pub(crate) fn is_retryable(status: u16, body: &str) -> bool {
    match status {
        429 | 500 | 502 | 503 | 504 => true,
        403 => first_reason(body)
            .map(|r| ApiErrorReason::from(r.as_str()).is_transient())
            .unwrap_or(false),
        _ => false,
    }
}

fn first_reason(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("error")?
        .get("errors")?
        .as_array()?
        .first()?
        .get("reason")?
        .as_str()
        .map(|s| s.to_string())
}

/// Convert a failed response into a [`DriveError`].
///
/// Falls back to [`DriveError::HttpError`] when the body is not a Drive error
/// document.
pub(crate) fn error_from_response(status: u16, body: &str) -> DriveError {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return DriveError::HttpError(status);
    };
    let Some(error) = json.get("error") else {
        return DriveError::HttpError(status);
    };

    let code = error
        .get("code")
        .and_then(|v| v.as_u64())
        .map(|c| c as u16)
        .unwrap_or(status);
    let reason = first_reason(body).unwrap_or_else(|| "unknown".to_string());
    let message = error
        .get("message")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| ApiErrorReason::from(reason.as_str()).description().to_string());

    DriveError::Api {
        code,
        reason,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOT_FOUND: &str = r#"{
        "error": {
            "code": 404,
            "message": "File not found: 1abc.",
            "errors": [{"domain": "global", "reason": "notFound", "message": "File not found: 1abc."}]
        }
    }"#;

    const RATE_LIMITED: &str = r#"{
        "error": {
            "code": 403,
            "message": "User Rate Limit Exceeded",
            "errors": [{"domain": "usageLimits", "reason": "userRateLimitExceeded"}]
        }
    }"#;

    #[test]
    fn test_reason_conversion() {
        assert_eq!(ApiErrorReason::from("notFound"), ApiErrorReason::NotFound);
        assert_eq!(
            ApiErrorReason::from("userRateLimitExceeded"),
            ApiErrorReason::UserRateLimitExceeded
        );
        assert_eq!(
            ApiErrorReason::from("insufficientFilePermissions"),
            ApiErrorReason::InsufficientPermissions
        );
        assert_eq!(ApiErrorReason::from("whatever"), ApiErrorReason::Unknown);
    }

    #[test]
    fn test_transient_reasons() {
        assert!(ApiErrorReason::RateLimitExceeded.is_transient());
        assert!(ApiErrorReason::BackendError.is_transient());
        assert!(!ApiErrorReason::NotFound.is_transient());
        assert!(!ApiErrorReason::InsufficientPermissions.is_transient());
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(429, ""));
        assert!(is_retryable(503, "<html>"));
        assert!(is_retryable(403, RATE_LIMITED));
        assert!(!is_retryable(403, r#"{"error":{"errors":[{"reason":"forbidden"}]}}"#));
        assert!(!is_retryable(404, NOT_FOUND));
    }

    #[test]
    fn test_error_from_drive_body() {
        match error_from_response(404, NOT_FOUND) {
            DriveError::Api {
                code,
                reason,
                message,
            } => {
                assert_eq!(code, 404);
                assert_eq!(reason, "notFound");
                assert_eq!(message, "File not found: 1abc.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_from_plain_body() {
        assert!(matches!(
            error_from_response(502, "Bad Gateway"),
            DriveError::HttpError(502)
        ));
    }
}
