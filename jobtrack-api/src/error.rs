use serde_json::{Map, Value};
use thiserror::Error;

const NETWORK_MESSAGE: &str = "Network error. Please check your connection.";
const UNAUTHORIZED_MESSAGE: &str = "Authentication required. Please log in.";
const TOKEN_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";
const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action.";
const VALIDATION_MESSAGE: &str = "Validation failed.";
const RATE_LIMIT_MESSAGE: &str = "Too many requests. Please try again later.";
const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
const UNKNOWN_MESSAGE: &str = "An unexpected error occurred";

/// Values of the `code` field that mark a 401 as an invalid or expired token.
const TOKEN_INVALID_CODES: [&str; 2] = ["token_not_valid", "token_expired"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Unauthorized,
    TokenExpired,
    Forbidden,
    Validation,
    RateLimit,
    ServerError,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Unauthorized => "unauthorized",
            Self::TokenExpired => "token_expired",
            Self::Forbidden => "forbidden",
            Self::Validation => "validation",
            Self::RateLimit => "rate_limit",
            Self::ServerError => "server_error",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure tagged with one of the [`ErrorKind`]s.
///
/// Only [`classify`] builds these, so every failure that leaves the client
/// went through the same precedence rules.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
    details: Option<Map<String, Value>>,
}

impl ClassifiedError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn details(&self) -> Option<&Map<String, Value>> {
        self.details.as_ref()
    }

    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Network
    }

    /// The stored credential can no longer be used.
    pub fn is_auth_invalid(&self) -> bool {
        matches!(self.kind, ErrorKind::Unauthorized | ErrorKind::TokenExpired)
    }
}

/// What went wrong before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFailure {
    /// The request was sent but no response came back (connect, timeout, reset).
    NoResponse { message: String },
    /// The server answered with a non-2xx status.
    Status { status: u16, body: String },
    /// A 2xx response whose body was not the JSON we expected.
    MalformedBody { message: String },
    /// The request could not be built.
    Setup { message: String },
}

impl From<reqwest::Error> for RawFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            RawFailure::Setup {
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            RawFailure::Status {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            RawFailure::NoResponse {
                message: err.to_string(),
            }
        }
    }
}

pub fn classify(failure: RawFailure) -> ClassifiedError {
    match failure {
        RawFailure::NoResponse { .. } => ClassifiedError {
            kind: ErrorKind::Network,
            message: NETWORK_MESSAGE.to_string(),
            status: None,
            details: None,
        },
        RawFailure::Status { status, body } => classify_status(status, &body),
        RawFailure::MalformedBody { message } | RawFailure::Setup { message } => {
            ClassifiedError {
                kind: ErrorKind::Unknown,
                message: if message.is_empty() {
                    UNKNOWN_MESSAGE.to_string()
                } else {
                    message
                },
                status: None,
                details: None,
            }
        }
    }
}

fn classify_status(status: u16, body: &str) -> ClassifiedError {
    let body = parse_body(body);
    let error_text = body
        .as_ref()
        .and_then(|b| b.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let details = body
        .as_ref()
        .and_then(|b| b.get("details"))
        .and_then(Value::as_object)
        .cloned();

    let (kind, message, details) = match status {
        401 if has_token_invalid_code(body.as_ref()) => {
            (ErrorKind::TokenExpired, TOKEN_EXPIRED_MESSAGE.to_string(), details)
        }
        401 => (ErrorKind::Unauthorized, UNAUTHORIZED_MESSAGE.to_string(), details),
        403 => (ErrorKind::Forbidden, FORBIDDEN_MESSAGE.to_string(), details),
        422 => (
            ErrorKind::Validation,
            error_text.unwrap_or_else(|| VALIDATION_MESSAGE.to_string()),
            details.or_else(|| validation_details(body)),
        ),
        429 => (ErrorKind::RateLimit, RATE_LIMIT_MESSAGE.to_string(), details),
        500..=599 => (
            ErrorKind::ServerError,
            error_text.unwrap_or_else(|| SERVER_ERROR_MESSAGE.to_string()),
            details,
        ),
        _ => (
            ErrorKind::Unknown,
            error_text.unwrap_or_else(|| UNKNOWN_MESSAGE.to_string()),
            details,
        ),
    };

    ClassifiedError {
        kind,
        message,
        status: Some(status),
        details,
    }
}

fn parse_body(body: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(body) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn has_token_invalid_code(body: Option<&Map<String, Value>>) -> bool {
    body.and_then(|b| b.get("code"))
        .and_then(Value::as_str)
        .is_some_and(|code| TOKEN_INVALID_CODES.contains(&code))
}

// Field errors come back either under `detail` or as the top-level object.
fn validation_details(body: Option<Map<String, Value>>) -> Option<Map<String, Value>> {
    let mut body = body?;
    match body.remove("detail") {
        Some(Value::Object(detail)) => Some(detail),
        Some(other) => {
            body.insert("detail".to_string(), other);
            Some(body)
        }
        None => Some(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(status: u16, body: Value) -> ClassifiedError {
        classify(RawFailure::Status {
            status,
            body: body.to_string(),
        })
    }

    #[test]
    fn no_response_is_network() {
        let err = classify(RawFailure::NoResponse {
            message: "connection refused".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(err.status(), None);
        assert!(err.is_retryable());
    }

    #[test]
    fn unauthorized_without_marker() {
        let err = status(401, json!({"detail": "Authentication credentials were not provided."}));
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.status(), Some(401));
        assert!(err.is_auth_invalid());
    }

    #[test]
    fn unauthorized_with_token_marker_is_token_expired() {
        let err = status(401, json!({"detail": "Token is invalid", "code": "token_not_valid"}));
        assert_eq!(err.kind(), ErrorKind::TokenExpired);

        let err = status(401, json!({"code": "token_expired"}));
        assert_eq!(err.kind(), ErrorKind::TokenExpired);
    }

    #[test]
    fn unauthorized_with_unrelated_code_stays_unauthorized() {
        let err = status(401, json!({"code": "not_authenticated"}));
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn unauthorized_with_malformed_body() {
        let err = classify(RawFailure::Status {
            status: 401,
            body: "<html>nope</html>".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn forbidden() {
        let err = status(403, json!({}));
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.message(), FORBIDDEN_MESSAGE);
    }

    #[test]
    fn validation_carries_field_details() {
        let err = status(
            422,
            json!({"error": "Invalid application", "details": {"status": ["Not a valid choice."]}}),
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.message(), "Invalid application");
        assert_eq!(
            err.details().and_then(|d| d.get("status")),
            Some(&json!(["Not a valid choice."]))
        );
    }

    #[test]
    fn validation_details_fall_back_to_detail_then_body() {
        let err = status(422, json!({"detail": {"position": ["Position is required"]}}));
        assert!(err.details().is_some_and(|d| d.contains_key("position")));

        let err = status(422, json!({"company_name": ["This field is required."]}));
        assert!(err.details().is_some_and(|d| d.contains_key("company_name")));
        assert_eq!(err.message(), VALIDATION_MESSAGE);
    }

    #[test]
    fn rate_limit_has_one_canonical_message() {
        let err = status(429, json!({"error": "quota exceeded"}));
        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert_eq!(err.message(), RATE_LIMIT_MESSAGE);
    }

    #[test]
    fn server_errors() {
        for code in [500, 502, 503, 599] {
            assert_eq!(status(code, json!({})).kind(), ErrorKind::ServerError);
        }
        let err = status(500, json!({"error": "Internal Server Error"}));
        assert_eq!(err.message(), "Internal Server Error");
    }

    #[test]
    fn other_statuses_are_unknown() {
        let err = status(404, json!({"error": "Not Found"}));
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.message(), "Not Found");
        assert_eq!(err.status(), Some(404));

        let err = classify(RawFailure::Status {
            status: 409,
            body: String::new(),
        });
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.message(), UNKNOWN_MESSAGE);
    }

    #[test]
    fn malformed_and_setup_failures_are_unknown() {
        let err = classify(RawFailure::MalformedBody {
            message: "expected value at line 1 column 1".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(!err.is_retryable());

        let err = classify(RawFailure::Setup { message: String::new() });
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.message(), UNKNOWN_MESSAGE);
    }
}
