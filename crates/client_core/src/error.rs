use cinema_shared::error::{ApiError, ErrorCode};
use thiserror::Error;

/// Input rejected before any request is sent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("either a positive duration or an end time is required")]
    MissingDurationOrEnd,
    #[error("duration must be a whole number of minutes, got '{0}'")]
    InvalidDuration(String),
    #[error("{field} must be a date-time like 2025-05-01T18:00, got '{value}'")]
    InvalidDateTime { field: &'static str, value: String },
    #[error("{field} must be a date like 2025-05-01, got '{value}'")]
    InvalidDate { field: &'static str, value: String },
    #[error("score must be a number between 0 and 10, got '{0}'")]
    ScoreNotANumber(String),
    #[error("score must be between 0 and 10, got {0}")]
    ScoreOutOfRange(f64),
    #[error("score must be a whole number, got {0}")]
    ScoreNotWhole(f64),
    #[error("review comments must not be empty")]
    EmptyComments,
}

/// Empty error bodies already carry the `HTTP <status>:` prefix.
fn http_display(status: u16, message: &str) -> String {
    let prefix = format!("HTTP {status}: ");
    if message.starts_with(&prefix) {
        message.to_string()
    } else {
        format!("{prefix}{message}")
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{}", http_display(*status, message))]
    Http {
        status: u16,
        code: ErrorCode,
        message: String,
        detail: Option<ApiError>,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{action} is not permitted for the current user and state")]
    NotPermitted { action: &'static str },
    #[error("not logged in")]
    NotLoggedIn,
    #[error("{0} has not been loaded")]
    NotLoaded(&'static str),
    #[error("unexpected response for {context}: {reason}")]
    UnexpectedResponse {
        context: &'static str,
        reason: String,
    },
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ClientError {
    /// Text shown to the user. Server rejections are shown exactly as the
    /// server phrased them.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ClientError::Validation(_)
                | ClientError::NotPermitted { .. }
                | ClientError::NotLoggedIn
                | ClientError::NotLoaded(_)
        )
    }

    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            ClientError::NotLoggedIn
                | ClientError::Http {
                    code: ErrorCode::Unauthorized,
                    ..
                }
        )
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_surface_the_server_text_verbatim() {
        let err = ClientError::Http {
            status: 409,
            code: ErrorCode::Conflict,
            message: "Only REVIEWED screenings can be approved".into(),
            detail: None,
        };
        assert_eq!(err.user_message(), "Only REVIEWED screenings can be approved");
        assert_eq!(err.to_string(), "HTTP 409: Only REVIEWED screenings can be approved");
        assert_eq!(err.status(), Some(409));
        assert!(!err.is_local());
    }

    #[test]
    fn empty_body_fallback_is_not_prefixed_twice() {
        let err = ClientError::Http {
            status: 404,
            code: ErrorCode::NotFound,
            message: "HTTP 404: Not Found".into(),
            detail: None,
        };
        assert_eq!(err.to_string(), "HTTP 404: Not Found");
    }

    #[test]
    fn unauthorized_requires_reauth() {
        let err = ClientError::Http {
            status: 401,
            code: ErrorCode::Unauthorized,
            message: "Bad credentials".into(),
            detail: None,
        };
        assert!(err.requires_reauth());
        assert!(ClientError::NotLoggedIn.requires_reauth());
        assert!(!ClientError::Validation(ValidationError::EmptyComments).requires_reauth());
    }
}
