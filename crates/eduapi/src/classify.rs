//! Response classification.
//!
//! Every dispatched request ends in an [`Outcome`]. [`classify`] maps an
//! outcome to a [`Classification`] without touching the outside world, and
//! [`Classification::effects`] turns that into the side effects the client
//! must perform. Keeping this pure lets the policy be tested on its own.

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::Error;

/// Toast shown when the backend answers 403.
pub const PERMISSION_DENIED_MESSAGE: &str = "You do not have permission to perform this action.";

/// Toast shown when the backend answers 500.
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";

/// Toast shown when a failure carries no usable message.
pub const FALLBACK_MESSAGE: &str = "Something went wrong.";

/// The result of one dispatched request, as seen by the interceptors.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The backend answered with a 2xx status.
    Success {
        /// Request path, relative to the base URL.
        path: String,
        /// Response status.
        status: StatusCode,
    },
    /// The request failed, either at the transport level or with a non-2xx status.
    Failure(Failure),
}

/// Details of a failed request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Failure {
    /// Request path, relative to the base URL.
    pub path: String,
    /// Response status, if a response arrived.
    pub status: Option<StatusCode>,
    /// Response body, if one arrived.
    pub body: Option<Value>,
    /// Transport-level error message, if the request never completed.
    pub transport: Option<String>,
}

impl Outcome {
    /// Request path this outcome belongs to.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Success { path, .. } => path,
            Self::Failure(failure) => &failure.path,
        }
    }

    /// Response status, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Success { status, .. } => Some(*status),
            Self::Failure(failure) => failure.status,
        }
    }

    /// Check if this outcome is a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

impl Failure {
    /// Build the failure view of a request error.
    ///
    /// Returns `None` for errors that did not come from a dispatched request.
    #[must_use]
    pub fn from_error(error: &Error) -> Option<Self> {
        match error {
            Error::Status { path, status, body } => Some(Self {
                path: path.clone(),
                status: Some(*status),
                body: body.clone(),
                transport: None,
            }),
            Error::Transport {
                path,
                status,
                source,
            } => Some(Self {
                path: path.clone(),
                status: *status,
                body: None,
                transport: Some(source.to_string()),
            }),
            _ => None,
        }
    }

    /// The best user-facing message this failure carries.
    ///
    /// Priority: body `message`, body `detail`, transport error, fallback.
    /// Empty strings are skipped.
    #[must_use]
    pub fn message(&self) -> String {
        self.body_field("message")
            .or_else(|| self.body_field("detail"))
            .or_else(|| self.transport.as_deref().filter(|m| !m.is_empty()))
            .unwrap_or(FALLBACK_MESSAGE)
            .to_string()
    }

    fn body_field(&self, field: &str) -> Option<&str> {
        self.body
            .as_ref()?
            .get(field)?
            .as_str()
            .filter(|s| !s.is_empty())
    }
}

/// What an outcome means for the session and the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The request succeeded.
    Success,
    /// 401: the session credential is invalid or expired.
    SessionInvalid,
    /// 403: the user may not perform this action.
    PermissionDenied,
    /// 500: the backend failed.
    ServerFault,
    /// Any other failure, with the best message it carried.
    Unclassified {
        /// Message to show the user.
        message: String,
    },
}

/// Side effects to perform for a classified outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Effects {
    /// Delete the session token.
    pub clear_token: bool,
    /// Navigate to the login entry point.
    pub navigate_to_login: bool,
    /// Show this message to the user.
    pub toast: Option<String>,
}

impl Effects {
    /// No side effects.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Check if there is nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.clear_token && !self.navigate_to_login && self.toast.is_none()
    }
}

impl Classification {
    /// The side effects this classification calls for.
    ///
    /// At most one toast is produced, and none for [`Classification::SessionInvalid`].
    #[must_use]
    pub fn effects(&self) -> Effects {
        match self {
            Self::Success => Effects::none(),
            Self::SessionInvalid => Effects {
                clear_token: true,
                navigate_to_login: true,
                toast: None,
            },
            Self::PermissionDenied => Effects {
                toast: Some(PERMISSION_DENIED_MESSAGE.to_string()),
                ..Effects::none()
            },
            Self::ServerFault => Effects {
                toast: Some(SERVER_ERROR_MESSAGE.to_string()),
                ..Effects::none()
            },
            Self::Unclassified { message } => Effects {
                toast: Some(message.clone()),
                ..Effects::none()
            },
        }
    }
}

/// Classify an outcome.
#[must_use]
pub fn classify(outcome: &Outcome) -> Classification {
    let failure = match outcome {
        Outcome::Success { .. } => return Classification::Success,
        Outcome::Failure(failure) => failure,
    };

    match failure.status {
        Some(StatusCode::UNAUTHORIZED) => Classification::SessionInvalid,
        Some(StatusCode::FORBIDDEN) => Classification::PermissionDenied,
        Some(StatusCode::INTERNAL_SERVER_ERROR) => Classification::ServerFault,
        _ => Classification::Unclassified {
            message: failure.message(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failure(status: Option<StatusCode>, body: Option<Value>, transport: Option<&str>) -> Outcome {
        Outcome::Failure(Failure {
            path: "notes/".to_string(),
            status,
            body,
            transport: transport.map(String::from),
        })
    }

    fn toast_for(outcome: &Outcome) -> Option<String> {
        classify(outcome).effects().toast
    }

    #[test]
    fn test_success_has_no_effects() {
        let outcome = Outcome::Success {
            path: "notes/".to_string(),
            status: StatusCode::OK,
        };
        assert_eq!(classify(&outcome), Classification::Success);
        assert!(classify(&outcome).effects().is_empty());
    }

    #[test]
    fn test_unauthorized_clears_session_without_toast() {
        let outcome = failure(
            Some(StatusCode::UNAUTHORIZED),
            Some(json!({"detail": "Token expired"})),
            None,
        );
        let effects = classify(&outcome).effects();

        assert_eq!(classify(&outcome), Classification::SessionInvalid);
        assert!(effects.clear_token);
        assert!(effects.navigate_to_login);
        assert!(effects.toast.is_none());
    }

    #[test]
    fn test_forbidden_toast() {
        let outcome = failure(
            Some(StatusCode::FORBIDDEN),
            Some(json!({"message": "ignored"})),
            None,
        );
        assert_eq!(
            toast_for(&outcome).as_deref(),
            Some("You do not have permission to perform this action.")
        );
        assert!(!classify(&outcome).effects().clear_token);
    }

    #[test]
    fn test_server_error_toast() {
        let outcome = failure(Some(StatusCode::INTERNAL_SERVER_ERROR), None, None);
        assert_eq!(
            toast_for(&outcome).as_deref(),
            Some("Server error. Please try again later.")
        );
    }

    #[test]
    fn test_message_field_wins() {
        let outcome = failure(
            Some(StatusCode::BAD_REQUEST),
            Some(json!({"message": "X", "detail": "Y"})),
            Some("Network Error"),
        );
        assert_eq!(toast_for(&outcome).as_deref(), Some("X"));
    }

    #[test]
    fn test_detail_field_used_without_message() {
        let outcome = failure(
            Some(StatusCode::NOT_FOUND),
            Some(json!({"detail": "Y"})),
            None,
        );
        assert_eq!(toast_for(&outcome).as_deref(), Some("Y"));
    }

    #[test]
    fn test_transport_message_used_without_body() {
        let outcome = failure(None, None, Some("Network Error"));
        assert_eq!(toast_for(&outcome).as_deref(), Some("Network Error"));
    }

    #[test]
    fn test_fallback_message() {
        let outcome = failure(None, None, None);
        assert_eq!(toast_for(&outcome).as_deref(), Some("Something went wrong."));
    }

    #[test]
    fn test_non_string_and_empty_fields_skipped() {
        let outcome = failure(
            Some(StatusCode::BAD_REQUEST),
            Some(json!({"message": "", "detail": ["field required"]})),
            None,
        );
        assert_eq!(toast_for(&outcome).as_deref(), Some(FALLBACK_MESSAGE));
    }

    #[test]
    fn test_non_object_body_falls_through() {
        let outcome = failure(
            Some(StatusCode::BAD_GATEWAY),
            Some(json!("upstream unavailable")),
            None,
        );
        assert_eq!(toast_for(&outcome).as_deref(), Some(FALLBACK_MESSAGE));
    }

    #[test]
    fn test_other_server_errors_are_unclassified() {
        let outcome = failure(
            Some(StatusCode::SERVICE_UNAVAILABLE),
            Some(json!({"detail": "Maintenance"})),
            None,
        );
        assert_eq!(
            classify(&outcome),
            Classification::Unclassified {
                message: "Maintenance".to_string()
            }
        );
    }

    #[test]
    fn test_failure_from_status_error() {
        let err = Error::Status {
            path: "quizzes/".to_string(),
            status: StatusCode::CONFLICT,
            body: Some(json!({"detail": "exists"})),
        };
        let failure = Failure::from_error(&err).unwrap();

        assert_eq!(failure.path, "quizzes/");
        assert_eq!(failure.status, Some(StatusCode::CONFLICT));
        assert_eq!(failure.message(), "exists");
    }

    #[test]
    fn test_failure_from_non_request_error() {
        assert!(Failure::from_error(&Error::internal("bug")).is_none());
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome = failure(Some(StatusCode::FORBIDDEN), None, None);
        assert_eq!(outcome.path(), "notes/");
        assert_eq!(outcome.status(), Some(StatusCode::FORBIDDEN));
        assert!(outcome.is_failure());
    }
}
