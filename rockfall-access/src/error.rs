use rockfall_core::error::AppError;
use thiserror::Error;

use crate::guard::AccessDenied;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("session is no longer authorized")]
    Unauthorized,

    #[error("profile unavailable: {0}")]
    ProfileUnavailable(String),

    #[error("auth service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("auth service returned {status}: {body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("auth service sent an unusable response: {0}")]
    MalformedResponse(String),

    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("corrupt session record: {0}")]
    CorruptRecord(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),
}

impl SessionError {
    /// Failures the user can fix by retrying with other input.
    pub fn is_credential_error(&self) -> bool {
        matches!(self, SessionError::InvalidCredentials | SessionError::Validation(_))
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidCredentials => AppError::AuthError(anyhow::Error::new(err)),
            SessionError::Unauthorized => AppError::Unauthorized(anyhow::Error::new(err)),
            SessionError::Validation(_) => AppError::BadRequest(anyhow::Error::new(err)),
            SessionError::ProfileUnavailable(_)
            | SessionError::Transport(_)
            | SessionError::UnexpectedStatus { .. }
            | SessionError::MalformedResponse(_) => AppError::BadGateway(err.to_string()),
            SessionError::Storage(_) | SessionError::CorruptRecord(_) => {
                AppError::InternalError(anyhow::Error::new(err))
            }
        }
    }
}

impl From<AccessDenied> for AppError {
    fn from(err: AccessDenied) -> Self {
        match err {
            AccessDenied::Unauthenticated => AppError::Unauthorized(anyhow::Error::new(err)),
            AccessDenied::MissingRole { .. }
            | AccessDenied::Site(_)
            | AccessDenied::ProfileUnavailable => AppError::Forbidden(anyhow::Error::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::View;
    use rockfall_core::axum::http::StatusCode;

    #[test]
    fn session_errors_map_to_http_statuses() {
        assert_eq!(
            AppError::from(SessionError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(SessionError::ProfileUnavailable("down".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn access_denials_map_to_http_statuses() {
        assert_eq!(
            AppError::from(AccessDenied::Unauthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
        let missing = AccessDenied::MissingRole {
            view: View::Users,
            required: View::Users.required_roles(),
        };
        assert_eq!(AppError::from(missing).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::from(AccessDenied::Site("mine-9".into())).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(AccessDenied::ProfileUnavailable).status(),
            StatusCode::FORBIDDEN
        );
    }
}
