use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        /// Full JSON body when the server sent one.
        data: Option<Value>,
    },
    #[error("Network error: {0}")]
    Network(String),
    /// A 401 outside the login/signup pages; the user has been sent to login.
    #[error("Session expired or not authenticated. Please login.")]
    Redirected,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, ApiError::Redirected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_backend_message() {
        let err = ApiError::Http {
            status: 409,
            message: "Username or email already exists".to_string(),
            data: None,
        };
        assert_eq!(err.to_string(), "Username or email already exists");
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn non_http_errors_have_no_status() {
        assert_eq!(ApiError::Network("refused".into()).status(), None);
        assert!(ApiError::Redirected.is_redirect());
    }
}
