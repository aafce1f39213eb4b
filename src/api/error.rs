//! Typed API failures.

use thiserror::Error;

/// Everything that can go wrong talking to the publishing API.
///
/// Status errors come from a response the server actually sent;
/// [`ApiError::Transport`] means no usable response arrived at all.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not authenticated.")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Post not found.")]
    NotFound,

    #[error("Post unpublished.")]
    Gone,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests in a short period of time. Try again later.")]
    RateLimited,

    #[error("Incorrect password.")]
    IncorrectPassword,

    #[error("User does not exist.")]
    UserNotFound,

    #[error("Access token is invalid or doesn't exist.")]
    InvalidToken,

    #[error("Unexpected response from server: {status}. {message}")]
    Unexpected { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Wrong data returned from API: {0}")]
    Decode(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Map a non-2xx status and the envelope's message to an error.
    pub fn from_status(status: u16, message: &str) -> Self {
        match status {
            400 => ApiError::BadRequest(message.to_string()),
            401 => ApiError::Unauthenticated,
            403 => ApiError::Forbidden(message.to_string()),
            404 => ApiError::NotFound,
            409 => ApiError::Conflict(message.to_string()),
            410 => ApiError::Gone,
            429 => ApiError::RateLimited,
            _ => ApiError::Unexpected {
                status,
                message: message.to_string(),
            },
        }
    }

    /// Status mapping for the login endpoint, which reports bad credentials
    /// more specifically.
    pub fn from_login_status(status: u16, message: &str) -> Self {
        match status {
            401 => ApiError::IncorrectPassword,
            404 => ApiError::UserNotFound,
            _ => Self::from_status(status, message),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }

    /// True when no response was received (connection, proxy, timeout).
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(ApiError::from_status(400, "no body"), ApiError::BadRequest(m) if m == "no body"));
        assert!(matches!(ApiError::from_status(401, ""), ApiError::Unauthenticated));
        assert!(ApiError::from_status(404, "").is_not_found());
        assert!(matches!(ApiError::from_status(410, ""), ApiError::Gone));
        assert!(matches!(ApiError::from_status(409, "taken"), ApiError::Conflict(_)));
        assert!(matches!(ApiError::from_status(429, ""), ApiError::RateLimited));
        assert!(matches!(
            ApiError::from_status(500, "oops"),
            ApiError::Unexpected { status: 500, .. }
        ));
    }

    #[test]
    fn test_login_status_mapping() {
        assert!(matches!(ApiError::from_login_status(401, ""), ApiError::IncorrectPassword));
        assert!(matches!(ApiError::from_login_status(404, ""), ApiError::UserNotFound));
        assert!(matches!(ApiError::from_login_status(429, ""), ApiError::RateLimited));
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::from_status(400, "Missing body").to_string(), "Bad request: Missing body");
        assert_eq!(ApiError::NotFound.to_string(), "Post not found.");
        assert_eq!(ApiError::IncorrectPassword.to_string(), "Incorrect password.");
    }
}
