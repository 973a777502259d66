use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not authenticated - call ensure_authenticated() first")]
    Unauthenticated,

    #[error("Authorization code exchange rejected: {0}")]
    AuthorizationFailed(String),

    #[error("Token refresh rejected: {0}")]
    RefreshFailed(String),

    #[error("Redirect URL contains no authorization code")]
    MalformedRedirect,

    #[error("Network error reaching token endpoint: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Maximum length for response bodies quoted in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl AuthError {
    /// Truncate a response body to avoid dumping excessive data into errors
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.chars().count() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let truncated: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
            format!("{}... (truncated, {} total bytes)", truncated, body.len())
        }
    }
}
