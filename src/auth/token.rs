//! Token endpoint exchanges: the two OAuth2 grant flows.
//!
//! Both grants POST a form-encoded body to `{base_url}/v1/oauth/token`,
//! authenticated with HTTP Basic auth built from `app_key:app_secret`.
//! Responses deserialize into [`TokenResponse`]; a response missing either
//! the access or the refresh token counts as a failed exchange, whatever
//! the HTTP status said.

use serde::Deserialize;
use tracing::debug;

use super::credentials::Credentials;
use super::error::AuthError;

/// Token endpoint path relative to the API base URL
const TOKEN_ENDPOINT_PATH: &str = "/v1/oauth/token";

/// Raw token endpoint response with named optional fields.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    // The endpoint has no standardized error schema; these two fields cover
    // the common shape and feed the error message when tokens are absent.
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// Convert into a usable token set. Requires both the access and the
    /// refresh token, keeping the both-or-neither invariant.
    fn into_tokens(self) -> Result<GrantTokens, String> {
        match (self.access_token, self.refresh_token) {
            (Some(access_token), Some(refresh_token)) => Ok(GrantTokens {
                access_token,
                refresh_token,
                id_token: self.id_token,
            }),
            (access, _) => {
                let mut reason = match access {
                    None => "response missing access_token".to_string(),
                    Some(_) => "response missing refresh_token".to_string(),
                };
                if let Some(error) = self.error {
                    reason.push_str(&format!(" ({})", error));
                }
                if let Some(description) = self.error_description {
                    reason.push_str(&format!(": {}", description));
                }
                Err(reason)
            }
        }
    }
}

/// Tokens from a successful grant.
#[derive(Debug, Clone)]
pub struct GrantTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub id_token: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Grant {
    AuthorizationCode,
    RefreshToken,
}

impl Grant {
    fn name(&self) -> &'static str {
        match self {
            Grant::AuthorizationCode => "authorization_code",
            Grant::RefreshToken => "refresh_token",
        }
    }

    fn failure(&self, reason: String) -> AuthError {
        match self {
            Grant::AuthorizationCode => AuthError::AuthorizationFailed(reason),
            Grant::RefreshToken => AuthError::RefreshFailed(reason),
        }
    }
}

/// Client for the token endpoint.
pub struct TokenClient {
    client: reqwest::Client,
    endpoint: String,
    app_key: String,
    app_secret: String,
    redirect_uri: String,
}

impl TokenClient {
    pub fn new(client: reqwest::Client, credentials: &Credentials) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}{}",
                credentials.base_url.trim_end_matches('/'),
                TOKEN_ENDPOINT_PATH
            ),
            app_key: credentials.app_key.clone(),
            app_secret: credentials.app_secret.clone(),
            redirect_uri: credentials.callback_url.clone(),
        }
    }

    /// Exchange an authorization code for a fresh token set.
    pub async fn exchange_authorization_code(&self, code: &str) -> Result<GrantTokens, AuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        self.request_tokens(Grant::AuthorizationCode, &form).await
    }

    /// Exchange a refresh token for a new access + refresh token pair.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<GrantTokens, AuthError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        self.request_tokens(Grant::RefreshToken, &form).await
    }

    async fn request_tokens(
        &self,
        grant: Grant,
        form: &[(&str, &str)],
    ) -> Result<GrantTokens, AuthError> {
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.app_key, Some(&self.app_secret))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), grant = grant.name(), "token endpoint rejected grant");
            return Err(grant.failure(format!(
                "status {}: {}",
                status.as_u16(),
                AuthError::truncate_body(&body)
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|_| {
            grant.failure(format!(
                "unparseable token response: {}",
                AuthError::truncate_body(&body)
            ))
        })?;

        parsed.into_tokens().map_err(|reason| grant.failure(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            app_key: "client-id".to_string(),
            app_secret: "client-secret".to_string(),
            callback_url: "https://127.0.0.1:8182".to_string(),
            base_url: "https://api.example.com/".to_string(),
        }
    }

    #[test]
    fn endpoint_derives_from_base_url() {
        let token_client = TokenClient::new(reqwest::Client::new(), &credentials());
        assert_eq!(token_client.endpoint, "https://api.example.com/v1/oauth/token");
    }

    #[test]
    fn complete_response_yields_tokens() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token": "a1", "refresh_token": "r1", "id_token": "i1"}"#,
        )
        .expect("parse");

        let tokens = response.into_tokens().expect("tokens");
        assert_eq!(tokens.access_token, "a1");
        assert_eq!(tokens.refresh_token, "r1");
        assert_eq!(tokens.id_token.as_deref(), Some("i1"));
    }

    #[test]
    fn response_without_access_token_is_rejected() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"error": "invalid_grant", "error_description": "token is invalid"}"#,
        )
        .expect("parse");

        let reason = response.into_tokens().expect_err("no tokens");
        assert!(reason.contains("access_token"));
        assert!(reason.contains("invalid_grant"));
        assert!(reason.contains("token is invalid"));
    }

    #[test]
    fn response_without_refresh_token_is_rejected() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token": "a1"}"#).expect("parse");

        let reason = response.into_tokens().expect_err("no tokens");
        assert!(reason.contains("refresh_token"));
    }

    #[test]
    fn missing_id_token_is_allowed() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token": "a1", "refresh_token": "r1"}"#)
                .expect("parse");

        let tokens = response.into_tokens().expect("tokens");
        assert_eq!(tokens.id_token, None);
    }
}
