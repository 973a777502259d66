//! Authentication session: decides when to reauthorize versus refresh and
//! derives the request headers used by API calls.
//!
//! The session holds the in-memory [`TokenSet`] and moves it between two
//! states: unauthenticated (no tokens) and authenticated (access + refresh
//! pair held). A full authorization blocks on the injected
//! [`RedirectPrompt`] while the user completes the browser grant; a refresh
//! is a plain exchange of the held refresh token. Failed exchanges never
//! touch the held tokens or the store.

use std::collections::HashMap;
use std::io::{self, Write};

use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap};
use tracing::{debug, info, warn};

use super::credentials::{
    Credentials, EnvStore, KEY_ACCESS_TOKEN, KEY_AUTH_CODE, KEY_AUTH_CODE_URL, KEY_ID_TOKEN,
    KEY_REFRESH_TOKEN,
};
use super::error::AuthError;
use super::token::{GrantTokens, TokenClient};

/// Browser authorization endpoint path relative to the API base URL
const AUTHORIZE_ENDPOINT_PATH: &str = "/v1/oauth/authorize";

/// Default store age, in days, beyond which a full authorization is forced.
/// Refresh tokens for the trader API stop working after seven days.
pub const DEFAULT_MAX_AGE_DAYS: i64 = 7;

/// Capability for obtaining the post-login redirect URL.
///
/// The console implementation blocks on stdin; UI contexts and tests
/// substitute their own source.
pub trait RedirectPrompt {
    fn prompt(&self, authorize_url: &str) -> Result<String>;
}

/// Prints the authorize URL and reads the pasted redirect URL from stdin.
pub struct StdinPrompt;

impl RedirectPrompt for StdinPrompt {
    fn prompt(&self, authorize_url: &str) -> Result<String> {
        println!("\nOpen this link in a browser to authenticate:\n\n{}\n", authorize_url);
        println!("After login, copy the full redirect URL from the address bar.");
        print!("Paste it here: ");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin()
            .read_line(&mut line)
            .context("Failed to read redirect URL")?;
        Ok(line.trim().to_string())
    }
}

/// In-memory token state.
///
/// `access_token` and `refresh_token` are either both present
/// (authenticated) or both absent; partial exchanges are never kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    pub auth_code_url: Option<String>,
    pub auth_code: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
}

impl TokenSet {
    /// Rebuild from persisted store values. A store missing either token,
    /// e.g. after a crash between writes, loads as unauthenticated.
    fn from_store(values: &HashMap<String, String>) -> Self {
        let get = |key: &str| values.get(key).filter(|value| !value.is_empty()).cloned();
        let mut tokens = TokenSet {
            auth_code_url: get(KEY_AUTH_CODE_URL),
            auth_code: get(KEY_AUTH_CODE),
            access_token: get(KEY_ACCESS_TOKEN),
            refresh_token: get(KEY_REFRESH_TOKEN),
            id_token: get(KEY_ID_TOKEN),
        };
        if tokens.access_token.is_none() || tokens.refresh_token.is_none() {
            tokens.access_token = None;
            tokens.refresh_token = None;
        }
        tokens
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some()
    }
}

/// Authentication session against the trader API.
pub struct Session {
    credentials: Credentials,
    store: EnvStore,
    token_client: TokenClient,
    prompt: Box<dyn RedirectPrompt>,
    tokens: TokenSet,
}

impl Session {
    /// Build a session, restoring any tokens already persisted in the store.
    pub fn new(
        credentials: Credentials,
        store: EnvStore,
        http: reqwest::Client,
        prompt: Box<dyn RedirectPrompt>,
    ) -> Result<Self> {
        let values = store.load()?;
        let tokens = TokenSet::from_store(&values);
        let token_client = TokenClient::new(http, &credentials);
        Ok(Self {
            credentials,
            store,
            token_client,
            prompt,
            tokens,
        })
    }

    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    /// URL the user must visit to grant access.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}{}?client_id={}&redirect_uri={}",
            self.credentials.base_url.trim_end_matches('/'),
            AUTHORIZE_ENDPOINT_PATH,
            self.credentials.app_key,
            self.credentials.callback_url
        )
    }

    /// Make sure usable tokens are held.
    ///
    /// Runs the full authorization flow when the store is older than
    /// `max_age_days` (or `force` is set), then always refreshes. A fresh
    /// code exchange and an immediate refresh both yield usable tokens, so
    /// the extra refresh is cheap and normalizes the state. A refresh
    /// failure is not fatal; previously held tokens stay in place until the
    /// remote API rejects them.
    pub async fn ensure_authenticated(&mut self, force: bool, max_age_days: i64) -> Result<()> {
        let age = self.store.age_days();
        if needs_authorization(age, max_age_days, force) {
            info!(age_days = age, force, "running full authorization");
            self.authorize().await?;
        }

        if let Err(e) = self.refresh().await {
            warn!("token refresh failed, keeping prior tokens: {}", e);
        }
        Ok(())
    }

    /// Request headers for authenticated API calls: the bearer token plus a
    /// JSON accept header. Errors with [`AuthError::Unauthenticated`] when
    /// no access token is held.
    pub fn headers(&self) -> Result<HeaderMap> {
        let Some(token) = self.tokens.access_token.as_deref() else {
            return Err(AuthError::Unauthenticated.into());
        };
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }

    /// Full authorization: browser grant, code extraction, code exchange.
    /// On failure nothing is persisted and the held tokens are untouched.
    pub async fn authorize(&mut self) -> Result<()> {
        let authorize_url = self.authorize_url();
        let redirect_url = self.prompt.prompt(&authorize_url)?;
        let code = extract_auth_code(&redirect_url)?;

        let granted = self.token_client.exchange_authorization_code(&code).await?;
        self.store_grant(&granted, Some((&redirect_url, &code)))?;
        info!("authorization complete, tokens stored");
        Ok(())
    }

    /// Exchange the held refresh token for a new token pair.
    pub async fn refresh(&mut self) -> Result<()> {
        let refresh_token = self
            .tokens
            .refresh_token
            .clone()
            .ok_or_else(|| AuthError::RefreshFailed("no refresh token held".to_string()))?;

        let granted = self.token_client.refresh_access_token(&refresh_token).await?;
        self.store_grant(&granted, None)?;
        debug!("access token refreshed");
        Ok(())
    }

    /// Persist every field of a successful exchange in one store write, then
    /// replace the in-memory token state.
    fn store_grant(
        &mut self,
        granted: &GrantTokens,
        authorization: Option<(&str, &str)>,
    ) -> Result<()> {
        let id_token = granted.id_token.clone().unwrap_or_default();
        let mut entries: Vec<(&str, &str)> = Vec::new();
        if let Some((redirect_url, code)) = authorization {
            entries.push((KEY_AUTH_CODE_URL, redirect_url));
            entries.push((KEY_AUTH_CODE, code));
        }
        entries.push((KEY_ACCESS_TOKEN, granted.access_token.as_str()));
        entries.push((KEY_REFRESH_TOKEN, granted.refresh_token.as_str()));
        entries.push((KEY_ID_TOKEN, id_token.as_str()));
        self.store.save_all(&entries)?;

        if let Some((redirect_url, code)) = authorization {
            self.tokens.auth_code_url = Some(redirect_url.to_string());
            self.tokens.auth_code = Some(code.to_string());
        }
        self.tokens.access_token = Some(granted.access_token.clone());
        self.tokens.refresh_token = Some(granted.refresh_token.clone());
        self.tokens.id_token = granted.id_token.clone();
        Ok(())
    }
}

/// Full authorization runs when the store has gone stale or the caller
/// forces it.
fn needs_authorization(age_days: i64, max_age_days: i64, force: bool) -> bool {
    force || age_days > max_age_days
}

/// Pull the `code` query parameter out of the pasted redirect URL: locate
/// the `code=` marker, truncate at the next `&`. The API %40-escapes the @
/// in email-shaped codes; undo that one escape.
pub fn extract_auth_code(redirect_url: &str) -> Result<String, AuthError> {
    let start = redirect_url
        .find("code=")
        .ok_or(AuthError::MalformedRedirect)?;
    let value = &redirect_url[start + "code=".len()..];
    let value = value.split('&').next().unwrap_or(value);
    Ok(value.replace("%40", "@"))
}
