//! Authentication module: OAuth2 token lifecycle for the trader API.
//!
//! This module provides:
//! - `EnvStore` / `Credentials`: dotenv-file persistence of configuration and tokens
//! - `TokenClient`: the authorization-code and refresh-token grants
//! - `Session`: decides reauthorize-vs-refresh and derives request headers
//!
//! Tokens live in the same env file as the configuration; the file's age
//! drives the reauthorization decision.

pub mod credentials;
pub mod error;
pub mod session;
pub mod token;

pub use credentials::{Credentials, EnvStore};
pub use error::AuthError;
pub use session::{
    extract_auth_code, RedirectPrompt, Session, StdinPrompt, TokenSet, DEFAULT_MAX_AGE_DAYS,
};
pub use token::{GrantTokens, TokenClient, TokenResponse};
