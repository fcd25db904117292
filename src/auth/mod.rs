//! Google OAuth 2.0 credentials for the calendar service.
//!
//! The rest of the crate only ever asks [`CredentialProvider::get_valid_credential`]
//! for an [`AccessToken`]; loading the client secret, reusing or refreshing the
//! persisted token, and falling back to interactive consent all happen here.

mod client_secret;
mod credential;
mod token_store;

pub use client_secret::ClientSecret;
pub use credential::{
    authorization_url, extract_code, ConsentPrompt, CredentialProvider, CredentialState,
    GoogleTokenEndpoint, StdinConsentPrompt, TokenEndpoint, TokenResponse,
};
pub use token_store::{StoredToken, TokenStore};

use std::fmt;

/// The OAuth scope required for creating calendar events
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// A bearer token accepted by the calendar API
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep tokens out of logs
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}
