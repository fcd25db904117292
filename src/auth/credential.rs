//! Credential provider state machine.
//!
//! ```text
//! Unauthenticated ──stored token valid / refreshed──────────────▶ Authorized
//!        │                                                          ▲
//!        └─no usable token─▶ AwaitingInteractiveConsent ──code──────┘
//! ```

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{AccessToken, ClientSecret, StoredToken, TokenStore, CALENDAR_SCOPE};
use crate::api::error::{check_status, ApiError};
use crate::error::SyncError;

const SERVICE_NAME: &str = "google-calendar";
const ENDPOINT_NAME: &str = "google-oauth";

/// Where the provider currently stands with the calendar service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialState {
    /// No usable credential is known
    Unauthenticated,
    /// Waiting for the user to approve access at `auth_url`
    AwaitingInteractiveConsent { auth_url: String },
    /// Holding a token that was valid when it was obtained
    Authorized(StoredToken),
}

/// Successful response from the OAuth token endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Convert into the persisted form, keeping `previous_refresh` when the
    /// endpoint did not issue a new refresh token
    fn into_stored(self, previous_refresh: Option<String>, now: DateTime<Utc>) -> StoredToken {
        let scopes = match self.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => vec![CALENDAR_SCOPE.to_string()],
        };
        StoredToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: self.expires_in.map(|secs| now + Duration::seconds(secs)),
            scopes,
        }
    }
}

/// OAuth token endpoint operations
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Exchange an authorization code for tokens
    async fn exchange_code(
        &self,
        secret: &ClientSecret,
        code: &str,
    ) -> Result<TokenResponse, ApiError>;

    /// Obtain a fresh access token from a refresh token
    async fn refresh(
        &self,
        secret: &ClientSecret,
        refresh_token: &str,
    ) -> Result<TokenResponse, ApiError>;
}

/// Google's token endpoint, at the `token_uri` named by the client secret
#[derive(Default)]
pub struct GoogleTokenEndpoint {
    client: Client,
}

impl GoogleTokenEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    async fn post_form(
        &self,
        token_uri: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, ApiError> {
        debug!("OAuth POST: {}", token_uri);

        let response = self
            .client
            .post(token_uri)
            .form(form)
            .send()
            .await
            .map_err(|e| ApiError::network(ENDPOINT_NAME, e.to_string()))?;

        let response = check_status(ENDPOINT_NAME, response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::parse(ENDPOINT_NAME, e))
    }
}

#[async_trait]
impl TokenEndpoint for GoogleTokenEndpoint {
    async fn exchange_code(
        &self,
        secret: &ClientSecret,
        code: &str,
    ) -> Result<TokenResponse, ApiError> {
        self.post_form(
            &secret.token_uri,
            &[
                ("client_id", secret.client_id.as_str()),
                ("client_secret", secret.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", secret.redirect_uri()),
            ],
        )
        .await
    }

    async fn refresh(
        &self,
        secret: &ClientSecret,
        refresh_token: &str,
    ) -> Result<TokenResponse, ApiError> {
        self.post_form(
            &secret.token_uri,
            &[
                ("client_id", secret.client_id.as_str()),
                ("client_secret", secret.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ],
        )
        .await
    }
}

/// Asks the user to approve access and hand back the authorization code
pub trait ConsentPrompt: Send + Sync {
    /// Show `auth_url` and return what the user pasted back
    fn request_code(&self, auth_url: &str) -> io::Result<String>;
}

/// Prompt on the controlling terminal
pub struct StdinConsentPrompt;

impl ConsentPrompt for StdinConsentPrompt {
    fn request_code(&self, auth_url: &str) -> io::Result<String> {
        println!("\nPlease visit this URL to authorize access to your calendar:\n");
        println!("{}\n", auth_url);
        println!("After approving, paste the authorization code (or the full URL you were");
        println!("redirected to).");
        print!("Code: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        Ok(input)
    }
}

/// Build the consent URL for `secret`
pub fn authorization_url(secret: &ClientSecret) -> Result<String, SyncError> {
    let url = Url::parse_with_params(
        &secret.auth_uri,
        &[
            ("client_id", secret.client_id.as_str()),
            ("redirect_uri", secret.redirect_uri()),
            ("response_type", "code"),
            ("scope", CALENDAR_SCOPE),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|e| SyncError::authorization(SERVICE_NAME, format!("invalid auth_uri: {}", e)))?;
    Ok(url.into())
}

/// Pull the authorization code out of what the user pasted: either the
/// bare code or the URL the browser was redirected to
pub fn extract_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        let url = Url::parse(input).ok()?;
        return url
            .query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.into_owned())
            .filter(|code| !code.is_empty());
    }

    Some(input.to_string())
}

/// A refresh rejected because the grant was revoked or has expired.
///
/// A 401 means the client itself was rejected (`invalid_client`), and the
/// stored refresh token may still be good.
fn is_revoked(err: &ApiError) -> bool {
    match err {
        ApiError::HttpError {
            status: 400,
            message,
            ..
        } => message.contains("invalid_grant"),
        _ => false,
    }
}

/// Hands out valid calendar access tokens
pub struct CredentialProvider<E: TokenEndpoint = GoogleTokenEndpoint> {
    secret: ClientSecret,
    store: TokenStore,
    endpoint: E,
    prompt: Option<Arc<dyn ConsentPrompt>>,
    state: CredentialState,
}

impl CredentialProvider<GoogleTokenEndpoint> {
    pub fn new(secret: ClientSecret, store: TokenStore) -> Self {
        Self::with_endpoint(secret, store, GoogleTokenEndpoint::new())
    }
}

impl<E: TokenEndpoint> CredentialProvider<E> {
    pub fn with_endpoint(secret: ClientSecret, store: TokenStore, endpoint: E) -> Self {
        Self {
            secret,
            store,
            endpoint,
            prompt: None,
            state: CredentialState::Unauthenticated,
        }
    }

    /// Allow falling back to interactive consent through `prompt`
    pub fn with_prompt(mut self, prompt: impl ConsentPrompt + 'static) -> Self {
        self.prompt = Some(Arc::new(prompt));
        self
    }

    pub fn state(&self) -> &CredentialState {
        &self.state
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Return an access token that is valid now.
    ///
    /// Reuses the persisted token when it is still valid, refreshes it when
    /// it has expired, and asks for interactive consent when there is nothing
    /// usable. Fails with [`SyncError::Authorization`] when consent is needed
    /// but no prompt was configured.
    pub async fn get_valid_credential(&mut self) -> Result<AccessToken, SyncError> {
        let now = Utc::now();

        let known = match &self.state {
            CredentialState::Authorized(token) => Some(token.clone()),
            _ => self.store.load()?,
        };

        if let Some(token) = known {
            if let Some(token) = self.reuse_or_refresh(token, now).await? {
                return Ok(self.authorize(token));
            }
        }

        let token = self.request_consent().await?;
        self.store.save(&token)?;
        info!("Credential file saved to: {}", self.store.path().display());
        Ok(self.authorize(token))
    }

    /// Forget the persisted credential; returns whether one existed
    pub fn revoke(&mut self) -> Result<bool, SyncError> {
        self.state = CredentialState::Unauthenticated;
        self.store.remove()
    }

    fn authorize(&mut self, token: StoredToken) -> AccessToken {
        let access = AccessToken::new(token.access_token.clone());
        self.state = CredentialState::Authorized(token);
        access
    }

    async fn reuse_or_refresh(
        &mut self,
        token: StoredToken,
        now: DateTime<Utc>,
    ) -> Result<Option<StoredToken>, SyncError> {
        if !token.covers(CALENDAR_SCOPE) {
            warn!("Stored credential was granted different scopes, re-authorization required");
            return Ok(None);
        }

        if !token.is_expired(now) {
            debug!("Reusing stored credential");
            return Ok(Some(token));
        }

        let Some(refresh_token) = token.refresh_token else {
            warn!("Stored credential expired and has no refresh token");
            return Ok(None);
        };

        info!("Access token expired, refreshing");
        match self.endpoint.refresh(&self.secret, &refresh_token).await {
            Ok(response) => {
                let refreshed = response.into_stored(Some(refresh_token), now);
                self.store.save(&refreshed)?;
                Ok(Some(refreshed))
            }
            Err(e) if is_revoked(&e) => {
                warn!(error = %e, "Stored credential was revoked, re-authorization required");
                self.store.remove()?;
                self.state = CredentialState::Unauthenticated;
                Ok(None)
            }
            Err(e) => Err(SyncError::authorization(SERVICE_NAME, e.to_string())),
        }
    }

    async fn request_consent(&mut self) -> Result<StoredToken, SyncError> {
        let auth_url = authorization_url(&self.secret)?;

        let Some(prompt) = self.prompt.clone() else {
            self.state = CredentialState::Unauthenticated;
            return Err(SyncError::authorization(
                SERVICE_NAME,
                "interactive authorization required, run `trello-gcal-sync auth`",
            ));
        };

        self.state = CredentialState::AwaitingInteractiveConsent {
            auth_url: auth_url.clone(),
        };

        // Prompts block on the terminal, keep them off the async workers
        let url = auth_url.clone();
        let input = tokio::task::spawn_blocking(move || prompt.request_code(&url))
            .await
            .map_err(|e| SyncError::authorization(SERVICE_NAME, e.to_string()))?
            .map_err(|e| SyncError::authorization(SERVICE_NAME, e.to_string()))?;
        let code = extract_code(&input).ok_or_else(|| {
            SyncError::authorization(SERVICE_NAME, "no authorization code provided")
        })?;

        let response = self
            .endpoint
            .exchange_code(&self.secret, &code)
            .await
            .map_err(|e| SyncError::authorization(SERVICE_NAME, e.to_string()))?;

        Ok(response.into_stored(None, Utc::now()))
    }
}
