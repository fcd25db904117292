//! Transport-level errors shared by the board and calendar adapters

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::Response;
use std::fmt;

/// Errors that can occur when talking to Trello or Google Calendar
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 401 Unauthorized - key, token or access token invalid or expired
    Unauthorized { provider: String },
    /// 403 Forbidden - credentials lack access to the resource
    Forbidden { provider: String },
    /// 429 Rate Limited
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },
    /// Network or timeout error
    NetworkError { provider: String, message: String },
    /// Other HTTP errors, and response bodies that failed to parse (status 0)
    HttpError {
        provider: String,
        status: u16,
        message: String,
    },
    /// Provider has no credentials to work with
    NotConfigured { provider: String },
}

impl ApiError {
    /// Check if this is an authentication error (401 or 403)
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized { .. } | ApiError::Forbidden { .. }
        )
    }

    /// Check if the resource did not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::HttpError { status: 404, .. })
    }

    /// Get the provider name for this error
    pub fn provider_name(&self) -> &str {
        match self {
            ApiError::Unauthorized { provider }
            | ApiError::Forbidden { provider }
            | ApiError::RateLimited { provider, .. }
            | ApiError::NetworkError { provider, .. }
            | ApiError::HttpError { provider, .. }
            | ApiError::NotConfigured { provider } => provider,
        }
    }

    /// Get retry-after seconds if rate limited
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            ApiError::RateLimited {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }

    /// Map a non-success HTTP status to the matching variant
    pub fn from_status(provider: &str, status: u16, body: String, retry_after: Option<u64>) -> Self {
        match status {
            401 => ApiError::unauthorized(provider),
            403 => ApiError::forbidden(provider),
            404 => ApiError::http(provider, 404, format!("Not found: {}", body)),
            429 => ApiError::rate_limited(provider, retry_after),
            _ => ApiError::http(provider, status, body),
        }
    }

    pub fn unauthorized(provider: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            provider: provider.into(),
        }
    }

    pub fn forbidden(provider: impl Into<String>) -> Self {
        ApiError::Forbidden {
            provider: provider.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, retry_after: Option<u64>) -> Self {
        ApiError::RateLimited {
            provider: provider.into(),
            retry_after_secs: retry_after,
        }
    }

    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::NetworkError {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn http(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        ApiError::HttpError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// A response body that could not be decoded
    pub fn parse(provider: impl Into<String>, message: impl fmt::Display) -> Self {
        ApiError::http(provider, 0, format!("Parse error: {}", message))
    }

    pub fn not_configured(provider: impl Into<String>) -> Self {
        ApiError::NotConfigured {
            provider: provider.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized { provider } => {
                write!(f, "{}: Unauthorized (401) - credentials rejected", provider)
            }
            ApiError::Forbidden { provider } => {
                write!(
                    f,
                    "{}: Forbidden (403) - insufficient permissions",
                    provider
                )
            }
            ApiError::RateLimited {
                provider,
                retry_after_secs,
            } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "{}: Rate limited - retry after {}s", provider, secs)
                } else {
                    write!(f, "{}: Rate limited", provider)
                }
            }
            ApiError::NetworkError { provider, message } => {
                write!(f, "{}: Network error - {}", provider, message)
            }
            ApiError::HttpError {
                provider,
                status,
                message,
            } => {
                write!(f, "{}: HTTP {} - {}", provider, status, message)
            }
            ApiError::NotConfigured { provider } => {
                write!(f, "{}: Not configured (missing credentials)", provider)
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Pass a successful response through, otherwise map its status and body
pub async fn check_status(provider: &str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = retry_after_secs(response.headers());
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_status(
        provider,
        status.as_u16(),
        body,
        retry_after,
    ))
}

/// Retry-After in its delay-seconds form; HTTP dates are ignored
fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
