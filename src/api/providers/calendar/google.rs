//! Google Calendar provider implementation

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::{CalendarEvent, CalendarProvider, CreatedEvent};
use crate::api::error::{check_status, ApiError};
use crate::auth::AccessToken;

const GOOGLE_CALENDAR_API_URL: &str = "https://www.googleapis.com/calendar/v3";
const PROVIDER_NAME: &str = "google-calendar";

/// Google Calendar v3 API provider
pub struct GoogleCalendarProvider {
    access_token: AccessToken,
    application_name: String,
    base_url: String,
    client: Client,
}

impl GoogleCalendarProvider {
    /// Create a provider that authenticates every request with `access_token`
    pub fn new(access_token: AccessToken, application_name: impl Into<String>) -> Self {
        Self {
            access_token,
            application_name: application_name.into(),
            base_url: GOOGLE_CALENDAR_API_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Point the provider at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// `{base}/calendars/{calendar_id}/events`, with the id percent-encoded
    fn events_url(&self, calendar_id: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::http(PROVIDER_NAME, 0, format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::http(PROVIDER_NAME, 0, "Base URL cannot have a path"))?
            .extend(["calendars", calendar_id, "events"]);
        Ok(url)
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn create_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<CreatedEvent, ApiError> {
        let url = self.events_url(calendar_id)?;
        debug!("Google Calendar POST: {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(self.access_token.as_str())
            .header(reqwest::header::USER_AGENT, &self.application_name)
            .json(event)
            .send()
            .await
            .map_err(|e| ApiError::network(PROVIDER_NAME, e.to_string()))?;

        let response = check_status(PROVIDER_NAME, response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::parse(PROVIDER_NAME, e))
    }
}
