//! Calendar provider trait and implementations

mod google;
mod mock;

pub use google::GoogleCalendarProvider;
pub use mock::MockCalendarProvider;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;

/// Calendar that refers to the authenticated user's own calendar
pub const PRIMARY_CALENDAR_ID: &str = "primary";

/// Date-only boundary of an all-day event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDate {
    pub date: NaiveDate,
}

/// An event to be created on a calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: EventDate,
    pub end: EventDate,
}

impl CalendarEvent {
    /// An all-day event that starts and ends on `date`
    pub fn all_day(summary: impl Into<String>, description: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            summary: summary.into(),
            description: description.into(),
            start: EventDate { date },
            end: EventDate { date },
        }
    }
}

/// What the calendar returned after creating an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    pub id: String,
    #[serde(default)]
    pub html_link: Option<String>,
}

/// Trait for calendars the sync routine writes to
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Get the provider name (e.g., "google-calendar")
    fn name(&self) -> &str;

    /// Create an event, returning once the calendar has confirmed it
    async fn create_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<CreatedEvent, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_day_event_serializes_date_only() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let event = CalendarEvent::all_day("Buy milk", "2%", date);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "summary": "Buy milk",
                "description": "2%",
                "start": {"date": "2024-03-15"},
                "end": {"date": "2024-03-15"},
            })
        );
    }

    #[test]
    fn test_created_event_parses_google_response() {
        let json = r#"{
            "kind": "calendar#event",
            "id": "abc123",
            "status": "confirmed",
            "htmlLink": "https://www.google.com/calendar/event?eid=abc123"
        }"#;
        let created: CreatedEvent = serde_json::from_str(json).unwrap();
        assert_eq!(created.id, "abc123");
        assert!(created.html_link.is_some());
    }
}
