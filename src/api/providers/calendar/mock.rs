//! In-memory calendar provider for tests

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{CalendarEvent, CalendarProvider, CreatedEvent};
use crate::api::error::ApiError;

const PROVIDER_NAME: &str = "mock-calendar";

/// Mock implementation for testing
#[derive(Default, Clone)]
pub struct MockCalendarProvider {
    /// Events created so far, with the calendar they were created on
    pub created: Arc<Mutex<Vec<(String, CalendarEvent)>>>,
    /// Event summaries whose creation fails
    failing_summaries: Arc<Mutex<HashSet<String>>>,
}

impl MockCalendarProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make creation fail for events with this summary
    pub fn fail_for(&self, summary: &str) {
        self.failing_summaries
            .lock()
            .unwrap()
            .insert(summary.to_string());
    }

    /// Events created so far (for test assertions)
    pub fn events(&self) -> Vec<CalendarEvent> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn event_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }
}

#[async_trait]
impl CalendarProvider for MockCalendarProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn create_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<CreatedEvent, ApiError> {
        if self.failing_summaries.lock().unwrap().contains(&event.summary) {
            return Err(ApiError::http(PROVIDER_NAME, 500, "backend error"));
        }

        let mut created = self.created.lock().unwrap();
        created.push((calendar_id.to_string(), event.clone()));
        Ok(CreatedEvent {
            id: format!("event-{}", created.len()),
            html_link: None,
        })
    }
}
