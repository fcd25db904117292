//! Provider trait definitions for external service integrations
//!
//! - Board providers (Trello) supply the cards to sync
//! - Calendar providers (Google Calendar) receive the events

pub mod calendar;
pub mod kanban;

// Re-export commonly used types
pub use calendar::{CalendarEvent, CalendarProvider, CreatedEvent, EventDate};
pub use kanban::{Board, BoardList, BoardProvider, Card, Comment};
