//! API client modules for external service integrations
//!
//! This module provides:
//! - Provider traits for the board and calendar services
//! - Error handling shared by both HTTP adapters

pub mod error;
pub mod providers;

pub use error::ApiError;
pub use providers::calendar::{GoogleCalendarProvider, PRIMARY_CALENDAR_ID};
pub use providers::kanban::TrelloProvider;
pub use providers::{
    Board, BoardList, BoardProvider, CalendarEvent, CalendarProvider, Card, Comment,
    CreatedEvent, EventDate,
};
