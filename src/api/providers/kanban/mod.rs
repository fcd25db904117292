//! Board provider trait and implementations
//!
//! A board provider exposes a task board's lists and cards and lets the sync
//! routine append comments to cards. Trello is the only live backend.

mod mock;
mod trello;

pub use mock::{MockBoardCommand, MockBoardProvider};
pub use trello::{creation_date_from_id, TrelloProvider};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;

/// A task board and its lists, in board order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    /// Unique identifier in the provider
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Lists on the board, in the order the provider returned them
    pub lists: Vec<BoardList>,
}

/// A named list on a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardList {
    pub id: String,
    pub name: String,
}

/// A comment on a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
}

/// A card with the comments it carried when it was fetched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Unique identifier in the provider
    pub id: String,
    /// Card title
    pub name: String,
    /// Card description (empty when the card has none)
    pub description: String,
    /// When the card was created
    pub created_at: DateTime<Utc>,
    /// Comments, in the order the provider returned them
    pub comments: Vec<Comment>,
}

impl Card {
    /// True when some comment's text is exactly `text`
    pub fn has_comment(&self, text: &str) -> bool {
        self.comments.iter().any(|c| c.text == text)
    }

    /// Calendar date of the creation timestamp, no time-of-day
    pub fn creation_date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// Trait for task boards the sync routine reads from
#[async_trait]
pub trait BoardProvider: Send + Sync {
    /// Get the provider name (e.g., "trello")
    fn name(&self) -> &str;

    /// Fetch a board and its open lists
    async fn get_board(&self, board_id: &str) -> Result<Board, ApiError>;

    /// Fetch the open cards of a list, comments included
    async fn list_cards(&self, list: &BoardList) -> Result<Vec<Card>, ApiError>;

    /// Append a comment to a card
    async fn add_comment(&self, card: &Card, text: &str) -> Result<(), ApiError>;

    /// Test that the configured credentials are accepted
    async fn test_connection(&self) -> Result<bool, ApiError>;
}
