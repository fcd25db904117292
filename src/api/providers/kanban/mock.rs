//! In-memory board provider for tests

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Board, BoardList, BoardProvider, Card, Comment};
use crate::api::error::ApiError;

const PROVIDER_NAME: &str = "mock-board";

/// Mock implementation for testing
#[derive(Default, Clone)]
pub struct MockBoardProvider {
    state: Arc<Mutex<MockBoardState>>,
    /// Record of calls made against the provider
    pub command_log: Arc<Mutex<Vec<MockBoardCommand>>>,
}

#[derive(Default)]
struct MockBoardState {
    next_id: u64,
    boards: HashMap<String, (String, Vec<BoardList>)>,
    /// list id -> card ids, in list order
    list_cards: HashMap<String, Vec<String>>,
    cards: HashMap<String, Card>,
    /// Card names whose comment appends fail
    failing_comments: HashSet<String>,
    credentials_rejected: bool,
}

impl MockBoardState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockBoardCommand {
    pub operation: String,
    pub args: Vec<String>,
}

impl MockBoardProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty board
    pub fn add_board(&self, board_id: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .boards
            .insert(board_id.to_string(), (name.to_string(), Vec::new()));
    }

    /// Append a list to a board, returning the new list id
    pub fn add_list(&self, board_id: &str, name: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("list");
        state
            .boards
            .get_mut(board_id)
            .expect("board must be added before its lists")
            .1
            .push(BoardList {
                id: id.clone(),
                name: name.to_string(),
            });
        state.list_cards.insert(id.clone(), Vec::new());
        id
    }

    /// Append a card to a list, returning the new card id
    pub fn add_card(
        &self,
        list_id: &str,
        name: &str,
        description: &str,
        created_at: DateTime<Utc>,
    ) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("card");
        state
            .list_cards
            .get_mut(list_id)
            .expect("list must be added before its cards")
            .push(id.clone());
        state.cards.insert(
            id.clone(),
            Card {
                id: id.clone(),
                name: name.to_string(),
                description: description.to_string(),
                created_at,
                comments: Vec::new(),
            },
        );
        id
    }

    /// Attach a pre-existing comment to a card without logging a call
    pub fn seed_comment(&self, card_id: &str, text: &str) {
        if let Some(card) = self.state.lock().unwrap().cards.get_mut(card_id) {
            card.comments.push(Comment {
                text: text.to_string(),
            });
        }
    }

    /// Make every comment append on the named card fail
    pub fn fail_comments_for(&self, card_name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_comments
            .insert(card_name.to_string());
    }

    /// Reject every call as unauthorized
    pub fn reject_credentials(&self) {
        self.state.lock().unwrap().credentials_rejected = true;
    }

    /// Comment texts currently on a card (for test assertions)
    pub fn comments_for(&self, card_id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .cards
            .get(card_id)
            .map(|c| c.comments.iter().map(|c| c.text.clone()).collect())
            .unwrap_or_default()
    }

    /// Get the command log
    pub fn get_commands(&self) -> Vec<MockBoardCommand> {
        self.command_log.lock().unwrap().clone()
    }

    fn log_command(&self, operation: &str, args: &[&str]) {
        self.command_log.lock().unwrap().push(MockBoardCommand {
            operation: operation.to_string(),
            args: args.iter().map(|s| (*s).to_string()).collect(),
        });
    }

    fn check_credentials(&self) -> Result<(), ApiError> {
        if self.state.lock().unwrap().credentials_rejected {
            Err(ApiError::unauthorized(PROVIDER_NAME))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BoardProvider for MockBoardProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn get_board(&self, board_id: &str) -> Result<Board, ApiError> {
        self.log_command("get_board", &[board_id]);
        self.check_credentials()?;

        let state = self.state.lock().unwrap();
        let (name, lists) = state
            .boards
            .get(board_id)
            .ok_or_else(|| ApiError::http(PROVIDER_NAME, 404, format!("Not found: {}", board_id)))?;

        Ok(Board {
            id: board_id.to_string(),
            name: name.clone(),
            lists: lists.clone(),
        })
    }

    async fn list_cards(&self, list: &BoardList) -> Result<Vec<Card>, ApiError> {
        self.log_command("list_cards", &[&list.id]);
        self.check_credentials()?;

        let state = self.state.lock().unwrap();
        let ids = state
            .list_cards
            .get(&list.id)
            .ok_or_else(|| ApiError::http(PROVIDER_NAME, 404, format!("Not found: {}", list.id)))?;

        Ok(ids
            .iter()
            .filter_map(|id| state.cards.get(id).cloned())
            .collect())
    }

    async fn add_comment(&self, card: &Card, text: &str) -> Result<(), ApiError> {
        self.log_command("add_comment", &[&card.id, text]);
        self.check_credentials()?;

        let mut state = self.state.lock().unwrap();
        if state.failing_comments.contains(&card.name) {
            return Err(ApiError::network(PROVIDER_NAME, "connection reset"));
        }

        let stored = state
            .cards
            .get_mut(&card.id)
            .ok_or_else(|| ApiError::http(PROVIDER_NAME, 404, format!("Not found: {}", card.id)))?;
        stored.comments.push(Comment {
            text: text.to_string(),
        });
        Ok(())
    }

    async fn test_connection(&self) -> Result<bool, ApiError> {
        self.log_command("test_connection", &[]);
        Ok(!self.state.lock().unwrap().credentials_rejected)
    }
}
