//! Card Sync Service - creates calendar events for unsynced board cards.
//!
//! A card counts as synced once it carries a comment whose text equals the
//! marker exactly. The marker is the only sync state; nothing is stored
//! locally. Cards are processed one at a time, in board order, and the marker
//! is appended only after the calendar confirms the event.

use tracing::{debug, info, warn};

use crate::api::providers::{
    Board, BoardList, BoardProvider, CalendarEvent, CalendarProvider, Card, CreatedEvent,
};
use crate::config::{GoogleConfig, ValidatedTrello};
use crate::error::SyncError;

/// What a sync run targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub board_id: String,
    pub list_name: String,
    pub marker_text: String,
    pub calendar_id: String,
}

impl SyncSettings {
    pub fn from_config(trello: &ValidatedTrello, google: &GoogleConfig) -> Self {
        Self {
            board_id: trello.board_id.clone(),
            list_name: trello.list_name.clone(),
            marker_text: trello.marker_text.clone(),
            calendar_id: google.calendar_id.clone(),
        }
    }
}

/// A card the run could not finish
#[derive(Debug)]
pub struct CardFailure {
    pub card_id: String,
    pub card_name: String,
    /// Either [`SyncError::EventCreation`] or [`SyncError::MarkerAppend`]
    pub error: SyncError,
}

impl CardFailure {
    /// The event exists but the card is unmarked, so a rerun duplicates it
    pub fn is_duplicate_risk(&self) -> bool {
        matches!(self.error, SyncError::MarkerAppend { .. })
    }
}

/// Result of a sync run
#[derive(Debug, Default)]
pub struct SyncResult {
    /// Names of cards that got an event and a marker
    pub created: Vec<String>,
    /// Names of cards that already carried the marker
    pub skipped: Vec<String>,
    /// Cards that failed; the run carried on past them
    pub failed: Vec<CardFailure>,
}

impl SyncResult {
    /// Check if the sync was successful (no card failed)
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Get a summary message
    pub fn summary(&self) -> String {
        format!(
            "Created: {}, Skipped: {}, Failed: {}",
            self.created.len(),
            self.skipped.len(),
            self.failed.len()
        )
    }
}

/// Select the one list named `name`
pub fn select_list<'a>(board: &'a Board, name: &str) -> Result<&'a BoardList, SyncError> {
    let matches: Vec<&BoardList> = board.lists.iter().filter(|list| list.name == name).collect();
    match matches.as_slice() {
        [] => Err(SyncError::ListNotFound {
            list_name: name.to_string(),
        }),
        [list] => Ok(*list),
        _ => Err(SyncError::AmbiguousList {
            list_name: name.to_string(),
            count: matches.len(),
        }),
    }
}

/// Service for syncing one board list into a calendar
pub struct CardSyncService<B: BoardProvider, C: CalendarProvider> {
    board: B,
    calendar: C,
    settings: SyncSettings,
}

impl<B: BoardProvider, C: CalendarProvider> CardSyncService<B, C> {
    pub fn new(board: B, calendar: C, settings: SyncSettings) -> Self {
        Self {
            board,
            calendar,
            settings,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Check the board credentials before any board data is read
    pub async fn authenticate_board(&self) -> Result<(), SyncError> {
        match self.board.test_connection().await {
            Ok(true) => {
                debug!(provider = self.board.name(), "Board credentials accepted");
                Ok(())
            }
            Ok(false) => Err(SyncError::authorization(
                self.board.name(),
                "application key or token rejected",
            )),
            Err(e) => Err(SyncError::from_board(e)),
        }
    }

    /// Create an event for every unsynced card in the configured list.
    ///
    /// Board lookup, list resolution and card fetch failures abort the run.
    /// Failures on a single card are recorded in the result and the run moves
    /// on to the next card.
    pub async fn synchronize(&self) -> Result<SyncResult, SyncError> {
        let cards = self.fetch_cards().await?;
        let mut result = SyncResult::default();

        for card in &cards {
            if card.has_comment(&self.settings.marker_text) {
                debug!(card = %card.name, "Skipping already synced card");
                result.skipped.push(card.name.clone());
                continue;
            }

            match self.create_event_for_card(card).await {
                Ok(event) => {
                    info!(card = %card.name, event_id = %event.id, "Created calendar event");
                    result.created.push(card.name.clone());
                }
                Err(error) => {
                    if matches!(error, SyncError::MarkerAppend { .. }) {
                        warn!(
                            card = %card.name,
                            error = %error,
                            "Marker not appended, the next run will create a duplicate event"
                        );
                    } else {
                        warn!(card = %card.name, error = %error, "Failed to sync card");
                    }
                    result.failed.push(CardFailure {
                        card_id: card.id.clone(),
                        card_name: card.name.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            board_id = %self.settings.board_id,
            list = %self.settings.list_name,
            "Sync finished: {}",
            result.summary()
        );
        Ok(result)
    }

    /// Create the all-day event for `card`, then mark the card as synced.
    ///
    /// The marker is never appended when event creation fails.
    pub async fn create_event_for_card(&self, card: &Card) -> Result<CreatedEvent, SyncError> {
        let event = event_for_card(card);

        let created = self
            .calendar
            .create_event(&self.settings.calendar_id, &event)
            .await
            .map_err(|source| SyncError::EventCreation {
                card: card.name.clone(),
                source,
            })?;

        self.board
            .add_comment(card, &self.settings.marker_text)
            .await
            .map_err(|source| SyncError::MarkerAppend {
                card: card.name.clone(),
                source,
            })?;

        Ok(created)
    }

    /// The cards a sync would create events for, without side effects
    pub async fn plan(&self) -> Result<Vec<Card>, SyncError> {
        let cards = self.fetch_cards().await?;
        Ok(cards
            .into_iter()
            .filter(|card| !card.has_comment(&self.settings.marker_text))
            .collect())
    }

    async fn fetch_cards(&self) -> Result<Vec<Card>, SyncError> {
        info!(
            board_id = %self.settings.board_id,
            list = %self.settings.list_name,
            provider = self.board.name(),
            "Fetching board"
        );

        let board = self
            .board
            .get_board(&self.settings.board_id)
            .await
            .map_err(SyncError::from_board)?;
        let list = select_list(&board, &self.settings.list_name)?;

        let cards = self
            .board
            .list_cards(list)
            .await
            .map_err(SyncError::from_board)?;

        info!(
            "Fetched {} cards from {}/{}",
            cards.len(),
            board.name,
            list.name
        );
        Ok(cards)
    }
}

/// Map a card onto its all-day event, dated by the card's creation day
pub fn event_for_card(card: &Card) -> CalendarEvent {
    CalendarEvent::all_day(&card.name, &card.description, card.creation_date())
}
