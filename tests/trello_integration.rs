//! Integration tests for the Trello board provider
//!
//! These tests require real API credentials and a test board.
//! They are skipped when credentials are not available.
//!
//! ## Environment Variables Required
//!
//! - `TRELLO_GCAL_SYNC_TRELLO__APP_KEY`: Trello application key
//! - `TRELLO_GCAL_SYNC_TRELLO__APP_TOKEN`: Trello user token
//! - `TRELLO_GCAL_SYNC_TEST_BOARD`: Id of a board the token can write to
//! - `TRELLO_GCAL_SYNC_TEST_LIST` (optional): List to read, default "TODO"
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test trello_integration -- --nocapture --test-threads=1
//! ```

use std::env;

use trello_gcal_sync::api::providers::kanban::{BoardProvider, TrelloProvider};
use trello_gcal_sync::api::ApiError;
use trello_gcal_sync::services::select_list;

// ─── Configuration Helpers ───────────────────────────────────────────────────

/// Check if Trello credentials are configured
fn trello_configured() -> bool {
    env::var("TRELLO_GCAL_SYNC_TRELLO__APP_KEY").is_ok()
        && env::var("TRELLO_GCAL_SYNC_TRELLO__APP_TOKEN").is_ok()
        && env::var("TRELLO_GCAL_SYNC_TEST_BOARD").is_ok()
}

fn test_board() -> String {
    env::var("TRELLO_GCAL_SYNC_TEST_BOARD").expect("TRELLO_GCAL_SYNC_TEST_BOARD required")
}

fn test_list() -> String {
    env::var("TRELLO_GCAL_SYNC_TEST_LIST").unwrap_or_else(|_| "TODO".to_string())
}

/// Macro to skip test if provider is not configured
macro_rules! skip_if_not_configured {
    ($configured:expr, $provider:expr) => {
        if !$configured {
            eprintln!("Skipping test: {} credentials not configured", $provider);
            return;
        }
    };
}

fn get_provider() -> TrelloProvider {
    TrelloProvider::from_env().expect("Trello provider should be configured")
}

// ─── Trello Integration Tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_connection() {
    skip_if_not_configured!(trello_configured(), "Trello");
    let provider = get_provider();

    let result = provider.test_connection().await;
    assert!(result.is_ok(), "Connection test failed: {:?}", result);
    assert!(result.unwrap(), "Connection should be valid");
}

#[tokio::test]
async fn test_invalid_token_is_auth_error() {
    skip_if_not_configured!(trello_configured(), "Trello");
    let key = env::var("TRELLO_GCAL_SYNC_TRELLO__APP_KEY").unwrap();
    let provider = TrelloProvider::new(key, "not-a-real-token".to_string());

    let err = provider
        .get_board(&test_board())
        .await
        .expect_err("Bogus token should be rejected");
    assert!(err.is_auth_error(), "Expected auth error, got {:?}", err);
}

#[tokio::test]
async fn test_get_board_lists() {
    skip_if_not_configured!(trello_configured(), "Trello");
    let provider = get_provider();

    let board = provider
        .get_board(&test_board())
        .await
        .expect("Should fetch board");
    assert!(!board.lists.is_empty(), "Test board should have lists");

    eprintln!(
        "Lists on {}: {:?}",
        board.name,
        board.lists.iter().map(|l| &l.name).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_list_cards_have_creation_dates() {
    skip_if_not_configured!(trello_configured(), "Trello");
    let provider = get_provider();

    let board = provider
        .get_board(&test_board())
        .await
        .expect("Should fetch board");
    let list_name = test_list();
    let list = match select_list(&board, &list_name) {
        Ok(list) => list,
        Err(e) => {
            eprintln!("Skipping test: {}", e);
            return;
        }
    };

    let cards = provider.list_cards(list).await.expect("Should list cards");
    for card in &cards {
        assert!(!card.id.is_empty(), "Card should have ID");
        // Trello launched in 2011; anything earlier means the id was misdecoded
        assert!(
            card.created_at.timestamp() > 1_293_840_000,
            "Card {} has implausible creation time {}",
            card.name,
            card.created_at
        );
    }

    eprintln!("Fetched {} cards from {}", cards.len(), list_name);
}

#[tokio::test]
async fn test_unknown_board_is_not_found() {
    skip_if_not_configured!(trello_configured(), "Trello");
    let provider = get_provider();

    let err = provider
        .get_board("000000000000000000000000")
        .await
        .expect_err("Unknown board should fail");
    // Trello answers malformed or foreign board ids with 400, 401 or 404
    let rejected = err.is_not_found()
        || err.is_auth_error()
        || matches!(err, ApiError::HttpError { status: 400, .. });
    assert!(rejected, "Unexpected error: {:?}", err);
}
