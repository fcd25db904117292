//! Trello board provider implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::env;
use tracing::{debug, warn};

use super::{Board, BoardList, BoardProvider, Card, Comment};
use crate::api::error::{check_status, ApiError};

const TRELLO_API_URL: &str = "https://api.trello.com/1";
const PROVIDER_NAME: &str = "trello";

/// Trello returns at most this many actions per request
const MAX_COMMENT_ACTIONS: &str = "1000";

/// Trello REST API provider
pub struct TrelloProvider {
    app_key: String,
    user_token: String,
    base_url: String,
    client: Client,
}

impl TrelloProvider {
    /// Create a new Trello provider from an application key and user token
    pub fn new(app_key: String, user_token: String) -> Self {
        Self {
            app_key,
            user_token,
            base_url: TRELLO_API_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Point the provider at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Create from environment variables
    ///
    /// Required environment variables:
    /// - TRELLO_GCAL_SYNC_TRELLO__APP_KEY: Trello application key
    /// - TRELLO_GCAL_SYNC_TRELLO__APP_TOKEN: Trello user token
    pub fn from_env() -> Result<Self, ApiError> {
        let key = env::var("TRELLO_GCAL_SYNC_TRELLO__APP_KEY").ok();
        let token = env::var("TRELLO_GCAL_SYNC_TRELLO__APP_TOKEN").ok();

        match (key, token) {
            (Some(k), Some(t)) if !k.is_empty() && !t.is_empty() => Ok(Self::new(k, t)),
            _ => Err(ApiError::not_configured(PROVIDER_NAME)),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_query(&self) -> [(&str, &str); 2] {
        [("key", &self.app_key), ("token", &self.user_token)]
    }

    /// Make an authenticated GET request
    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        debug!("Trello GET: {}", path);

        let response = self
            .client
            .get(self.url(path))
            .query(&self.auth_query())
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::network(PROVIDER_NAME, e.to_string()))?;

        check_status(PROVIDER_NAME, response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::parse(PROVIDER_NAME, e))
    }

    /// Make an authenticated POST request, discarding the response body
    async fn post(&self, path: &str, query: &[(&str, &str)]) -> Result<(), ApiError> {
        debug!("Trello POST: {}", path);

        let response = self
            .client
            .post(self.url(path))
            .query(&self.auth_query())
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::network(PROVIDER_NAME, e.to_string()))?;

        check_status(PROVIDER_NAME, response).await.map(|_| ())
    }

    async fn fetch_comments(&self, card_id: &str) -> Result<Vec<Comment>, ApiError> {
        let actions: Vec<TrelloAction> = self
            .get(
                &format!("/cards/{}/actions", card_id),
                &[
                    ("filter", "commentCard"),
                    ("fields", "data"),
                    ("limit", MAX_COMMENT_ACTIONS),
                ],
            )
            .await?;

        Ok(actions
            .into_iter()
            .filter_map(|a| a.data.text)
            .map(|text| Comment { text })
            .collect())
    }
}

/// Decode the creation time embedded in a Trello object id.
///
/// The first 8 hex digits of an id are the Unix timestamp (seconds) at
/// which the object was created.
pub fn creation_date_from_id(id: &str) -> Option<DateTime<Utc>> {
    let prefix = id.get(..8)?;
    let secs = u32::from_str_radix(prefix, 16).ok()?;
    DateTime::from_timestamp(i64::from(secs), 0)
}

// Trello API response types
#[derive(Debug, Deserialize)]
struct TrelloBoard {
    id: String,
    name: String,
    #[serde(default)]
    lists: Vec<TrelloList>,
}

#[derive(Debug, Deserialize)]
struct TrelloList {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TrelloCard {
    id: String,
    name: String,
    #[serde(default)]
    desc: String,
}

#[derive(Debug, Deserialize)]
struct TrelloAction {
    data: TrelloActionData,
}

#[derive(Debug, Deserialize)]
struct TrelloActionData {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrelloMember {
    #[allow(dead_code)]
    id: String,
}

#[async_trait]
impl BoardProvider for TrelloProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn get_board(&self, board_id: &str) -> Result<Board, ApiError> {
        let board: TrelloBoard = self
            .get(
                &format!("/boards/{}", board_id),
                &[("fields", "name"), ("lists", "open"), ("list_fields", "name")],
            )
            .await?;

        Ok(Board {
            id: board.id,
            name: board.name,
            lists: board
                .lists
                .into_iter()
                .map(|l| BoardList {
                    id: l.id,
                    name: l.name,
                })
                .collect(),
        })
    }

    async fn list_cards(&self, list: &BoardList) -> Result<Vec<Card>, ApiError> {
        let cards: Vec<TrelloCard> = self
            .get(&format!("/lists/{}/cards", list.id), &[("fields", "name,desc")])
            .await?;

        debug!(list = %list.name, count = cards.len(), "Fetched Trello cards");

        let mut result = Vec::with_capacity(cards.len());
        for card in cards {
            let created_at = creation_date_from_id(&card.id).ok_or_else(|| {
                ApiError::parse(
                    PROVIDER_NAME,
                    format!("card id '{}' carries no creation timestamp", card.id),
                )
            })?;
            let comments = self.fetch_comments(&card.id).await?;
            result.push(Card {
                id: card.id,
                name: card.name,
                description: card.desc,
                created_at,
                comments,
            });
        }

        Ok(result)
    }

    async fn add_comment(&self, card: &Card, text: &str) -> Result<(), ApiError> {
        self.post(
            &format!("/cards/{}/actions/comments", card.id),
            &[("text", text)],
        )
        .await
    }

    async fn test_connection(&self) -> Result<bool, ApiError> {
        match self
            .get::<TrelloMember>("/members/me", &[("fields", "id")])
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_auth_error() => {
                warn!("Trello authentication failed");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
