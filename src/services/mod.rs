//! Sync services built on the board and calendar providers.

pub mod card_sync;

pub use card_sync::{
    event_for_card, select_list, CardFailure, CardSyncService, SyncResult, SyncSettings,
};
