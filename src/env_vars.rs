//! Environment variable registry.
//!
//! Every configuration value can be overridden from the environment using the
//! `TRELLO_GCAL_SYNC_` prefix with `__` separating nested config paths
//! (e.g., `TRELLO_GCAL_SYNC_TRELLO__BOARD_ID`). The `config` command prints
//! this registry.

/// An environment variable definition
#[derive(Debug, Clone)]
pub struct EnvVar {
    /// Environment variable name (e.g., "TRELLO_GCAL_SYNC_TRELLO__APP_KEY")
    pub name: &'static str,
    pub description: &'static str,
    /// Category for grouping in output
    pub category: EnvVarCategory,
    /// Whether a sync run fails without it (unless set in a config file)
    pub required: bool,
    pub default: Option<&'static str>,
    pub example: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvVarCategory {
    /// Board, list and board-service credentials
    Trello,
    /// Calendar and OAuth file locations
    Google,
    Sync,
    Logging,
}

impl EnvVarCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            EnvVarCategory::Trello => "Trello",
            EnvVarCategory::Google => "Google Calendar",
            EnvVarCategory::Sync => "Sync",
            EnvVarCategory::Logging => "Logging",
        }
    }

    /// All categories in display order
    pub fn all() -> &'static [EnvVarCategory] {
        &[
            EnvVarCategory::Trello,
            EnvVarCategory::Google,
            EnvVarCategory::Sync,
            EnvVarCategory::Logging,
        ]
    }
}

/// Static registry of all documented environment variables
pub static ENV_VARS: &[EnvVar] = &[
    // === Trello ===
    EnvVar {
        name: "TRELLO_GCAL_SYNC_TRELLO__BOARD_ID",
        description: "Id of the board whose list is synced",
        category: EnvVarCategory::Trello,
        required: true,
        default: None,
        example: Some("5f1a2b3c4d5e6f7a8b9c0d1e"),
    },
    EnvVar {
        name: "TRELLO_GCAL_SYNC_TRELLO__APP_KEY",
        description: "Trello application key",
        category: EnvVarCategory::Trello,
        required: true,
        default: None,
        example: Some("0123456789abcdef0123456789abcdef"),
    },
    EnvVar {
        name: "TRELLO_GCAL_SYNC_TRELLO__APP_TOKEN",
        description: "Trello user token granting the application access to the board",
        category: EnvVarCategory::Trello,
        required: true,
        default: None,
        example: Some("ATTA..."),
    },
    EnvVar {
        name: "TRELLO_GCAL_SYNC_TRELLO__LIST_NAME",
        description: "Name of the list to sync; exactly one list on the board must match",
        category: EnvVarCategory::Trello,
        required: false,
        default: Some("TODO"),
        example: Some("Today"),
    },
    // === Google ===
    EnvVar {
        name: "TRELLO_GCAL_SYNC_GOOGLE__CALENDAR_ID",
        description: "Calendar that receives the events",
        category: EnvVarCategory::Google,
        required: false,
        default: Some("primary"),
        example: Some("team@group.calendar.google.com"),
    },
    EnvVar {
        name: "TRELLO_GCAL_SYNC_GOOGLE__APPLICATION_NAME",
        description: "Application name sent with calendar requests",
        category: EnvVarCategory::Google,
        required: false,
        default: Some("TrelloGcalSyncer"),
        example: None,
    },
    EnvVar {
        name: "TRELLO_GCAL_SYNC_GOOGLE__CLIENT_SECRET_PATH",
        description: "Path to the OAuth client secret JSON",
        category: EnvVarCategory::Google,
        required: false,
        default: Some("~/.config/trello-gcal-sync/clientsecret.json"),
        example: Some("/etc/trello-gcal-sync/clientsecret.json"),
    },
    EnvVar {
        name: "TRELLO_GCAL_SYNC_GOOGLE__CREDENTIALS_PATH",
        description: "Path of the persisted OAuth token",
        category: EnvVarCategory::Google,
        required: false,
        default: Some("~/.credentials/calendar-trello-gcal-syncer.json"),
        example: None,
    },
    // === Sync ===
    EnvVar {
        name: "TRELLO_GCAL_SYNC_SYNC__MARKER_TEXT",
        description: "Comment text marking a card as synced (matched exactly)",
        category: EnvVarCategory::Sync,
        required: false,
        default: Some("Added to GCal"),
        example: None,
    },
    // === Logging ===
    EnvVar {
        name: "TRELLO_GCAL_SYNC_LOGGING__LEVEL",
        description: "Log level (trace, debug, info, warn, error); RUST_LOG takes precedence",
        category: EnvVarCategory::Logging,
        required: false,
        default: Some("info"),
        example: Some("debug"),
    },
    EnvVar {
        name: "TRELLO_GCAL_SYNC_LOGGING__TO_FILE",
        description: "Write logs to a file under the state directory instead of stderr",
        category: EnvVarCategory::Logging,
        required: false,
        default: Some("false"),
        example: Some("true"),
    },
];

/// Get all environment variables for a given category
pub fn env_vars_for_category(category: EnvVarCategory) -> impl Iterator<Item = &'static EnvVar> {
    ENV_VARS.iter().filter(move |v| v.category == category)
}

/// Get environment variables grouped by category
pub fn env_vars_by_category() -> Vec<(EnvVarCategory, Vec<&'static EnvVar>)> {
    EnvVarCategory::all()
        .iter()
        .map(|cat| {
            let vars: Vec<&EnvVar> = env_vars_for_category(*cat).collect();
            (*cat, vars)
        })
        .filter(|(_, vars)| !vars.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_PREFIX;

    #[test]
    fn test_all_env_vars_have_descriptions() {
        for var in ENV_VARS {
            assert!(
                !var.description.is_empty(),
                "EnvVar {} has empty description",
                var.name
            );
        }
    }

    #[test]
    fn test_all_env_vars_use_config_prefix_and_nesting() {
        let prefix = format!("{}_", ENV_PREFIX);
        for var in ENV_VARS {
            assert!(
                var.name.starts_with(&prefix),
                "EnvVar {} does not have {} prefix",
                var.name,
                prefix
            );
            assert!(
                var.name.contains("__"),
                "EnvVar {} does not name a config section",
                var.name
            );
        }
    }

    #[test]
    fn test_required_vars_are_the_trello_credentials() {
        let required: Vec<&str> = ENV_VARS
            .iter()
            .filter(|v| v.required)
            .map(|v| v.name)
            .collect();
        assert_eq!(
            required,
            vec![
                "TRELLO_GCAL_SYNC_TRELLO__BOARD_ID",
                "TRELLO_GCAL_SYNC_TRELLO__APP_KEY",
                "TRELLO_GCAL_SYNC_TRELLO__APP_TOKEN",
            ]
        );
    }

    #[test]
    fn test_env_vars_by_category() {
        let grouped = env_vars_by_category();
        assert_eq!(grouped.len(), EnvVarCategory::all().len());
        assert_eq!(grouped[0].0, EnvVarCategory::Trello);
        assert_eq!(grouped[0].1.len(), 4);
    }

    #[test]
    fn test_category_display_names() {
        assert_eq!(EnvVarCategory::Trello.display_name(), "Trello");
        assert_eq!(EnvVarCategory::Google.display_name(), "Google Calendar");
        assert_eq!(EnvVarCategory::Sync.display_name(), "Sync");
        assert_eq!(EnvVarCategory::Logging.display_name(), "Logging");
    }
}
