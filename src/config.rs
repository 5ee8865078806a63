use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::store::{MemoryStore, MongoStore, Storage, VoteRetention};
use crate::voting::ZeroVotePolicy;

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_vote_credits")]
    initial_vote_credits: u32,
    #[serde(default)]
    zero_votes: ZeroVotePolicy,
    #[serde(default)]
    vote_retention: VoteRetention,
}

impl Config {
    fn default_vote_credits() -> u32 {
        10
    }

    /// Credits every newly registered user starts with.
    pub fn initial_vote_credits(&self) -> u32 {
        self.initial_vote_credits
    }

    /// Whether votes of zero credits are recorded or refused.
    pub fn zero_votes(&self) -> ZeroVotePolicy {
        self.zero_votes
    }

    /// Whether deleting an event also deletes the votes cast on it.
    pub fn vote_retention(&self) -> VoteRetention {
        self.vote_retention
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_vote_credits: Self::default_vote_credits(),
            zero_votes: ZeroVotePolicy::default(),
            vote_retention: VoteRetention::default(),
        }
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        if config.zero_votes() == ZeroVotePolicy::Allow {
            warn!("Zero-credit votes will be recorded");
        }

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Which store backs the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StorageKind {
    #[default]
    MongoDb,
    Memory,
}

/// Configuration for the store.
#[derive(Deserialize)]
struct StoreConfig {
    #[serde(default)]
    storage: StorageKind,
    // secrets
    db_uri: Option<String>,
    #[serde(default = "StoreConfig::default_db_name")]
    db_name: String,
}

impl StoreConfig {
    fn default_db_name() -> String {
        "rising_stars".to_string()
    }
}

/// A fairing that loads the storage config, opens the selected store,
/// performs any setup necessary, and places a [`Storage`] handle into
/// managed state.
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Storage",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<StoreConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load storage config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let storage = match config.storage {
            StorageKind::Memory => {
                warn!("Using in-memory storage, nothing will persist across restarts");
                Storage::new(MemoryStore::new())
            }
            StorageKind::MongoDb => {
                let Some(db_uri) = config.db_uri else {
                    error!("`db_uri` must be set when `storage` is \"mongodb\"");
                    return Err(rocket);
                };
                info!("Loaded database config, connecting...");
                // Connects and ensures the required indexes exist.
                match MongoStore::connect(&db_uri, &config.db_name).await {
                    Ok(store) => {
                        info!("...database connection online!");
                        Storage::new(store)
                    }
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                }
            }
        };

        // Manage the state.
        rocket = rocket.manage(storage);
        Ok(rocket)
    }
}
