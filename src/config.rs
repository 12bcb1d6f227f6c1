use std::path::{Path, PathBuf};

use chrono::Duration;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::{
    election::Election,
    identity::{OperatorAccount, Operators},
    store::FileStore,
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    #[serde(default = "default_session_ttl")]
    session_ttl: u32,
    #[serde(default = "default_store_path")]
    store_path: PathBuf,
    #[serde(default)]
    seed_demo: bool,
    // secrets
    jwt_secret: String,
    #[serde(default)]
    operators: Option<Vec<OperatorAccount>>,
}

fn default_session_ttl() -> u32 {
    3600
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data")
}

impl Config {
    /// Valid lifetime of session cookies in seconds.
    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl.into())
    }

    /// Directory holding the election's files.
    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Whether to install demo candidates and voters into an empty election.
    pub fn seed_demo(&self) -> bool {
        self.seed_demo
    }

    /// Secret key used to sign session cookies.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Configured operator accounts, or the stock pair if none are given.
    pub fn operators(&self) -> Operators {
        self.operators
            .clone()
            .map(Operators::new)
            .unwrap_or_default()
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
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

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// A fairing that opens the election's file store, loads the election,
/// optionally seeds demo data, and places the [`Election`] into managed state.
/// Must be attached after [`ConfigFairing`].
pub struct ElectionFairing;

#[rocket::async_trait]
impl Fairing for ElectionFairing {
    fn info(&self) -> Info {
        Info {
            name: "Election store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.state::<Config>() {
            Some(config) => config,
            None => {
                error!("Election store requires the application config");
                return Err(rocket);
            }
        };
        let path = config.store_path().to_path_buf();
        info!("Opening election store at {}...", path.display());

        let store = match FileStore::open(&path) {
            Ok(store) => store,
            Err(e) => {
                error!("Failed to open election store: {e}");
                return Err(rocket);
            }
        };
        let election = match Election::open(Box::new(store), config.operators()) {
            Ok(election) => election,
            Err(e) => {
                error!("Failed to load election: {e}");
                return Err(rocket);
            }
        };

        if config.seed_demo() {
            if let Err(e) = election.seed_demo() {
                error!("Failed to seed demo data: {e}");
                return Err(rocket);
            }
        }
        info!("...election loaded!");

        // Manage the state.
        rocket = rocket.manage(election);
        Ok(rocket)
    }
}
