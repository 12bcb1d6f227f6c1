#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

use config::{ConfigFairing, ElectionFairing};
use logging::LoggerFairing;

/// Build the server: routes, config, the file-backed election and logging.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(ElectionFairing)
        .attach(LoggerFairing)
}

/// Build a server around an already loaded election, for tests.
#[cfg(test)]
pub(crate) fn rocket_for_election(election: model::election::Election) -> Rocket<Build> {
    use rocket::figment::providers::Serialized;

    let figment = rocket::Config::figment()
        .merge(Serialized::default("jwt_secret", "test secret"))
        .merge(Serialized::default("log_level", "off"));
    rocket::custom(figment)
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(LoggerFairing)
        .manage(election)
}
