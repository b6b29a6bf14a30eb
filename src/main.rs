#[macro_use]
extern crate rocket;

mod api;
mod config;
mod db;
mod env;
mod error;
mod models;
mod routes;
mod seed;
mod stats;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;
mod view;

use api::{api_get_student, api_reset_dynamic, api_update_student, health};
use clap::Parser;
use config::AppConfig;
use db::Store;
use error::AppError;
use rocket::fs::{FileServer, relative};
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;
use routes::{group_page, index, internal_error, not_found, student_page};
use seed::{SeedRoster, drop_all, seed_if_empty};
use telemetry::{TelemetryFairing, init_tracing};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Figment(#[from] rocket::figment::Error),
    #[error("Environment error: {0}")]
    Env(#[from] dotenvy::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
    #[error("{0}")]
    Rocket(Box<rocket::Error>),
}

impl From<rocket::Error> for Error {
    fn from(value: rocket::Error) -> Self {
        Error::Rocket(Box::new(value))
    }
}

/// Student grades and attendance diary.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Delete all records before seeding, producing a clean reseed.
    #[arg(long)]
    reset: bool,

    /// Database URL, overriding `database_url` from Rocket.toml / ROCKET_DATABASE_URL.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    let loaded_env = env::load_environment()?;
    let _telemetry = init_tracing();
    loaded_env.log();

    let cli = Cli::parse();

    let mut config = AppConfig::from_figment(&rocket::Config::figment())?;
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }

    let store = Store::connect(&config).await?;
    store.migrate().await?;

    if cli.reset {
        drop_all(&store).await?;
    }
    seed_if_empty(&store, &SeedRoster::standard()).await?;

    let _rocket = init_rocket(store).launch().await?;
    Ok(())
}

pub fn init_rocket(store: Store) -> Rocket<Build> {
    info!("Starting electronic diary");

    rocket::build()
        .manage(store)
        .mount("/", routes![index, group_page, student_page])
        .mount(
            "/api",
            routes![api_update_student, api_get_student, api_reset_dynamic, health],
        )
        .mount("/static", FileServer::from(relative!("static")))
        .register("/", catchers![not_found, internal_error])
        .attach(Template::fairing())
        .attach(TelemetryFairing)
}
