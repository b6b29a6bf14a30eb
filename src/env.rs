use tracing::{info, warn};

const COMMON_ENV: &str = "config/common.env";
const SECRETS_ENV: &str = ".secrets.env";

/// Env files for a Rocket profile, lowest precedence first.
fn env_layers(profile: &str) -> [&'static str; 3] {
    let profile_env = match profile {
        "release" => "config/prod.env",
        _ => "config/dev.env",
    };
    [COMMON_ENV, profile_env, SECRETS_ENV]
}

/// Which env files were applied and which were absent.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadedEnv {
    pub applied: Vec<&'static str>,
    pub missing: Vec<&'static str>,
}

impl LoadedEnv {
    /// Env files load before the subscriber exists, so this is called once
    /// tracing is up.
    pub fn log(&self) {
        for path in &self.applied {
            info!(path, "Loaded environment file");
        }
        for path in &self.missing {
            warn!(path, "Environment file not found, skipped");
        }
    }
}

/// Loads the env layers for `ROCKET_PROFILE`, each overriding the previous
/// ones.
pub fn load_environment() -> Result<LoadedEnv, dotenvy::Error> {
    let profile = dotenvy::var("ROCKET_PROFILE").unwrap_or_else(|_| "debug".to_string());
    load_layers(&env_layers(&profile))
}

fn load_layers(paths: &[&'static str]) -> Result<LoadedEnv, dotenvy::Error> {
    let mut loaded = LoadedEnv::default();

    for &path in paths {
        match dotenvy::from_filename_override(path) {
            Ok(_) => loaded.applied.push(path),
            Err(e) if e.not_found() => loaded.missing.push(path),
            Err(e) => return Err(e),
        }
    }

    Ok(loaded)
}
