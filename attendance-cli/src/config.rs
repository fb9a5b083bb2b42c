use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_with::serde_as;
use strum::{Display, EnumString};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    #[serde(default)]
    pub cache: CacheSettings,
    pub engine: EngineSettings,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct CacheSettings {
    /// Where cached sessions and leave drafts live. Defaults to the user's
    /// cache directory.
    pub directory: Option<PathBuf>,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct EngineSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub tick_interval_ms: u64,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub annual_leave_allowance: f64,
}

impl CacheSettings {
    pub fn resolve_directory(&self) -> Result<PathBuf> {
        match &self.directory {
            Some(directory) => Ok(directory.clone()),
            None => Ok(dirs::cache_dir()
                .context("Cannot determine cache directory")?
                .join("attendance")),
        }
    }
}

impl EngineSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

pub fn config_directory() -> Result<PathBuf> {
    let base_path = std::env::current_dir().context("Failed to determine the current directory")?;
    Ok(base_path.join("config"))
}

pub fn read_config() -> Result<Settings> {
    let config_directory = config_directory()?;

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .context("Failed to parse APP_ENVIRONMENT")?;
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .set_default("engine.tick_interval_ms", 1000)?
        .set_default("engine.annual_leave_allowance", 20.0)?
        .add_source(config::File::from(config_directory.join("base.yaml")).required(false))
        .add_source(
            config::File::from(config_directory.join(environment_filename)).required(false),
        )
        .add_source(
            config::Environment::with_prefix("ATTENDANCE")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .context("Failed to build configuration")?;

    settings
        .try_deserialize::<Settings>()
        .context("Failed to deserialize configuration")
}

#[derive(Display, Debug, EnumString)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}
