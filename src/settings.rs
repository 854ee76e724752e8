//! Runtime settings: defaults, an optional `rusty_plan` config file, then
//! `RUSTY_PLAN__*` environment variables.

use crate::error::RustyPlanError;
use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use std::path::PathBuf;

/// Default score a row must exceed to be taken for a header row.
pub const DEFAULT_HEADER_THRESHOLD: u8 = 3;

/// Telegram bot credentials and destination.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TelegramSettings {
    pub token: String,
    pub chat_id: String,
    #[serde(default)]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub reply_to_message_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(default = "default_header_threshold")]
    pub header_threshold: u8,
    #[serde(default)]
    pub error_as_null: bool,
    /// Directory for the log file; logs go to stderr when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub telegram: Option<TelegramSettings>,
}

fn default_header_threshold() -> u8 {
    DEFAULT_HEADER_THRESHOLD
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            header_threshold: DEFAULT_HEADER_THRESHOLD,
            error_as_null: false,
            log_dir: None,
            telegram: None,
        }
    }
}

impl Settings {
    /// Loads settings from `rusty_plan.{toml,yaml,json}` in the working directory
    /// and the environment.
    pub fn load() -> Result<Self, RustyPlanError> {
        Self::load_from("rusty_plan", Environment::with_prefix("RUSTY_PLAN"))
    }

    /// Loads settings from the config file stem `file` and the `environment` source.
    pub(crate) fn load_from(file: &str, environment: Environment) -> Result<Self, RustyPlanError> {
        let settings = Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(
                environment
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize::<Settings>()?)
    }
}
