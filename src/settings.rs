use crate::population::DWF_PER_PERSON;
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

const START_TIME_FIELD: &str = "start_time";
const DWF_PER_PERSON_FIELD: &str = "dwf_per_person";
const STRICT_FACTORS_FIELD: &str = "strict_factors";
const OUTPUT_FORMAT_FIELD: &str = "output_format";
const ENVIRONMENT_PREFIX: &str = "DWF";

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Settings {
    pub start_time: String,
    pub dwf_per_person: f64,
    #[serde(default)]
    pub dwf_factors_file: Option<PathBuf>,
    pub strict_factors: bool,
    pub output_format: OutputFormat,
}

pub fn map_from_environment_variables() -> HashMap<String, String> {
    env::vars().collect()
}

pub fn make_settings_file_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "DwfLaterals")
        .map(|dirs| dirs.preference_dir().join("settings.toml"))
}

fn make_config_builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default(START_TIME_FIELD, "00:00:00")?
        .set_default(DWF_PER_PERSON_FIELD, DWF_PER_PERSON)?
        .set_default(STRICT_FACTORS_FIELD, false)?
        .set_default(OUTPUT_FORMAT_FIELD, "csv")
}

/// Defaults, then the settings file if it exists, then `DWF_*` variables.
pub fn make_settings(
    environment_variables: &HashMap<String, String>,
    settings_file_path: &Path,
) -> Result<Settings, ConfigError> {
    let builder = make_config_builder()?
        .add_source(
            config::File::from(settings_file_path)
                .format(FileFormat::Toml)
                .required(false),
        )
        .add_source(
            Environment::with_prefix(ENVIRONMENT_PREFIX)
                .try_parsing(true)
                .source(Some(environment_variables.clone().into_iter().collect())),
        );
    let config = builder.build()?;
    config.try_deserialize::<Settings>()
}
