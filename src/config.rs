//! Configuration System
//!
//! Runtime configuration for the relay: auto-show, default test devices, simulation mode and
//! logging. Layered with the `config` crate, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. Global file: `$XDG_CONFIG_HOME/consent-relay/config.toml`
//! 3. Workspace file: `<workspace>/consent-relay.toml`
//! 4. Environment: `CONSENT_RELAY__<KEY>` (nested keys joined with `__`)

use crate::error::RelayError;
use crate::logging::LoggingConfig;
use crate::simulation::{SimulatedOutcome, SimulationMode};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const WORKSPACE_CONFIG_FILE: &str = "consent-relay.toml";
pub const ENV_PREFIX: &str = "CONSENT_RELAY";
const ENV_SEPARATOR: &str = "__";

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Show the consent form automatically after a successful Init
    #[serde(default)]
    pub auto_show: bool,

    /// Relay diagnostics on/off; false silences logging entirely
    #[serde(default = "default_true")]
    pub debug_logging: bool,

    /// Test devices merged into Init when the caller supplies none
    #[serde(default)]
    pub test_device_hashed_ids: Vec<String>,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Development-mode simulation used when no native provider is available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Register a [`ScriptedSimulation`](crate::simulation::ScriptedSimulation) built from
    /// this section when the host supplies no strategy of its own
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub mode: SimulationMode,

    /// Outcomes for successive simulated requests; requests past the end are held
    #[serde(default)]
    pub script: Vec<SimulatedOutcome>,
}

fn default_true() -> bool {
    true
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            auto_show: false,
            debug_logging: true,
            test_device_hashed_ids: Vec::new(),
            simulation: SimulationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), RelayError> {
        if let Some(pos) = self
            .test_device_hashed_ids
            .iter()
            .position(|id| id.trim().is_empty())
        {
            return Err(RelayError::ConfigError(format!(
                "test_device_hashed_ids[{}] is empty",
                pos
            )));
        }
        self.logging.validate().map_err(RelayError::ConfigError)
    }

    /// Logging settings with `debug_logging` applied.
    pub fn effective_logging(&self) -> LoggingConfig {
        let mut logging = self.logging.clone();
        if !self.debug_logging {
            logging.enabled = false;
        }
        logging
    }
}

/// Split a comma, newline or tab separated list of device ids, dropping blanks.
pub fn parse_device_id_list(text: &str) -> Vec<String> {
    text.split([',', '\n', '\r', '\t'])
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Path to the global config file, if a home directory is known.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "consent-relay").map(|dirs| dirs.config_dir().join("config.toml"))
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the layered configuration for `workspace_root`.
    pub fn load(workspace_root: &Path) -> Result<RelayConfig, RelayError> {
        Self::load_layers(
            global_config_path().as_deref(),
            workspace_root,
            Self::environment(),
        )
    }

    /// Load defaults plus a single explicit file. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<RelayConfig, RelayError> {
        let builder = builder_with_defaults()?.add_source(File::from(path).required(true));
        Self::finish(builder)
    }

    pub(crate) fn load_layers(
        global: Option<&Path>,
        workspace_root: &Path,
        env: Environment,
    ) -> Result<RelayConfig, RelayError> {
        let mut builder = builder_with_defaults()?;

        if let Some(global) = global {
            if global.exists() {
                debug!(config_path = %global.display(), "Loading global config");
                builder = builder.add_source(File::from(global).required(false));
            }
        }

        let workspace_file = workspace_root.join(WORKSPACE_CONFIG_FILE);
        if workspace_file.exists() {
            debug!(config_path = %workspace_file.display(), "Loading workspace config");
            builder = builder.add_source(File::from(workspace_file).required(false));
        }

        Self::finish(builder.add_source(env))
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("test_device_hashed_ids")
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<RelayConfig, RelayError> {
        let config: RelayConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, RelayError> {
    Ok(Config::builder()
        .set_default("auto_show", false)?
        .set_default("debug_logging", true)?
        .set_default("test_device_hashed_ids", Vec::<String>::new())?
        .set_default("simulation.enabled", false)?
        .set_default("simulation.mode", "always")?)
}
