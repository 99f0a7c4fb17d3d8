use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::Serialize;
use std::path::Path;

use super::{ConfigError, ResizeConfig, Settings};

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Config file picked up from the working directory when present
pub const LOCAL_CONFIG_FILE: &str = "downsize.toml";

/// Prefix for environment overrides, e.g. `DOWNSIZE_MAX_WIDTH=1600`
pub const ENV_PREFIX: &str = "DOWNSIZE_";

pub struct DownsizeConfig {
    figment: Figment,
}

impl DownsizeConfig {
    pub fn load() -> Result<Self> {
        Self::load_with::<Settings>(None, None)
    }

    /// Merge every configuration layer, lowest priority first:
    /// embedded defaults, `./downsize.toml`, the custom file, `DOWNSIZE_*`
    /// environment variables, then explicit CLI overrides.
    pub fn load_with<T: Serialize>(
        custom_config: Option<&Path>,
        cli_overrides: Option<T>,
    ) -> Result<Self> {
        tracing::trace!("CONFIG LOAD: Starting");

        let mut figment = Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            .merge(Toml::file(LOCAL_CONFIG_FILE));

        if let Some(custom_path) = custom_config {
            if !custom_path.is_file() {
                return Err(ConfigError::MissingConfigFile(custom_path.to_path_buf()).into());
            }
            tracing::debug!("Loading config file {}", custom_path.display());
            figment = figment.merge(Toml::file(custom_path));
        }

        // Environment variables override files
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        if let Some(cli) = cli_overrides {
            tracing::trace!("CONFIG LOAD: Applying CLI overrides");
            figment = figment.merge(Serialized::defaults(cli));
        }

        Ok(DownsizeConfig { figment })
    }

    /// Extract the merged, not yet validated settings
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(ConfigError::from)
            .context("invalid configuration value")?;
        Ok(settings)
    }

    /// Extract and validate the run configuration
    pub fn resolve(&self) -> Result<ResizeConfig> {
        let config = ResizeConfig::try_from(self.settings()?)?;
        tracing::debug!(?config, "CONFIG LOAD: Resolved");
        Ok(config)
    }
}
