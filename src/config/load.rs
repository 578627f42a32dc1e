use std::{env, path::PathBuf};

use thiserror::Error;

use super::schema::Settings;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidSettings {
    #[error("playback.position_interval_ms must be >= 1")]
    PositionInterval,
    #[error("library.thumbnail_size must be >= 1")]
    ThumbnailSize,
    #[error("audio.crossfade_steps must be >= 1")]
    CrossfadeSteps,
}

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `MUSICO__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("MUSICO")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }

    /// Basic sanity checks on loaded settings.
    pub fn validate(&self) -> Result<(), InvalidSettings> {
        if self.playback.position_interval_ms == 0 {
            return Err(InvalidSettings::PositionInterval);
        }
        if self.library.thumbnail_size == 0 {
            return Err(InvalidSettings::ThumbnailSize);
        }
        if self.audio.crossfade_steps == 0 {
            return Err(InvalidSettings::CrossfadeSteps);
        }
        Ok(())
    }

    /// Render these settings as a TOML document, suitable as a
    /// starting `config.toml`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Resolve the config path from `MUSICO_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("MUSICO_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/musico/config.toml`
/// or `~/.config/musico/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("musico").join("config.toml"))
}
