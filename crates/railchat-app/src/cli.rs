//! CLI argument definitions for the railchat terminal client.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use railchat_core::config::RailchatConfig;

/// railchat: talk to the train booking assistant from a terminal.
#[derive(Parser, Debug)]
#[command(name = "railchat", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the assistant backend.
    #[arg(short = 'u', long = "api-url")]
    pub api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Disable voice input even if a recognizer is configured.
    #[arg(long = "no-voice")]
    pub no_voice: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > platform default (~/.railchat/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        default_config_path()
    }

    /// Load the config file, then layer the environment and flags on top.
    pub fn resolve_config(&self) -> RailchatConfig {
        let mut config = RailchatConfig::load_or_default(&self.resolve_config_path());
        config.apply_env_overrides();
        self.apply_to(&mut config);
        config
    }

    /// Apply flag overrides to an already loaded config.
    pub fn apply_to(&self, config: &mut RailchatConfig) {
        if let Some(ref url) = self.api_url {
            config.api.base_url = url.clone();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if self.no_voice {
            config.voice.enabled = false;
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".railchat").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".railchat").join("config.toml");
    }
    PathBuf::from("config.toml")
}
