use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::engine::naming::{DEFAULT_MAX_TAG_LENGTH, TruncationStyle};
use crate::engine::rename_controller::RenamerSettings;
use crate::transport::discord::DEFAULT_API_BASE;

/// Top-level bot configuration, loaded from tagger.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct BotConfig {
    pub discord: DiscordSection,
    pub renamer: RenamerSection,
    pub steam: SteamSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiscordSection {
    /// Bot token. When empty the bot only pretends to rename.
    pub token: String,
    pub api_base: String,
    pub request_timeout_secs: u64,
    pub dry_run: bool,
    /// Simulated round trip for dry-run renames.
    pub dry_run_latency_ms: u64,
}

impl Default for DiscordSection {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: DEFAULT_API_BASE.into(),
            request_timeout_secs: 15,
            dry_run: false,
            dry_run_latency_ms: 250,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenamerSection {
    pub max_activity_name_length: usize,
    pub truncation: TruncationStyle,
    pub skip_solo_channels: bool,
}

impl Default for RenamerSection {
    fn default() -> Self {
        Self {
            max_activity_name_length: DEFAULT_MAX_TAG_LENGTH,
            truncation: TruncationStyle::Trailing,
            skip_solo_channels: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SteamSection {
    pub api_key: String,
    /// Parallel requests to the Steam Web API.
    pub concurrency: usize,
    pub request_timeout_secs: u64,
}

impl Default for SteamSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            concurrency: 6,
            request_timeout_secs: 30,
        }
    }
}

impl BotConfig {
    /// Load config from a TOML file. Falls back to defaults if the file doesn't exist.
    /// Environment variables override TOML values.
    pub fn load(path: &str) -> Result<Self, String> {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read config file {path}: {e}"))?;
            Self::from_toml(&contents).map_err(|e| format!("in {path}: {e}"))?
        } else {
            info!("No config file found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| format!("failed to parse config: {e}"))
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("DISCORD_TOKEN") {
            self.discord.token = v;
        }
        if let Some(v) = var("DISCORD_API_BASE") {
            self.discord.api_base = v;
        }
        if let Some(v) = var("DISCORD_TIMEOUT_SECS")
            && let Ok(secs) = v.parse()
        {
            self.discord.request_timeout_secs = secs;
        }
        if let Some(v) = var("DRY_RUN") {
            self.discord.dry_run = parse_flag(&v);
        }
        if let Some(v) = var("DRY_RUN_LATENCY_MS")
            && let Ok(ms) = v.parse()
        {
            self.discord.dry_run_latency_ms = ms;
        }
        if let Some(v) = var("MAX_ACTIVITY_NAME_LENGTH")
            && let Ok(len) = v.parse()
        {
            self.renamer.max_activity_name_length = len;
        }
        if let Some(v) = var("TRUNCATION_STYLE")
            && let Some(style) = TruncationStyle::parse(&v)
        {
            self.renamer.truncation = style;
        }
        if let Some(v) = var("SKIP_SOLO_CHANNELS") {
            self.renamer.skip_solo_channels = parse_flag(&v);
        }
        if let Some(v) = var("STEAM_API_KEY") {
            self.steam.api_key = v;
        }
        if let Some(v) = var("STEAM_CONCURRENCY")
            && let Ok(n) = v.parse()
        {
            self.steam.concurrency = n;
        }
        if let Some(v) = var("STEAM_TIMEOUT_SECS")
            && let Ok(secs) = v.parse()
        {
            self.steam.request_timeout_secs = secs;
        }
    }

    /// Renames go nowhere without a token, or when dry run is asked for.
    pub fn is_dry_run(&self) -> bool {
        self.discord.dry_run || self.discord.token.trim().is_empty()
    }

    pub fn discord_timeout(&self) -> Duration {
        Duration::from_secs(self.discord.request_timeout_secs)
    }

    pub fn dry_run_latency(&self) -> Duration {
        Duration::from_millis(self.discord.dry_run_latency_ms)
    }

    /// Convert into the renamer's own settings.
    pub fn to_renamer_settings(&self) -> RenamerSettings {
        RenamerSettings {
            max_tag_length: self.renamer.max_activity_name_length.max(1),
            truncation: self.renamer.truncation,
            skip_solo_channels: self.renamer.skip_solo_channels,
        }
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.discord.api_base, "https://discord.com/api/v10");
        assert_eq!(config.renamer.max_activity_name_length, 15);
        assert_eq!(config.renamer.truncation, TruncationStyle::Trailing);
        assert!(!config.renamer.skip_solo_channels);
        assert_eq!(config.steam.concurrency, 6);
        assert!(config.is_dry_run());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BotConfig::from_toml(
            r#"
[discord]
token = "abc"

[renamer]
truncation = "symmetric"
max_activity_name_length = 16
"#,
        )
        .unwrap();
        assert_eq!(config.discord.token, "abc");
        assert_eq!(config.discord.request_timeout_secs, 15);
        assert!(!config.is_dry_run());

        let settings = config.to_renamer_settings();
        assert_eq!(settings.truncation, TruncationStyle::Symmetric);
        assert_eq!(settings.max_tag_length, 16);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(BotConfig::from_toml("[renamer]\ntruncation = \"middle\"").is_err());
        assert!(BotConfig::from_toml("not = [toml").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DISCORD_TOKEN", "from-env"),
            ("DRY_RUN", "yes"),
            ("MAX_ACTIVITY_NAME_LENGTH", "20"),
            ("TRUNCATION_STYLE", "symmetric"),
            ("SKIP_SOLO_CHANNELS", "true"),
            ("STEAM_CONCURRENCY", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = BotConfig::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.discord.token, "from-env");
        assert!(config.is_dry_run());
        assert_eq!(config.renamer.max_activity_name_length, 20);
        assert_eq!(config.renamer.truncation, TruncationStyle::Symmetric);
        assert!(config.renamer.skip_solo_channels);
        // Unparseable values leave the default alone.
        assert_eq!(config.steam.concurrency, 6);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = BotConfig::load("/nonexistent/tagger.toml").unwrap();
        assert_eq!(config.renamer.max_activity_name_length, 15);
    }
}
