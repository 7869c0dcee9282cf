use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::provider::ProviderId;

pub const ENV_PROVIDER: &str = "WEATHER_PROVIDER";
pub const ENV_API_KEY: &str = "WEATHER_API_KEY";

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    /// Override for the location service base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoding_url: Option<String>,

    /// Override for the weather service base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_url: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "open-meteo" or "accuweather".
    pub default_provider: Option<String>,

    /// Example TOML:
    /// [providers.open-meteo]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow!(
                "No default provider configured.\n\
                 Hint: run `weather-mcp configure <provider>` \
                 (e.g. `weather-mcp configure open-meteo`) first."
            )
        })?;

        Ok(ProviderId::try_from(s.as_str())?)
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from the platform config file, then apply the provider
    /// override and environment variables on top.
    pub fn load(provider: Option<ProviderId>) -> Result<Self> {
        let mut cfg = Self::load_from(&Self::config_file_path()?)?;
        cfg.apply_overrides(provider, |name| std::env::var(name).ok())?;
        Ok(cfg)
    }

    /// Load config from `path`, or return an empty default if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config file.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-mcp", "weather-mcp")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply overrides. Provider precedence is `provider` (command line), then
    /// `WEATHER_PROVIDER`, then the file; `WEATHER_API_KEY` is attached to
    /// whichever provider ends up selected.
    pub fn apply_overrides<F>(&mut self, provider: Option<ProviderId>, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_provider = lookup(ENV_PROVIDER)
            .filter(|v| !v.trim().is_empty())
            .map(|v| {
                ProviderId::try_from(v.trim()).with_context(|| format!("Invalid {ENV_PROVIDER}"))
            })
            .transpose()?;

        if let Some(id) = provider.or(env_provider) {
            self.set_default_provider(id);
        }

        if let Some(api_key) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
            let id = self.default_provider_id().unwrap_or(ProviderId::OpenMeteo);
            self.upsert_provider_api_key(id, api_key.trim().to_string());
        }

        Ok(())
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers
            .entry(provider_id.as_str().to_string())
            .or_default()
            .api_key = api_key;

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id)
            .is_some_and(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    fn env<'a>(
        pairs: &'a [(&'static str, &'static str)],
    ) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn default_provider_id_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.default_provider_id().unwrap_err();

        assert!(err.to_string().contains("No default provider configured"));
    }

    #[test]
    fn set_api_key_and_default_for_provider() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenMeteo, "OPEN_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::OpenMeteo);

        let key = cfg.provider_api_key(ProviderId::OpenMeteo);
        assert_eq!(key, Some("OPEN_KEY"));
        assert!(cfg.is_provider_configured(ProviderId::OpenMeteo));
    }

    #[test]
    fn upsert_does_not_override_existing_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenMeteo, "OPEN_KEY".into());
        cfg.upsert_provider_api_key(ProviderId::AccuWeather, "ACCU_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");

        assert_eq!(default, ProviderId::OpenMeteo);
        assert!(cfg.is_provider_configured(ProviderId::OpenMeteo));
        assert!(cfg.is_provider_configured(ProviderId::AccuWeather));
    }

    #[test]
    fn upsert_keeps_endpoint_overrides() {
        let mut cfg = Config::default();
        cfg.providers.insert(
            "accuweather".into(),
            ProviderConfig {
                api_key: "OLD".into(),
                geocoding_url: Some("http://localhost:9000".into()),
                weather_url: None,
            },
        );

        cfg.upsert_provider_api_key(ProviderId::AccuWeather, "NEW".into());

        let provider = cfg.provider_config(ProviderId::AccuWeather).unwrap();
        assert_eq!(provider.api_key, "NEW");
        assert_eq!(provider.geocoding_url.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn set_default_provider_overrides_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenMeteo, "OPEN_KEY".into());
        cfg.upsert_provider_api_key(ProviderId::AccuWeather, "ACCU_KEY".into());

        cfg.set_default_provider(ProviderId::AccuWeather);

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::AccuWeather);
    }

    #[test]
    fn env_overrides_provider_and_key() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenMeteo, "FILE_KEY".into());

        let vars = [(ENV_PROVIDER, "accuweather"), (ENV_API_KEY, " ENV_KEY ")];
        cfg.apply_overrides(None, env(&vars)).unwrap();

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::AccuWeather);
        assert_eq!(cfg.provider_api_key(ProviderId::AccuWeather), Some("ENV_KEY"));
        assert_eq!(cfg.provider_api_key(ProviderId::OpenMeteo), Some("FILE_KEY"));
    }

    #[test]
    fn env_key_without_provider_uses_open_meteo() {
        let mut cfg = Config::default();
        cfg.apply_overrides(None, env(&[(ENV_API_KEY, "ENV_KEY")]))
            .unwrap();

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenMeteo);
        assert!(cfg.is_provider_configured(ProviderId::OpenMeteo));
    }

    #[test]
    fn env_rejects_unknown_provider() {
        let mut cfg = Config::default();
        let err = cfg
            .apply_overrides(None, env(&[(ENV_PROVIDER, "darksky")]))
            .unwrap_err();
        assert!(format!("{err:#}").contains("Unknown provider"));
    }

    #[test]
    fn command_line_provider_beats_env_and_takes_env_key() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenMeteo, "FILE_KEY".into());

        cfg.apply_overrides(
            Some(ProviderId::AccuWeather),
            env(&[(ENV_PROVIDER, "open-meteo"), (ENV_API_KEY, "ENV_KEY")]),
        )
        .unwrap();

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::AccuWeather);
        assert_eq!(cfg.provider_api_key(ProviderId::AccuWeather), Some("ENV_KEY"));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::AccuWeather, "ACCU_KEY".into());
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_provider_id().unwrap(), ProviderId::AccuWeather);
        assert_eq!(loaded.provider_api_key(ProviderId::AccuWeather), Some("ACCU_KEY"));
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.default_provider.is_none());
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn load_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_provider = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
