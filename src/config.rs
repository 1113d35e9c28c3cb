use anyhow::{anyhow, Context, Result};
use chrono::Locale;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";
const DEFAULT_LOCALE: &str = "pt_BR";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.into()
}

fn default_locale() -> String {
    DEFAULT_LOCALE.into()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.into()
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_with(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Read `path` when it exists, otherwise require `PLANNER_API_URL`.
    /// `PLANNER_*` variables from `env` override file values either way.
    pub fn load_with(path: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match path.filter(|p| p.exists()) {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config at {}", path.display()))?;
                toml::from_str(&contents).with_context(|| "Failed to parse config.toml")?
            }
            None => Config {
                api_url: env("PLANNER_API_URL").with_context(|| {
                    "PLANNER_API_URL not set. Create a config file or set the env var."
                })?,
                timezone: default_timezone(),
                locale: default_locale(),
                log_level: default_log_level(),
            },
        };

        if let Some(url) = env("PLANNER_API_URL") {
            config.api_url = url;
        }
        if let Some(tz) = env("PLANNER_TIMEZONE") {
            config.timezone = tz;
        }
        if let Some(locale) = env("PLANNER_LOCALE") {
            config.locale = locale;
        }

        // Fail at startup rather than on the first rendered date.
        config.zone()?;
        config.locale()?;
        Ok(config)
    }

    pub fn zone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Unknown timezone {:?}: {e}", self.timezone))
    }

    pub fn locale(&self) -> Result<Locale> {
        Locale::try_from(self.locale.as_str())
            .map_err(|_| anyhow!("Unknown locale {:?}", self.locale))
    }

    pub fn generate_default() -> Result<PathBuf> {
        let path = Self::config_path()
            .with_context(|| "Could not determine config directory")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let default = Config {
            api_url: "http://localhost:5000".into(),
            timezone: default_timezone(),
            locale: default_locale(),
            log_level: default_log_level(),
        };

        let toml_str = toml::to_string_pretty(&default)?;
        std::fs::write(&path, toml_str)?;
        Ok(path)
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("planner-tui").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn loads_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = \"http://trips.local\"\n").unwrap();

        let config = Config::load_with(Some(&path), env_from(&[])).unwrap();
        assert_eq!(config.api_url, "http://trips.local");
        assert_eq!(config.timezone, "America/Sao_Paulo");
        assert_eq!(config.zone().unwrap(), chrono_tz::America::Sao_Paulo);
        assert_eq!(config.locale().unwrap(), Locale::pt_BR);
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_url = \"http://trips.local\"\ntimezone = \"UTC\"\n",
        )
        .unwrap();

        let env = env_from(&[("PLANNER_TIMEZONE", "Europe/Lisbon"), ("PLANNER_LOCALE", "pt_PT")]);
        let config = Config::load_with(Some(&path), env).unwrap();
        assert_eq!(config.zone().unwrap(), chrono_tz::Europe::Lisbon);
        assert_eq!(config.locale().unwrap(), Locale::pt_PT);
    }

    #[test]
    fn missing_file_falls_back_to_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(Config::load_with(Some(&path), env_from(&[])).is_err());

        let config =
            Config::load_with(Some(&path), env_from(&[("PLANNER_API_URL", "http://api")])).unwrap();
        assert_eq!(config.api_url, "http://api");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn rejects_unknown_timezone() {
        let env = env_from(&[("PLANNER_API_URL", "http://api"), ("PLANNER_TIMEZONE", "Mars/Olympus")]);
        assert!(Config::load_with(None, env).is_err());
    }
}
