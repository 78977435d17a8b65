//! Config loader: reads `~/.switchboard/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.switchboard/config.json`
//! 3. Environment variables `SWITCHBOARD_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;
use crate::types::Provider;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    apply_env_overrides(load_config_from_path(&config_path))
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply process environment overrides on top of a loaded config.
fn apply_env_overrides(config: Config) -> Config {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply `SWITCHBOARD_*` overrides read through `lookup`.
///
/// Supported overrides:
/// - `SWITCHBOARD_ROUTER__MAX_RETRIES` → `router.max_retries`
/// - `SWITCHBOARD_ROUTER__TEMPERATURE` → `router.temperature`
/// - `SWITCHBOARD_ROUTER__PROBE_INTERVAL_SECS` → `router.probe_interval_secs`
/// - `SWITCHBOARD_PROVIDERS__<NAME>__API_BASE` → `providers.<name>.api_base`
/// - `SWITCHBOARD_PROVIDERS__<NAME>__MODEL` → `providers.<name>.model`
/// - `SWITCHBOARD_PROVIDERS__<NAME>__PRIORITY` → `providers.<name>.priority`
/// - `SWITCHBOARD_PROVIDERS__<NAME>__ENABLED` → `providers.<name>.enabled`
fn apply_overrides_from<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("SWITCHBOARD_ROUTER__MAX_RETRIES") {
        match val.parse::<u32>() {
            Ok(n) => config.router.max_retries = n,
            Err(_) => warn!("ignoring invalid SWITCHBOARD_ROUTER__MAX_RETRIES={}", val),
        }
    }
    if let Some(val) = lookup("SWITCHBOARD_ROUTER__TEMPERATURE") {
        match val.parse::<f64>() {
            Ok(t) if t.is_finite() => config.router.temperature = t,
            _ => warn!("ignoring invalid SWITCHBOARD_ROUTER__TEMPERATURE={}", val),
        }
    }
    if let Some(val) = lookup("SWITCHBOARD_ROUTER__PROBE_INTERVAL_SECS") {
        match val.parse::<u64>() {
            Ok(n) => config.router.probe_interval_secs = n,
            Err(_) => warn!("ignoring invalid SWITCHBOARD_ROUTER__PROBE_INTERVAL_SECS={}", val),
        }
    }

    for provider in Provider::ALL {
        let name = provider.as_str().to_uppercase();
        let overrides = config.providers.get_mut(provider);

        if let Some(val) = lookup(&format!("SWITCHBOARD_PROVIDERS__{name}__API_BASE")) {
            overrides.api_base = Some(val);
        }
        if let Some(val) = lookup(&format!("SWITCHBOARD_PROVIDERS__{name}__MODEL")) {
            overrides.model = Some(val);
        }
        let key = format!("SWITCHBOARD_PROVIDERS__{name}__PRIORITY");
        if let Some(val) = lookup(&key) {
            match val.parse::<u32>() {
                Ok(p) => overrides.priority = Some(p),
                Err(_) => warn!("ignoring invalid {}={}", key, val),
            }
        }
        if let Some(val) = lookup(&format!("SWITCHBOARD_PROVIDERS__{name}__ENABLED")) {
            overrides.enabled = val == "true" || val == "1";
        }
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.router.max_retries, 3);
        assert_eq!(config.transport.max_connections_per_provider, 30);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "router": { "maxRetries": 5, "backoffUnitMs": 10 },
            "providers": { "gemini": { "model": "gemini-2.0-flash", "timeoutSecs": 12 } }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.router.max_retries, 5);
        assert_eq!(config.router.backoff_unit_ms, 10);
        assert_eq!(config.providers.gemini.model.as_deref(), Some("gemini-2.0-flash"));
        assert_eq!(config.providers.gemini.timeout_secs, Some(12));
        // Default preserved
        assert_eq!(config.router.temperature, 0.7);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.router.max_retries, 3);
    }

    #[test]
    fn test_load_empty_json() {
        let file = write_temp_json("{}");
        let config = load_config_from_path(file.path());
        assert_eq!(config.router.probe_interval_secs, 300);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.router.max_retries = 1;
        config.providers.openai.api_key_env = Some("MY_OPENAI_KEY".to_string());

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.router.max_retries, 1);
        assert_eq!(
            reloaded.providers.openai.api_key_env.as_deref(),
            Some("MY_OPENAI_KEY")
        );
    }

    #[test]
    fn test_env_override_router() {
        let config = apply_overrides_from(
            Config::default(),
            env(&[
                ("SWITCHBOARD_ROUTER__MAX_RETRIES", "7"),
                ("SWITCHBOARD_ROUTER__TEMPERATURE", "0.2"),
            ]),
        );
        assert_eq!(config.router.max_retries, 7);
        assert_eq!(config.router.temperature, 0.2);
    }

    #[test]
    fn test_env_override_invalid_number_ignored() {
        let config = apply_overrides_from(
            Config::default(),
            env(&[("SWITCHBOARD_ROUTER__MAX_RETRIES", "lots")]),
        );
        assert_eq!(config.router.max_retries, 3);
    }

    #[test]
    fn test_env_override_invalid_values_keep_defaults() {
        let config = apply_overrides_from(
            Config::default(),
            env(&[
                ("SWITCHBOARD_ROUTER__TEMPERATURE", "warm"),
                ("SWITCHBOARD_ROUTER__PROBE_INTERVAL_SECS", "-5"),
                ("SWITCHBOARD_PROVIDERS__GEMINI__PRIORITY", "first"),
            ]),
        );
        assert_eq!(config.router.temperature, 0.7);
        assert_eq!(config.router.probe_interval_secs, 300);
        assert_eq!(config.providers.gemini.priority, None);
    }

    #[test]
    fn test_env_override_non_finite_temperature_ignored() {
        let config = apply_overrides_from(
            Config::default(),
            env(&[("SWITCHBOARD_ROUTER__TEMPERATURE", "NaN")]),
        );
        assert_eq!(config.router.temperature, 0.7);
    }

    #[test]
    fn test_env_override_provider() {
        let config = apply_overrides_from(
            Config::default(),
            env(&[
                ("SWITCHBOARD_PROVIDERS__GROQ__API_BASE", "http://localhost:9000/v1"),
                ("SWITCHBOARD_PROVIDERS__GROQ__PRIORITY", "9"),
                ("SWITCHBOARD_PROVIDERS__OPENAI__ENABLED", "false"),
            ]),
        );
        assert_eq!(
            config.providers.groq.api_base.as_deref(),
            Some("http://localhost:9000/v1")
        );
        assert_eq!(config.providers.groq.priority, Some(9));
        assert!(!config.providers.openai.enabled);
        assert!(config.providers.gemini.enabled);
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["router"].get("probeTimeoutSecs").is_some());
        assert!(raw["router"].get("probe_timeout_secs").is_none());
    }
}
