//! `switchboard status`: show configuration and credential status.
//!
//! Purely local: nothing is sent to any provider.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use switchboard_core::config::{get_config_path, load_config};
use switchboard_providers::{EnvSecrets, ProviderCatalog};

/// One provider line of the status table.
#[derive(Debug, PartialEq)]
struct ProviderRow {
    name: String,
    model: String,
    protocol: &'static str,
    priority: u32,
    timeout_secs: u64,
    key: KeyStatus,
}

#[derive(Debug, PartialEq)]
enum KeyStatus {
    Set,
    Missing(String),
    Disabled,
}

fn provider_rows(catalog: &ProviderCatalog) -> Vec<ProviderRow> {
    catalog
        .configs()
        .map(|config| ProviderRow {
            name: config.display_name.clone(),
            model: config.model.clone(),
            protocol: config.protocol.as_str(),
            priority: config.priority,
            timeout_secs: config.timeout.as_secs(),
            key: if !config.enabled {
                KeyStatus::Disabled
            } else if catalog.has_credential(config.provider) {
                KeyStatus::Set
            } else {
                KeyStatus::Missing(config.api_key_env.clone())
            },
        })
        .collect()
}

/// Run the status command.
pub fn run(path: Option<&Path>) -> Result<()> {
    let config = load_config(path);
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);
    let catalog = ProviderCatalog::from_config(&config.providers, &EnvSecrets);

    println!();
    println!("{}", "Switchboard Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".red().to_string()
        }
    );

    let router = &config.router;
    println!(
        "  {:<18} {}",
        "Routing:".bold(),
        format!(
            "retries: {} | temp: {} | probe every {}s (timeout {}s)",
            router.max_retries, router.temperature, router.probe_interval_secs, router.probe_timeout_secs
        )
        .dimmed(),
    );

    let transport = &config.transport;
    println!(
        "  {:<18} {}",
        "Connections:".bold(),
        format!(
            "max {} | per provider {}",
            transport.max_connections, transport.max_connections_per_provider
        )
        .dimmed(),
    );

    println!();
    println!("  {}", "Providers:".bold());
    for row in provider_rows(&catalog) {
        let key = match row.key {
            KeyStatus::Set => format!("{} (key set)", "✓".green()),
            KeyStatus::Missing(var) => format!("{}", format!("· {var} not set").dimmed()),
            KeyStatus::Disabled => format!("{}", "· disabled".yellow()),
        };
        println!(
            "    {:<12} {:<34} {} {}",
            row.name,
            row.model,
            format!("p{} {} {}s", row.priority, row.protocol, row.timeout_secs).dimmed(),
            key
        );
    }
    println!();

    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::config::ProvidersConfig;
    use switchboard_providers::StaticSecrets;

    #[test]
    fn rows_follow_catalog_order() {
        let catalog = ProviderCatalog::from_config(&ProvidersConfig::default(), &StaticSecrets::new());
        let rows = provider_rows(&catalog);
        let priorities: Vec<u32> = rows.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![1, 2, 3, 4]);
        assert_eq!(rows[2].protocol, "generate-content");
    }

    #[test]
    fn key_status_reflects_secrets_and_enabled() {
        let mut providers = ProvidersConfig::default();
        providers.openai.enabled = false;
        let secrets = StaticSecrets::new()
            .with("GROQ_API_KEY", "k")
            .with("OPENAI_API_KEY", "k");
        let catalog = ProviderCatalog::from_config(&providers, &secrets);
        let rows = provider_rows(&catalog);

        assert_eq!(rows[0].key, KeyStatus::Missing("OPENROUTER_API_KEY".into()));
        assert_eq!(rows[1].key, KeyStatus::Set);
        assert_eq!(rows[3].key, KeyStatus::Disabled);
    }

    #[test]
    fn run_with_missing_file_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(Some(&dir.path().join("absent.json"))).is_ok());
    }
}
