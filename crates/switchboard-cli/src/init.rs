//! `switchboard init`: write a default config file.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use switchboard_core::config::{get_config_path, save_config, Config};

/// Create the config file if it doesn't exist. Returns whether it was written.
fn ensure_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("failed to write config: {}", path.display()))?;
    Ok(true)
}

/// Run the init command.
pub fn run(path: Option<&Path>) -> Result<()> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

    println!();
    println!("{}", "Switchboard Setup".cyan().bold());
    println!();

    if ensure_config(&config_path)? {
        println!("  {} created config at {}", "✓".green(), config_path.display());
    } else {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    }

    println!();
    println!(
        "{}",
        "Set OPENROUTER_API_KEY, GROQ_API_KEY, GEMINI_API_KEY and/or OPENAI_API_KEY, then run `switchboard health`."
            .dimmed()
    );
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::config::load_config;

    #[test]
    fn writes_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert!(ensure_config(&path).unwrap());
        assert!(path.exists());
        assert!(!ensure_config(&path).unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("maxRetries"));
        assert_eq!(load_config(Some(&path)).router.max_retries, 3);
    }

    #[test]
    fn keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"router":{"maxRetries":7}}"#).unwrap();

        run(Some(&path)).unwrap();
        assert_eq!(load_config(Some(&path)).router.max_retries, 7);
    }
}
