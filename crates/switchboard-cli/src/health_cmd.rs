//! `switchboard health` / `switchboard watch` output.

use anyhow::{Context, Result};
use colored::Colorize;

use switchboard_core::utils::truncate_string;
use switchboard_router::{HealthReport, HealthSnapshot, OverallStatus, ProviderHealth};

use crate::helpers::{format_ms, format_rate};

const ERROR_COLUMN: usize = 60;

/// Print a health report as a table or as pretty JSON.
pub fn print_report(report: &HealthReport, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(report).context("failed to serialize report")?;
        println!("{text}");
        return Ok(());
    }

    let status = match report.status {
        OverallStatus::Healthy => "healthy".green().bold(),
        OverallStatus::Degraded => "degraded".yellow().bold(),
        OverallStatus::Unhealthy => "unhealthy".red().bold(),
    };

    println!();
    println!("{}  {}", "Switchboard Health".cyan().bold(), status);
    println!(
        "  {}",
        format!(
            "{} of {} providers available, {} degraded",
            report.available_providers, report.total_providers, report.degraded_providers
        )
        .dimmed()
    );
    println!();
    for provider in &report.providers {
        println!("{}", provider_line(provider));
    }
    println!();
    Ok(())
}

/// Callback for the monitor: one compact table per cycle.
pub fn print_snapshot(snapshot: &HealthSnapshot) {
    println!(
        "{}",
        format!("── {} ──", chrono::Local::now().format("%H:%M:%S")).dimmed()
    );
    for provider in &snapshot.providers {
        println!("{}", provider_line(provider));
    }
}

fn provider_line(p: &ProviderHealth) -> String {
    let mark = if p.available {
        "✓".green()
    } else if p.has_credential {
        "✗".red()
    } else {
        "·".dimmed()
    };

    let mut line = format!(
        "  {} {:<11} {:>7}  avg {:>7}  {}/{} ok",
        mark,
        p.provider.as_str(),
        format_rate(p.success_rate),
        format_ms(p.avg_response_time_ms),
        p.successful_requests,
        p.total_requests,
    );
    if let Some(ref err) = p.last_error {
        line.push_str(&format!("  {}", truncate_string(err, ERROR_COLUMN).dimmed()));
    }
    line
}
