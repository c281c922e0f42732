//! `xcheck doctor`: environment and connectivity checks.

use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crosscheck_core::llm::box_gateway::BoxModelGateway;
use crosscheck_core::session::SessionStore;
use crosscheck_infra::llm::check_connection;

use crate::state::AppState;

/// Outcome of one check.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckResult {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

impl CheckResult {
    fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok: true,
            detail: detail.into(),
        }
    }

    fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok: false,
            detail: detail.into(),
        }
    }
}

/// Check local files, credentials and a ping call to each backend.
pub async fn doctor(state: &AppState, json: bool) -> Result<()> {
    let mut checks = Vec::new();

    checks.push(CheckResult::pass(
        "data directory",
        state.data_dir.display().to_string(),
    ));

    let config_path = state.config_path();
    checks.push(CheckResult::pass(
        "config",
        if config_path.exists() {
            config_path.display().to_string()
        } else {
            "no config.toml, using defaults".to_string()
        },
    ));

    checks.push(match state.session_store().load().await {
        Ok(sessions) => CheckResult::pass(
            "sessions",
            format!(
                "{} session(s), {} turn(s)",
                sessions.len(),
                sessions.iter().map(|s| s.len()).sum::<usize>()
            ),
        ),
        Err(e) => CheckResult::fail("sessions", e.to_string()),
    });

    match state.credentials() {
        Ok(credentials) => {
            checks.push(CheckResult::pass(
                "credentials",
                if credentials.requires_password() {
                    "API keys found, access password set"
                } else {
                    "API keys found"
                },
            ));
            match state.gateways(&credentials) {
                Ok((a, b)) => {
                    checks.push(ping(&a, json).await);
                    checks.push(ping(&b, json).await);
                }
                Err(e) => checks.push(CheckResult::fail("gateways", format!("{e:#}"))),
            }
        }
        Err(e) => checks.push(CheckResult::fail("credentials", e.to_string())),
    }

    let healthy = checks.iter().all(|c| c.ok);

    if json {
        let out = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "healthy": healthy,
            "checks": checks,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Crosscheck v{}",
        style("🔍").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();
    for check in &checks {
        let mark = if check.ok {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!(
            "  {} {:<14} {}",
            mark,
            check.name,
            style(&check.detail).dim()
        );
    }
    println!();
    if !healthy {
        println!(
            "  {}",
            style("Some checks failed. Run with -v for details.").yellow()
        );
        println!();
    }
    Ok(())
}

async fn ping(gateway: &BoxModelGateway, quiet: bool) -> CheckResult {
    let name = format!("{} ({})", gateway.backend(), gateway.provider_name());

    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner
    };
    spinner.set_message(format!("contacting {}...", gateway.provider_name()));

    let result = check_connection(gateway).await;
    spinner.finish_and_clear();

    match result {
        Ok(model) => CheckResult::pass(name, format!("{model} answered")),
        Err(e) => CheckResult::fail(name, format!("{} ({})", e, e.kind())),
    }
}
