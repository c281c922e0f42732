//! `xcheck models`: show backend A model discovery.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use crosscheck_core::llm::discovery::{Discovery, DiscoverySource, discover, normalize_model_name};
use crosscheck_core::llm::gateway::ModelCatalog;
use crosscheck_infra::llm::gemini_gateway;

use crate::state::AppState;

/// List backend A models that support generation and show which one the
/// preference list selects.
pub async fn list_models(state: &AppState, json: bool) -> Result<()> {
    let credentials = state.credentials()?;
    let backends = &state.config.backends;
    let gateway = gemini_gateway(backends, credentials.gemini_api_key.clone())?;

    let (available, listing_error) = match gateway.list_models().await {
        Ok(models) => (models, None),
        Err(e) => {
            tracing::warn!(error = %e, "model listing failed");
            (Vec::new(), Some(e.to_string()))
        }
    };
    let discovery = discover(
        &backends.gemini_model_preferences,
        &available,
        &backends.gemini_default_model,
    );

    if json {
        let out = serde_json::json!({
            "available": available
                .iter()
                .map(|m| normalize_model_name(m))
                .collect::<Vec<_>>(),
            "preferences": backends.gemini_model_preferences,
            "selected": discovery.model_id,
            "source": source_label(&discovery),
            "listing_error": listing_error,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if let Some(err) = &listing_error {
        println!();
        println!(
            "  {} Could not list models: {}",
            style("!").yellow().bold(),
            err
        );
    } else {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Model").fg(Color::White),
            Cell::new("Preference").fg(Color::White),
        ]);
        for model in &available {
            let name = normalize_model_name(model);
            let rank = backends
                .gemini_model_preferences
                .iter()
                .position(|p| normalize_model_name(p) == name)
                .map(|i| (i + 1).to_string())
                .unwrap_or_default();
            let color = if name == discovery.model_id {
                Color::Green
            } else {
                Color::White
            };
            table.add_row(vec![Cell::new(name).fg(color), Cell::new(rank).fg(Color::DarkGrey)]);
        }
        println!();
        println!("{table}");
    }

    println!();
    println!(
        "  {}  {} {}",
        style("Selected:").bold(),
        style(&discovery.model_id).green(),
        style(format!("({})", source_label(&discovery))).dim()
    );
    println!();
    Ok(())
}

fn source_label(discovery: &Discovery) -> &'static str {
    match discovery.source {
        DiscoverySource::Preferred => "preferred",
        DiscoverySource::FirstAvailable => "first available",
        DiscoverySource::Default => "default",
    }
}
