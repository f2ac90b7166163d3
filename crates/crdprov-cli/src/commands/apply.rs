//! Apply command - create, update or replace a resource

use console::style;
use crdprov_core::TypeRole;
use std::path::Path;

use crate::display;
use crate::error::Result;
use crate::util;

pub async fn run(
    config_path: Option<&Path>,
    type_name: &str,
    file: &Path,
    state_path: Option<&Path>,
) -> Result<()> {
    let entry = super::resolve_type(type_name, TypeRole::Resource)?;
    let config = util::read_config(file)?;
    let prior = match state_path {
        Some(path) => util::read_state(path)?,
        None => None,
    };

    let provider = super::connect(config_path).await?;
    let outcome = provider
        .apply(&entry.name, prior.as_ref(), &config)
        .await
        .map_err(super::fail)?;

    let (symbol, action_style) = display::action_style(outcome.action);
    let id = outcome.state.get("id").and_then(|v| v.as_str()).unwrap_or_default();
    println!(
        "{} {} {}: {}",
        action_style.apply_to(symbol),
        entry.kind.kind,
        style(id).cyan(),
        outcome.action
    );

    match state_path {
        Some(path) => {
            util::write_state(path, &outcome.state)?;
            println!("{} State written to {}", style("✓").green(), path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&outcome.state)?),
    }
    Ok(())
}
