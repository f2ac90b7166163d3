//! Import command - adopt an existing object into state

use console::style;
use crdprov_core::TypeRole;
use std::path::Path;

use crate::error::Result;
use crate::util;

pub async fn run(
    config_path: Option<&Path>,
    type_name: &str,
    id: &str,
    state_path: Option<&Path>,
) -> Result<()> {
    let entry = super::resolve_type(type_name, TypeRole::Resource)?;
    // Reject malformed identifiers before connecting
    let target = super::parse_id(entry, id)?;

    let provider = super::connect(config_path).await?;
    let state = provider.import(&entry.name, id).await.map_err(super::fail)?;

    println!(
        "{} Imported {} {}",
        style("✓").green(),
        entry.kind.kind,
        style(&target).cyan()
    );
    match state_path {
        Some(path) => util::write_state(path, &state)?,
        None => println!("{}", serde_json::to_string_pretty(&state)?),
    }
    Ok(())
}
