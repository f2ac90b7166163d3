//! Delete command - delete the object recorded in a state file

use console::style;
use crdprov_core::TypeRole;
use std::path::Path;

use crate::error::Result;
use crate::util;

pub async fn run(config_path: Option<&Path>, type_name: &str, state_path: &Path) -> Result<()> {
    let entry = super::resolve_type(type_name, TypeRole::Resource)?;
    let state = util::require_state(state_path)?;

    let provider = super::connect(config_path).await?;
    provider
        .delete(&entry.name, &state)
        .await
        .map_err(super::fail)?;
    util::remove_state(state_path)?;

    println!(
        "{} Deleted {} {}",
        style("✓").green(),
        entry.kind.kind,
        style(state.get("id").and_then(|v| v.as_str()).unwrap_or_default()).cyan()
    );
    Ok(())
}
