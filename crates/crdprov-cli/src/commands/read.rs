//! Read command - refresh a state file

use console::style;
use crdprov_core::TypeRole;
use std::path::Path;

use crate::error::Result;
use crate::util;

pub async fn run(config_path: Option<&Path>, type_name: &str, state_path: &Path) -> Result<()> {
    let entry = super::resolve_type(type_name, TypeRole::Resource)?;
    let state = util::require_state(state_path)?;

    let provider = super::connect(config_path).await?;
    match provider.read(&entry.name, &state).await.map_err(super::fail)? {
        Some(refreshed) => {
            let changed = refreshed != state;
            util::write_state(state_path, &refreshed)?;
            if changed {
                println!("{} State refreshed, the object changed outside crdprov", style("~").yellow());
            } else {
                println!("{} State is up to date", style("✓").green());
            }
        }
        None => {
            util::remove_state(state_path)?;
            println!(
                "{} {} no longer exists, removed {}",
                style("⚠").yellow(),
                entry.kind.kind,
                state_path.display()
            );
        }
    }
    Ok(())
}
