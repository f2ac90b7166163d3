//! Types command - list provider types

use console::style;
use crdprov_core::{ProviderSchema, TypeRole};
use serde_json::json;

use crate::error::Result;

pub fn run(json_output: bool) -> Result<()> {
    let registry = ProviderSchema::global();

    if json_output {
        let types: Vec<_> = registry
            .entries()
            .iter()
            .map(|entry| {
                json!({
                    "name": entry.name,
                    "role": entry.role,
                    "kind": entry.kind.kind,
                    "api_version": entry.kind.api_version(),
                    "namespaced": entry.kind.namespaced,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&types)?);
        return Ok(());
    }

    for role in [TypeRole::Resource, TypeRole::DataSource, TypeRole::Manifest] {
        println!("{}", style(format!("{}s", role)).bold());
        for entry in registry.by_role(role) {
            println!(
                "  {} {}",
                style(&entry.name).cyan(),
                style(format!("({} {})", entry.kind.kind, entry.kind.api_version())).dim()
            );
        }
        println!();
    }

    Ok(())
}
