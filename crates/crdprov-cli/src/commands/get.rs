//! Get command - read a live object through its data source

use crdprov_core::TypeRole;
use serde_json::json;
use std::path::Path;

use crate::error::Result;

pub async fn run(config_path: Option<&Path>, type_name: &str, id: &str, json_output: bool) -> Result<()> {
    let entry = super::resolve_type(type_name, TypeRole::DataSource)?;
    let target = super::parse_id(entry, id)?;

    let mut metadata = json!({ "name": target.name });
    if let Some(namespace) = &target.namespace {
        metadata["namespace"] = json!(namespace);
    }

    let provider = super::connect(config_path).await?;
    let data = provider
        .read_data_source(&entry.name, &json!({ "metadata": metadata }))
        .await
        .map_err(super::fail)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        print!("{}", serde_yaml::to_string(&data)?);
    }
    Ok(())
}
