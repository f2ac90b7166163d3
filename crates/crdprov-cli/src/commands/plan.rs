//! Plan command - show what an apply would change

use console::style;
use crdprov_core::TypeRole;
use crdprov_kube::PlanAction;
use std::path::Path;

use crate::display;
use crate::error::Result;
use crate::util;

pub fn run(type_name: &str, file: &Path, state: Option<&Path>) -> Result<()> {
    let entry = super::resolve_type(type_name, TypeRole::Resource)?;
    let config = util::read_config(file)?;
    let prior = match state {
        Some(path) => util::read_state(path)?,
        None => None,
    };

    let result = super::offline()
        .plan(&entry.name, prior.as_ref(), &config)
        .map_err(super::fail)?;

    let (symbol, action_style) = display::action_style(result.action);
    println!(
        "{} {} {} will be {}",
        action_style.apply_to(symbol),
        entry.kind.kind,
        style(result.planned.object_ref()).cyan(),
        action_style.apply_to(result.action)
    );

    if result.action == PlanAction::NoOp {
        return Ok(());
    }

    println!();
    display::print_diff(&result.diff);
    if !result.has_manifest_changes() {
        println!("  {}", style("(only provider settings change)").dim());
    }
    Ok(())
}
