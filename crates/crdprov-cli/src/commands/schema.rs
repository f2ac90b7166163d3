//! Schema command - show the attribute schema of a type

use console::style;
use crdprov_core::TypeRole;

use crate::display;
use crate::error::Result;

pub fn run(type_name: &str, role: TypeRole, json_schema: bool, json_output: bool) -> Result<()> {
    let entry = super::resolve_type(type_name, role)?;
    let schema = entry.schema();

    if json_schema {
        println!("{}", serde_json::to_string_pretty(&schema.to_json_schema())?);
        return Ok(());
    }
    if json_output {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    println!(
        "{} {} ({})",
        style("→").blue(),
        style(&entry.name).cyan().bold(),
        role
    );
    if !schema.description.is_empty() {
        println!("  {}", style(&schema.description).dim());
    }
    println!();
    display::print_schema(&schema);

    Ok(())
}
