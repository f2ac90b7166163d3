//! Display formatting for CLI output
//!
//! Provides structured display for:
//! - Diagnostics with attribute paths
//! - Plan actions and manifest diffs
//! - Attribute schemas as an indented tree

use console::{Style, style};
use crdprov_core::schema::{Attributes, describe_type};
use crdprov_core::{Diagnostics, Presence, Schema, Severity};
use crdprov_kube::{DiffLine, LineType, PlanAction};

/// Print diagnostics, one block per diagnostic
pub fn print_diagnostics(diags: &Diagnostics) {
    for diag in diags.iter() {
        let icon = match diag.severity {
            Severity::Error => style("✗").red(),
            Severity::Warning => style("⚠").yellow(),
        };

        let path_display = match &diag.attribute {
            Some(path) => format!(" at {}", style(path).dim()),
            None => String::new(),
        };

        println!("  {} {}{}", icon, diag.summary, path_display);
        for line in diag.detail.lines() {
            println!("    {}", line);
        }
    }
}

/// Symbol and colour for a plan action
pub fn action_style(action: PlanAction) -> (&'static str, Style) {
    match action {
        PlanAction::Create => ("+", Style::new().green()),
        PlanAction::Update => ("~", Style::new().yellow()),
        PlanAction::Replace => ("-/+", Style::new().red()),
        PlanAction::NoOp => ("=", Style::new().dim()),
    }
}

/// Print a unified manifest diff
pub fn print_diff(lines: &[DiffLine]) {
    for line in lines {
        match line.line_type {
            LineType::Added => println!("  {}", style(format!("+ {}", line.content)).green()),
            LineType::Removed => println!("  {}", style(format!("- {}", line.content)).red()),
            LineType::Context => println!("    {}", style(&line.content).dim()),
        }
    }
}

/// Print the attributes of a schema as a tree
pub fn print_schema(schema: &Schema) {
    print_attributes(&schema.attributes, 1);
}

fn print_attributes(attrs: &Attributes, depth: usize) {
    let indent = "  ".repeat(depth);
    let width = attrs.keys().map(String::len).max().unwrap_or(0);

    for (name, attr) in attrs {
        let mut flags = vec![presence_label(attr.presence)];
        if attr.sensitive {
            flags.push("sensitive");
        }

        let default = attr
            .default
            .as_ref()
            .map(|d| format!(" (default: {})", d))
            .unwrap_or_default();

        println!(
            "{}{}  {}  {}{}",
            indent,
            style(format!("{:<width$}", name)).cyan(),
            style(describe_type(&attr.attr_type)).yellow(),
            style(flags.join(", ")).dim(),
            default,
        );

        if let Some(nested) = attr.attr_type.nested() {
            print_attributes(nested, depth + 1);
        }
    }
}

fn presence_label(presence: Presence) -> &'static str {
    match presence {
        Presence::Required => "required",
        Presence::Optional => "optional",
        Presence::Computed => "computed",
        Presence::OptionalComputed => "optional, computed",
    }
}

/// Pluralize a word based on count
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(0, "error", "errors"), "0 errors");
        assert_eq!(pluralize(1, "error", "errors"), "1 error");
        assert_eq!(pluralize(3, "invalid attribute", "invalid attributes"), "3 invalid attributes");
    }

    #[test]
    fn test_action_symbols() {
        assert_eq!(action_style(PlanAction::Create).0, "+");
        assert_eq!(action_style(PlanAction::Replace).0, "-/+");
    }
}
