//! Change planning
//!
//! Compares prior state with planned state and shows what the apply would
//! change as a line diff of the two manifests.

use crdprov_core::{CrdKind, ResourceData, to_yaml};
use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanAction {
    Create,
    Update,
    /// Name or namespace changed: delete, then create
    Replace,
    NoOp,
}

impl std::fmt::Display for PlanAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanAction::Create => write!(f, "create"),
            PlanAction::Update => write!(f, "update in-place"),
            PlanAction::Replace => write!(f, "replace"),
            PlanAction::NoOp => write!(f, "no changes"),
        }
    }
}

/// Type of diff line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Added,
    Removed,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub line_type: LineType,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanResult {
    pub action: PlanAction,
    pub planned: ResourceData,
    pub diff: Vec<DiffLine>,
}

impl PlanResult {
    /// Whether any line of the manifest changes
    pub fn has_manifest_changes(&self) -> bool {
        self.diff.iter().any(|l| l.line_type != LineType::Context)
    }
}

/// Plan the transition from `prior` to `planned`
pub fn plan(kind: &CrdKind, prior: Option<&ResourceData>, planned: ResourceData) -> Result<PlanResult> {
    let new_yaml = to_yaml(&planned.to_manifest(kind))?;

    let Some(prior) = prior else {
        return Ok(PlanResult {
            action: PlanAction::Create,
            diff: compute_text_diff("", &new_yaml),
            planned,
        });
    };

    let old_yaml = to_yaml(&prior.to_manifest(kind))?;
    let diff = compute_text_diff(&old_yaml, &new_yaml);

    let action = if prior.object_ref() != planned.object_ref() {
        PlanAction::Replace
    } else if old_yaml != new_yaml || bookkeeping_changed(prior, &planned) {
        PlanAction::Update
    } else {
        PlanAction::NoOp
    };

    Ok(PlanResult {
        action,
        planned,
        diff,
    })
}

fn bookkeeping_changed(prior: &ResourceData, planned: &ResourceData) -> bool {
    prior.force_conflicts != planned.force_conflicts
        || prior.field_manager != planned.field_manager
        || prior.deletion_propagation != planned.deletion_propagation
        || prior.wait_for != planned.wait_for
        || prior.wait_for_delete != planned.wait_for_delete
}

fn compute_text_diff(old: &str, new: &str) -> Vec<DiffLine> {
    TextDiff::from_lines(old, new)
        .iter_all_changes()
        .map(|change| DiffLine {
            line_type: match change.tag() {
                ChangeTag::Delete => LineType::Removed,
                ChangeTag::Insert => LineType::Added,
                ChangeTag::Equal => LineType::Context,
            },
            content: change.value().trim_end().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crdprov_core::crds::SERVICE_MONITOR;
    use serde_json::json;

    fn data(port: &str) -> ResourceData {
        ResourceData::from_value(&json!({
            "metadata": {"name": "api", "namespace": "monitoring"},
            "spec": {"endpoints": [{"port": port}], "selector": {}}
        }))
        .unwrap()
    }

    #[test]
    fn test_create() {
        let result = plan(&SERVICE_MONITOR, None, data("web")).unwrap();
        assert_eq!(result.action, PlanAction::Create);
        assert!(result.diff.iter().all(|l| l.line_type == LineType::Added));
        assert!(result.diff.iter().any(|l| l.content == "kind: ServiceMonitor"));
    }

    #[test]
    fn test_no_op() {
        let prior = data("web");
        let result = plan(&SERVICE_MONITOR, Some(&prior), data("web")).unwrap();
        assert_eq!(result.action, PlanAction::NoOp);
        assert!(!result.has_manifest_changes());
    }

    #[test]
    fn test_update_shows_changed_lines() {
        let prior = data("web");
        let result = plan(&SERVICE_MONITOR, Some(&prior), data("metrics")).unwrap();
        assert_eq!(result.action, PlanAction::Update);

        let removed: Vec<_> = result
            .diff
            .iter()
            .filter(|l| l.line_type == LineType::Removed)
            .map(|l| l.content.trim())
            .collect();
        let added: Vec<_> = result
            .diff
            .iter()
            .filter(|l| l.line_type == LineType::Added)
            .map(|l| l.content.trim())
            .collect();
        assert_eq!(removed, ["- port: web"]);
        assert_eq!(added, ["- port: metrics"]);
    }

    #[test]
    fn test_bookkeeping_only_change_is_update() {
        let prior = data("web");
        let mut planned = data("web");
        planned.force_conflicts = true;
        let result = plan(&SERVICE_MONITOR, Some(&prior), planned).unwrap();
        assert_eq!(result.action, PlanAction::Update);
        assert!(!result.has_manifest_changes());
    }

    #[test]
    fn test_namespace_change_is_replace() {
        let prior = data("web");
        let mut planned = data("web");
        planned.metadata.namespace = Some("observability".into());
        let result = plan(&SERVICE_MONITOR, Some(&prior), planned).unwrap();
        assert_eq!(result.action, PlanAction::Replace);
    }
}
