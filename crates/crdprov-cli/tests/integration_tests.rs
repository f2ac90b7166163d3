//! Integration tests for CLI commands
//!
//! Only commands that never contact a cluster are exercised here.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Helper to run crdprov command
fn crdprov(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_crdprov"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute crdprov")
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}

const SERVICE_MONITOR: &str = r#"
metadata:
  name: api
  namespace: monitoring
  labels:
    release: prometheus
spec:
  job_label: app
  endpoints:
    - port: web
      interval: 30s
  selector:
    match_labels:
      app: api
"#;

mod types_command {
    use super::*;

    #[test]
    fn test_types_lists_every_role() {
        let output = crdprov(&["types"]);
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("k8s_monitoring_coreos_com_service_monitor_v1"));
        assert!(stdout.contains("k8s_monitoring_coreos_com_prometheus_rule_v1_manifest"));
        assert!(stdout.contains("data sources"));
    }

    #[test]
    fn test_types_json() {
        let output = crdprov(&["types", "--json"]);
        assert!(output.status.success());

        let json: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
        let types = json.as_array().unwrap();
        assert_eq!(types.len(), 12);
        assert!(types.iter().any(|t| t["name"] == "k8s_monitoring_coreos_com_probe_v1"
            && t["role"] == "data_source"
            && t["api_version"] == "monitoring.coreos.com/v1"));
    }
}

mod schema_command {
    use super::*;

    #[test]
    fn test_schema_tree() {
        let output = crdprov(&["schema", "ServiceMonitor"]);
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("force_conflicts"));
        assert!(stdout.contains("deletion_propagation"));
        assert!(stdout.contains("\"Background\""));
        assert!(stdout.contains("endpoints"));
    }

    #[test]
    fn test_json_schema_hides_computed_attributes() {
        let output = crdprov(&["schema", "probes", "--json-schema"]);
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let properties = json["properties"].as_object().unwrap();
        assert!(properties.contains_key("spec"));
        assert!(properties.contains_key("wait_for"));
        assert!(!properties.contains_key("id"));
    }

    #[test]
    fn test_unknown_type_suggests_name() {
        let output = crdprov(&["schema", "ServiceMonitr"]);
        assert_eq!(output.status.code(), Some(64));

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("did you mean"));
        assert!(stderr.contains("k8s_monitoring_coreos_com_service_monitor_v1"));
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "sm.yaml", SERVICE_MONITOR);

        let output = crdprov(&["validate", "ServiceMonitor", "-f", file.to_str().unwrap()]);
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));
        assert!(String::from_utf8_lossy(&output.stdout).contains("is a valid ServiceMonitor"));
    }

    #[test]
    fn test_validate_reports_attribute_paths() {
        let dir = TempDir::new().unwrap();
        let file = write(
            dir.path(),
            "sm.yaml",
            "metadata:\n  name: api\n  namespace: monitoring\nspec:\n  endpoints:\n    - interval: soon\n  selector: {}\n",
        );

        let output = crdprov(&["validate", "ServiceMonitor", "-f", file.to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(2));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("spec.endpoints[0].interval"));
    }

    #[test]
    fn test_validate_json_output_with_errors() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "sm.yaml", "metadata:\n  name: api\n");

        let output = crdprov(&[
            "validate",
            "ServiceMonitor",
            "-f",
            file.to_str().unwrap(),
            "--json",
        ]);
        let json: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");

        assert_eq!(json["valid"], false);
        assert!(!json["diagnostics"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_validate_data_source_role() {
        let dir = TempDir::new().unwrap();
        let file = write(
            dir.path(),
            "ds.yaml",
            "metadata:\n  name: api\n  namespace: monitoring\n",
        );

        let output = crdprov(&[
            "validate",
            "ServiceMonitor",
            "--role",
            "data-source",
            "-f",
            file.to_str().unwrap(),
        ]);
        assert!(output.status.success());
    }

    #[test]
    fn test_validate_missing_file() {
        let output = crdprov(&["validate", "Probe", "-f", "/nonexistent/probe.yaml"]);
        assert_eq!(output.status.code(), Some(5));
    }
}

mod manifest_command {
    use super::*;

    #[test]
    fn test_manifest_renders_yaml() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "sm.yaml", SERVICE_MONITOR);

        let output = crdprov(&["manifest", "ServiceMonitor", "-f", file.to_str().unwrap()]);
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        insta::assert_snapshot!(stdout, @r###"
        apiVersion: monitoring.coreos.com/v1
        kind: ServiceMonitor
        metadata:
          labels:
            release: prometheus
          name: api
          namespace: monitoring
        spec:
          endpoints:
          - interval: 30s
            port: web
          jobLabel: app
          selector:
            matchLabels:
              app: api
        "###);
    }

    #[test]
    fn test_manifest_rejects_bookkeeping_attributes() {
        let dir = TempDir::new().unwrap();
        let file = write(
            dir.path(),
            "sm.yaml",
            &format!("{}force_conflicts: true\n", SERVICE_MONITOR.trim_start()),
        );

        let output = crdprov(&["manifest", "ServiceMonitor", "-f", file.to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(2));
    }
}

mod plan_command {
    use super::*;

    #[test]
    fn test_plan_without_state_is_create() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "sm.yaml", SERVICE_MONITOR);

        let output = crdprov(&["plan", "ServiceMonitor", "-f", file.to_str().unwrap()]);
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("monitoring/api will be create"));
        assert!(stdout.contains("+ kind: ServiceMonitor"));
    }

    #[test]
    fn test_plan_against_state_detects_replace() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "sm.yaml", SERVICE_MONITOR);
        let state = write(
            dir.path(),
            "state.json",
            r#"{"id": "default/api", "metadata": {"name": "api", "namespace": "default"}, "spec": {"selector": {}}}"#,
        );

        let output = crdprov(&[
            "plan",
            "ServiceMonitor",
            "-f",
            file.to_str().unwrap(),
            "--state",
            state.to_str().unwrap(),
        ]);
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("will be replace"));
    }
}

mod import_command {
    use super::*;

    #[test]
    fn test_invalid_import_id_fails_before_connecting() {
        let output = crdprov(&["import", "PodMonitor", "just-a-name"]);
        assert_eq!(output.status.code(), Some(64));

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Expected import identifier"));
        assert!(stderr.contains("'just-a-name'"));
    }

    #[test]
    fn test_empty_segment_is_rejected() {
        let output = crdprov(&["get", "Probe", "monitoring/"]);
        assert_eq!(output.status.code(), Some(64));
    }
}
