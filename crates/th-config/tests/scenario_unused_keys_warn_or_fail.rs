use th_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

#[test]
fn warn_mode_reports_unused_keys_without_error() {
    let yaml = r#"
data:
  dir: data
sever:
  addr: "127.0.0.1:1"
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert!(!report.is_clean());
    assert_eq!(report.unused_leaf_pointers, vec!["/sever/addr".to_string()]);
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let yaml = "log:\n  filter: info\n  colour: true\n";
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    assert!(err.to_string().contains("CONFIG_UNUSED_KEYS"));
    assert!(err.to_string().contains("/log/colour"));
}

#[test]
fn display_subtree_is_consumed() {
    let yaml = r#"
display:
  phase: "{start}"
  status: "{status}"
server:
  addr: "127.0.0.1:8898"
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
}

#[test]
fn unused_pointers_are_sorted() {
    let yaml = "zeta:\n  b: 2\n  a: 1\nalpha: 0\n";
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/alpha".to_string(), "/zeta/a".to_string(), "/zeta/b".to_string()]
    );
}
