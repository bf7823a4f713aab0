use std::collections::HashMap;

use j2subst::env::{click_bool, click_bool_neg, detect_ci, go_bool, go_bool_neg, EnvFilter};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_default_filter_hides_own_and_private_variables() {
    let filter = EnvFilter::default();
    assert!(filter.is_skipped("J2SUBST_CONFIG_PATH"));
    assert!(filter.is_skipped("_"));
    assert!(!filter.is_skipped("HOME"));
    assert!(!filter.is_skipped("MY_J2SUBST_VAR"));
    assert!(filter.is_skipped("PATH_"));
    assert!(filter.is_skipped("FOO_"));
    assert!(!filter.is_skipped("FOO_BAR"));
}

#[test]
fn test_passthrough() {
    let filter = EnvFilter::new(["SECRET", "J2SUBST_"]).unwrap();
    let vars = vec![
        ("HOME".to_string(), "/root".to_string()),
        ("SECRET_TOKEN".to_string(), "x".to_string()),
        ("J2SUBST_DEPTH".to_string(), "2".to_string()),
        ("LANG".to_string(), "C".to_string()),
    ];
    let kept = filter.passthrough(vars);
    assert_eq!(kept.keys().collect::<Vec<_>>(), vec!["HOME", "LANG"]);
}

#[test]
fn test_invalid_skip_pattern() {
    assert!(EnvFilter::new(["("]).is_err());
}

#[test]
fn test_detect_ci() {
    assert!(!detect_ci(lookup(&[])));
    assert!(detect_ci(lookup(&[("CI", "true")])));
    assert!(detect_ci(lookup(&[("BUILD_ID", "42")])));
    assert!(!detect_ci(lookup(&[("BUILD_ID", "")])));
    assert!(!detect_ci(lookup(&[("CI", "false"), ("BUILD_ID", "42")])));
    assert!(!detect_ci(lookup(&[("CI", "0"), ("RUN_ID", "7")])));
}

#[test]
fn test_bool_helpers() {
    assert!(click_bool("Yes"));
    assert!(click_bool(" on "));
    assert!(!click_bool("maybe"));
    assert!(click_bool_neg("OFF"));
    assert!(!click_bool_neg("1"));

    assert!(go_bool("True"));
    assert!(!go_bool("yes"));
    assert!(go_bool_neg("F"));
    assert!(!go_bool_neg("no"));
}
