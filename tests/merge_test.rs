use j2subst::merge::{merge_dict, ConfigDict, MergeConflict};
use serde_json::{json, Value};

fn dict(value: Value) -> ConfigDict {
    match value {
        Value::Object(map) => map,
        _ => panic!("Expected an object"),
    }
}

fn sorted_numbers(value: &Value) -> Vec<i64> {
    let mut v: Vec<i64> = value.as_array().unwrap().iter().map(|x| x.as_i64().unwrap()).collect();
    v.sort();
    v
}

#[test]
fn test_absent_inputs_yield_empty_map() {
    let merged = merge_dict(None, None);
    assert!(merged.dict.is_empty());
    assert!(merged.conflicts.is_empty());

    let base = dict(json!({"a": 1}));
    assert_eq!(merge_dict(Some(&base), None).dict, base);
    assert_eq!(merge_dict(None, Some(&base)).dict, base);
}

#[test]
fn test_scalars_are_overwritten() {
    let base = dict(json!({"x": 1, "keep": "yes"}));
    let incoming = dict(json!({"x": 2, "new": true}));
    let merged = merge_dict(Some(&base), Some(&incoming));
    assert_eq!(merged.dict, dict(json!({"x": 2, "keep": "yes", "new": true})));
}

#[test]
fn test_scalar_base_is_replaced_by_container() {
    let base = dict(json!({"x": null, "y": "s"}));
    let incoming = dict(json!({"x": {"a": 1}, "y": [1]}));
    let merged = merge_dict(Some(&base), Some(&incoming));
    assert_eq!(merged.dict, incoming);
    assert!(merged.conflicts.is_empty());
}

#[test]
fn test_nested_maps_merge_recursively() {
    let base = dict(json!({"db": {"host": "a", "port": 1, "opts": {"x": 1}}}));
    let incoming = dict(json!({"db": {"port": 2, "opts": {"y": 2}}}));
    let merged = merge_dict(Some(&base), Some(&incoming));
    assert_eq!(
        merged.dict,
        dict(json!({"db": {"host": "a", "port": 2, "opts": {"x": 1, "y": 2}}}))
    );
}

#[test]
fn test_sequences_union_regardless_of_grouping() {
    let a = dict(json!({"a": [1, 2]}));
    let b = dict(json!({"a": [2, 3]}));
    let c = dict(json!({"a": [3, 4, 4]}));

    let left = merge_dict(Some(&merge_dict(Some(&a), Some(&b)).dict), Some(&c)).dict;
    let right = merge_dict(Some(&a), Some(&merge_dict(Some(&b), Some(&c)).dict)).dict;

    assert_eq!(sorted_numbers(&left["a"]), vec![1, 2, 3, 4]);
    assert_eq!(sorted_numbers(&right["a"]), vec![1, 2, 3, 4]);
}

#[test]
fn test_empty_incoming_map_resets_key() {
    let base = dict(json!({"k": {"nested": 1}}));
    let incoming = dict(json!({"k": {}}));
    let merged = merge_dict(Some(&base), Some(&incoming));
    assert_eq!(merged.dict, dict(json!({"k": {}})));
}

#[test]
fn test_empty_incoming_sequence_resets_key() {
    let base = dict(json!({"k": [1, 2]}));
    let incoming = dict(json!({"k": []}));
    let merged = merge_dict(Some(&base), Some(&incoming));
    assert_eq!(merged.dict, dict(json!({"k": []})));
}

#[test]
fn test_type_conflict_keeps_existing_value() {
    let base = dict(json!({"x": {"a": 1}}));
    let incoming = dict(json!({"x": [1, 2]}));
    let merged = merge_dict(Some(&base), Some(&incoming));

    assert_eq!(merged.dict, base);
    assert_eq!(
        merged.conflicts,
        vec![MergeConflict { key: "x".to_string(), existing: "map", incoming: "sequence" }]
    );
}

#[test]
fn test_container_vs_scalar_conflict_is_reported_with_path() {
    let base = dict(json!({"outer": {"list": [1], "map": {"a": 1}}}));
    let incoming = dict(json!({"outer": {"list": "nope", "map": 5}}));
    let merged = merge_dict(Some(&base), Some(&incoming));

    assert_eq!(merged.dict, base);
    let mut keys: Vec<&str> = merged.conflicts.iter().map(|c| c.key.as_str()).collect();
    keys.sort();
    assert_eq!(keys, vec!["outer.list", "outer.map"]);
    assert!(merged.conflicts[0].to_string().contains("type mismatch"));
}

#[test]
fn test_incoming_is_not_mutated() {
    let base = dict(json!({"a": [1], "m": {"x": 1}}));
    let incoming = dict(json!({"a": [2], "m": {"y": 2}}));
    let snapshot = incoming.clone();
    let _ = merge_dict(Some(&base), Some(&incoming));
    assert_eq!(incoming, snapshot);
}
