use std::sync::Arc;

use j2subst::error::Error;
use j2subst::registry::{Registry, TemplateFn};
use j2subst::renderer::{MiniJinjaRenderer, TemplateRenderer};
use j2subst::report::Reporter;
use minijinja::Value;
use serde_json::json;

fn render(registry: &Registry, source: &str) -> String {
    MiniJinjaRenderer::new(registry).render_str(source, &[], &json!({})).unwrap()
}

fn constant(value: &'static str) -> TemplateFn {
    Arc::new(move |_: &[Value]| Ok(Value::from(value)))
}

#[test]
fn test_builtin_filters() {
    let registry = Registry::with_builtins(false, &Reporter::new(true)).unwrap();

    assert_eq!(render(&registry, "{{ 'yes' | click_bool }}"), "true");
    assert_eq!(render(&registry, "{{ 'off' | click_bool_neg }}"), "true");
    assert_eq!(render(&registry, "{{ 'yes' | go_bool }}"), "false");
    assert_eq!(render(&registry, "{{ [3, 1, 3, 2] | uniq | join(',') }}"), "3,1,2");
    assert_eq!(render(&registry, "{{ [1, 2, 3] | list_diff([2]) | join(',') }}"), "1,3");
    assert_eq!(render(&registry, "{{ [1, 2, 3] | list_intersect([3, 2, 9]) | join(',') }}"), "2,3");
    assert_eq!(render(&registry, "{{ {'b': 1, 'a': 2} | dict_keys | join(',') }}"), "a,b");
    assert_eq!(render(&registry, "{{ 'a-b' | is_plain_key }}"), "false");
    assert_eq!(render(&registry, "{{ {} | is_map }} {{ [] | is_seq }} {{ 1 | is_str }}"), "true true false");
}

#[test]
fn test_builtin_functions() {
    let registry = Registry::with_builtins(false, &Reporter::new(true)).unwrap();

    assert_eq!(render(&registry, "{{ len([1, 2]) }}"), "2");
    assert_eq!(render(&registry, "{{ sorted([3, 1, 2]) | join(',') }}"), "1,2,3");
    assert_eq!(render(&registry, "{{ bool('') }}"), "false");
    assert_eq!(render(&registry, "{{ str(5) }}"), "5");
    assert_eq!(render(&registry, "{{ set([2, 1, 2, 1]) | join(',') }}"), "2,1");
    assert_eq!(render(&registry, "{{ type('a') }} {{ type(1) }} {{ type([]) }} {{ type({}) }} {{ type(none) }}"), "string number sequence map none");
}

#[test]
fn test_filters_as_functions() {
    let plain = Registry::with_builtins(false, &Reporter::new(true)).unwrap();
    assert!(!plain.function_names().any(|n| n == "click_bool"));

    let registry = Registry::with_builtins(true, &Reporter::new(true)).unwrap();
    assert!(registry.function_names().any(|n| n == "click_bool"));
    assert_eq!(render(&registry, "{{ click_bool('y') }}"), "true");
    assert_eq!(render(&registry, "{{ 'y' | click_bool }}"), "true");
}

#[test]
fn test_first_registration_wins() {
    let reporter = Reporter::new(false);
    let mut registry = Registry::new();

    assert!(registry.add_function("pick", constant("first"), &reporter).unwrap());
    assert!(!registry.add_function("pick", constant("second"), &reporter).unwrap());
    assert!(!registry.add_function("not-plain", constant("x"), &reporter).unwrap());

    assert_eq!(reporter.warnings().len(), 2);
    assert_eq!(render(&registry, "{{ pick() }}"), "first");
}

#[test]
fn test_strict_collision_is_an_error() {
    let reporter = Reporter::new(true);
    let mut registry = Registry::new();
    registry.add_function("pick", constant("first"), &reporter).unwrap();
    assert!(matches!(
        registry.add_function("pick", constant("second"), &reporter),
        Err(Error::StrictModeError(_))
    ));
}
