//! Template functions and filters.
//!
//! The registry is built once at startup from a fixed table, optionally
//! extended by the caller. A name can only be registered once; later
//! registrations under the same name are rejected.

use std::sync::Arc;

use indexmap::IndexMap;
use minijinja::value::{Rest, Value, ValueKind};
use minijinja::{Environment, Error as TemplateError, ErrorKind};

use crate::env::{click_bool, click_bool_neg, go_bool, go_bool_neg};
use crate::error::Result;
use crate::report::Reporter;

pub type FunctionResult = std::result::Result<Value, TemplateError>;

/// A global template function.
pub type TemplateFn = Arc<dyn Fn(&[Value]) -> FunctionResult + Send + Sync>;

/// A template filter: receives the filtered value and the extra arguments.
pub type TemplateFilter = Arc<dyn Fn(&Value, &[Value]) -> FunctionResult + Send + Sync>;

/// Whether the name can be used as a template identifier (`[a-zA-Z_][a-zA-Z0-9_]*`).
pub fn is_plain_key(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn function<F>(f: F) -> TemplateFn
where
    F: Fn(&[Value]) -> FunctionResult + Send + Sync + 'static,
{
    Arc::new(f)
}

fn filter<F>(f: F) -> TemplateFilter
where
    F: Fn(&Value, &[Value]) -> FunctionResult + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Default, Clone)]
pub struct Registry {
    functions: IndexMap<String, TemplateFn>,
    filters: IndexMap<String, TemplateFilter>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the builtin functions and filters.
    ///
    /// With `filters_as_functions` every builtin filter is reachable as a
    /// function as well, taking the filtered value as its first argument.
    pub fn with_builtins(filters_as_functions: bool, reporter: &Reporter) -> Result<Self> {
        let mut registry = Self::new();
        for (name, f) in builtin_functions() {
            registry.add_function(name, f, reporter)?;
        }
        for (name, f) in builtin_filters() {
            registry.add_filter(name, f, reporter)?;
        }
        if filters_as_functions {
            let filters: Vec<(String, TemplateFilter)> =
                registry.filters.iter().map(|(k, v)| (k.clone(), Arc::clone(v))).collect();
            for (name, filter) in filters {
                registry.add_function(&name, filter_as_function(filter), reporter)?;
            }
        }
        Ok(registry)
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn filter_names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    /// Registers a function. Returns `false` when the name was rejected.
    pub fn add_function(&mut self, name: &str, f: TemplateFn, reporter: &Reporter) -> Result<bool> {
        if !is_plain_key(name) {
            reporter.warn("import_function", format!("key is not \"plain\", function will not be imported as {name:?}"))?;
            return Ok(false);
        }
        if self.functions.contains_key(name) {
            reporter.warn("import_function", format!("globals already has {name:?} key, function will not be imported"))?;
            return Ok(false);
        }
        self.functions.insert(name.to_string(), f);
        Ok(true)
    }

    /// Registers a filter. Returns `false` when the name was rejected.
    pub fn add_filter(&mut self, name: &str, f: TemplateFilter, reporter: &Reporter) -> Result<bool> {
        if !is_plain_key(name) {
            reporter.warn("import_filter", format!("key is not \"plain\", filter will not be imported as {name:?}"))?;
            return Ok(false);
        }
        if self.filters.contains_key(name) {
            reporter.warn("import_filter", format!("filters already has {name:?} key, filter will not be imported"))?;
            return Ok(false);
        }
        self.filters.insert(name.to_string(), f);
        Ok(true)
    }

    /// Installs every registered function and filter into the environment.
    pub fn install(&self, env: &mut Environment<'static>) {
        for (name, f) in &self.functions {
            let f = Arc::clone(f);
            env.add_function(name.clone(), move |args: Rest<Value>| f(&args.0));
        }
        for (name, f) in &self.filters {
            let f = Arc::clone(f);
            env.add_filter(name.clone(), move |value: Value, args: Rest<Value>| f(&value, &args.0));
        }
    }
}

fn filter_as_function(filter: TemplateFilter) -> TemplateFn {
    Arc::new(move |args: &[Value]| match args.split_first() {
        Some((value, rest)) => filter(value, rest),
        None => Err(TemplateError::new(ErrorKind::MissingArgument, "missing value argument")),
    })
}

fn first_arg<'a>(args: &'a [Value], name: &str) -> std::result::Result<&'a Value, TemplateError> {
    args.first().ok_or_else(|| {
        TemplateError::new(ErrorKind::MissingArgument, format!("{name}() takes exactly one argument"))
    })
}

fn truthy_str(value: &Value, f: fn(&str) -> bool) -> bool {
    match value.kind() {
        ValueKind::Bool => value.is_true(),
        _ => value.as_str().is_some_and(f),
    }
}

fn items(value: &Value) -> std::result::Result<Vec<Value>, TemplateError> {
    Ok(value.try_iter()?.collect())
}

fn unique(values: Vec<Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

fn kind_name(value: &Value) -> &'static str {
    match value.kind() {
        ValueKind::Undefined => "undefined",
        ValueKind::None => "none",
        ValueKind::Bool => "bool",
        ValueKind::Number => "number",
        ValueKind::String => "string",
        ValueKind::Seq => "sequence",
        ValueKind::Map => "map",
        _ => "object",
    }
}

fn builtin_functions() -> Vec<(&'static str, TemplateFn)> {
    vec![
        ("bool", function(|args: &[Value]| Ok(Value::from(first_arg(args, "bool")?.is_true())))),
        (
            "len",
            function(|args: &[Value]| {
                let value = first_arg(args, "len")?;
                value.len().map(Value::from).ok_or_else(|| {
                    TemplateError::new(ErrorKind::InvalidOperation, "object has no len()")
                })
            }),
        ),
        ("list", function(|args: &[Value]| Ok(Value::from(items(first_arg(args, "list")?)?)))),
        ("repr", function(|args: &[Value]| Ok(Value::from(format!("{:?}", first_arg(args, "repr")?))))),
        ("set", function(|args: &[Value]| Ok(Value::from(unique(items(first_arg(args, "set")?)?))))),
        (
            "sorted",
            function(|args: &[Value]| {
                let mut values = items(first_arg(args, "sorted")?)?;
                values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                Ok(Value::from(values))
            }),
        ),
        ("str", function(|args: &[Value]| Ok(Value::from(first_arg(args, "str")?.to_string())))),
        ("type", function(|args: &[Value]| Ok(Value::from(kind_name(first_arg(args, "type")?))))),
    ]
}

fn builtin_filters() -> Vec<(&'static str, TemplateFilter)> {
    vec![
        ("click_bool", filter(|v: &Value, _: &[Value]| Ok(Value::from(truthy_str(v, click_bool))))),
        (
            "click_bool_neg",
            filter(|v: &Value, _: &[Value]| {
                let neg = match v.kind() {
                    ValueKind::Bool => !v.is_true(),
                    _ => v.as_str().is_some_and(click_bool_neg),
                };
                Ok(Value::from(neg))
            }),
        ),
        ("go_bool", filter(|v: &Value, _: &[Value]| Ok(Value::from(truthy_str(v, go_bool))))),
        (
            "go_bool_neg",
            filter(|v: &Value, _: &[Value]| {
                let neg = match v.kind() {
                    ValueKind::Bool => !v.is_true(),
                    _ => v.as_str().is_some_and(go_bool_neg),
                };
                Ok(Value::from(neg))
            }),
        ),
        ("is_map", filter(|v: &Value, _: &[Value]| Ok(Value::from(v.kind() == ValueKind::Map)))),
        ("is_seq", filter(|v: &Value, _: &[Value]| Ok(Value::from(v.kind() == ValueKind::Seq)))),
        ("is_str", filter(|v: &Value, _: &[Value]| Ok(Value::from(v.kind() == ValueKind::String)))),
        (
            "is_plain_key",
            filter(|v: &Value, _: &[Value]| Ok(Value::from(v.as_str().is_some_and(is_plain_key)))),
        ),
        (
            "dict_keys",
            filter(|v: &Value, _: &[Value]| {
                if v.kind() != ValueKind::Map {
                    return Err(TemplateError::new(ErrorKind::InvalidOperation, "dict_keys expects a map"));
                }
                let mut keys = items(v)?;
                keys.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                Ok(Value::from(keys))
            }),
        ),
        ("uniq", filter(|v: &Value, _: &[Value]| Ok(Value::from(unique(items(v)?))))),
        (
            "list_diff",
            filter(|v: &Value, args: &[Value]| {
                let other = items(first_arg(args, "list_diff")?)?;
                let diff = unique(items(v)?).into_iter().filter(|x| !other.contains(x)).collect::<Vec<_>>();
                Ok(Value::from(diff))
            }),
        ),
        (
            "list_intersect",
            filter(|v: &Value, args: &[Value]| {
                let other = items(first_arg(args, "list_intersect")?)?;
                let common = unique(items(v)?).into_iter().filter(|x| other.contains(x)).collect::<Vec<_>>();
                Ok(Value::from(common))
            }),
        ),
    ]
}
