//! Process environment handling: variable passthrough into templates and
//! CI/CD detection.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::constants::{ENV_CI, ENV_SKIP};
use crate::error::{Error, Result};

/// Filters environment variables before they are exposed to templates.
///
/// A variable is skipped when any pattern matches its name. Patterns are
/// unanchored regular expressions; use `^` and `$` to pin them.
#[derive(Debug, Clone)]
pub struct EnvFilter {
    skip: Vec<Regex>,
}

impl EnvFilter {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let skip = patterns
            .into_iter()
            .map(|p| {
                Regex::new(p.as_ref())
                    .map_err(|e| Error::ConfigError(format!("invalid env skip pattern: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { skip })
    }

    pub fn is_skipped(&self, name: &str) -> bool {
        self.skip.iter().any(|re| re.is_match(name))
    }

    /// Collects the variables that survive the filter.
    pub fn passthrough<I>(&self, vars: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        vars.into_iter().filter(|(k, _)| !self.is_skipped(k)).collect()
    }

    /// Filtered snapshot of the current process environment.
    ///
    /// Variables whose name or value is not valid unicode are left out.
    pub fn from_process(&self) -> BTreeMap<String, String> {
        self.passthrough(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }
}

impl Default for EnvFilter {
    fn default() -> Self {
        let skip = ENV_SKIP
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self { skip }
    }
}

/// Boolean parsing the way click interprets environment values for flags.
pub fn click_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "on" | "t" | "true" | "y" | "yes")
}

pub fn click_bool_neg(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "0" | "f" | "false" | "n" | "no" | "off")
}

/// Boolean parsing in the manner of Go's `strconv.ParseBool`, without errors.
pub fn go_bool(value: &str) -> bool {
    matches!(value, "1" | "T" | "TRUE" | "True" | "t" | "true")
}

pub fn go_bool_neg(value: &str) -> bool {
    matches!(value, "0" | "F" | "FALSE" | "False" | "f" | "false")
}

/// CI detection over an arbitrary variable lookup.
///
/// `CI` set to a false-like value disables detection. Otherwise any of the
/// well-known CI variables with a non-empty value marks a CI run.
pub fn detect_ci<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    if lookup("CI").is_some_and(|v| click_bool_neg(&v)) {
        return false;
    }
    ENV_CI.iter().any(|name| lookup(name).is_some_and(|v| !v.is_empty()))
}

/// Whether the process runs under CI/CD. Computed once per process.
pub fn is_ci() -> bool {
    static IS_CI: OnceLock<bool> = OnceLock::new();
    *IS_CI.get_or_init(|| detect_ci(|name| std::env::var(name).ok()))
}
