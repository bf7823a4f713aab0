//! Configuration aggregation for j2subst.
//! Loads YAML, JSON and TOML documents from files and directories and folds
//! them into a single dictionary, in discovery order.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use serde_json::Value;
use walkdir::WalkDir;

use crate::constants::{CONFIG_EXT, EMPTY_JSON, EMPTY_YAML};
use crate::error::{Error, Result};
use crate::merge::{merge_dict_logged, ConfigDict};
use crate::report::Reporter;

/// Output format of the dump mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpFormat {
    #[default]
    Yaml,
    Json,
}

impl FromStr for DumpFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "YAML" => Ok(Self::Yaml),
            "JSON" => Ok(Self::Json),
            _ => Err("must be one of: YAML, JSON".to_string()),
        }
    }
}

impl fmt::Display for DumpFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpFormat::Yaml => write!(f, "YAML"),
            DumpFormat::Json => write!(f, "JSON"),
        }
    }
}

/// Format of a configuration file, derived from its name extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        match path.as_ref().extension()?.to_str()? {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Builds the matcher for recognized configuration file names.
fn config_globset() -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for ext in CONFIG_EXT {
        builder.add(
            Glob::new(&format!("*{ext}"))
                .map_err(|e| Error::ConfigError(format!("invalid config pattern: {e}")))?,
        );
    }
    builder.build().map_err(|e| Error::ConfigError(format!("invalid config pattern: {e}")))
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_str().is_some_and(|s| s.starts_with('.'))
}

/// Recursively finds configuration files below `dir`, following symlinks.
///
/// Results are sorted by the path string, so `d/base.yaml` comes before
/// `d/base/x.yaml`. Entries that cannot be visited (dangling links,
/// unreadable directories) are reported and skipped.
pub fn find_config_files<P: AsRef<Path>>(dir: P, reporter: &Reporter) -> Result<Vec<PathBuf>> {
    let matcher = config_globset()?;
    let mut found = Vec::new();
    for entry in WalkDir::new(dir.as_ref())
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                reporter.warn("merge_dict_default", format!("failed to search: {e}"))?;
                continue;
            }
        };
        if entry.file_type().is_file() && matcher.is_match(entry.file_name()) {
            found.push(entry.into_path());
        }
    }
    found.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    Ok(found)
}

fn into_dict(value: Value, path: &Path) -> Result<Option<ConfigDict>> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(Error::ConfigError(format!(
            "top-level document is not a mapping ({}): {}",
            crate::merge::type_name(&other),
            path.display()
        ))),
    }
}

/// Folds configuration documents into one running dictionary.
pub struct ConfigLoader<'a> {
    reporter: &'a Reporter,
    dict: ConfigDict,
}

impl<'a> ConfigLoader<'a> {
    pub fn new(reporter: &'a Reporter) -> Self {
        Self { reporter, dict: ConfigDict::new() }
    }

    pub fn dict(&self) -> &ConfigDict {
        &self.dict
    }

    pub fn into_dict(self) -> ConfigDict {
        self.dict
    }

    fn merge(&mut self, incoming: &ConfigDict) {
        self.dict = merge_dict_logged(Some(&self.dict), Some(incoming));
    }

    /// Merges every non-empty document of a YAML stream, in stream order.
    pub fn merge_yaml_str(&mut self, content: &str, origin: &Path) -> Result<()> {
        let mut all_empty = true;
        for document in serde_yaml::Deserializer::from_str(content) {
            let value = Value::deserialize(document)?;
            if let Some(dict) = into_dict(value, origin)? {
                all_empty = false;
                self.merge(&dict);
            }
        }
        if all_empty {
            self.reporter.info(
                "merge_dict_from_yaml",
                format!("received empty document(s) from: {:?}", origin.display().to_string()),
            );
        }
        Ok(())
    }

    pub fn merge_json_str(&mut self, content: &str) -> Result<()> {
        let value: Value = serde_json::from_str(content)?;
        if let Some(dict) = into_dict(value, Path::new("<string>"))? {
            self.merge(&dict);
        }
        Ok(())
    }

    pub fn merge_toml_str(&mut self, content: &str) -> Result<()> {
        let dict: ConfigDict = toml::from_str(content)?;
        self.merge(&dict);
        Ok(())
    }

    /// Loads a single file, picking the parser from the name extension.
    pub fn merge_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::ConfigError(format!(
                "not a file or does not exist: {:?}",
                path.display().to_string()
            )));
        }
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::ConfigError(format!(
                "non-recognized name extension: {:?}",
                path.display().to_string()
            ))
        })?;
        let content = fs::read_to_string(path)?;
        match format {
            ConfigFormat::Yaml => self.merge_yaml_str(&content, path),
            ConfigFormat::Json => {
                let value: Value = serde_json::from_str(&content)?;
                if let Some(dict) = into_dict(value, path)? {
                    self.merge(&dict);
                }
                Ok(())
            }
            ConfigFormat::Toml => self.merge_toml_str(&content),
        }
    }

    fn try_merge_file(&mut self, path: &Path) -> Result<()> {
        match self.merge_file(path) {
            Ok(()) => Ok(()),
            Err(e) => self.reporter.warn(
                "merge_dict_default",
                format!("failed to load config file: {}: {e}", path.display()),
            ),
        }
    }

    /// Loads every source in order. A source is either a file or a directory
    /// searched recursively for recognized configuration files.
    ///
    /// Failures are reported per source and skipped, unless the reporter is
    /// strict, in which case the first failure aborts.
    pub fn merge_sources<P: AsRef<Path>>(&mut self, sources: &[P]) -> Result<()> {
        for source in sources {
            let source = source.as_ref();
            if source.is_file() {
                self.try_merge_file(source)?;
            } else if source.is_dir() {
                let files = match find_config_files(source, self.reporter) {
                    Ok(files) => files,
                    Err(e @ Error::StrictModeError(_)) => return Err(e),
                    Err(e) => {
                        self.reporter.warn(
                            "merge_dict_default",
                            format!("failed to search {}: {e}", source.display()),
                        )?;
                        continue;
                    }
                };
                for file in files {
                    self.reporter
                        .info("merge_dict_default", format!("try loading {}", file.display()));
                    self.try_merge_file(&file)?;
                }
            } else {
                self.reporter.warn(
                    "merge_dict_default",
                    format!("not a file or directory, or does not exist: {}", source.display()),
                )?;
            }
        }
        Ok(())
    }
}

/// Aggregates the given sources into one dictionary.
pub fn load_config<P: AsRef<Path>>(sources: &[P], reporter: &Reporter) -> Result<ConfigDict> {
    let mut loader = ConfigLoader::new(reporter);
    loader.merge_sources(sources)?;
    Ok(loader.into_dict())
}

/// Serializes the whole configuration with sorted keys.
///
/// An empty configuration yields a fixed placeholder instead of empty output.
pub fn dump_config(dict: &ConfigDict, format: DumpFormat) -> Result<String> {
    match format {
        DumpFormat::Yaml if dict.is_empty() => Ok(EMPTY_YAML.to_string()),
        DumpFormat::Json if dict.is_empty() => Ok(EMPTY_JSON.to_string()),
        DumpFormat::Yaml => Ok(serde_yaml::to_string(dict)?),
        DumpFormat::Json => {
            let mut buf = Vec::new();
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
            dict.serialize(&mut ser)?;
            String::from_utf8(buf).map_err(|e| Error::ConfigError(format!("dump is not valid UTF-8: {e}")))
        }
    }
}

/// Single-line JSON with `", "` and `": "` separators.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_format_from_path() {
        assert_eq!(ConfigFormat::from_path("a.yml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path("dir/a.yaml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path("a.json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path("a.toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path("a.ini"), None);
        assert_eq!(ConfigFormat::from_path("yaml"), None);
    }

    #[test]
    fn test_dump_format_from_str() {
        assert_eq!("yaml".parse::<DumpFormat>(), Ok(DumpFormat::Yaml));
        assert_eq!("Json".parse::<DumpFormat>(), Ok(DumpFormat::Json));
        assert!("xml".parse::<DumpFormat>().is_err());
    }
}
