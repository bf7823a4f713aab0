//! Core template processing for j2subst.
//! Resolves inputs and outputs, renders single files, stdin and directory
//! trees, and guards the output location before writing.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use serde_json::Value;

use crate::constants::{
    CTX_FILE, CTX_IS_CI, CTX_ORIGIN, DICT_NAME_CFG, DICT_NAME_ENV, STREAM_MARKER, TEMPLATE_EXT,
    TEMPLATE_PATH_PARTS,
};
use crate::env::{is_ci, EnvFilter};
use crate::error::{Error, Result};
use crate::files::{is_same_file, is_stdin, is_stdout, normalize_path};
use crate::merge::ConfigDict;
use crate::registry::{is_plain_key, Registry};
use crate::renderer::{MiniJinjaRenderer, TemplateRenderer};
use crate::report::Reporter;
use crate::search::{find_template, resolve_origin, SearchDir, TemplatePath};

/// Settings of the render driver.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Overwrite existing output files
    pub force: bool,
    /// Delete the template after a successful render
    pub unlink: bool,
    /// Propagate filters as functions too
    pub filters_as_functions: bool,
    pub template_ext: String,
    pub template_path: Vec<String>,
    pub dict_name_cfg: String,
    pub dict_name_env: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            force: false,
            unlink: false,
            filters_as_functions: false,
            template_ext: TEMPLATE_EXT.to_string(),
            template_path: TEMPLATE_PATH_PARTS.iter().map(|s| s.to_string()).collect(),
            dict_name_cfg: DICT_NAME_CFG.to_string(),
            dict_name_env: DICT_NAME_ENV.to_string(),
        }
    }
}

/// Input template (or stdin marker) paired with an optional explicit output
/// (or stdout marker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
}

fn has_ext(path: &Path, ext: &str) -> bool {
    path.to_str().is_some_and(|s| s.ends_with(ext))
}

/// Interprets the first two command-line arguments as an input/output pair.
///
/// Returns `None` when the arguments should instead be processed as a plain
/// list: the first one is neither stdin nor an existing template file, or the
/// second one is a template too.
pub fn handle_simple_cli_args(arg1: Option<&str>, arg2: Option<&str>, template_ext: &str) -> Option<RenderTarget> {
    let arg1 = arg1.filter(|a| !a.is_empty())?;

    let input = if is_stdin(arg1) {
        PathBuf::from(STREAM_MARKER)
    } else {
        let a = normalize_path(arg1);
        if a.is_file() && has_ext(&a, template_ext) {
            PathBuf::from(arg1)
        } else {
            return None;
        }
    };

    let Some(arg2) = arg2.filter(|a| !a.is_empty()) else {
        return Some(RenderTarget { input, output: None });
    };

    let output = if is_stdout(arg2) {
        PathBuf::from(STREAM_MARKER)
    } else {
        let a = normalize_path(arg2);
        if has_ext(&a, template_ext) {
            // second argument is (probably) a template too
            return None;
        }
        a
    };

    Some(RenderTarget { input, output: Some(output) })
}

/// Checks that `output` may be written and removes an existing file there.
///
/// Refuses symlinks, non-regular files, the input file itself, and existing
/// files unless `force` is set.
pub fn prepare_output_target(output: &Path, input: Option<&Path>, force: bool) -> Result<()> {
    let meta = match fs::symlink_metadata(output) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    if meta.file_type().is_symlink() {
        return Err(Error::RenderError(format!("output file is symlink: {}", output.display())));
    }
    if !meta.is_file() {
        return Err(Error::RenderError(format!("output file is not a file: {}", output.display())));
    }
    if let Some(input) = input {
        if is_same_file(input, output)? {
            return Err(Error::RenderError(format!(
                "unable to process template inplace: {}",
                input.display()
            )));
        }
    }
    if !force {
        return Err(Error::RenderError(format!(
            "unable to overwrite existing file: {}",
            output.display()
        )));
    }

    fs::remove_file(output)?;
    Ok(())
}

/// Renders templates against the aggregated configuration.
pub struct Processor {
    renderer: Box<dyn TemplateRenderer>,
    template_path: TemplatePath,
    reporter: Reporter,
    options: RenderOptions,
    config: ConfigDict,
    env_vars: BTreeMap<String, String>,
    allow_stream: bool,
}

impl Processor {
    /// Creates a processor with the builtin function/filter registry and the
    /// filtered process environment.
    pub fn new(options: RenderOptions, config: ConfigDict, reporter: Reporter) -> Result<Self> {
        let registry = Registry::with_builtins(options.filters_as_functions, &reporter)?;
        Self::with_registry(options, config, reporter, &registry)
    }

    pub fn with_registry(
        options: RenderOptions,
        config: ConfigDict,
        reporter: Reporter,
        registry: &Registry,
    ) -> Result<Self> {
        for name in [&options.dict_name_cfg, &options.dict_name_env] {
            if !is_plain_key(name) {
                return Err(Error::InvalidDictName(name.clone()));
            }
        }

        let mut template_path = TemplatePath::new(options.template_path.iter().cloned());
        // early pass: registers placeholder-free directories and reports missing ones
        template_path.resolve(false, None, &reporter)?;

        Ok(Self {
            renderer: Box::new(MiniJinjaRenderer::new(registry)),
            template_path,
            reporter,
            options,
            config,
            env_vars: EnvFilter::default().from_process(),
            allow_stream: true,
        })
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn config(&self) -> &ConfigDict {
        &self.config
    }

    pub fn template_path(&self) -> &TemplatePath {
        &self.template_path
    }

    pub fn set_env_vars(&mut self, vars: BTreeMap<String, String>) {
        self.env_vars = vars;
    }

    /// Whether `-`, `/dev/stdin` and `/dev/stdout` are honored.
    pub fn allow_stream(&self) -> bool {
        self.allow_stream
    }

    pub fn set_allow_stream(&mut self, allow: bool) {
        self.allow_stream = allow;
    }

    /// Search directories for a render with the given origin.
    pub fn search_dirs(&mut self, origin: Option<&Path>) -> Result<Vec<Arc<SearchDir>>> {
        self.template_path.resolve(true, origin, &self.reporter)
    }

    fn context(&self, file: Option<&Path>, origin: Option<&Path>) -> Value {
        let path_value = |p: Option<&Path>| {
            p.map(|p| Value::String(p.display().to_string())).unwrap_or(Value::Null)
        };
        let env = self
            .env_vars
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<serde_json::Map<_, _>>();

        let mut ctx = serde_json::Map::new();
        ctx.insert(self.options.dict_name_cfg.clone(), Value::Object(self.config.clone()));
        ctx.insert(self.options.dict_name_env.clone(), Value::Object(env));
        ctx.insert(CTX_IS_CI.to_string(), Value::Bool(is_ci()));
        ctx.insert(CTX_FILE.to_string(), path_value(file));
        ctx.insert(CTX_ORIGIN.to_string(), path_value(origin));
        Value::Object(ctx)
    }

    /// Renders a template string with the origin-less environment.
    pub fn render_str(&mut self, source: &str) -> Result<String> {
        let dirs = self.search_dirs(None)?;
        let ctx = self.context(None, None);
        self.renderer.render_str(source, &dirs, &ctx)
    }

    fn render_stdin(&mut self) -> Result<String> {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        self.render_str(&buffer)
    }

    /// Looks the template up and renders it. Returns the output and the path
    /// the template was found at.
    ///
    /// The origin-less environment is probed first without reporting; if the
    /// template is not found there, the lookup is repeated with the template
    /// itself as origin.
    pub fn render_from_file(&mut self, name: &str) -> Result<(String, PathBuf)> {
        let probe = Reporter::silent();
        let mut dirs = self.template_path.resolve(true, None, &probe)?;
        let mut found = find_template(&dirs, name);
        if found.is_none() {
            debug!("render_from_file: retrying {name:?} with its own origin");
            dirs = self.template_path.resolve(true, Some(Path::new(name)), &self.reporter)?;
            found = find_template(&dirs, name);
        }
        let path = found.ok_or_else(|| Error::RenderError(format!("template not found: {name:?}")))?;

        let source = fs::read_to_string(&path)?;
        let origin = resolve_origin(&path, &self.reporter)?.map(|o| o.dir);
        let ctx = self.context(Some(&path), origin.as_deref());
        let rendered = self.renderer.render_named(name, &source, &dirs, &ctx)?;
        Ok((rendered, path))
    }

    /// Renders one template into `output`, or into the inferred output name
    /// when `output` is `None`.
    ///
    /// Per-file problems are reported and yield `Ok(false)`; only strict mode
    /// escalations are returned as errors.
    pub fn render_file<P: AsRef<Path>>(&mut self, input: P, output: Option<&Path>) -> Result<bool> {
        match self.try_render_file(input.as_ref(), output) {
            Ok(()) => Ok(true),
            Err(e @ Error::StrictModeError(_)) => Err(e),
            Err(e) => {
                self.reporter.warn("render_file", e.to_string())?;
                Ok(false)
            }
        }
    }

    fn try_render_file(&mut self, input: &Path, output: Option<&Path>) -> Result<()> {
        let (rendered, file_in) = if is_stdin(input) {
            if !self.allow_stream {
                return Err(Error::RenderError("stdin not allowed".to_string()));
            }
            (self.render_stdin()?, None)
        } else {
            let name = input.to_str().ok_or_else(|| {
                Error::RenderError(format!("template name is not valid unicode: {}", input.display()))
            })?;
            let (rendered, path) = self.render_from_file(name)?;
            (rendered, Some(path))
        };

        let file_out = match (output, &file_in) {
            (Some(output), _) => output.to_path_buf(),
            (None, None) => PathBuf::from(STREAM_MARKER),
            (None, Some(file_in)) => file_in
                .to_str()
                .and_then(|s| s.strip_suffix(self.options.template_ext.as_str()))
                .map(PathBuf::from)
                .ok_or_else(|| {
                    Error::RenderError(format!(
                        "input file name extension mismatch: {:?}",
                        input.display().to_string()
                    ))
                })?,
        };

        if is_stdout(&file_out) {
            if !self.allow_stream {
                return Err(Error::RenderError("stdout not allowed".to_string()));
            }
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
            return self.unlink_input(file_in.as_deref());
        }

        prepare_output_target(&file_out, file_in.as_deref(), self.options.force)?;
        fs::write(&file_out, rendered)?;
        self.unlink_input(file_in.as_deref())
    }

    fn unlink_input(&self, file_in: Option<&Path>) -> Result<()> {
        if !self.options.unlink {
            return Ok(());
        }
        match file_in {
            Some(path) => fs::remove_file(path)?,
            None => self.reporter.info("render_file", "cannot unlink() stdin"),
        }
        Ok(())
    }

    /// Renders every template below `dir`, visiting entries in sorted order.
    ///
    /// `depth` bounds the recursion: zero visits nothing, a negative value is
    /// unbounded. The result is `true` only if every render succeeded; a
    /// failure does not stop the walk.
    pub fn render_directory<P: AsRef<Path>>(&mut self, dir: P, depth: i64) -> Result<bool> {
        const SOURCE: &str = "render_directory";
        let dir = dir.as_ref();

        if !dir.is_dir() {
            self.reporter.warn(SOURCE, format!("not a directory: {:?}", dir.display().to_string()))?;
            return Ok(false);
        }
        let depth = depth.max(-1);
        if depth == 0 {
            self.reporter.debug(SOURCE, "depth == 0");
            return Ok(true);
        }

        let entries = fs::read_dir(dir)
            .and_then(|rd| rd.map(|e| e.map(|e| e.path())).collect::<io::Result<Vec<_>>>());
        let mut entries = match entries {
            Ok(entries) => entries,
            Err(e) => {
                self.reporter.warn(SOURCE, format!("failed to read {}: {e}", dir.display()))?;
                return Ok(false);
            }
        };
        entries.sort();

        let next_depth = if depth < 0 { depth } else { depth - 1 };
        let mut ok = true;
        for entry in entries {
            if entry.is_dir() {
                ok &= self.render_directory(&entry, next_depth)?;
                continue;
            }
            if has_ext(&entry, &self.options.template_ext) && entry.is_file() {
                ok &= self.render_file(&entry, None)?;
                continue;
            }
            self.reporter.info(SOURCE, format!("ignore: {}", entry.display()));
        }
        Ok(ok)
    }
}
