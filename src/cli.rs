//! Command-line interface implementation for j2subst.
//! Provides argument parsing with environment variable fallbacks using clap.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::parser::ValueSource;
use clap::{error::ErrorKind, ArgMatches, CommandFactory, FromArgMatches, Parser};

use crate::config::DumpFormat;
use crate::constants::{MAX_DEPTH, PATH_LIST_SEPARATOR, TEMPLATE_PATH};
use crate::env::{click_bool, click_bool_neg};

/// Value of `--dump`: a format, or an explicit "off".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpMode {
    Format(DumpFormat),
    Off,
}

fn parse_dump_mode(s: &str) -> Result<DumpMode, String> {
    if click_bool(s) {
        return Ok(DumpMode::Format(DumpFormat::default()));
    }
    if click_bool_neg(s) {
        return Ok(DumpMode::Off);
    }
    s.parse::<DumpFormat>().map(DumpMode::Format)
}

/// Command-line arguments structure for j2subst.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "j2subst: expand templates with layered YAML/JSON/TOML configuration",
    long_about = None
)]
pub struct Args {
    /// Dump configuration to stdout and exit (YAML or JSON)
    #[arg(long, value_name = "FORMAT", num_args = 0..=1, default_missing_value = "yaml", value_parser = parse_dump_mode)]
    pub dump: Option<DumpMode>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Enable quiet mode (overrides any --verbose)
    #[arg(short, long, env = "J2SUBST_QUIET", value_parser = BoolishValueParser::new())]
    pub quiet: bool,

    /// Enable debug mode
    #[arg(short = 'D', long, env = "J2SUBST_DEBUG", value_parser = BoolishValueParser::new())]
    pub debug: bool,

    /// Enable strict mode: every warning aborts the run
    #[arg(short, long, env = "J2SUBST_STRICT", value_parser = BoolishValueParser::new())]
    pub strict: bool,

    /// Overwrite existing output files
    #[arg(short, long, env = "J2SUBST_FORCE", value_parser = BoolishValueParser::new())]
    pub force: bool,

    /// Delete template files after expanding them
    #[arg(short, long, env = "J2SUBST_UNLINK", value_parser = BoolishValueParser::new())]
    pub unlink: bool,

    /// Recursion depth to look for template files
    #[arg(short, long, env = "J2SUBST_DEPTH", value_name = "INTEGER",
          value_parser = clap::value_parser!(i64).range(1..=MAX_DEPTH))]
    pub depth: Option<i64>,

    /// Colon-separated list of configuration files or directories.
    /// Supported formats: YAML (".yaml", ".yml"), JSON (".json"), TOML (".toml")
    #[arg(short, long, env = "J2SUBST_CONFIG_PATH", value_name = "LIST")]
    pub config_path: Option<String>,

    /// Colon-separated list of template directories.
    /// Entries may contain @{CWD} and @{ORIGIN} placeholders
    #[arg(short, long, env = "J2SUBST_TEMPLATE_PATH", value_name = "LIST", default_value = TEMPLATE_PATH)]
    pub template_path: String,

    /// Propagate filters as functions too
    #[arg(long, env = "J2SUBST_FN_FILTERS", value_parser = BoolishValueParser::new())]
    pub fn_filters: bool,

    /// Name of the configuration dictionary inside templates
    #[arg(long, env = "J2SUBST_DICT_NAME_CFG")]
    pub dict_name_cfg: Option<String>,

    /// Name of the environment dictionary inside templates
    #[arg(long, env = "J2SUBST_DICT_NAME_ENV")]
    pub dict_name_env: Option<String>,

    /// Templates, directories, or an input/output pair
    #[arg(value_name = "ARGUMENTS")]
    pub args: Vec<String>,
}

/// Splits a separator-delimited list, dropping empty items.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(PATH_LIST_SEPARATOR).filter(|p| !p.is_empty()).map(String::from).collect()
}

impl Args {
    /// Requested dump format, if dump mode is on.
    pub fn dump_format(&self) -> Option<DumpFormat> {
        match self.dump {
            Some(DumpMode::Format(format)) => Some(format),
            _ => None,
        }
    }

    /// Verbosity level: -1 quiet, 0 warnings, 1 and above info.
    pub fn verbosity(&self) -> i32 {
        if self.quiet {
            -1
        } else {
            i32::from(self.verbose)
        }
    }

    pub fn config_sources(&self) -> Vec<PathBuf> {
        self.config_path.as_deref().map(split_list).unwrap_or_default().into_iter().map(PathBuf::from).collect()
    }

    pub fn template_path_entries(&self) -> Vec<String> {
        split_list(&self.template_path)
    }
}

fn from_command_line(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Options which make no sense together with `--dump` when given on the
/// command line. Values coming from the environment are tolerated.
const DUMP_EXCLUSIVE: [(&str, &str); 8] = [
    ("force", "--force"),
    ("unlink", "--unlink"),
    ("depth", "--depth"),
    ("template_path", "--template-path"),
    ("fn_filters", "--fn-filters"),
    ("dict_name_cfg", "--dict-name-cfg"),
    ("dict_name_env", "--dict-name-env"),
    ("args", "arguments"),
];

fn validate(args: &Args, matches: &ArgMatches) -> Result<(), clap::Error> {
    if args.dump_format().is_none() {
        return Ok(());
    }
    for (id, flag) in DUMP_EXCLUSIVE {
        if from_command_line(matches, id) {
            return Err(Args::command().error(ErrorKind::ArgumentConflict, format!("Cannot use --dump with {flag}")));
        }
    }
    Ok(())
}

/// Parses and validates arguments from an iterator.
///
/// The verbosity count falls back to `J2SUBST_VERBOSE` when `-v` is absent.
pub fn try_parse_args<I, T>(itr: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = Args::command().try_get_matches_from(itr)?;
    let mut args = Args::from_arg_matches(&matches)?;
    if !from_command_line(&matches, "verbose") {
        if let Some(v) = std::env::var("J2SUBST_VERBOSE").ok().and_then(|v| v.trim().parse::<u8>().ok()) {
            args.verbose = v;
        }
    }
    validate(&args, &matches)?;
    Ok(args)
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With clap's default error handling for argument errors
pub fn get_args() -> Args {
    match try_parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(e) => e.exit(),
    }
}
