//! Common constants used throughout j2subst.

/// Default name of the configuration dictionary inside templates
pub const DICT_NAME_CFG: &str = "cfg";

/// Default name of the environment dictionary inside templates
pub const DICT_NAME_ENV: &str = "env";

/// Suffix of renderable template files
pub const TEMPLATE_EXT: &str = ".j2";

/// Placeholder replaced with the process working directory
pub const PLACEHOLDER_CWD: &str = "@{CWD}";

/// Placeholder replaced with the origin directory of the rendered template
pub const PLACEHOLDER_ORIGIN: &str = "@{ORIGIN}";

/// Prefix shared by all placeholders
pub const PLACEHOLDER_PREFIX: &str = "@{";

/// Default template path entries
pub const TEMPLATE_PATH_PARTS: [&str; 2] = [PLACEHOLDER_ORIGIN, PLACEHOLDER_CWD];

/// Default template path as accepted on the command line
pub const TEMPLATE_PATH: &str = "@{ORIGIN}:@{CWD}";

/// Separator of path lists (config path, template path)
pub const PATH_LIST_SEPARATOR: char = ':';

/// Upper bound for the directory walk depth
pub const MAX_DEPTH: i64 = 20;

/// Recognized configuration file suffixes (leading dots are mandatory)
pub const CONFIG_EXT: [&str; 4] = [".yaml", ".yml", ".json", ".toml"];

/// Environment variables matching any of these patterns are hidden from templates:
/// the tool's own namespace and names ending in an underscore
pub const ENV_SKIP: [&str; 2] = [r"^J2SUBST_", r"_$"];

/// Environment variables indicating a CI/CD run
pub const ENV_CI: [&str; 9] = [
    "BUILD_ID",
    "BUILD_NUMBER",
    "CI",
    "CI_APP_ID",
    "CI_BUILD_ID",
    "CI_BUILD_NUMBER",
    "CI_NAME",
    "CONTINUOUS_INTEGRATION",
    "RUN_ID",
];

/// Stream marker accepted for both stdin and stdout
pub const STREAM_MARKER: &str = "-";

pub const STDIN_PATH: &str = "/dev/stdin";
pub const STDOUT_PATH: &str = "/dev/stdout";

/// YAML dump of an empty configuration
pub const EMPTY_YAML: &str = "\n---\n# empty\n---\n";

/// JSON dump of an empty configuration
pub const EMPTY_JSON: &str = "{}";

/// Context key holding the CI detection flag
pub const CTX_IS_CI: &str = "is_ci";

/// Context key holding the resolved template file path
pub const CTX_FILE: &str = "j2subst_file";

/// Context key holding the resolved origin directory
pub const CTX_ORIGIN: &str = "j2subst_origin";
