//! j2subst's main application entry point and orchestration logic.
//! Handles command-line argument parsing, configuration loading and the
//! template rendering flow.

use std::path::Path;
use std::process::ExitCode;

use clap::{error::ErrorKind, CommandFactory};
use j2subst::{
    cli::{get_args, Args},
    config::{dump_config, load_config},
    constants::{DICT_NAME_CFG, DICT_NAME_ENV, MAX_DEPTH},
    env::is_ci,
    error::{default_error_handler, Result},
    logger::init_logger,
    processor::{handle_simple_cli_args, Processor, RenderOptions},
    report::Reporter,
};

/// Main application entry point.
fn main() -> ExitCode {
    let args = get_args();

    init_logger(args.verbosity(), args.debug);

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            default_error_handler(err);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Aggregates configuration from every config source
/// 2. In dump mode, prints the configuration and stops
/// 3. Pairs the first arguments as input/output when possible
/// 4. Otherwise renders every argument (file or directory) on its own
fn run(args: Args) -> Result<bool> {
    let reporter = Reporter::new(args.strict);
    let config = load_config(&args.config_sources(), &reporter)?;

    if let Some(format) = args.dump_format() {
        println!("{}", dump_config(&config, format)?);
        return Ok(true);
    }

    let depth = args.depth.unwrap_or(if is_ci() { MAX_DEPTH } else { 1 });

    let mut items = args.args.clone();
    if items.is_empty() {
        if !is_ci() {
            Args::command().error(ErrorKind::MissingRequiredArgument, "no arguments were specified").exit();
        }
        items.push(std::env::current_dir()?.display().to_string());
    }

    let options = RenderOptions {
        force: args.force,
        unlink: args.unlink,
        filters_as_functions: args.fn_filters,
        template_path: args.template_path_entries(),
        dict_name_cfg: args.dict_name_cfg.clone().unwrap_or_else(|| DICT_NAME_CFG.to_string()),
        dict_name_env: args.dict_name_env.clone().unwrap_or_else(|| DICT_NAME_ENV.to_string()),
        ..RenderOptions::default()
    };
    let template_ext = options.template_ext.clone();
    let mut processor = Processor::new(options, config, reporter)?;

    let target = handle_simple_cli_args(
        items.first().map(String::as_str),
        items.get(1).map(String::as_str),
        &template_ext,
    );
    if let Some(target) = target {
        return processor.render_file(&target.input, target.output.as_deref());
    }

    // stdin/stdout are only valid as the sole input/output pair
    processor.set_allow_stream(false);

    let mut ok = true;
    for item in &items {
        let path = Path::new(item);
        if path.is_dir() {
            ok &= processor.render_directory(path, depth)?;
        } else {
            ok &= processor.render_file(path, None)?;
        }
    }
    Ok(ok)
}
