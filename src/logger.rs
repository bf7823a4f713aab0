/// Selects the log level from the command-line verbosity.
///
/// Verbosity below zero means quiet, zero shows warnings, anything above shows info.
/// Debug mode wins over everything else.
pub fn level_filter(verbosity: i32, debug: bool) -> log::LevelFilter {
    if debug {
        return log::LevelFilter::Debug;
    }
    match verbosity {
        v if v < 0 => log::LevelFilter::Error,
        0 => log::LevelFilter::Warn,
        _ => log::LevelFilter::Info,
    }
}

pub fn init_logger(verbosity: i32, debug: bool) {
    env_logger::Builder::new()
        .filter_level(level_filter(verbosity, debug))
        .format_timestamp(None)
        .init();
}
