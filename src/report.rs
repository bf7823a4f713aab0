//! Diagnostics sink shared by the config aggregator, the path resolver and
//! the render driver.

use std::cell::RefCell;

use crate::error::{Error, Result};

/// Routes recoverable conditions to the logger.
///
/// In strict mode a warning is not logged but turned into
/// [`Error::StrictModeError`], which callers propagate to abort the run.
#[derive(Debug, Default)]
pub struct Reporter {
    strict: bool,
    silent: bool,
    warnings: RefCell<Vec<String>>,
}

impl Reporter {
    pub fn new(strict: bool) -> Self {
        Self { strict, silent: false, warnings: RefCell::new(Vec::new()) }
    }

    /// Reporter for probing passes: warnings are demoted to debug output,
    /// never recorded and never escalated.
    pub fn silent() -> Self {
        Self { strict: false, silent: true, warnings: RefCell::new(Vec::new()) }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn warn<S: AsRef<str>>(&self, source: &str, message: S) -> Result<()> {
        let message = message.as_ref();
        if self.silent {
            log::debug!("{source}: {message}");
            return Ok(());
        }
        if self.strict {
            return Err(Error::StrictModeError(format!("{source}: {message}")));
        }
        log::warn!("{source}: {message}");
        self.warnings.borrow_mut().push(format!("{source}: {message}"));
        Ok(())
    }

    pub fn info<S: AsRef<str>>(&self, source: &str, message: S) {
        if self.silent {
            log::debug!("{source}: {}", message.as_ref());
        } else {
            log::info!("{source}: {}", message.as_ref());
        }
    }

    pub fn debug<S: AsRef<str>>(&self, source: &str, message: S) {
        log::debug!("{source}: {}", message.as_ref());
    }

    /// Warnings recorded so far, formatted as `source: message`.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_records_message() {
        let reporter = Reporter::new(false);
        reporter.warn("op", "something odd").unwrap();
        assert_eq!(reporter.warnings(), vec!["op: something odd".to_string()]);
    }

    #[test]
    fn test_strict_warn_escalates() {
        let reporter = Reporter::new(true);
        match reporter.warn("op", "something odd") {
            Err(Error::StrictModeError(msg)) => assert_eq!(msg, "op: something odd"),
            other => panic!("Expected StrictModeError, got {other:?}"),
        }
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn test_silent_reporter_swallows_warnings() {
        let reporter = Reporter::silent();
        assert!(reporter.warn("op", "ignored").is_ok());
        assert!(reporter.warnings().is_empty());
    }
}
