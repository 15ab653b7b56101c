//! Log sink setup.
//!
//! All diagnostics go through the `log` facade. The binary installs an
//! `env_logger` sink once at startup with every level enabled in the sink
//! itself, and steers verbosity through [`log::set_max_level`]. That lets the
//! level be raised or lowered after the config file has been read without
//! reinstalling the logger.
//!
//! Level precedence, highest first:
//!
//! ```text
//! --debug              -> debug
//! --quiet              -> off
//! [logging] level      -> as configured
//! default              -> info
//! ```

use log::LevelFilter;
use std::io::Write;
use std::str::FromStr;

/// Pick the effective level from the CLI flags and the config file.
///
/// `--debug` wins over `--quiet`. An unparsable configured level falls back
/// to info; config validation reports it separately.
pub fn resolve_level(quiet: bool, debug: bool, configured: Option<&str>) -> LevelFilter {
    if debug {
        return LevelFilter::Debug;
    }
    if quiet {
        return LevelFilter::Off;
    }
    configured
        .and_then(|level| LevelFilter::from_str(level).ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install the stderr logger. Safe to call more than once.
pub fn init(level: LevelFilter) {
    let installed = env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.args()
            )
        })
        .try_init();
    if installed.is_err() {
        log::debug!("logger already installed");
    }
    set_level(level);
}

pub fn set_level(level: LevelFilter) {
    log::set_max_level(level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_info() {
        assert_eq!(resolve_level(false, false, None), LevelFilter::Info);
    }

    #[test]
    fn debug_wins_over_quiet() {
        assert_eq!(resolve_level(true, true, None), LevelFilter::Debug);
    }

    #[test]
    fn quiet_turns_logging_off() {
        assert_eq!(resolve_level(true, false, Some("trace")), LevelFilter::Off);
    }

    #[test]
    fn configured_level_applies_without_flags() {
        assert_eq!(resolve_level(false, false, Some("warn")), LevelFilter::Warn);
        assert_eq!(resolve_level(false, false, Some("TRACE")), LevelFilter::Trace);
    }

    #[test]
    fn debug_flag_overrides_configured_level() {
        assert_eq!(resolve_level(false, true, Some("error")), LevelFilter::Debug);
    }

    #[test]
    fn unparsable_level_falls_back_to_info() {
        assert_eq!(resolve_level(false, false, Some("loud")), LevelFilter::Info);
    }
}
