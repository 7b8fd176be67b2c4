//! Logging setup for the CLI

use std::io::IsTerminal;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Whether stderr gets ANSI escape codes
pub static ANSI: AtomicBool = AtomicBool::new(true);

pub mod ansi {
    pub const MAGENTA: &str = "\x1b[35m";
    pub const RESET: &str = "\x1b[0m";
}

/// Log an error with the `FATAL` marker
macro_rules! fatal {
    ($error:expr) => {{
        use $crate::logging::{ANSI, ansi};
        let ansi = ANSI.load(std::sync::atomic::Ordering::SeqCst);
        tracing::error!(
            fatal = true,
            "{}FATAL{} {}",
            if ansi { ansi::MAGENTA } else { "" },
            if ansi { ansi::RESET } else { "" },
            $error
        );
    }};
}

pub(crate) use fatal;

/// Verbosity flags shared by every command
#[derive(clap::Args, Clone, Copy, Debug, Default)]
#[command(next_help_heading = "Log Options")]
pub struct LogArgs {
    /// Increase logging verbosity (-v DEBUG, -vv TRACE)
    ///
    /// `RUST_LOG` takes precedence over this flag.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Decrease logging verbosity (-q WARN, -qq ERROR)
    ///
    /// Overrides both `--verbosity` and `RUST_LOG`.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,
}

/// Install the global subscriber writing to stderr
pub fn init_global_subscriber(args: LogArgs) {
    let log_level = log_level(args);
    let env_filter = EnvFilter::from_default_env().add_directive(log_level.into());

    let terminal = std::io::stderr().is_terminal();
    ANSI.store(terminal, Ordering::SeqCst);

    let layer = fmt::layer()
        .without_time()
        .with_target(false)
        .with_ansi(terminal)
        .with_writer(std::io::stderr)
        .compact();

    // A second initialization (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .try_init();
}

fn log_level(args: LogArgs) -> LevelFilter {
    match args.quiet {
        0 => (),
        1 => return LevelFilter::WARN,
        _ => return LevelFilter::ERROR,
    }

    if let Ok(rust_log) = std::env::var(EnvFilter::DEFAULT_ENV) {
        if let Ok(level) = LevelFilter::from_str(&rust_log) {
            return level;
        }
    }

    match args.verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_wins_over_verbosity() {
        let args = LogArgs {
            verbosity: 2,
            quiet: 1,
        };
        assert_eq!(log_level(args), LevelFilter::WARN);
        assert_eq!(
            log_level(LogArgs {
                verbosity: 0,
                quiet: 3
            }),
            LevelFilter::ERROR
        );
    }
}
