//! Command line interface for the demo host.

use clap::{ArgAction, Parser};

/// Coarse verbosity derived from `-q` / `-v` flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = concat!(
        env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"),
        " - Hook a window's message loop and log every intercepted message.",
    )
)]
pub struct Cli {
    /// Title of the demo window that gets hooked.
    #[arg(long, default_value = "wndmux demo")]
    pub title: String,
    /// Claim WM_CLOSE so the window survives its close button (exit with Ctrl+C).
    #[arg(long = "swallow-close")]
    pub swallow_close: bool,
    /// Increase verbosity (-v=debug, -vv=trace). Overrides RUST_LOG.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
    /// Quiet mode: only warnings and errors. Overrides -v and RUST_LOG.
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    /// `quiet` wins over any number of `-v`.
    pub fn log_level(&self) -> LogLevel {
        if self.quiet {
            LogLevel::Warn
        } else {
            match self.verbose {
                0 => LogLevel::Info,
                1 => LogLevel::Debug,
                _ => LogLevel::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("wndmux").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.title, "wndmux demo");
        assert!(!cli.swallow_close);
        assert_eq!(cli.log_level(), LogLevel::Info);
    }

    #[test]
    fn verbosity_counts() {
        assert_eq!(parse(&["-v"]).log_level(), LogLevel::Debug);
        assert_eq!(parse(&["-vv"]).log_level(), LogLevel::Trace);
        assert_eq!(parse(&["-vvv"]).log_level(), LogLevel::Trace);
    }

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(parse(&["-q", "-vv"]).log_level(), LogLevel::Warn);
    }

    #[test]
    fn flags_parse() {
        let cli = parse(&["--title", "scratch", "--swallow-close"]);
        assert_eq!(cli.title, "scratch");
        assert!(cli.swallow_close);
    }
}
