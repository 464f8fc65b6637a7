//! Run configuration.

use std::path::PathBuf;
use std::str::FromStr;

use hoare_fv_analysis::WpOptions;
use hoare_fv_solver::SolverKind;

/// Default per-function solver timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Colored per-function lines on stderr.
    #[default]
    Text,
    /// One JSON document on stdout.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "unknown output format '{other}' (expected 'text' or 'json')"
            )),
        }
    }
}

/// Options for one verification run.
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    pub solver: SolverKind,
    /// Per-function solver timeout in milliseconds; `0` disables it.
    pub timeout_ms: u64,
    /// Worker threads. `1` checks functions sequentially with one shared
    /// solver session.
    pub jobs: usize,
    pub wp: WpOptions,
    /// Directory receiving one `<function>.smt2` file per encoded query.
    pub dump_smt: Option<PathBuf>,
    pub output_format: OutputFormat,
    pub verbose: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            solver: SolverKind::Z3,
            timeout_ms: DEFAULT_TIMEOUT_SECS * 1000,
            jobs: 1,
            wp: WpOptions::default(),
            dump_smt: None,
            output_format: OutputFormat::Text,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parses_known_names() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn defaults_are_sequential_with_thirty_second_timeout() {
        let opts = VerifyOptions::default();
        assert_eq!(opts.jobs, 1);
        assert_eq!(opts.timeout_ms, 30_000);
        assert!(!opts.wp.close_loop_obligations);
    }
}
