/// Colored verification output formatter.
///
/// Produces per-function verification results with color-coded status:
///   [OK]      function_name (green)
///   [FAIL]    function_name, then the counterexample (red)
///   [UNKNOWN] function_name - reason (yellow)
///   [ERROR]   function_name - stage and message (magenta)
///   [SKIP]    function_name (cyan)
use colored::Colorize;

use crate::types::{FunctionOutcome, FunctionResult, RunReport};

/// Lines printed for one function; the first carries the status tag.
pub fn format_function(result: &FunctionResult, verbose: bool) -> Vec<String> {
    let timing = if verbose {
        format!(" ({}ms)", result.duration_ms)
    } else {
        String::new()
    };
    match &result.outcome {
        FunctionOutcome::Verified => {
            vec![format!("  {}       {}{timing}", "[OK]".green().bold(), result.name)]
        }
        FunctionOutcome::Skipped => vec![format!(
            "  {}     {} (no postcondition){timing}",
            "[SKIP]".cyan().bold(),
            result.name
        )],
        FunctionOutcome::Failed { counterexample } => {
            let mut lines = vec![format!(
                "  {}     {}{timing}",
                "[FAIL]".red().bold(),
                result.name
            )];
            let origin = if counterexample.replayed {
                ""
            } else {
                " (solver model)"
            };
            lines.push(format!("      counterexample{}:", origin.dimmed()));
            lines.push(format!("        {}", counterexample.call));
            lines.extend(counterexample.lines.iter().map(|l| format!("        {l}")));
            lines
        }
        FunctionOutcome::Inconclusive { reason } => vec![format!(
            "  {}  {} ({reason}){timing}",
            "[UNKNOWN]".yellow().bold(),
            result.name
        )],
        FunctionOutcome::Error { stage, message } => vec![format!(
            "  {}    {} ({stage}: {message}){timing}",
            "[ERROR]".magenta().bold(),
            result.name
        )],
    }
}

/// Summary line, e.g. `Summary: 2 OK, 1 FAIL (total: 156ms)`.
pub fn format_summary(report: &RunReport) -> String {
    let tally = report.tally();
    let mut parts = Vec::new();
    if tally.verified > 0 {
        parts.push(format!("{} {}", tally.verified, "OK".green()));
    }
    if tally.skipped > 0 {
        parts.push(format!("{} {}", tally.skipped, "SKIP".cyan()));
    }
    if tally.failed > 0 {
        parts.push(format!("{} {}", tally.failed, "FAIL".red()));
    }
    if tally.inconclusive > 0 {
        parts.push(format!("{} {}", tally.inconclusive, "UNKNOWN".yellow()));
    }
    if tally.errors > 0 {
        parts.push(format!("{} {}", tally.errors, "ERROR".magenta()));
    }

    let summary = parts.join(", ");
    let total_ms = report.total_ms();
    if total_ms > 0 {
        format!("Summary: {summary} (total: {total_ms}ms)")
    } else {
        format!("Summary: {summary}")
    }
}

/// Print verification results with colored output to stderr.
///
/// ```text
///   [OK]       sum_to(n) (42ms)
///   [FAIL]     f
///       counterexample:
///         f() => [r = 1]
///   [ERROR]    g (pending: loop `while (i < n)` has no invariant)
///
/// Summary: 1 OK, 1 FAIL, 1 ERROR (total: 156ms)
/// ```
pub fn print_verification_results(report: &RunReport, verbose: bool) {
    if report.functions.is_empty() {
        eprintln!("{}", "No functions found.".dimmed());
        return;
    }

    eprintln!();
    for result in &report.functions {
        for line in format_function(result, verbose) {
            eprintln!("{line}");
        }
    }
    eprintln!();
    eprintln!("{}", format_summary(report));
    eprintln!();
}

/// Print a header for the verification run.
pub fn print_header(module: &str, backend: &str) {
    eprintln!("{}", format!("Verifying {module} with {backend}").bold());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cex_render::Counterexample;
    use crate::types::CheckState;

    fn result(outcome: FunctionOutcome) -> FunctionResult {
        FunctionResult::new("f", outcome, 12)
    }

    #[test]
    fn verified_line_has_ok_tag() {
        let lines = format_function(&result(FunctionOutcome::Verified), false);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("[OK]"));
        assert!(lines[0].contains('f'));
        assert!(!lines[0].contains("12ms"));
    }

    #[test]
    fn verbose_adds_timing() {
        let lines = format_function(&result(FunctionOutcome::Verified), true);
        assert!(lines[0].contains("(12ms)"));
    }

    #[test]
    fn failure_lists_counterexample() {
        let cex = Counterexample {
            call: "f(3) => [r = 1]".into(),
            lines: vec!["i = 3".into()],
            replayed: true,
        };
        let lines = format_function(
            &result(FunctionOutcome::Failed {
                counterexample: cex,
            }),
            false,
        );
        assert!(lines[0].contains("[FAIL]"));
        assert!(lines.iter().any(|l| l.trim() == "f(3) => [r = 1]"));
        assert!(lines.last().is_some_and(|l| l.trim() == "i = 3"));
    }

    #[test]
    fn error_line_names_stage() {
        let lines = format_function(
            &result(FunctionOutcome::Error {
                stage: CheckState::Pending,
                message: "loop `while (i < n)` has no invariant".into(),
            }),
            false,
        );
        assert!(lines[0].contains("[ERROR]"));
        assert!(lines[0].contains("pending: loop"));
    }

    #[test]
    fn inconclusive_line_names_reason() {
        let lines = format_function(
            &result(FunctionOutcome::Inconclusive {
                reason: "timeout".into(),
            }),
            false,
        );
        assert!(lines[0].contains("[UNKNOWN]"));
        assert!(lines[0].contains("(timeout)"));
    }

    #[test]
    fn summary_counts_outcomes_and_total() {
        let report = RunReport {
            module: "m".into(),
            functions: vec![
                result(FunctionOutcome::Verified),
                result(FunctionOutcome::Verified),
                result(FunctionOutcome::Inconclusive {
                    reason: "timeout".into(),
                }),
            ],
        };
        let summary = format_summary(&report);
        assert!(summary.starts_with("Summary: 2 "));
        assert!(summary.contains("UNKNOWN"));
        assert!(summary.ends_with("(total: 36ms)"));
        assert!(!summary.contains("FAIL"));
    }
}
