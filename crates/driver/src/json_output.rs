/// Structured JSON output for verification results.
///
/// Produced by `--output-format json` for tooling that consumes results
/// programmatically.
use serde::{Deserialize, Serialize};

use crate::pipeline::outcome_label;
use crate::types::{FunctionOutcome, FunctionResult, RunReport};

/// Complete verification report in JSON format.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonVerificationReport {
    pub module: String,
    pub verified: bool,
    pub functions: Vec<JsonFunctionResult>,
    pub summary: JsonSummary,
}

/// Per-function verification result in JSON format.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonFunctionResult {
    pub name: String,
    /// "verified", "failed", "inconclusive", "error", "skipped"
    pub status: String,
    pub verified: bool,
    pub duration_ms: u64,
    /// Solver reason for inconclusive results, error message otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Pipeline state an error was raised in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterexample: Option<JsonCounterexample>,
}

/// A rendered counterexample.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonCounterexample {
    /// `f(args) => [r = v]`
    pub call: String,
    pub locals: Vec<String>,
    /// Values come from replaying the body rather than the raw model.
    pub replayed: bool,
}

/// Summary of all verification results.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSummary {
    pub total: usize,
    pub verified: usize,
    pub failed: usize,
    pub inconclusive: usize,
    pub errors: usize,
    pub skipped: usize,
    pub total_ms: u64,
}

impl From<&FunctionResult> for JsonFunctionResult {
    fn from(result: &FunctionResult) -> Self {
        let mut json = JsonFunctionResult {
            name: result.name.clone(),
            status: outcome_label(&result.outcome).to_string(),
            verified: result.verified,
            duration_ms: result.duration_ms,
            message: None,
            stage: None,
            counterexample: None,
        };
        match &result.outcome {
            FunctionOutcome::Failed { counterexample } => {
                json.counterexample = Some(JsonCounterexample {
                    call: counterexample.call.clone(),
                    locals: counterexample.lines.clone(),
                    replayed: counterexample.replayed,
                });
            }
            FunctionOutcome::Inconclusive { reason } => json.message = Some(reason.clone()),
            FunctionOutcome::Error { stage, message } => {
                json.stage = Some(stage.to_string());
                json.message = Some(message.clone());
            }
            FunctionOutcome::Verified | FunctionOutcome::Skipped => {}
        }
        json
    }
}

impl From<&RunReport> for JsonVerificationReport {
    fn from(report: &RunReport) -> Self {
        let tally = report.tally();
        JsonVerificationReport {
            module: report.module.clone(),
            verified: report.all_verified(),
            functions: report.functions.iter().map(JsonFunctionResult::from).collect(),
            summary: JsonSummary {
                total: tally.total(),
                verified: tally.verified,
                failed: tally.failed,
                inconclusive: tally.inconclusive,
                errors: tally.errors,
                skipped: tally.skipped,
                total_ms: report.total_ms(),
            },
        }
    }
}

/// Print a JSON verification report to stdout.
///
/// JSON goes to stdout only; logs and progress stay on stderr.
pub fn print_json_report(report: &JsonVerificationReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("[hoare-fv] Error serializing JSON report: {e}");
        }
    }
}
