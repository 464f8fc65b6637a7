use crate::error::SolverError;
use crate::model::Model;
use crate::result::SolverResult;

/// Parse solver stdout into a `SolverResult`.
///
/// The first meaningful line is the `check-sat` answer; for `sat` the rest
/// is the `(get-model)` response. An `(error ...)` before the answer means
/// the script was rejected; after it, Z3 uses the same form to report that
/// no model is available, which is ignored.
pub fn parse_solver_output(stdout: &str, stderr: &str) -> Result<SolverResult, SolverError> {
    let stdout = stdout.trim();

    if stdout.is_empty() {
        if stderr.contains("timeout") {
            return Ok(SolverResult::Unknown("timeout".to_string()));
        }
        return Err(SolverError::ParseError(format!(
            "Empty solver output. stderr: {}",
            stderr.trim()
        )));
    }

    let first_line = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    if first_line.starts_with("(error") {
        return Err(SolverError::ParseError(format!(
            "Solver rejected the script: {first_line}"
        )));
    }

    match first_line {
        "unsat" => Ok(SolverResult::Unsat),
        "sat" => Ok(SolverResult::Sat(parse_model(stdout))),
        "unknown" => Ok(SolverResult::Unknown(extract_unknown_reason(stdout, stderr))),
        "timeout" => Ok(SolverResult::Unknown("timeout".to_string())),
        _ => Err(SolverError::ParseError(format!(
            "Unexpected solver output: {first_line}"
        ))),
    }
}

/// Reason string for an `unknown` answer.
fn extract_unknown_reason(stdout: &str, stderr: &str) -> String {
    let after_unknown = stdout
        .lines()
        .skip_while(|line| line.trim() != "unknown")
        .skip(1)
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("(error"));

    if let Some(reason) = after_unknown {
        reason
            .trim_start_matches('(')
            .trim_end_matches(')')
            .trim_start_matches(":reason-unknown ")
            .trim_matches('"')
            .to_string()
    } else if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        "unknown".to_string()
    }
}

/// Collect the nullary `define-fun` entries of a model.
///
/// Accepts both the bare-paren layout of recent Z3 releases and the older
/// `(model ...)` wrapper. Entries with parameters (function
/// interpretations) are skipped.
fn parse_model(output: &str) -> Option<Model> {
    const DEFINE_FUN: &str = "(define-fun ";

    let mut assignments = Vec::new();
    let mut pos = 0;

    while let Some(offset) = output[pos..].find(DEFINE_FUN) {
        let start = pos + offset;
        let Some(end) = find_sexp_end(output, start) else {
            break;
        };
        // body excludes the opening `(define-fun ` and the closing `)`
        let body = &output[start + DEFINE_FUN.len()..end - 1];
        if let Some(entry) = parse_define_fun(body) {
            assignments.push(entry);
        }
        pos = end;
    }

    (!assignments.is_empty()).then(|| Model::with_assignments(assignments))
}

/// Index just past the S-expression that opens at `start`.
fn find_sexp_end(input: &str, start: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    if bytes.get(start) != Some(&b'(') {
        return None;
    }

    let mut depth = 0usize;
    for (i, b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse `name () Sort value` into `(name, value)`.
fn parse_define_fun(input: &str) -> Option<(String, String)> {
    let normalized = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let (name, rest) = normalized.split_once(' ')?;
    let rest = rest.trim_start().strip_prefix("()")?.trim_start();

    let after_sort = skip_sexp(rest)?;
    let value = rest[after_sort..].trim();
    if value.is_empty() {
        return None;
    }
    Some((name.to_string(), value.to_string()))
}

/// Length of the leading S-expression (atom or parenthesized) of `input`.
fn skip_sexp(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    match bytes.first()? {
        b'(' => find_sexp_end(input, 0),
        _ => Some(
            bytes
                .iter()
                .position(|b| b.is_ascii_whitespace() || *b == b'(' || *b == b')')
                .unwrap_or(bytes.len()),
        ),
    }
}
