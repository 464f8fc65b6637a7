use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use hoare_fv_smtlib::command::Command as SmtCmd;
use hoare_fv_smtlib::script::Script;

use crate::config::{SolverConfig, SolverKind};
use crate::error::SolverError;
use crate::parser::parse_solver_output;
use crate::result::SolverResult;

/// Interval between liveness checks while waiting for a solver process.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// SMT solver driven as a subprocess over stdin/stdout.
///
/// Works with any solver that reads SMT-LIB2 from stdin (Z3, CVC5, Yices).
#[derive(Debug, Clone)]
pub struct CliSolver {
    config: SolverConfig,
}

impl CliSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Auto-detect the binary for `kind` and use default settings.
    pub fn with_default_config_for(kind: SolverKind) -> Result<Self, SolverError> {
        Ok(Self::new(SolverConfig::auto_detect_for(kind)?))
    }

    /// Auto-detect Z3 and use default settings.
    pub fn with_default_config() -> Result<Self, SolverError> {
        Self::with_default_config_for(SolverKind::Z3)
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Check satisfiability of a Script.
    ///
    /// Model production is enabled up front; `(check-sat)` and
    /// `(get-model)` are appended when the script lacks them.
    pub fn check_sat(&self, script: &Script) -> Result<SolverResult, SolverError> {
        self.check_sat_raw(&render_query(script))
    }

    /// Check satisfiability from a raw SMT-LIB2 string.
    pub fn check_sat_raw(&self, smtlib: &str) -> Result<SolverResult, SolverError> {
        self.config.validate()?;

        let args = self.config.build_args();
        tracing::debug!(solver = %self.config.kind, ?args, "spawning solver");
        let started = Instant::now();

        let mut child = Command::new(&self.config.solver_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SolverError::ProcessError(format!("Failed to start {}: {e}", self.config.kind))
            })?;

        // Drain both pipes on helper threads so a chatty solver never blocks
        // on a full pipe while we are still writing or polling.
        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        {
            let mut stdin = child.stdin.take().ok_or_else(|| {
                SolverError::ProcessError("Failed to open solver stdin".to_string())
            })?;
            stdin.write_all(smtlib.as_bytes()).map_err(|e| {
                SolverError::ProcessError(format!("Failed to write to solver stdin: {e}"))
            })?;
        }

        let timed_out = wait_with_deadline(&mut child, self.config.wall_clock_limit())?;

        let stdout = join_reader(stdout_reader);
        let stderr = join_reader(stderr_reader);
        tracing::debug!(
            solver = %self.config.kind,
            elapsed_ms = started.elapsed().as_millis() as u64,
            timed_out,
            "solver finished"
        );

        if timed_out {
            return Ok(SolverResult::Unknown("timeout".to_string()));
        }
        if stderr.contains("timeout") || stdout.trim() == "timeout" {
            return Ok(SolverResult::Unknown("timeout".to_string()));
        }

        parse_solver_output(&stdout, &stderr)
    }
}

/// Render a script as a complete query: produce-models option, the
/// script's own commands, then whichever of check-sat and get-model the
/// script lacks.
pub fn render_query(script: &Script) -> String {
    let mut out = String::new();
    out.push_str(&SmtCmd::SetOption("produce-models".into(), "true".into()).to_string());
    out.push('\n');
    out.push_str(&script.to_string());
    out.push('\n');
    if !script.has_check_sat() {
        out.push_str("(check-sat)\n");
    }
    if !script.has_get_model() {
        out.push_str("(get-model)\n");
    }
    out
}

type Reader = thread::JoinHandle<String>;

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> Option<Reader> {
    source.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            // A read error just truncates the captured output.
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join_reader(reader: Option<Reader>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// Wait for `child` to exit. Returns `true` if it had to be killed because
/// `limit` elapsed first.
fn wait_with_deadline(child: &mut Child, limit: Option<Duration>) -> Result<bool, SolverError> {
    let wait_err = |e: std::io::Error| SolverError::ProcessError(format!("Failed to wait for solver: {e}"));

    let Some(limit) = limit else {
        child.wait().map_err(wait_err)?;
        return Ok(false);
    };

    let deadline = Instant::now() + limit;
    loop {
        if child.try_wait().map_err(wait_err)?.is_some() {
            return Ok(false);
        }
        if Instant::now() >= deadline {
            tracing::warn!(limit_ms = limit.as_millis() as u64, "solver exceeded wall-clock limit, killing");
            // The process may have exited between try_wait and kill.
            let _ = child.kill();
            child.wait().map_err(wait_err)?;
            return Ok(true);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoare_fv_smtlib::sort::Sort;
    use hoare_fv_smtlib::term::Term;
    use std::path::PathBuf;

    #[test]
    fn render_query_appends_check_sat_and_get_model() {
        let mut script = Script::new();
        script.push(SmtCmd::DeclareConst("x".into(), Sort::Int));
        script.push(SmtCmd::Assert(Term::IntGt(
            Box::new(Term::constant("x")),
            Box::new(Term::int(0)),
        )));
        let text = render_query(&script);
        assert!(text.starts_with("(set-option :produce-models true)\n"));
        assert!(text.contains("(assert (> x 0))"));
        assert!(text.ends_with("(check-sat)\n(get-model)\n"));
    }

    #[test]
    fn render_query_asks_for_model_after_existing_check_sat() {
        let script = Script::with_commands(vec![SmtCmd::CheckSat]);
        let text = render_query(&script);
        assert_eq!(text.matches("(check-sat)").count(), 1);
        assert!(text.ends_with("(check-sat)\n(get-model)\n"), "{text}");
    }

    #[test]
    fn render_query_keeps_single_get_model() {
        let script = Script::with_commands(vec![SmtCmd::CheckSat, SmtCmd::GetModel]);
        let text = render_query(&script);
        assert_eq!(text.matches("(get-model)").count(), 1);
    }

    #[test]
    fn missing_binary_is_not_found() {
        let solver = CliSolver::new(SolverConfig::new(
            SolverKind::Z3,
            PathBuf::from("/nonexistent/z3"),
        ));
        let err = solver.check_sat(&Script::new()).unwrap_err();
        assert!(matches!(err, SolverError::NotFound(SolverKind::Z3, _)));
    }

    #[cfg(unix)]
    #[test]
    fn runaway_process_is_killed_at_deadline() {
        let Ok(mut child) = Command::new("sleep").arg("30").spawn() else {
            return;
        };
        let started = Instant::now();
        let killed = wait_with_deadline(&mut child, Some(Duration::from_millis(50))).unwrap();
        assert!(killed);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn fast_process_is_not_killed() {
        let Ok(mut child) = Command::new("true").spawn() else {
            return;
        };
        let killed = wait_with_deadline(&mut child, Some(Duration::from_secs(10))).unwrap();
        assert!(!killed);
    }
}
