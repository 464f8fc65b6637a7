use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::SolverError;

/// Extra time granted past the solver's own timeout before the process is killed.
const KILL_GRACE: Duration = Duration::from_millis(1500);

/// Supported SMT solver backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverKind {
    /// Z3 from Microsoft Research.
    Z3,
    /// CVC5 from Stanford/Iowa.
    Cvc5,
    /// Yices2 from SRI International.
    Yices,
}

impl SolverKind {
    /// Binary name used for PATH lookup.
    pub fn binary_name(&self) -> &'static str {
        match self {
            SolverKind::Z3 => "z3",
            SolverKind::Cvc5 => "cvc5",
            SolverKind::Yices => "yices-smt2",
        }
    }

    /// Install locations searched after `PATH`.
    fn common_paths(&self) -> [String; 3] {
        ["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"]
            .map(|prefix| format!("{prefix}/{}", self.binary_name()))
    }

    /// Arguments that make the solver read SMT-LIB2 from stdin.
    pub fn stdin_args(&self) -> Vec<String> {
        let args: &[&str] = match self {
            SolverKind::Z3 => &["-in"],
            SolverKind::Cvc5 => &["--lang", "smt2", "--produce-models"],
            SolverKind::Yices => &[],
        };
        args.iter().map(|a| a.to_string()).collect()
    }

    /// Solver-specific timeout argument, if supported.
    pub fn timeout_arg(&self, timeout_ms: u64) -> Option<String> {
        if timeout_ms == 0 {
            return None;
        }
        match self {
            SolverKind::Z3 => Some(format!("-t:{timeout_ms}")),
            SolverKind::Cvc5 => Some(format!("--tlimit={timeout_ms}")),
            SolverKind::Yices => Some(format!("--timeout={}", timeout_ms.div_ceil(1000))),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Z3 => f.write_str("Z3"),
            SolverKind::Cvc5 => f.write_str("CVC5"),
            SolverKind::Yices => f.write_str("Yices"),
        }
    }
}

impl std::str::FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "z3" => Ok(SolverKind::Z3),
            "cvc5" => Ok(SolverKind::Cvc5),
            "yices" | "yices2" | "yices-smt2" => Ok(SolverKind::Yices),
            _ => Err(format!(
                "Unknown solver: {s}. Valid options: z3, cvc5, yices"
            )),
        }
    }
}

/// Solver configuration.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Which solver to use.
    pub kind: SolverKind,
    /// Path to the solver binary.
    pub solver_path: PathBuf,
    /// Timeout in milliseconds (0 = no timeout).
    pub timeout_ms: u64,
    /// Additional solver arguments.
    pub extra_args: Vec<String>,
}

impl SolverConfig {
    pub fn new(kind: SolverKind, solver_path: PathBuf) -> Self {
        Self {
            kind,
            solver_path,
            timeout_ms: 0,
            extra_args: Vec::new(),
        }
    }

    /// Set the per-query timeout (in milliseconds).
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Locate the solver binary for `kind`: every `PATH` entry first, then
    /// the usual install prefixes.
    pub fn auto_detect_for(kind: SolverKind) -> Result<Self, SolverError> {
        let binary = kind.binary_name();
        let on_path: Vec<PathBuf> = std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).map(|dir| dir.join(binary)).collect())
            .unwrap_or_else(Vec::new);

        on_path
            .into_iter()
            .chain(kind.common_paths().into_iter().map(PathBuf::from))
            .find(|candidate| candidate.is_file())
            .map(|path| Self::new(kind, path))
            .ok_or_else(|| SolverError::NotFound(kind, PathBuf::from(binary)))
    }

    /// Full argument list for one solver invocation.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.kind.stdin_args();
        if let Some(timeout_arg) = self.kind.timeout_arg(self.timeout_ms) {
            args.push(timeout_arg);
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Wall-clock limit after which a still-running solver process is killed.
    pub fn wall_clock_limit(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms) + KILL_GRACE)
    }

    /// Validate that the configured solver binary exists.
    pub fn validate(&self) -> Result<(), SolverError> {
        if !self.solver_path.exists() {
            return Err(SolverError::NotFound(self.kind, self.solver_path.clone()));
        }
        Ok(())
    }
}
