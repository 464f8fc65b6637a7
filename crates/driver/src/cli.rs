/// `hoare-fv` command-line front end.
///
/// ```text
/// hoare-fv [OPTIONS] <MODULE.json>
/// ```
///
/// Reads a module, checks every function, prints the results and returns
/// the process exit code: `0` when every function verified, `1` when any
/// failed, was inconclusive or hit an error, `2` on usage, input or
/// solver-setup errors.
use std::path::{Path, PathBuf};

use colored::Colorize;

use hoare_fv_analysis::{Module, parse_module};
use hoare_fv_solver::{SolverBackend, SolverKind, create_backend};

use crate::error::DriverError;
use crate::json_output::{JsonVerificationReport, print_json_report};
use crate::options::{DEFAULT_TIMEOUT_SECS, OutputFormat, VerifyOptions};
use crate::output;
use crate::pipeline::Pipeline;
use crate::types::RunReport;

/// Environment variable selecting the solver when `--solver` is absent.
pub const SOLVER_ENV: &str = "HOARE_FV_SOLVER";

/// What the command line asks for.
#[derive(Debug)]
pub enum CliCommand {
    Help,
    Version,
    Verify { input: PathBuf, options: VerifyOptions },
}

/// Run the command line and return the exit code.
pub fn run(args: &[String]) -> i32 {
    let env_solver = std::env::var(SOLVER_ENV).ok();
    let command = match parse_args(args, env_solver.as_deref()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            eprintln!("Run with --help for usage.");
            return 2;
        }
    };

    let (input, options) = match command {
        CliCommand::Help => {
            print_usage();
            return 0;
        }
        CliCommand::Version => {
            eprintln!("hoare-fv {}", env!("CARGO_PKG_VERSION"));
            return 0;
        }
        CliCommand::Verify { input, options } => (input, options),
    };

    let report = load_module(&input).and_then(|module| {
        let backend = create_backend(options.solver, options.timeout_ms)?;
        if options.output_format == OutputFormat::Text {
            output::print_header(&module_name(&input), &backend.name());
        }
        verify_module(&module, &module_name(&input), backend.as_ref(), &options)
    });

    match report {
        Ok(report) => {
            match options.output_format {
                OutputFormat::Text => output::print_verification_results(&report, options.verbose),
                OutputFormat::Json => print_json_report(&JsonVerificationReport::from(&report)),
            }
            if report.all_verified() { 0 } else { 1 }
        }
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            2
        }
    }
}

/// Read and deserialize a module file.
pub fn load_module(path: &Path) -> Result<Module, DriverError> {
    let text = std::fs::read_to_string(path).map_err(|source| DriverError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_module(&text)?)
}

/// Check every function of `module` with the given backend.
pub fn verify_module(
    module: &Module,
    name: &str,
    backend: &dyn SolverBackend,
    options: &VerifyOptions,
) -> Result<RunReport, DriverError> {
    Pipeline::new(module, backend, options).run(name)
}

/// Module name shown in reports: the input file stem.
pub fn module_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "module".to_string())
}

/// Whether `--verbose`/`-v` was given; read before logging is set up.
pub fn wants_verbose(args: &[String]) -> bool {
    args.iter().any(|a| a == "--verbose" || a == "-v")
}

/// Parse arguments (without the program name).
///
/// Value flags accept both `--flag value` and `--flag=value`. `env_solver`
/// is consulted when `--solver` is absent.
pub fn parse_args(args: &[String], env_solver: Option<&str>) -> Result<CliCommand, DriverError> {
    let mut options = VerifyOptions::default();
    let mut input = None;
    let mut solver_flag = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if arg.starts_with("--") => (flag, Some(value.to_string())),
            _ => (arg.as_str(), None),
        };
        let mut value = |name: &str| -> Result<String, DriverError> {
            inline
                .clone()
                .or_else(|| iter.next().cloned())
                .ok_or_else(|| DriverError::Usage(format!("{name} requires a value")))
        };
        match flag {
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--verbose" | "-v" => options.verbose = true,
            "--close-loops" => options.wp.close_loop_obligations = true,
            "--timeout" => {
                let secs: u64 = parse_number("--timeout", &value("--timeout")?)?;
                options.timeout_ms = secs.saturating_mul(1000);
            }
            "--jobs" | "-j" => {
                let jobs: usize = parse_number("--jobs", &value("--jobs")?)?;
                if jobs == 0 {
                    return Err(DriverError::Usage("--jobs must be at least 1".into()));
                }
                options.jobs = jobs;
            }
            "--solver" => solver_flag = Some(value("--solver")?),
            "--output-format" => {
                options.output_format = value("--output-format")?
                    .parse()
                    .map_err(DriverError::Usage)?;
            }
            "--dump-smt" => options.dump_smt = Some(PathBuf::from(value("--dump-smt")?)),
            other if other.starts_with('-') => {
                return Err(DriverError::Usage(format!("unknown option '{other}'")));
            }
            path => {
                if input.replace(PathBuf::from(path)).is_some() {
                    return Err(DriverError::Usage("expected exactly one input file".into()));
                }
            }
        }
    }

    if let Some(name) = solver_flag.as_deref().or(env_solver) {
        options.solver = name.parse::<SolverKind>().map_err(DriverError::Usage)?;
    }

    let input = input.ok_or_else(|| DriverError::Usage("missing input file".into()))?;
    Ok(CliCommand::Verify { input, options })
}

fn parse_number<T: std::str::FromStr>(flag: &str, text: &str) -> Result<T, DriverError> {
    text.parse()
        .map_err(|_| DriverError::Usage(format!("{flag}: '{text}' is not a valid number")))
}

/// Print usage information.
fn print_usage() {
    eprintln!("hoare-fv: weakest-precondition verifier for annotated modules");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    hoare-fv [OPTIONS] <MODULE.json>");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!(
        "    --timeout <SECONDS>         Solver timeout per function, 0 for none (default: {DEFAULT_TIMEOUT_SECS})"
    );
    eprintln!("    --solver <NAME>             z3, cvc5 or yices (default: ${SOLVER_ENV} or z3)");
    eprintln!("    --jobs, -j <N>              Functions checked in parallel (default: 1)");
    eprintln!("    --output-format <FORMAT>    Output format: text or json (default: text)");
    eprintln!("    --close-loops               Quantify loop obligations over loop-assigned variables");
    eprintln!("                                (without it loop proofs only cover the entry state and are unsound)");
    eprintln!("    --dump-smt <DIR>            Write each function's SMT-LIB query to DIR/<function>.smt2");
    eprintln!("    --verbose, -v               Show timings and info-level logs");
    eprintln!("    --version, -V               Print version information");
    eprintln!("    --help, -h                  Print this help");
    eprintln!();
    eprintln!("EXIT STATUS:");
    eprintln!("    0  every function verified");
    eprintln!("    1  a function failed, was inconclusive or could not be checked");
    eprintln!("    2  usage, input or solver setup error");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn verify(list: &[&str], env: Option<&str>) -> (PathBuf, VerifyOptions) {
        match parse_args(&args(list), env).unwrap() {
            CliCommand::Verify { input, options } => (input, options),
            other => panic!("expected verify, got {other:?}"),
        }
    }

    #[test]
    fn defaults() {
        let (input, options) = verify(&["m.json"], None);
        assert_eq!(input, PathBuf::from("m.json"));
        assert_eq!(options.timeout_ms, 30_000);
        assert_eq!(options.solver, SolverKind::Z3);
        assert_eq!(options.output_format, OutputFormat::Text);
        assert!(options.dump_smt.is_none());
    }

    #[test]
    fn value_flags_accept_both_spellings() {
        let (_, a) = verify(&["--timeout", "5", "--jobs=3", "m.json"], None);
        assert_eq!(a.timeout_ms, 5_000);
        assert_eq!(a.jobs, 3);
        let (_, b) = verify(&["m.json", "--timeout=0", "--output-format", "json"], None);
        assert_eq!(b.timeout_ms, 0);
        assert_eq!(b.output_format, OutputFormat::Json);
    }

    #[test]
    fn solver_flag_beats_environment() {
        let (_, from_env) = verify(&["m.json"], Some("cvc5"));
        assert_eq!(from_env.solver, SolverKind::Cvc5);
        let (_, from_flag) = verify(&["--solver", "yices", "m.json"], Some("cvc5"));
        assert_eq!(from_flag.solver, SolverKind::Yices);
    }

    #[test]
    fn boolean_flags() {
        let (_, options) = verify(&["-v", "--close-loops", "--dump-smt", "out", "m.json"], None);
        assert!(options.verbose);
        assert!(options.wp.close_loop_obligations);
        assert_eq!(options.dump_smt, Some(PathBuf::from("out")));
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert!(matches!(parse_args(&args(&["--bogus", "-h"]), None), Err(_)));
        assert!(matches!(parse_args(&args(&["-h"]), None), Ok(CliCommand::Help)));
        assert!(matches!(
            parse_args(&args(&["m.json", "--version"]), None),
            Ok(CliCommand::Version)
        ));
    }

    #[test]
    fn usage_errors() {
        for bad in [
            vec![],
            vec!["a.json", "b.json"],
            vec!["--timeout", "soon", "m.json"],
            vec!["--jobs", "0", "m.json"],
            vec!["--solver", "minisat", "m.json"],
            vec!["--output-format", "xml", "m.json"],
            vec!["m.json", "--timeout"],
            vec!["--frobnicate", "m.json"],
        ] {
            let result = parse_args(&args(&bad), None);
            assert!(
                matches!(result, Err(DriverError::Usage(_))),
                "{bad:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn module_name_is_file_stem() {
        assert_eq!(module_name(Path::new("/tmp/sum_to.json")), "sum_to");
    }

    #[test]
    fn verbose_detection() {
        assert!(wants_verbose(&args(&["m.json", "-v"])));
        assert!(!wants_verbose(&args(&["m.json"])));
    }
}
