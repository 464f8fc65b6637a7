//! Benchmarks for WP computation, simplification and encoding.
//!
//! Benchmark groups:
//! - `wp_*`: WP + simplification only
//! - `encode_*`: VC generation plus SMT encoding, no solver involved
//! - `e2e_*`: full pipeline against Z3 (skipped when Z3 is missing)

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use hoare_fv_analysis::ir::{CmpOp, Expr, Function, LValue, Module, Param, Predicate, Statement};
use hoare_fv_analysis::{SolverSession, build_vc, encode_vc, wp};
use hoare_fv_solver::CliSolver;

// ---------------------------------------------------------------------------
// Program constructors
// ---------------------------------------------------------------------------

fn v(n: &str) -> Expr {
    Expr::var(n)
}

fn set(name: &str, e: Expr) -> Statement {
    Statement::assign(LValue::var(name), e)
}

/// A counting loop whose body is `width` consecutive updates, nested
/// `depth` times.
fn make_loop_program(width: usize, depth: usize) -> Function {
    let mut body = Statement::block(
        (0..width)
            .map(|k| set("s", Expr::add(v("s"), Expr::int(k as i64))))
            .chain([set("i", Expr::add(v("i"), Expr::int(1)))])
            .collect(),
    );
    for _ in 0..depth {
        body = Statement::block(vec![
            Statement::if_then(
                Predicate::compare(CmpOp::Gt, v("s"), v("n")),
                set("s", Expr::sub(v("s"), v("n"))),
                None,
            ),
            Statement::while_loop(
                Predicate::compare(CmpOp::Lt, v("i"), v("n")),
                Some(Predicate::compare(CmpOp::Le, v("i"), v("n"))),
                body,
            ),
        ]);
    }
    Function {
        name: "bench".into(),
        params: vec![Param::int("n")],
        returns: vec![Param::int("s")],
        locals: vec![Param::int("i")],
        body: Statement::block(vec![set("s", Expr::int(0)), set("i", Expr::int(0)), body]),
        pre: Some(Predicate::compare(CmpOp::Ge, v("n"), Expr::int(0))),
        post: Some(Predicate::compare(CmpOp::Ge, v("i"), v("n"))),
    }
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_wp_small_loop(c: &mut Criterion) {
    let func = make_loop_program(4, 1);
    let post = func.post.clone().unwrap_or(Predicate::TRUE);
    c.bench_function("wp_small_loop", |b| {
        b.iter(|| wp(black_box(&func.body), black_box(&post)))
    });
}

fn bench_wp_nested_loops(c: &mut Criterion) {
    let func = make_loop_program(16, 4);
    let post = func.post.clone().unwrap_or(Predicate::TRUE);
    c.bench_function("wp_nested_loops", |b| {
        b.iter(|| wp(black_box(&func.body), black_box(&post)))
    });
}

fn bench_encode_nested_loops(c: &mut Criterion) {
    let func = make_loop_program(16, 4);
    let module = Module {
        functions: vec![func.clone()],
        formulas: vec![],
    };
    c.bench_function("encode_nested_loops", |b| {
        b.iter(|| {
            let mut session = SolverSession::new();
            if let Ok(Some(vc)) = build_vc(&func) {
                let _ = encode_vc(&mut session, &module, &func, &vc);
            }
        })
    });
}

fn bench_e2e_small_loop(c: &mut Criterion) {
    let solver = match CliSolver::with_default_config() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Z3 not available, skipping E2E bench: {e}");
            return;
        }
    };
    let func = make_loop_program(4, 1);
    let module = Module {
        functions: vec![func.clone()],
        formulas: vec![],
    };
    c.bench_function("e2e_small_loop", |b| {
        b.iter(|| {
            let mut session = SolverSession::new();
            if let Ok(Some(vc)) = build_vc(&func)
                && let Ok(encoded) = encode_vc(&mut session, &module, &func, &vc)
            {
                let _ = solver.check_sat(&encoded.script);
            }
        })
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(wp_benches, bench_wp_small_loop, bench_wp_nested_loops);

criterion_group!(encode_benches, bench_encode_nested_loops);

criterion_group!(e2e_benches, bench_e2e_small_loop);

criterion_main!(wp_benches, encode_benches, e2e_benches);
