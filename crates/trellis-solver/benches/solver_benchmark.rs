//! Solver benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use trellis_solver::{Constrain, Constraint, Expression, SimplexSolver, SolverConfig, Variable};

const VARIABLES: usize = 500;
const CANDIDATES: usize = 1000;
const TARGET: usize = 500;

struct XorShift(u64);

impl XorShift {
    fn next_f64(&mut self) -> f64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn grained(&mut self) -> f64 {
        (self.next_f64() / 1e-4).floor() * 1e-4
    }
}

/// Random sparse constraints: mostly equalities, about one in eight `<= 0`.
fn random_constraints(rng: &mut XorShift) -> Vec<Constraint> {
    let vars: Vec<Variable> = (0..VARIABLES).map(|_| Variable::external()).collect();
    (0..CANDIDATES)
        .map(|_| {
            let mut expr = Expression::from_constant(rng.grained() * 20.0 - 10.0);
            let count = (rng.next_f64() * 3.0) as usize + 1;
            for _ in 0..count {
                let var = vars[(rng.next_f64() * (VARIABLES - 1) as f64) as usize];
                expr += var * (rng.grained() * 10.0 - 5.0);
            }
            if rng.next_f64() < 0.12 {
                expr.less_or_equal(0.0)
            } else {
                expr.equal_to(0.0)
            }
        })
        .collect()
}

fn fill(solver: &mut SimplexSolver, constraints: &[Constraint]) -> Vec<Constraint> {
    let mut added = Vec::with_capacity(TARGET);
    for c in constraints {
        if added.len() == TARGET {
            break;
        }
        if solver.add(c).is_ok() {
            added.push(c.clone());
        }
    }
    added
}

fn auto_solver() -> SimplexSolver {
    SimplexSolver::with_config(SolverConfig::default().with_auto_solve(true))
}

fn add_constraints(c: &mut Criterion) {
    let constraints = random_constraints(&mut XorShift(0x2545_F491_4F6C_DD1D));
    c.bench_function("add_constraints", |b| {
        b.iter(|| {
            let mut solver = auto_solver();
            fill(&mut solver, black_box(&constraints))
        })
    });
}

fn update_constants(c: &mut Criterion) {
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
    let constraints = random_constraints(&mut rng);
    let mut solver = auto_solver();
    let added = fill(&mut solver, &constraints);

    c.bench_function("update_constants", |b| {
        b.iter_batched(
            || (solver.clone(), added.clone()),
            |(mut solver, mut added)| {
                for constraint in &mut added {
                    // an edit can leave the required set infeasible; keep going
                    let value = black_box(rng.grained() * 20.0 - 10.0);
                    let _ = solver.update_constant(constraint, value);
                }
                solver
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, add_constraints, update_constants);
criterion_main!(benches);
