//! Property-based tests for the simplex solver.

use proptest::prelude::*;
use trellis_solver::{Constrain, SimplexSolver, SolverConfig, Strength, Variable};

fn auto_solver() -> SimplexSolver {
    SimplexSolver::with_config(SolverConfig::default().with_auto_solve(true))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * (1.0 + b.abs())
}

fn strength_below_required() -> impl Strategy<Value = Strength> {
    prop_oneof![
        Just(Strength::WEAK),
        Just(Strength::MEDIUM),
        Just(Strength::STRONG),
        (1.0f64..999.0).prop_map(Strength::new),
    ]
}

proptest! {
    /// A lone required equality pins the variable to its constant
    #[test]
    fn equality_lands_on_literal(k in -1.0e6f64..1.0e6) {
        let mut solver = auto_solver();
        let x = Variable::external();
        solver.add(&x.equal_to(k)).unwrap();
        prop_assert!(close(solver.value_for(x), k));
    }

    /// Editing the constant of a bound equality tracks every target
    #[test]
    fn update_constant_tracks_targets(targets in prop::collection::vec(-1000.0f64..1000.0, 1..20)) {
        let mut solver = auto_solver();
        let x = Variable::external();
        let y = Variable::external();
        solver.add(&y.equal_to(x * 2.0)).unwrap();
        let mut anchor = x.equal_to(0.0);
        solver.add(&anchor).unwrap();

        for target in targets {
            solver.update_constant(&mut anchor, target).unwrap();
            prop_assert!(close(solver.value_for(x), target));
            prop_assert!(close(solver.value_for(y), 2.0 * target));
        }
    }

    /// A lower bound edited in place gives the same result as a fresh solve
    #[test]
    fn lower_bound_edit_matches_fresh_solve(
        initial in -100.0f64..100.0,
        edited in -100.0f64..100.0,
        preferred in -100.0f64..100.0,
    ) {
        let mut solver = auto_solver();
        let x = Variable::external();
        let mut floor = x.greater_or_equal(initial);
        solver.add(&floor).unwrap();
        solver.add(&x.equal_to(preferred).with_strength(Strength::WEAK)).unwrap();
        solver.update_constant(&mut floor, edited).unwrap();

        prop_assert!(close(solver.value_for(x), edited.max(preferred)));
    }

    /// An upper bound edited in place gives the same result as a fresh solve
    #[test]
    fn upper_bound_edit_matches_fresh_solve(
        initial in -100.0f64..100.0,
        edited in -100.0f64..100.0,
        preferred in -100.0f64..100.0,
    ) {
        let mut solver = auto_solver();
        let x = Variable::external();
        let mut ceiling = x.less_or_equal(initial);
        solver.add(&ceiling).unwrap();
        solver.add(&x.equal_to(preferred).with_strength(Strength::WEAK)).unwrap();
        solver.update_constant(&mut ceiling, edited).unwrap();

        prop_assert!(close(solver.value_for(x), edited.min(preferred)));
    }

    /// The stronger of two competing preferences wins
    #[test]
    fn stronger_preference_wins(
        a in -500.0f64..500.0,
        b in -500.0f64..500.0,
        sa in strength_below_required(),
        sb in strength_below_required(),
    ) {
        prop_assume!((sa.value() - sb.value()).abs() > 1.0);
        let mut solver = auto_solver();
        let x = Variable::external();
        solver.add(&x.equal_to(a).with_strength(sa)).unwrap();
        solver.add(&x.equal_to(b).with_strength(sb)).unwrap();

        let expected = if sa.value() > sb.value() { a } else { b };
        prop_assert!(close(solver.value_for(x), expected));
    }

    /// Removing the anchor of a required chain and re-anchoring moves the chain
    #[test]
    fn remove_and_readd_chain(
        len in 2usize..8,
        first in -100.0f64..100.0,
        second in -100.0f64..100.0,
    ) {
        let mut solver = auto_solver();
        let vars: Vec<Variable> = (0..len).map(|_| Variable::external()).collect();
        for pair in vars.windows(2) {
            solver.add(&pair[0].equal_to(pair[1] + 1.0)).unwrap();
        }
        let last = vars[len - 1];
        let anchor = last.equal_to(first);
        solver.add(&anchor).unwrap();

        solver.remove(&anchor).unwrap();
        solver.add(&last.equal_to(second)).unwrap();

        for (i, &v) in vars.iter().enumerate() {
            let expected = second + (len - 1 - i) as f64;
            prop_assert!(close(solver.value_for(v), expected));
        }
    }
}
