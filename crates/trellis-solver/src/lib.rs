//! Incremental linear constraint solving for trellis.
//!
//! This crate implements:
//! - Cassowary simplex tableau with incremental add and remove
//! - Phase 1 artificial-variable insertion for required constraints
//! - Dual simplex re-optimization after constant edits
//! - Strength (priority) changes without rebuilding the tableau
//!
//! ```
//! use trellis_solver::{Constrain, SimplexSolver, SolverConfig, Strength, Variable};
//!
//! let mut solver = SimplexSolver::with_config(SolverConfig::default().with_auto_solve(true));
//! let width = Variable::external();
//! solver.add(&width.greater_or_equal(40.0)).unwrap();
//! solver.add(&width.equal_to(120.0).with_strength(Strength::WEAK)).unwrap();
//! assert!((solver.value_for(width) - 120.0).abs() < 1e-6);
//! ```

mod config;
mod solver;
mod tableau;

pub use config::SolverConfig;
pub use solver::SimplexSolver;
pub use trellis_core::{
    near_zero, Constrain, Constraint, ConstraintId, Expression, Relation, SolverError, Strength,
    Variable, VariableKind, EPSILON,
};
