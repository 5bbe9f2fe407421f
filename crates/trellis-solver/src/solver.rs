//! Incremental Cassowary solver.
//!
//! [`SimplexSolver`] tracks which auxiliary variables represent each added
//! constraint and drives the [`Tableau`] through insertion, removal and
//! constant/strength edits without re-solving from scratch.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::debug;
use trellis_core::{
    near_zero, Constraint, ConstraintId, Expression, SolverError, Strength, Variable,
};

use crate::config::SolverConfig;
use crate::tableau::{Goal, Tableau};

/// Bookkeeping for one tracked constraint.
#[derive(Debug, Clone)]
struct ConstraintRecord {
    /// The solver's own copy; its constant and strength are authoritative.
    constraint: Constraint,
    /// The slack, dummy or error variable that stands for the constraint.
    marker: Variable,
    /// Error variables penalized in the objective, empty when required.
    errors: SmallVec<[Variable; 2]>,
}

/// Outcome of direct insertion.
enum Insertion {
    Inserted,
    NeedsArtificial(Expression),
}

/// Outcome of the artificial-variable phase.
enum Phase1 {
    Feasible,
    /// The row that blocked the constraint.
    Infeasible(Expression),
}

/// The Cassowary constraint solver.
#[derive(Debug, Clone, Default)]
pub struct SimplexSolver {
    config: SolverConfig,
    tableau: Tableau,
    records: IndexMap<ConstraintId, ConstraintRecord>,
    /// Marker variable back to the constraint it represents.
    markers: HashMap<Variable, ConstraintId>,
}

impl SimplexSolver {
    /// Create a solver with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn set_auto_solve(&mut self, auto_solve: bool) {
        self.config.auto_solve = auto_solve;
    }

    pub fn set_explain_failure(&mut self, explain_failure: bool) {
        self.config.explain_failure = explain_failure;
    }

    pub fn has_constraint(&self, constraint: &Constraint) -> bool {
        self.records.contains_key(&constraint.id())
    }

    pub fn constraint_count(&self) -> usize {
        self.records.len()
    }

    /// Add a constraint to the solver.
    ///
    /// A required constraint that conflicts with the required constraints
    /// already present is rolled back and reported as
    /// [`SolverError::RequiredFailure`].
    pub fn add(&mut self, constraint: &Constraint) -> Result<(), SolverError> {
        let id = constraint.id();
        if self.records.contains_key(&id) {
            return Err(SolverError::DuplicateConstraint(id));
        }

        let expr = self.expression_for(constraint);
        match self.try_to_add(id, expr) {
            Insertion::Inserted => debug!(constraint = %id, "added directly"),
            Insertion::NeedsArtificial(expr) => match self.add_with_artificial_variable(expr) {
                Ok(Phase1::Feasible) => {
                    debug!(constraint = %id, "added through artificial variable")
                }
                Ok(Phase1::Infeasible(row)) => {
                    let explanation = if self.config.explain_failure {
                        self.build_explanation(id, &row)
                    } else {
                        Vec::new()
                    };
                    self.remove_record(id)?;
                    debug!(
                        constraint = %id,
                        implicated = explanation.len(),
                        "required constraint rejected"
                    );
                    if self.config.auto_solve {
                        self.solve()?;
                    }
                    return Err(SolverError::RequiredFailure { explanation });
                }
                Err(err) => {
                    self.remove_record(id)?;
                    return Err(err);
                }
            },
        }

        if self.config.auto_solve {
            self.solve()?;
        }
        Ok(())
    }

    /// Remove a tracked constraint.
    pub fn remove(&mut self, constraint: &Constraint) -> Result<(), SolverError> {
        self.remove_record(constraint.id())?;
        if self.config.auto_solve {
            self.solve()?;
        }
        Ok(())
    }

    /// Move the right-hand constant of a tracked constraint to `value`.
    ///
    /// Feasibility is restored with the dual simplex, so the objective stays
    /// optimal without a call to [`SimplexSolver::solve`]. The caller's copy
    /// of the constraint is updated as well.
    pub fn update_constant(
        &mut self,
        constraint: &mut Constraint,
        value: f64,
    ) -> Result<(), SolverError> {
        let id = constraint.id();
        let record = self
            .records
            .get_mut(&id)
            .ok_or(SolverError::ConstraintNotFound(id))?;

        // `<=` stores its constant with the opposite sign; going through the
        // normalized expression keeps one rule for every relation.
        let delta =
            record.constraint.stored_constant(value) - record.constraint.expression().constant;
        if near_zero(delta) {
            return Ok(());
        }

        record.constraint.set_constant(value);
        let marker = record.marker;
        constraint.set_constant(value);

        debug!(constraint = %id, value, delta, "update constant");
        self.tableau.shift_marker(marker, delta);
        let resolved = self.tableau.dual_optimize(self.config.max_iterations);
        self.tableau.clear_infeasible();
        resolved
    }

    /// Change the strength of a tracked non-required constraint.
    ///
    /// Strength only reaches the objective, never feasibility. Moving a
    /// constraint to or from [`Strength::REQUIRED`] is rejected.
    pub fn update_strength(
        &mut self,
        constraint: &mut Constraint,
        strength: Strength,
    ) -> Result<(), SolverError> {
        let id = constraint.id();
        let record = self
            .records
            .get_mut(&id)
            .ok_or(SolverError::ConstraintNotFound(id))?;

        let old = record.constraint.strength();
        if old == strength {
            constraint.set_strength(strength);
            return Ok(());
        }
        if old.is_required() || strength.is_required() {
            return Err(SolverError::RequiredStrength(id));
        }

        record.constraint.set_strength(strength);
        let errors = record.errors.clone();
        constraint.set_strength(strength);

        let delta = strength.value() - old.value();
        debug!(constraint = %id, from = %old, to = %strength, "update strength");
        for error in errors {
            self.tableau.add_to_objective(error, delta);
        }

        if self.config.auto_solve {
            self.solve()?;
        }
        Ok(())
    }

    /// Minimize the weighted error objective.
    pub fn solve(&mut self) -> Result<(), SolverError> {
        self.tableau.optimize(Goal::Objective, self.config.max_iterations)
    }

    /// The current value of a variable, zero if it never became basic.
    pub fn value_for(&self, variable: Variable) -> f64 {
        self.tableau.value_for(variable)
    }

    /// Build the tableau form of a new constraint and record its markers.
    fn expression_for(&mut self, constraint: &Constraint) -> Expression {
        let source = constraint.expression();
        let mut expr = Expression::from_constant(source.constant);
        for (variable, coeff) in source.terms() {
            self.tableau.expand_into(&mut expr, variable, coeff);
        }

        let weight = constraint.weight();
        let mut errors = SmallVec::new();
        let marker = if constraint.is_inequality() {
            // expr >= 0 becomes expr - slack = 0 with slack >= 0
            let slack = Variable::slack();
            expr.add_term(slack, -1.0);
            if !constraint.is_required() {
                let error = Variable::error();
                expr.add_term(error, 1.0);
                self.tableau.add_to_objective(error, weight);
                errors.push(error);
            }
            slack
        } else if constraint.is_required() {
            let dummy = Variable::dummy();
            expr.add_term(dummy, -1.0);
            dummy
        } else {
            let plus = Variable::error();
            let minus = Variable::error();
            expr.add_term(plus, -1.0);
            expr.add_term(minus, 1.0);
            self.tableau.add_to_objective(plus, weight);
            self.tableau.add_to_objective(minus, weight);
            errors.push(plus);
            errors.push(minus);
            plus
        };

        if expr.constant < 0.0 {
            expr.multiply(-1.0);
        }

        let id = constraint.id();
        self.markers.insert(marker, id);
        self.records.insert(
            id,
            ConstraintRecord {
                constraint: constraint.clone(),
                marker,
                errors,
            },
        );
        expr
    }

    /// Pivot the new row straight into the basis if it has a usable subject.
    fn try_to_add(&mut self, id: ConstraintId, mut expr: Expression) -> Insertion {
        let fresh: SmallVec<[Variable; 3]> = self
            .records
            .get(&id)
            .map(|record| {
                std::iter::once(record.marker)
                    .chain(record.errors.iter().copied())
                    .collect()
            })
            .unwrap_or_default();

        let Some(subject) = choose_subject(&expr, &fresh) else {
            return Insertion::NeedsArtificial(expr);
        };

        expr.solve_for(subject);
        self.tableau.substitute_out(subject, &expr);
        self.tableau.add_row(subject, expr);
        Insertion::Inserted
    }

    /// Phase 1: minimize a fresh artificial variable standing for `expr`.
    fn add_with_artificial_variable(&mut self, expr: Expression) -> Result<Phase1, SolverError> {
        let av = Variable::slack();
        self.tableau.begin_artificial(av, expr);

        let optimized = self.tableau.optimize(Goal::Artificial, self.config.max_iterations);
        let residual = self.tableau.end_artificial().map_or(0.0, |artificial| artificial.constant);
        if let Err(err) = optimized {
            self.tableau.remove_row(av);
            self.tableau.remove_column(av);
            return Err(err);
        }

        if !near_zero(residual) {
            let row = self.tableau.remove_row(av).unwrap_or_default();
            self.tableau.remove_column(av);
            return Ok(Phase1::Infeasible(row));
        }

        if let Some(mut row) = self.tableau.remove_row(av) {
            if !row.is_constant() {
                let Some(entry) = row.pivotable_variable() else {
                    self.tableau.remove_column(av);
                    return Ok(Phase1::Infeasible(row));
                };
                row.change_subject(av, entry);
                self.tableau.substitute_out(entry, &row);
                self.tableau.add_row(entry, row);
            }
        }

        // av is pinned at zero from here on
        self.tableau.remove_column(av);
        Ok(Phase1::Feasible)
    }

    /// The rejected constraint followed by every constraint whose marker
    /// appears in the blocking row.
    fn build_explanation(&self, id: ConstraintId, row: &Expression) -> Vec<Constraint> {
        let mut ids = vec![id];
        for variable in row.variables() {
            if let Some(&marked) = self.markers.get(&variable) {
                if !ids.contains(&marked) {
                    ids.push(marked);
                }
            }
        }

        ids.iter()
            .filter_map(|id| self.records.get(id))
            .map(|record| record.constraint.clone())
            .collect()
    }

    /// Take a constraint's rows, columns and objective terms out of the
    /// tableau and forget it.
    fn remove_record(&mut self, id: ConstraintId) -> Result<(), SolverError> {
        let record = self
            .records
            .shift_remove(&id)
            .ok_or(SolverError::ConstraintNotFound(id))?;
        self.markers.remove(&record.marker);

        let weight = record.constraint.weight();
        for &error in &record.errors {
            self.tableau.add_to_objective(error, -weight);
        }

        let marker = record.marker;
        if !self.tableau.is_basic(marker) {
            if let Some(exit) = self.tableau.find_exit_var(marker) {
                self.tableau.pivot(marker, exit)?;
            }
        }
        if self.tableau.remove_row(marker).is_none() {
            self.tableau.remove_column(marker);
        }

        for &error in record.errors.iter().filter(|&&error| error != marker) {
            if self.tableau.remove_row(error).is_none() {
                self.tableau.remove_column(error);
            }
        }

        debug!(constraint = %id, marker = %marker, "removed");
        Ok(())
    }
}

/// An external variable if there is one, otherwise one of the constraint's
/// own slack or error variables with a negative coefficient.
///
/// Fresh variables appear in no other row, so making one basic can not push
/// another restricted row negative.
fn choose_subject(expr: &Expression, fresh: &[Variable]) -> Option<Variable> {
    if let Some(external) = expr.variables().find(Variable::is_external) {
        return Some(external);
    }
    fresh
        .iter()
        .copied()
        .find(|&variable| variable.is_pivotable() && expr.coefficient(variable) < 0.0)
}

impl fmt::Display for SimplexSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} constraints, {} rows",
            self.records.len(),
            self.tableau.row_count()
        )?;
        write!(f, "{}", self.tableau)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::Constrain;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn auto_solver() -> SimplexSolver {
        SimplexSolver::with_config(SolverConfig::default().with_auto_solve(true))
    }

    #[test]
    fn test_equal_variables() {
        let mut solver = auto_solver();
        let v1 = Variable::external();
        let v2 = Variable::external();
        solver.add(&v1.equal_to(v2)).unwrap();
        solver.add(&v1.equal_to(100.0)).unwrap();

        assert!(approx(solver.value_for(v1), 100.0));
        assert!(approx(solver.value_for(v2), 100.0));
    }

    #[test]
    fn test_required_equality_uses_dummy_marker() {
        let mut solver = SimplexSolver::new();
        let x = Variable::external();
        let c = x.equal_to(10.0);
        solver.add(&c).unwrap();

        let record = &solver.records[&c.id()];
        assert!(record.marker.is_dummy());
        assert!(record.errors.is_empty());
        assert!(solver.tableau.is_basic(x));
    }

    #[test]
    fn test_soft_equality_uses_two_error_variables() {
        let mut solver = SimplexSolver::new();
        let x = Variable::external();
        let c = x.equal_to(10.0).with_strength(Strength::WEAK);
        solver.add(&c).unwrap();

        let record = &solver.records[&c.id()];
        assert!(record.marker.is_error());
        assert_eq!(record.errors.len(), 2);
        assert_eq!(solver.markers.get(&record.marker), Some(&c.id()));
    }

    #[test]
    fn test_rows_stay_reduced() {
        let mut solver = auto_solver();
        let x = Variable::external();
        let y = Variable::external();
        let z = Variable::external();
        solver.add(&x.equal_to(y + 5.0)).unwrap();
        solver.add(&y.equal_to(z * 2.0)).unwrap();
        solver.add(&z.greater_or_equal(3.0)).unwrap();
        solver.add(&x.less_or_equal(40.0).with_strength(Strength::WEAK)).unwrap();

        let basics: Vec<Variable> = [x, y, z]
            .into_iter()
            .filter(|&v| solver.tableau.is_basic(v))
            .collect();
        for &basic in &basics {
            let row = solver.tableau.row(basic).unwrap();
            for &other in &basics {
                assert!(!row.contains(other));
                assert!(!solver.tableau.objective().contains(other));
            }
        }
    }

    #[test]
    fn test_choose_subject_prefers_external() {
        let x = Variable::external();
        let s = Variable::slack();
        let expr = x * 2.0 - s + 3.0;
        assert_eq!(choose_subject(&expr, &[s]), Some(x));
    }

    #[test]
    fn test_choose_subject_ignores_stale_pivotable() {
        let stale = Variable::slack();
        let fresh = Variable::slack();
        let expr = stale * -1.0 + fresh + 3.0;
        assert_eq!(choose_subject(&expr, &[fresh]), None);

        let expr = stale * -1.0 - fresh + 3.0;
        assert_eq!(choose_subject(&expr, &[fresh]), Some(fresh));
    }

    #[test]
    fn test_display_lists_rows() {
        let mut solver = SimplexSolver::new();
        let x = Variable::external();
        solver.add(&x.equal_to(3.0)).unwrap();
        let dump = solver.to_string();
        assert!(dump.starts_with("1 constraints, 1 rows"));
        assert!(dump.contains(&format!("{x} = ")));
    }
}
