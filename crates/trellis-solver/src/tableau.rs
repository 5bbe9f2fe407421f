//! The simplex tableau.
//!
//! Rows map each basic variable to the expression defining it in terms of
//! non-basic (parametric) variables. Every structural change goes through
//! [`Tableau::pivot`] or [`Tableau::substitute_out`], which keep the rows in
//! reduced form: no basic variable ever appears as a term of any row or of
//! the objective.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::trace;
use trellis_core::{Expression, SolverError, Variable, EPSILON};

/// Which row `optimize` minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Goal {
    /// The weighted error objective (phase 2).
    Objective,
    /// The temporary objective of an artificial variable (phase 1).
    Artificial,
}

/// A restricted row is infeasible when its constant is negative beyond noise.
fn is_infeasible(constant: f64) -> bool {
    constant < -EPSILON
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Tableau {
    rows: BTreeMap<Variable, Expression>,
    objective: Expression,
    artificial: Option<Expression>,
    /// Restricted basic variables whose row constant went negative.
    infeasible: BTreeSet<Variable>,
}

impl Tableau {
    pub fn is_basic(&self, variable: Variable) -> bool {
        self.rows.contains_key(&variable)
    }

    #[cfg(test)]
    pub fn row(&self, variable: Variable) -> Option<&Expression> {
        self.rows.get(&variable)
    }

    #[cfg(test)]
    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Basic variables read their row constant, everything else is zero.
    pub fn value_for(&self, variable: Variable) -> f64 {
        self.rows.get(&variable).map_or(0.0, |row| row.constant)
    }

    pub fn add_row(&mut self, variable: Variable, expr: Expression) {
        self.rows.insert(variable, expr);
    }

    pub fn remove_row(&mut self, variable: Variable) -> Option<Expression> {
        self.infeasible.remove(&variable);
        self.rows.remove(&variable)
    }

    /// Erase `variable` from every row and objective, fixing it at zero.
    pub fn remove_column(&mut self, variable: Variable) {
        for row in self.rows.values_mut() {
            row.remove(variable);
        }
        self.objective.remove(variable);
        if let Some(artificial) = &mut self.artificial {
            artificial.remove(variable);
        }
    }

    /// Add `multiply * variable` to `target`, expanding a basic variable into
    /// its row so the result stays in parametric variables only.
    pub fn expand_into(&self, target: &mut Expression, variable: Variable, multiply: f64) {
        match self.rows.get(&variable) {
            Some(row) => target.add_expression(row, multiply),
            None => target.add_term(variable, multiply),
        }
    }

    /// Same as [`Tableau::expand_into`] with the objective as target.
    pub fn add_to_objective(&mut self, variable: Variable, multiply: f64) {
        match self.rows.get(&variable) {
            Some(row) => self.objective.add_expression(row, multiply),
            None => self.objective.add_term(variable, multiply),
        }
    }

    /// Replace `old` with `expr` in every row and objective.
    pub fn substitute_out(&mut self, old: Variable, expr: &Expression) {
        for (&basic, row) in self.rows.iter_mut() {
            if row.contains(old) {
                row.substitute_out(old, expr);
                if basic.is_restricted() && is_infeasible(row.constant) {
                    self.infeasible.insert(basic);
                }
            }
        }
        self.objective.substitute_out(old, expr);
        if let Some(artificial) = &mut self.artificial {
            artificial.substitute_out(old, expr);
        }
    }

    /// Make `entry` basic in place of `exit`.
    pub fn pivot(&mut self, entry: Variable, exit: Variable) -> Result<(), SolverError> {
        trace!(entry = %entry, exit = %exit, "pivot");
        let mut row = self
            .remove_row(exit)
            .ok_or(SolverError::Internal("pivot: leaving variable is not basic"))?;
        if !row.contains(entry) {
            self.rows.insert(exit, row);
            return Err(SolverError::Internal("pivot: entering variable is not in the leaving row"));
        }
        row.change_subject(exit, entry);
        self.substitute_out(entry, &row);
        self.rows.insert(entry, row);
        Ok(())
    }

    /// Install `row` as the definition of the artificial variable `av` and
    /// keep a copy as the phase-1 objective.
    pub fn begin_artificial(&mut self, av: Variable, row: Expression) {
        self.artificial = Some(row.clone());
        self.rows.insert(av, row);
    }

    /// Drop the phase-1 objective, returning its final form.
    pub fn end_artificial(&mut self) -> Option<Expression> {
        self.artificial.take()
    }

    fn goal_row(&self, goal: Goal) -> Result<&Expression, SolverError> {
        match goal {
            Goal::Objective => Ok(&self.objective),
            Goal::Artificial => self
                .artificial
                .as_ref()
                .ok_or(SolverError::Internal("optimize: no artificial objective")),
        }
    }

    /// Primal simplex: minimize the goal row.
    pub fn optimize(&mut self, goal: Goal, max_iterations: usize) -> Result<(), SolverError> {
        let mut pivots = 0;
        loop {
            let entry = self
                .goal_row(goal)?
                .terms()
                .find(|&(variable, coeff)| variable.is_pivotable() && coeff < 0.0)
                .map(|(variable, _)| variable);

            let Some(entry) = entry else {
                trace!(?goal, pivots, "optimal");
                return Ok(());
            };

            if pivots == max_iterations {
                return Err(SolverError::IterationLimit {
                    limit: max_iterations,
                });
            }
            let exit = self.leaving_variable(entry).ok_or(SolverError::ObjectiveUnbound)?;
            pivots += 1;
            self.pivot(entry, exit)?;
        }
    }

    /// Minimum ratio test over pivotable rows where `entry` has a negative
    /// coefficient.
    fn leaving_variable(&self, entry: Variable) -> Option<Variable> {
        let mut min_ratio = f64::MAX;
        let mut exit = None;

        for (&basic, row) in &self.rows {
            if !basic.is_pivotable() {
                continue;
            }
            let coeff = row.coefficient(entry);
            if coeff >= 0.0 {
                continue;
            }
            let ratio = -row.constant / coeff;
            if ratio < min_ratio {
                min_ratio = ratio;
                exit = Some(basic);
            }
        }

        exit
    }

    /// Mark that the marker of an edited constraint moved by `delta`.
    ///
    /// A basic marker absorbs the change in its own row. A parametric marker
    /// shifts every row that references it.
    pub fn shift_marker(&mut self, marker: Variable, delta: f64) {
        if let Some(row) = self.rows.get_mut(&marker) {
            row.constant += delta;
            if is_infeasible(row.constant) {
                self.infeasible.insert(marker);
            }
            return;
        }

        for (&basic, row) in self.rows.iter_mut() {
            let coeff = row.coefficient(marker);
            if coeff == 0.0 {
                continue;
            }
            row.constant -= coeff * delta;
            if basic.is_restricted() && is_infeasible(row.constant) {
                self.infeasible.insert(basic);
            }
        }
    }

    /// Dual simplex: restore feasibility of the marked rows while keeping the
    /// objective optimal.
    pub fn dual_optimize(&mut self, max_iterations: usize) -> Result<(), SolverError> {
        let mut pivots = 0;

        while let Some(exit) = self.infeasible.pop_first() {
            let Some(row) = self.rows.get(&exit) else {
                continue;
            };
            if !is_infeasible(row.constant) {
                continue;
            }

            let mut min_ratio = f64::MAX;
            let mut entry = None;
            for (variable, coeff) in row.terms() {
                if coeff > 0.0 && variable.is_pivotable() {
                    let ratio = self.objective.coefficient(variable) / coeff;
                    if ratio < min_ratio {
                        min_ratio = ratio;
                        entry = Some(variable);
                    }
                }
            }
            let entry = entry.ok_or(SolverError::Internal("dual optimize: no pivot found"))?;

            if pivots == max_iterations {
                return Err(SolverError::IterationLimit {
                    limit: max_iterations,
                });
            }
            pivots += 1;
            self.pivot(entry, exit)?;
        }

        trace!(pivots, "dual optimal");
        Ok(())
    }

    pub fn clear_infeasible(&mut self) {
        self.infeasible.clear();
    }

    /// Choose the row a parametric marker should pivot into before the row
    /// is dropped.
    ///
    /// Priority: the minimum ratio among restricted rows with a negative
    /// coefficient, then the minimum ratio among restricted rows with a
    /// positive coefficient, then the first external row.
    pub fn find_exit_var(&self, marker: Variable) -> Option<Variable> {
        let mut min_negative = f64::MAX;
        let mut min_positive = f64::MAX;
        let mut negative = None;
        let mut positive = None;
        let mut external = None;

        for (&basic, row) in &self.rows {
            let coeff = row.coefficient(marker);
            if coeff == 0.0 {
                continue;
            }

            if basic.is_external() {
                external.get_or_insert(basic);
            } else if coeff < 0.0 {
                let ratio = -row.constant / coeff;
                if ratio < min_negative {
                    min_negative = ratio;
                    negative = Some(basic);
                }
            } else {
                let ratio = row.constant / coeff;
                if ratio < min_positive {
                    min_positive = ratio;
                    positive = Some(basic);
                }
            }
        }

        negative.or(positive).or(external)
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "objective = {}", self.objective)?;
        for (basic, row) in &self.rows {
            writeln!(f, "{basic} = {row}")?;
        }
        Ok(())
    }
}
