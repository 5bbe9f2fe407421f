//! Linear expressions.
//!
//! An [`Expression`] is `constant + Σ(coefficient * variable)`. Coefficients
//! that cancel to within [`EPSILON`] of zero are dropped, so the term map
//! never holds an explicit zero and [`Expression::is_constant`] stays
//! meaningful for the solver.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::variable::Variable;

/// Tolerance for every "is this effectively zero" decision.
pub const EPSILON: f64 = 1e-8;

/// Near-zero check for floating point values.
pub fn near_zero(value: f64) -> bool {
    value.abs() < EPSILON
}

/// A linear expression in the form: constant + Σ(coefficient * variable)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    pub constant: f64,
    terms: BTreeMap<Variable, f64>,
}

impl Expression {
    /// Create the zero expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a constant expression.
    pub fn from_constant(value: f64) -> Self {
        Self {
            constant: value,
            terms: BTreeMap::new(),
        }
    }

    /// Create `coefficient * variable + constant`.
    pub fn from_term(variable: Variable, coefficient: f64, constant: f64) -> Self {
        let mut expr = Self::from_constant(constant);
        expr.add_term(variable, coefficient);
        expr
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Iterate the terms in ascending variable order.
    pub fn terms(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        self.terms.iter().map(|(&v, &c)| (v, c))
    }

    /// Iterate the variables that carry a term.
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.terms.keys().copied()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// True when the expression has no variable terms.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Get the coefficient for a variable, zero when absent.
    pub fn coefficient(&self, variable: Variable) -> f64 {
        self.terms.get(&variable).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, variable: Variable) -> bool {
        self.terms.contains_key(&variable)
    }

    /// Add `multiply` to the coefficient of `variable`, dropping the term if
    /// it cancels out.
    pub fn add_term(&mut self, variable: Variable, multiply: f64) {
        match self.terms.get_mut(&variable) {
            Some(coeff) => {
                let sum = *coeff + multiply;
                if near_zero(sum) {
                    self.terms.remove(&variable);
                } else {
                    *coeff = sum;
                }
            }
            None => {
                if !near_zero(multiply) {
                    self.terms.insert(variable, multiply);
                }
            }
        }
    }

    /// Add `multiply * other` into this expression.
    pub fn add_expression(&mut self, other: &Expression, multiply: f64) {
        self.constant += other.constant * multiply;
        for (&variable, &coeff) in &other.terms {
            self.add_term(variable, coeff * multiply);
        }
    }

    /// Erase a term, returning its coefficient.
    pub fn remove(&mut self, variable: Variable) -> Option<f64> {
        self.terms.remove(&variable)
    }

    /// Multiply the expression by a scalar.
    pub fn multiply(&mut self, scalar: f64) {
        self.constant *= scalar;
        for coeff in self.terms.values_mut() {
            *coeff *= scalar;
        }
    }

    /// Divide the expression by a non-zero scalar.
    pub fn divide(&mut self, divisor: f64) {
        debug_assert!(divisor != 0.0, "divisor can not be zero");
        self.multiply(1.0 / divisor);
    }

    /// Rewrite `c*v + rest = 0` into `v = -rest / c`.
    ///
    /// The term for `variable` is removed and every remaining term and the
    /// constant are scaled by `-1/c`. Returns the reciprocal `1/c`.
    ///
    /// # Panics
    ///
    /// Panics if `variable` has no term in this expression.
    pub fn solve_for(&mut self, variable: Variable) -> f64 {
        let Some(coeff) = self.terms.remove(&variable) else {
            panic!("solve_for: {variable} is not a term of {self}");
        };
        let reciprocal = 1.0 / coeff;
        self.multiply(-reciprocal);
        reciprocal
    }

    /// Turn the row defining `old` into the row defining `new`.
    ///
    /// # Panics
    ///
    /// Panics if `new` has no term in this expression.
    pub fn change_subject(&mut self, old: Variable, new: Variable) {
        if old == new {
            return;
        }
        let reciprocal = self.solve_for(new);
        self.terms.insert(old, reciprocal);
    }

    /// Replace every occurrence of `variable` with `expr`.
    pub fn substitute_out(&mut self, variable: Variable, expr: &Expression) {
        if let Some(coeff) = self.terms.remove(&variable) {
            self.add_expression(expr, coeff);
        }
    }

    /// The first slack or error variable among the terms.
    pub fn pivotable_variable(&self) -> Option<Variable> {
        debug_assert!(!self.is_constant(), "constant expression has no pivotable variable");
        self.terms.keys().copied().find(Variable::is_pivotable)
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Self::from_constant(value)
    }
}

impl From<Variable> for Expression {
    fn from(variable: Variable) -> Self {
        Self::from_term(variable, 1.0, 0.0)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (variable, coeff) in self.terms() {
            write!(f, "{coeff}*{variable} + ")?;
        }
        write!(f, "{}", self.constant)
    }
}

impl<T: Into<Expression>> AddAssign<T> for Expression {
    fn add_assign(&mut self, rhs: T) {
        self.add_expression(&rhs.into(), 1.0);
    }
}

impl<T: Into<Expression>> SubAssign<T> for Expression {
    fn sub_assign(&mut self, rhs: T) {
        self.add_expression(&rhs.into(), -1.0);
    }
}

impl MulAssign<f64> for Expression {
    fn mul_assign(&mut self, rhs: f64) {
        self.multiply(rhs);
    }
}

impl DivAssign<f64> for Expression {
    fn div_assign(&mut self, rhs: f64) {
        self.divide(rhs);
    }
}

impl<T: Into<Expression>> Add<T> for Expression {
    type Output = Expression;

    fn add(mut self, rhs: T) -> Expression {
        self += rhs;
        self
    }
}

impl<T: Into<Expression>> Sub<T> for Expression {
    type Output = Expression;

    fn sub(mut self, rhs: T) -> Expression {
        self -= rhs;
        self
    }
}

impl Mul<f64> for Expression {
    type Output = Expression;

    fn mul(mut self, rhs: f64) -> Expression {
        self.multiply(rhs);
        self
    }
}

impl Div<f64> for Expression {
    type Output = Expression;

    fn div(mut self, rhs: f64) -> Expression {
        self.divide(rhs);
        self
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(mut self) -> Expression {
        self.multiply(-1.0);
        self
    }
}

impl<T: Into<Expression>> Add<T> for Variable {
    type Output = Expression;

    fn add(self, rhs: T) -> Expression {
        Expression::from(self) + rhs
    }
}

impl<T: Into<Expression>> Sub<T> for Variable {
    type Output = Expression;

    fn sub(self, rhs: T) -> Expression {
        Expression::from(self) - rhs
    }
}

impl Mul<f64> for Variable {
    type Output = Expression;

    fn mul(self, rhs: f64) -> Expression {
        Expression::from_term(self, rhs, 0.0)
    }
}

impl Div<f64> for Variable {
    type Output = Expression;

    fn div(self, rhs: f64) -> Expression {
        Expression::from(self) / rhs
    }
}

impl Neg for Variable {
    type Output = Expression;

    fn neg(self) -> Expression {
        Expression::from_term(self, -1.0, 0.0)
    }
}

impl Add<Variable> for f64 {
    type Output = Expression;

    fn add(self, rhs: Variable) -> Expression {
        rhs + self
    }
}

impl Add<Expression> for f64 {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression {
        rhs + self
    }
}

impl Sub<Variable> for f64 {
    type Output = Expression;

    fn sub(self, rhs: Variable) -> Expression {
        Expression::from_term(rhs, -1.0, self)
    }
}

impl Sub<Expression> for f64 {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression {
        -rhs + self
    }
}

impl Mul<Variable> for f64 {
    type Output = Expression;

    fn mul(self, rhs: Variable) -> Expression {
        rhs * self
    }
}

impl Mul<Expression> for f64 {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        rhs * self
    }
}
