//! Linear constraints.
//!
//! A constraint relates two linear forms. On construction the relation is
//! normalized to `expression R 0`:
//!
//! - `lhs == rhs` stores `lhs - rhs` (`= 0`)
//! - `lhs >= rhs` stores `lhs - rhs` (`>= 0`)
//! - `lhs <= rhs` stores `rhs - lhs` (`>= 0`)
//!
//! Both inequality directions therefore read `expression >= 0`, which lets the
//! solver introduce slack variables through a single code path. The direction
//! the caller wrote is kept in [`Constraint::relation`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::expression::Expression;
use crate::strength::Strength;
use crate::variable::Variable;

static NEXT_CONSTRAINT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity handle of a constraint, issued at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(u64);

impl ConstraintId {
    fn next() -> Self {
        Self(NEXT_CONSTRAINT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The relation of a constraint (equality or inequality).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Relation {
    LessOrEqual,
    Equal,
    GreaterOrEqual,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::LessOrEqual => write!(f, "<="),
            Relation::Equal => write!(f, "=="),
            Relation::GreaterOrEqual => write!(f, ">="),
        }
    }
}

/// A linear relation with a strength.
///
/// Equality and hashing use the [`ConstraintId`]; two constraints built from
/// the same expressions are still distinct. Clones share the id.
#[derive(Debug, Clone)]
pub struct Constraint {
    id: ConstraintId,
    expression: Expression,
    relation: Relation,
    strength: Strength,
    label: Option<String>,
}

impl Constraint {
    /// Create a required constraint `lhs relation rhs`.
    pub fn new(lhs: impl Into<Expression>, relation: Relation, rhs: impl Into<Expression>) -> Self {
        let lhs = lhs.into();
        let rhs = rhs.into();
        let expression = match relation {
            Relation::Equal | Relation::GreaterOrEqual => lhs - rhs,
            Relation::LessOrEqual => rhs - lhs,
        };
        Self {
            id: ConstraintId::next(),
            expression,
            relation,
            strength: Strength::REQUIRED,
            label: None,
        }
    }

    pub fn with_strength(mut self, strength: Strength) -> Self {
        self.strength = strength;
        self
    }

    /// Attach a diagnostic label naming whatever created the constraint.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> ConstraintId {
        self.id
    }

    /// The normalized expression, read as `expression R 0`.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    /// Set the strength on this value.
    ///
    /// This does not reach a solver the constraint was already added to; use
    /// the solver's `update_strength` for that.
    pub fn set_strength(&mut self, strength: Strength) {
        self.strength = strength;
    }

    pub fn weight(&self) -> f64 {
        self.strength.value()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.strength.is_required()
    }

    pub fn is_inequality(&self) -> bool {
        self.relation != Relation::Equal
    }

    /// The right-hand constant `k` when the constraint is read as
    /// `(lhs terms - rhs terms) R k`.
    pub fn constant(&self) -> f64 {
        match self.relation {
            Relation::LessOrEqual => self.expression.constant,
            Relation::Equal | Relation::GreaterOrEqual => -self.expression.constant,
        }
    }

    /// Replace the right-hand constant, see [`Constraint::constant`].
    ///
    /// Like [`Constraint::set_strength`] this only edits the value; the
    /// solver's `update_constant` keeps a tracked constraint in sync.
    pub fn set_constant(&mut self, constant: f64) {
        self.expression.constant = self.stored_constant(constant);
    }

    /// The constant [`Constraint::expression`] would hold after
    /// `set_constant(constant)`.
    pub fn stored_constant(&self, constant: f64) -> f64 {
        match self.relation {
            Relation::LessOrEqual => constant,
            Relation::Equal | Relation::GreaterOrEqual => -constant,
        }
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Constraint {}

impl Hash for Constraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.is_inequality() { ">=" } else { "==" };
        write!(f, "{} {} 0 [{}]", self.expression, op, self.strength)?;
        if let Some(label) = &self.label {
            write!(f, " ({label})")?;
        }
        Ok(())
    }
}

/// Relational builders producing required constraints.
///
/// `==`, `<=` and `>=` can not return a [`Constraint`] in Rust, so these
/// methods take their place.
pub trait Constrain: Into<Expression> + Sized {
    fn equal_to(self, rhs: impl Into<Expression>) -> Constraint {
        Constraint::new(self, Relation::Equal, rhs)
    }

    fn less_or_equal(self, rhs: impl Into<Expression>) -> Constraint {
        Constraint::new(self, Relation::LessOrEqual, rhs)
    }

    fn greater_or_equal(self, rhs: impl Into<Expression>) -> Constraint {
        Constraint::new(self, Relation::GreaterOrEqual, rhs)
    }
}

impl Constrain for Expression {}
impl Constrain for Variable {}
impl Constrain for f64 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_normalization() {
        let x = Variable::external();
        let c = x.equal_to(100.0);
        assert_eq!(c.expression().coefficient(x), 1.0);
        assert_eq!(c.expression().constant, -100.0);
        assert_eq!(c.relation(), Relation::Equal);
        assert!(c.is_required());
        assert!(!c.is_inequality());
        assert_eq!(c.constant(), 100.0);
    }

    #[test]
    fn test_inequalities_read_greater_or_equal_zero() {
        let x = Variable::external();
        let y = Variable::external();

        let le = x.less_or_equal(y + 10.0);
        assert_eq!(le.expression().coefficient(x), -1.0);
        assert_eq!(le.expression().coefficient(y), 1.0);
        assert_eq!(le.expression().constant, 10.0);

        let ge = x.greater_or_equal(y + 10.0);
        assert_eq!(ge.expression().coefficient(x), 1.0);
        assert_eq!(ge.expression().coefficient(y), -1.0);
        assert_eq!(ge.expression().constant, -10.0);
    }

    #[test]
    fn test_constant_round_trip_per_relation() {
        let x = Variable::external();
        for mut c in [x.equal_to(5.0), x.less_or_equal(5.0), x.greater_or_equal(5.0)] {
            assert_eq!(c.constant(), 5.0);
            let stored = c.stored_constant(-7.5);
            c.set_constant(-7.5);
            assert_eq!(c.constant(), -7.5);
            assert_eq!(c.expression().constant, stored);
        }
    }

    #[test]
    fn test_identity_equality() {
        let x = Variable::external();
        let a = x.equal_to(1.0);
        let b = x.equal_to(1.0);
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn test_builders() {
        let x = Variable::external();
        let c = x
            .greater_or_equal(0.0)
            .with_strength(Strength::WEAK)
            .with_label("x.min");
        assert_eq!(c.strength(), Strength::WEAK);
        assert_eq!(c.weight(), 10.0);
        assert_eq!(c.label(), Some("x.min"));
        assert!(!c.is_required());
    }
}
