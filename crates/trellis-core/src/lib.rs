//! Core types for the trellis constraint solver.
//!
//! This crate provides the leaf model shared by the solver:
//! - Variables and their tableau roles
//! - Linear expressions with near-zero pruning
//! - Strengths, relations and constraints
//! - Error types

pub mod constraint;
pub mod errors;
pub mod expression;
pub mod strength;
pub mod variable;

pub use constraint::{Constrain, Constraint, ConstraintId, Relation};
pub use errors::SolverError;
pub use expression::{near_zero, Expression, EPSILON};
pub use strength::Strength;
pub use variable::{Variable, VariableKind};
