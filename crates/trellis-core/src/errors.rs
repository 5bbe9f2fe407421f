//! Error types for the solver.

use thiserror::Error;

use crate::constraint::{Constraint, ConstraintId};

/// Errors that can occur during constraint solving.
#[derive(Debug, Clone, Error)]
pub enum SolverError {
    /// Adding a required constraint would make the required set infeasible.
    ///
    /// `explanation` lists the rejected constraint followed by every tracked
    /// constraint implicated in the blocking row. It is empty when failure
    /// explanation is switched off.
    #[error("Unable to satisfy required constraint ({} implicated)", .explanation.len())]
    RequiredFailure { explanation: Vec<Constraint> },

    #[error("Constraint {0} has already been added")]
    DuplicateConstraint(ConstraintId),

    #[error("Constraint {0} is not in the solver")]
    ConstraintNotFound(ConstraintId),

    #[error("Strength of constraint {0} can not move to or from required")]
    RequiredStrength(ConstraintId),

    #[error("Objective function is unbounded")]
    ObjectiveUnbound,

    #[error("Simplex did not converge within {limit} pivots")]
    IterationLimit { limit: usize },

    #[error("Internal solver error: {0}")]
    Internal(&'static str),
}

impl SolverError {
    /// Whether a caller can reasonably catch this and keep using the solver.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SolverError::RequiredFailure { .. }
                | SolverError::DuplicateConstraint(_)
                | SolverError::ConstraintNotFound(_)
                | SolverError::RequiredStrength(_)
        )
    }
}
