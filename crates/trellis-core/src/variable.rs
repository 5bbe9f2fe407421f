//! Solver variables.
//!
//! A [`Variable`] is an identity-bearing unknown. Its id is issued from a
//! process-wide monotonic counter, so two variables are equal only when they
//! were produced by the same factory call. The id also fixes the iteration
//! order used by the solver, which keeps pivot selection reproducible.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

static NEXT_VARIABLE_ID: AtomicU64 = AtomicU64::new(1);

/// The role a variable plays in the tableau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariableKind {
    /// A user-visible unknown with unrestricted sign.
    External,
    /// Introduced for an inequality; restricted to be non-negative.
    Slack,
    /// Marks a required equality; never pivoted during optimization.
    Dummy,
    /// Measures the violation of a non-required constraint.
    Error,
}

impl VariableKind {
    fn prefix(self) -> char {
        match self {
            VariableKind::External => 'v',
            VariableKind::Slack => 's',
            VariableKind::Dummy => 'd',
            VariableKind::Error => 'e',
        }
    }
}

/// A real-valued unknown.
#[derive(Debug, Clone, Copy)]
pub struct Variable {
    id: u64,
    kind: VariableKind,
}

impl Variable {
    fn with_kind(kind: VariableKind) -> Self {
        let id = NEXT_VARIABLE_ID.fetch_add(1, AtomicOrdering::Relaxed);
        Self { id, kind }
    }

    /// Create a fresh external variable.
    pub fn external() -> Self {
        Self::with_kind(VariableKind::External)
    }

    /// Create a fresh slack variable.
    pub fn slack() -> Self {
        Self::with_kind(VariableKind::Slack)
    }

    /// Create a fresh dummy variable.
    pub fn dummy() -> Self {
        Self::with_kind(VariableKind::Dummy)
    }

    /// Create a fresh error variable.
    pub fn error() -> Self {
        Self::with_kind(VariableKind::Error)
    }

    /// The allocation-order handle of this variable.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn is_external(&self) -> bool {
        self.kind == VariableKind::External
    }

    pub fn is_slack(&self) -> bool {
        self.kind == VariableKind::Slack
    }

    pub fn is_dummy(&self) -> bool {
        self.kind == VariableKind::Dummy
    }

    pub fn is_error(&self) -> bool {
        self.kind == VariableKind::Error
    }

    /// Whether the variable may enter or leave the basis during optimization.
    pub fn is_pivotable(&self) -> bool {
        matches!(self.kind, VariableKind::Slack | VariableKind::Error)
    }

    /// Whether the variable must stay non-negative in a feasible solution.
    pub fn is_restricted(&self) -> bool {
        !self.is_external()
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.id)
    }
}
