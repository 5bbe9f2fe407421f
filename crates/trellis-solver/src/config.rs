//! Solver configuration.

/// Behavior switches for a [`SimplexSolver`](crate::SimplexSolver).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    /// Re-optimize the objective after every add, remove and strength edit.
    /// When off, call `solve()` once after a batch of edits.
    pub auto_solve: bool,
    /// Collect the implicated constraints when a required constraint fails.
    pub explain_failure: bool,
    /// Pivot budget for a single optimize or dual-optimize run.
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            auto_solve: false,
            explain_failure: true,
            max_iterations: 100_000,
        }
    }
}

impl SolverConfig {
    pub fn with_auto_solve(mut self, auto_solve: bool) -> Self {
        self.auto_solve = auto_solve;
        self
    }

    pub fn with_explain_failure(mut self, explain_failure: bool) -> Self {
        self.explain_failure = explain_failure;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}
