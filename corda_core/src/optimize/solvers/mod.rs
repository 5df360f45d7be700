//! Solver backends for linear problems
//!
//! A backend consumes the assembled problem and produces a
//! [`ProblemSolution`]. Infeasible and unbounded outcomes are statuses on the
//! solution, not errors; [`SolverError`] is reserved for failures of the
//! backend itself.

pub mod clarabel;
pub mod microlp;

use thiserror::Error;

use crate::optimize::problem::Problem;
use crate::optimize::ProblemSolution;

/// A linear programming backend
///
/// Backends rely on the owning problem having assembled its constraint rows,
/// so they are only reachable through
/// [`Problem::optimize`](crate::optimize::problem::Problem::optimize) and the
/// [`Solver`](crate::configuration::Solver) selection enum.
pub(crate) trait SolverBackend {
    /// Solve the problem, returning the status, objective value, and
    /// variable values at the optimum
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError>;
}

/// Errors raised by solver backends
#[derive(Debug, Clone, Error)]
pub enum SolverError {
    /// The backend failed internally (numerical breakdown, bad input state)
    #[error("solver backend failure: {0}")]
    Backend(String),
}
