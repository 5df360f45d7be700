//! Global defaults for reaction bounds, feasibility tolerance, and the LP
//! backend used by [`Problem::optimize`](crate::optimize::problem::Problem::optimize)

use std::sync::{LazyLock, RwLock};

/// The global configuration; write through the lock to change defaults
pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

pub struct Configuration {
    /// Default reaction lower bound
    pub lower_bound: f64,
    /// Default reaction upper bound
    pub upper_bound: f64,
    /// Feasibility tolerance, fluxes below it count as zero
    pub tolerance: f64,
    /// Backend used when a problem is optimized without an explicit solver
    pub solver: Solver,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
            solver: Solver::Microlp,
        }
    }
}

/// Enum used to specify the default solver to use
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Solver {
    /// Use the microlp simplex solver (returns vertex solutions, which the
    /// minimal-support passes rely on)
    Microlp,
    /// Use the Clarabel interior point solver
    Clarabel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_the_simplex_backend() {
        let config = CONFIGURATION.read().unwrap();
        assert_eq!(config.solver, Solver::Microlp);
        assert_eq!(config.lower_bound, -1000.);
        assert_eq!(config.upper_bound, 1000.);
    }
}
