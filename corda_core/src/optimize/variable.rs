//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};

/// A continuous, bounded variable of a linear problem
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Used to identify the variable (unique within a problem)
    pub id: String,
    /// Lowest value the variable may take
    pub lower_bound: f64,
    /// Highest value the variable may take
    pub upper_bound: f64,
    /// Column index of the variable in the assembled problem
    pub(crate) index: usize,
}

impl Variable {
    /// Create a new variable
    pub fn new(id: &str, lower_bound: f64, upper_bound: f64) -> Variable {
        Variable {
            id: id.to_string(),
            lower_bound,
            upper_bound,
            index: 0,
        }
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} <= {} <= {}",
            self.lower_bound, self.id, self.upper_bound
        )
    }
}
