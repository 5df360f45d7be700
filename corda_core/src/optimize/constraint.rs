//! Provides struct for representing a constraint in an optimization problem
use std::fmt::{Display, Formatter};

/// Represents a linear constraint in an optimization problem
///
/// Terms reference variables by id; the owning
/// [`Problem`](crate::optimize::problem::Problem) resolves them to column
/// indices when the constraint rows are assembled.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Represents an equality constraint, where `terms` = `equals`
    Equality {
        /// Used to identify the constraint
        id: String,
        /// Linear terms which are added together, see [`ConstraintTerm`]
        terms: Vec<ConstraintTerm>,
        /// The right hand side of the equality constraint
        equals: f64,
    },
    /// Represents an inequality constraint
    Inequality {
        /// Used to identify the constraint
        id: String,
        /// Linear terms which are added together, see [`ConstraintTerm`]
        terms: Vec<ConstraintTerm>,
        /// The lowest value the sum of the terms can take
        lower_bound: f64,
        /// The highest value the sum of the terms can take
        upper_bound: f64,
    },
}

impl Constraint {
    /// Create a new equality constraint
    ///
    /// # Parameters
    /// - `id`: identifier for the constraint
    /// - `terms`: slice of (variable id, coefficient) pairs
    /// - `equals`: the right hand side of the equality
    pub fn new_equality(id: &str, terms: &[(&str, f64)], equals: f64) -> Self {
        Constraint::Equality {
            id: id.to_string(),
            terms: Constraint::zip_into_terms(terms),
            equals,
        }
    }

    /// Create a new inequality constraint
    ///
    /// # Parameters
    /// - `id`: identifier for the constraint
    /// - `terms`: slice of (variable id, coefficient) pairs
    /// - `lower_bound`: the lowest value the sum of the terms can take
    /// - `upper_bound`: the highest value the sum of the terms can take
    pub fn new_inequality(
        id: &str,
        terms: &[(&str, f64)],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Self {
        Constraint::Inequality {
            id: id.to_string(),
            terms: Constraint::zip_into_terms(terms),
            lower_bound,
            upper_bound,
        }
    }

    /// Get the id of the constraint
    pub fn get_id(&self) -> &str {
        match self {
            Constraint::Equality { id, .. } => id,
            Constraint::Inequality { id, .. } => id,
        }
    }

    /// Get the terms of the constraint
    pub fn get_terms(&self) -> &[ConstraintTerm] {
        match self {
            Constraint::Equality { terms, .. } => terms,
            Constraint::Inequality { terms, .. } => terms,
        }
    }

    fn zip_into_terms(terms: &[(&str, f64)]) -> Vec<ConstraintTerm> {
        terms
            .iter()
            .map(|(variable, coefficient)| ConstraintTerm {
                variable: variable.to_string(),
                coefficient: *coefficient,
            })
            .collect()
    }

    fn terms_to_string(terms: &[ConstraintTerm]) -> String {
        terms
            .iter()
            .map(|t| format!("{}", t))
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::Equality { terms, equals, .. } => {
                write!(f, "{} = {}", Self::terms_to_string(terms), equals)
            }
            Constraint::Inequality {
                terms,
                lower_bound,
                upper_bound,
                ..
            } => {
                write!(
                    f,
                    "{} <= {} <= {}",
                    lower_bound,
                    Self::terms_to_string(terms),
                    upper_bound
                )
            }
        }
    }
}

/// Represents a single term in a constraint, specifically
/// represents the multiplication of the `variable` by the `coefficient`
#[derive(Debug, Clone)]
pub struct ConstraintTerm {
    /// Id of the referenced [`crate::optimize::variable::Variable`]
    pub variable: String,
    /// The coefficient for the variable
    pub coefficient: f64,
}

impl Display for ConstraintTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*{}", self.coefficient, self.variable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let eq = Constraint::new_equality("mass_balance", &[("x", 3.0), ("y", 2.0)], 6.);
        assert_eq!(format!("{}", eq), "3*x + 2*y = 6");

        let ineq = Constraint::new_inequality("range", &[("x", 1.0)], 2., 6.);
        assert_eq!(format!("{}", ineq), "2 <= 1*x <= 6");
    }
}
