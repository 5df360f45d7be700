//! Provides struct for representing an optimization problem's objective

use indexmap::IndexMap;

/// Represents the linear objective of an optimization problem
///
/// Coefficients are keyed by variable id; variables without an entry carry a
/// zero coefficient. The reconstruction loop rewrites these coefficients
/// between solves, so updates are cheap map operations.
#[derive(Debug, Clone)]
pub struct Objective {
    /// Non-zero coefficients of the objective, keyed by variable id
    coefficients: IndexMap<String, f64>,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    sense: ObjectiveSense,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            coefficients: IndexMap::new(),
            sense,
        }
    }

    /// Create a new empty maximization objective
    pub fn new_maximize() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new empty minimization objective
    pub fn new_minimize() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }

    /// Change the sense of the objective
    pub fn set_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
    }

    /// Get the sense of the objective
    pub fn get_sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// Set the coefficient of a single variable (zero removes the entry)
    pub fn set_coefficient(&mut self, variable_id: &str, coefficient: f64) {
        if coefficient == 0.0 {
            self.coefficients.shift_remove(variable_id);
        } else {
            self.coefficients
                .insert(variable_id.to_string(), coefficient);
        }
    }

    /// Set the coefficients of several variables at once
    pub fn set_coefficients<'a, I>(&mut self, coefficients: I)
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        for (variable_id, coefficient) in coefficients {
            self.set_coefficient(variable_id, coefficient);
        }
    }

    /// Get the coefficient of a variable
    pub fn get_coefficient(&self, variable_id: &str) -> f64 {
        self.coefficients.get(variable_id).copied().unwrap_or(0.0)
    }

    /// Remove all terms from the objective
    pub fn clear(&mut self) {
        self.coefficients.clear();
    }

    /// Iterate over the non-zero (variable id, coefficient) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.coefficients.iter()
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficients_update_in_place() {
        let mut objective = Objective::new_minimize();
        objective.set_coefficient("x", 2.0);
        objective.set_coefficient("y", 1.0);
        assert_eq!(objective.get_coefficient("x"), 2.0);

        objective.set_coefficient("x", 0.0);
        assert_eq!(objective.get_coefficient("x"), 0.0);
        assert_eq!(objective.iter().count(), 1);

        objective.clear();
        assert_eq!(objective.get_coefficient("y"), 0.0);
    }

    #[test]
    fn sense_round_trip() {
        let mut objective = Objective::new_maximize();
        assert_eq!(objective.get_sense(), ObjectiveSense::Maximize);
        objective.set_sense(ObjectiveSense::Minimize);
        assert_eq!(objective.get_sense(), ObjectiveSense::Minimize);
    }
}
