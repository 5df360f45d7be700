//! This module provides a struct for representing reactions
use derive_builder::Builder;
use indexmap::IndexMap;

use crate::configuration::CONFIGURATION;
use crate::metabolic_model::gene::Gpr;
use crate::utils::hashing::hash_as_hex_string;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Metabolite stoichiometry of the reaction
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene Protein Reaction rule associated with the reaction
    #[builder(default = "None")]
    pub gpr: Option<Gpr>,
    /// Lower flux bound
    #[builder(default = "CONFIGURATION.read().unwrap().lower_bound")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "CONFIGURATION.read().unwrap().upper_bound")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Notes about the reaction
    #[builder(default = "None")]
    pub notes: Option<String>,
}

impl Reaction {
    /// Whether the reaction can carry flux in both directions
    pub fn is_reversible(&self) -> bool {
        self.lower_bound < 0f64 && self.upper_bound > 0f64
    }

    /// Determine the id associated with the forward direction in the
    /// optimization problem
    ///
    /// # Note:
    /// The forward id is "{reaction_id}_forward"
    pub fn get_forward_id(&self) -> String {
        format!("{}_forward", &self.id)
    }

    /// Determine the id associated with the reverse direction in the
    /// optimization problem
    ///
    /// # Note:
    /// The reverse id is "{reaction_id}_reverse_{hexidecimal hash of reaction_id}"
    pub fn get_reverse_id(&self) -> String {
        format!("{}_reverse_{}", &self.id, hash_as_hex_string(&self.id))
    }

    /// Determine the upper bound of the variable associated with the forward direction
    pub(crate) fn get_forward_upper_bound(&self) -> f64 {
        if self.upper_bound > 0f64 {
            self.upper_bound
        } else {
            0f64
        }
    }

    /// Determine the lower bound of the variable associated with the forward direction
    pub(crate) fn get_forward_lower_bound(&self) -> f64 {
        if self.lower_bound > 0f64 {
            self.lower_bound
        } else {
            0f64
        }
    }

    /// Determine the upper bound of the variable associated with the reverse direction
    pub(crate) fn get_reverse_upper_bound(&self) -> f64 {
        if self.lower_bound < 0f64 {
            -self.lower_bound
        } else {
            0f64
        }
    }

    /// Determine the lower bound of the variable associated with the reverse direction
    pub(crate) fn get_reverse_lower_bound(&self) -> f64 {
        if self.upper_bound < 0f64 {
            -self.upper_bound
        } else {
            0f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reaction(lower: f64, upper: f64) -> Reaction {
        ReactionBuilder::default()
            .id("r".to_string())
            .lower_bound(lower)
            .upper_bound(upper)
            .build()
            .unwrap()
    }

    #[test]
    fn split_bounds_reversible() {
        let r = reaction(-10., 20.);
        assert!(r.is_reversible());
        assert_eq!(r.get_forward_lower_bound(), 0.);
        assert_eq!(r.get_forward_upper_bound(), 20.);
        assert_eq!(r.get_reverse_lower_bound(), 0.);
        assert_eq!(r.get_reverse_upper_bound(), 10.);
    }

    #[test]
    fn split_bounds_irreversible() {
        let r = reaction(0., 20.);
        assert!(!r.is_reversible());
        assert_eq!(r.get_reverse_upper_bound(), 0.);

        // A strictly backwards reaction forces flux through the reverse variable
        let r = reaction(-20., -5.);
        assert_eq!(r.get_forward_upper_bound(), 0.);
        assert_eq!(r.get_reverse_lower_bound(), 5.);
        assert_eq!(r.get_reverse_upper_bound(), 20.);
    }

    #[test]
    fn direction_ids_are_distinct() {
        let r = reaction(0., 10.);
        assert_eq!(r.get_forward_id(), "r_forward");
        assert!(r.get_reverse_id().starts_with("r_reverse_"));
        assert_ne!(r.get_forward_id(), r.get_reverse_id());
    }
}
