//! Metabolite and flux targets for a reconstruction
//!
//! A target states something the reconstructed network must be able to do.
//! Each target is turned into a demand pseudo-reaction which is carried at
//! high confidence, so the tiered build guarantees it can carry flux.

use indexmap::{indexmap, IndexMap};

use crate::metabolic_model::reaction::{Reaction, ReactionBuilder};
use crate::reconstruction::{DEMAND_PREFIX, UPPER};

/// Something the reconstruction must be able to produce
#[derive(Clone, Debug, PartialEq)]
pub enum MetaboliteTarget {
    /// A single metabolite (by id) which must be producible; lowered to a
    /// demand reaction consuming one unit of it
    Produce(String),
    /// An arbitrary flux requirement given as a full stoichiometry
    /// (metabolite id to coefficient, consumption negative)
    Flux(IndexMap<String, f64>),
}

impl MetaboliteTarget {
    /// The stoichiometry of the demand pseudo-reaction for this target
    pub(crate) fn stoichiometry(&self) -> IndexMap<String, f64> {
        match self {
            MetaboliteTarget::Produce(metabolite) => {
                indexmap! {metabolite.clone() => -1.0}
            }
            MetaboliteTarget::Flux(stoichiometry) => stoichiometry.clone(),
        }
    }

    /// Build the irreversible demand pseudo-reaction for this target
    ///
    /// `index` is the position of the target in the target list and makes the
    /// reaction id unique within one reconstruction.
    pub(crate) fn demand_reaction(&self, index: usize) -> Reaction {
        let description = match self {
            MetaboliteTarget::Produce(metabolite) => {
                format!("demand for {metabolite}")
            }
            MetaboliteTarget::Flux(_) => "demand for a flux target".to_string(),
        };
        ReactionBuilder::default()
            .id(format!("{DEMAND_PREFIX}{index}"))
            .metabolites(self.stoichiometry())
            .lower_bound(0.)
            .upper_bound(UPPER)
            .notes(Some(description))
            .build()
            .expect("demand reaction construction cannot fail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produce_target_consumes_one_unit() {
        let target = MetaboliteTarget::Produce("atp_c".to_string());
        let demand = target.demand_reaction(0);
        assert_eq!(demand.id, "EX_CORDA_0");
        assert_eq!(demand.metabolites.get("atp_c"), Some(&-1.0));
        assert_eq!(demand.lower_bound, 0.);
        assert_eq!(demand.upper_bound, UPPER);
        assert!(!demand.is_reversible());
    }

    #[test]
    fn flux_target_keeps_its_stoichiometry() {
        let target = MetaboliteTarget::Flux(indexmap! {
            "adp_c".to_string() => 1.0,
            "atp_c".to_string() => -1.0,
        });
        let demand = target.demand_reaction(3);
        assert_eq!(demand.id, "EX_CORDA_3");
        assert_eq!(demand.metabolites.len(), 2);
        assert_eq!(demand.metabolites.get("adp_c"), Some(&1.0));
    }
}
