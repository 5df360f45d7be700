//! This module provides the Model struct for representing an entire metabolic model

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;

/// Represents a Genome Scale Metabolic Model
///
/// Reading models from SBML/JSON files is the responsibility of a model
/// reader crate; here the model is the in-memory universe a reconstruction
/// is carved out of.
#[derive(Clone, Debug, Default)]
pub struct Model {
    /// Map of reaction ids to Reaction Objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Gene Objects
    pub genes: IndexMap<String, Gene>,
    /// Map of metabolite ids to Metabolite Objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model::default()
    }

    /// Add a reaction to the model, registering any metabolites appearing in
    /// its stoichiometry which the model doesn't know yet
    pub fn add_reaction(&mut self, reaction: Reaction) {
        for met_id in reaction.metabolites.keys() {
            if !self.metabolites.contains_key(met_id) {
                self.metabolites
                    .insert(met_id.clone(), Metabolite::with_id(met_id));
            }
        }
        if let Some(ref gpr) = reaction.gpr {
            for gene_id in gpr.genes() {
                if !self.genes.contains_key(&gene_id) {
                    self.genes.insert(gene_id.clone(), Gene::with_id(&gene_id));
                }
            }
        }
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add a gene to the model
    pub fn add_gene(&mut self, gene: Gene) {
        let id = gene.id.clone();
        self.genes.insert(id, gene);
    }

    /// Add a metabolite to the model
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Remove reactions (by id) from the model
    ///
    /// Unknown ids are ignored. When `prune_orphans` is set, metabolites no
    /// longer appearing in any reaction and genes no longer referenced by any
    /// GPR are dropped as well, and removed reactions leave the objective.
    pub fn remove_reactions<I, S>(&mut self, ids: I, prune_orphans: bool)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            let id = id.as_ref();
            self.reactions.shift_remove(id);
            self.objective.shift_remove(id);
        }
        if prune_orphans {
            self.prune_orphans();
        }
    }

    /// Drop metabolites and genes which no remaining reaction references
    pub fn prune_orphans(&mut self) {
        let mut used_metabolites: IndexSet<String> = IndexSet::new();
        let mut used_genes: IndexSet<String> = IndexSet::new();
        for reaction in self.reactions.values() {
            used_metabolites.extend(reaction.metabolites.keys().cloned());
            if let Some(ref gpr) = reaction.gpr {
                used_genes.extend(gpr.genes());
            }
        }
        self.metabolites.retain(|id, _| used_metabolites.contains(id));
        self.genes.retain(|id, _| used_genes.contains(id));
    }

    /// Derive a sub-model containing only the reactions in `keep`
    ///
    /// Orphan metabolites and genes are pruned. The objective is carried over
    /// when every reaction it references survives, and cleared otherwise.
    pub fn subnetwork<'a, I>(&self, keep: I, id: Option<&str>) -> Model
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: IndexSet<&str> = keep.into_iter().collect();
        let mut sub = self.clone();
        sub.id = id.map(|s| s.to_string()).or_else(|| self.id.clone());
        let to_remove: Vec<String> = sub
            .reactions
            .keys()
            .filter(|rid| !keep.contains(rid.as_str()))
            .cloned()
            .collect();
        sub.remove_reactions(&to_remove, true);
        if !sub.objective.keys().all(|rid| sub.reactions.contains_key(rid)) {
            sub.objective.clear();
        }
        sub
    }

    /// Look up a reaction by id
    pub fn reaction(&self, id: &str) -> Option<&Reaction> {
        self.reactions.get(id)
    }
}

#[derive(Clone, Debug, Error)]
pub enum ModelError {
    #[error("Reaction {0} not present in the model")]
    ReactionNotFound(String),
    #[error("Metabolite {0} not present in the model")]
    MetaboliteNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::gene::Gpr;
    use crate::metabolic_model::reaction::ReactionBuilder;
    use indexmap::indexmap;

    fn toy_model() -> Model {
        // EX_A -> A, conversion A -> B, EX_B consumes B
        let mut model = Model::new_empty();
        model.add_reaction(
            ReactionBuilder::default()
                .id("EX_A".to_string())
                .metabolites(indexmap! {"A".to_string() => 1.0})
                .lower_bound(0.)
                .upper_bound(10.)
                .build()
                .unwrap(),
        );
        model.add_reaction(
            ReactionBuilder::default()
                .id("conversion".to_string())
                .metabolites(indexmap! {"A".to_string() => -1.0, "B".to_string() => 1.0})
                .gpr(Some(Gpr::new_gene_node("g1")))
                .lower_bound(0.)
                .upper_bound(10.)
                .build()
                .unwrap(),
        );
        model.add_reaction(
            ReactionBuilder::default()
                .id("EX_B".to_string())
                .metabolites(indexmap! {"B".to_string() => -1.0})
                .lower_bound(0.)
                .upper_bound(10.)
                .build()
                .unwrap(),
        );
        model.objective.insert("EX_B".to_string(), 1.0);
        model
    }

    #[test]
    fn add_reaction_registers_parts() {
        let model = toy_model();
        assert_eq!(model.reactions.len(), 3);
        assert_eq!(model.metabolites.len(), 2);
        assert!(model.genes.contains_key("g1"));
    }

    #[test]
    fn remove_reactions_prunes_orphans() {
        let mut model = toy_model();
        model.remove_reactions(["conversion", "EX_B"], true);
        assert_eq!(model.reactions.len(), 1);
        assert!(model.metabolites.contains_key("A"));
        assert!(!model.metabolites.contains_key("B"));
        assert!(model.genes.is_empty());
        assert!(model.objective.is_empty());
    }

    #[test]
    fn subnetwork_keeps_objective_when_valid() {
        let model = toy_model();
        let sub = model.subnetwork(["EX_A", "conversion", "EX_B"].into_iter(), Some("sub"));
        assert_eq!(sub.objective.get("EX_B"), Some(&1.0));
        assert_eq!(sub.id.as_deref(), Some("sub"));

        let smaller = model.subnetwork(["EX_A"].into_iter(), None);
        assert!(smaller.objective.is_empty());
        assert_eq!(smaller.reactions.len(), 1);
        assert_eq!(smaller.metabolites.len(), 1);
    }
}
