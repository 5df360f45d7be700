//! The CORDA reconstruction worker
//!
//! Implements the tiered reconstruction of Schultz et al. (2016): starting
//! from a universe model and per-reaction confidence levels, high confidence
//! reactions are fixed together with their cheapest support, graded (medium,
//! then low) reactions earn inclusion, and unknown reactions are pulled in
//! only when the included core needs them. A worker is single use; create a
//! fresh one for every reconstruction run.

use derive_builder::Builder;
use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::confidence::Confidence;
use crate::configuration::CONFIGURATION;
use crate::metabolic_model::model::Model;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::{OptimizationStatus, ProblemSolution};
use crate::reconstruction::report::{BuildStatus, ReconstructionSummary, TierCounts};
use crate::reconstruction::targets::MetaboliteTarget;
use crate::reconstruction::{BuildPhase, CordaError, COST_INCREASE, UPPER};

/// Tuning parameters of a reconstruction
#[derive(Builder, Clone, Debug, PartialEq)]
pub struct CordaOptions {
    /// Maximum number of redundant pathways detected per target
    ///
    /// Larger limits make the build considerably slower.
    #[builder(default = "3")]
    pub redundancy_limit: usize,
    /// How much more absent reactions cost than low confidence ones
    #[builder(default = "100.0")]
    pub penalty_factor: f64,
    /// An absent reaction is included when it supports at least this many
    /// graded reactions
    #[builder(default = "5")]
    pub support: usize,
    /// The flux every target must be able to carry
    #[builder(default = "1.0")]
    pub required_flux: f64,
}

impl Default for CordaOptions {
    fn default() -> Self {
        Self {
            redundancy_limit: 3,
            penalty_factor: 100.0,
            support: 5,
            required_flux: 1.0,
        }
    }
}

impl CordaOptions {
    fn validate(&self) -> Result<(), CordaError> {
        if self.redundancy_limit < 1 {
            return Err(CordaError::InvalidRedundancyLimit(self.redundancy_limit));
        }
        if self.penalty_factor < 1.0 {
            return Err(CordaError::InvalidPenaltyFactor(self.penalty_factor));
        }
        if self.support < 1 {
            return Err(CordaError::InvalidSupport(self.support));
        }
        Ok(())
    }
}

/// The reconstruction worker
///
/// Holds a working copy of the universe model, the split-variable linear
/// problem derived from it, and the evolving confidence assignment. The
/// confidence of a direction variable only ever rises during a build, except
/// that directions proven unable to carry flux are excluded and recorded in
/// `impossible`.
pub struct Corda {
    /// Working copy of the universe, with demand reactions added and bounds
    /// opened up to [`UPPER`]
    model: Model,
    /// Steady state flux problem over the split direction variables
    problem: Problem,
    /// Current confidence per direction variable
    conf: IndexMap<String, Confidence>,
    /// Confidence per direction variable before the build
    initial_conf: IndexMap<String, Confidence>,
    /// Input-model bounds, restored on the reconstructed output
    saved_bounds: IndexMap<String, (f64, f64)>,
    /// Ids of the demand pseudo-reactions
    mocks: Vec<String>,
    /// Redundant pathway counts per target direction
    redundancies: IndexMap<String, u32>,
    /// Directions that were required at some point but cannot carry flux
    impossible: Vec<String>,
    phase: BuildPhase,
    options: CordaOptions,
    tolerance: f64,
    /// LP solves per build phase
    solves: IndexMap<BuildPhase, usize>,
}

impl Corda {
    /// Create a reconstruction worker
    ///
    /// `confidence` must assign a level to every reaction of `model`. Each
    /// target is added to the working model as an irreversible high
    /// confidence demand reaction, so the build guarantees it can carry flux.
    pub fn new(
        model: &Model,
        confidence: &IndexMap<String, Confidence>,
        targets: &[MetaboliteTarget],
        options: CordaOptions,
    ) -> Result<Self, CordaError> {
        options.validate()?;
        let tolerance = CONFIGURATION.read().unwrap().tolerance;

        let mut working = model.clone();
        let saved_bounds: IndexMap<String, (f64, f64)> = working
            .reactions
            .values()
            .map(|r| (r.id.clone(), (r.lower_bound, r.upper_bound)))
            .collect();

        let mut mocks = Vec::with_capacity(targets.len());
        for (index, target) in targets.iter().enumerate() {
            let demand = target.demand_reaction(index);
            mocks.push(demand.id.clone());
            working.add_reaction(demand);
        }

        // Open up the working bounds so inclusion decisions are not limited
        // by the medium scale bounds of the input model
        for reaction in working.reactions.values_mut() {
            if reaction.lower_bound < -tolerance {
                reaction.lower_bound = -UPPER;
            }
            if reaction.upper_bound > tolerance {
                reaction.upper_bound = UPPER;
            }
        }

        let mut conf = IndexMap::with_capacity(2 * working.reactions.len());
        let mut redundancies = IndexMap::with_capacity(2 * working.reactions.len());
        for reaction in working.reactions.values() {
            let level = if mocks.contains(&reaction.id) {
                Confidence::High
            } else {
                *confidence
                    .get(&reaction.id)
                    .ok_or_else(|| CordaError::MissingConfidence(reaction.id.clone()))?
            };
            conf.insert(reaction.get_forward_id(), level);
            conf.insert(reaction.get_reverse_id(), level);
            redundancies.insert(reaction.get_forward_id(), 0);
            redundancies.insert(reaction.get_reverse_id(), 0);
        }

        let mut problem = Problem::new_minimization();
        for reaction in working.reactions.values() {
            problem.add_new_variable(
                &reaction.get_forward_id(),
                reaction.get_forward_lower_bound(),
                reaction.get_forward_upper_bound(),
            )?;
            problem.add_new_variable(
                &reaction.get_reverse_id(),
                reaction.get_reverse_lower_bound(),
                reaction.get_reverse_upper_bound(),
            )?;
        }
        for met_id in working.metabolites.keys() {
            let mut terms: Vec<(String, f64)> = Vec::new();
            for reaction in working.reactions.values() {
                if let Some(coefficient) = reaction.metabolites.get(met_id) {
                    terms.push((reaction.get_forward_id(), *coefficient));
                    terms.push((reaction.get_reverse_id(), -coefficient));
                }
            }
            if terms.is_empty() {
                continue;
            }
            let term_refs: Vec<(&str, f64)> =
                terms.iter().map(|(v, c)| (v.as_str(), *c)).collect();
            problem.add_new_equality_constraint(
                &format!("mass_balance_{met_id}"),
                &term_refs,
                0.0,
            )?;
        }

        let initial_conf = conf.clone();
        Ok(Self {
            model: working,
            problem,
            conf,
            initial_conf,
            saved_bounds,
            mocks,
            redundancies,
            impossible: Vec::new(),
            phase: BuildPhase::Init,
            options,
            tolerance,
            solves: IndexMap::new(),
        })
    }

    // region Build

    /// Run the tiered reconstruction
    ///
    /// This is the only computation heavy part of the worker. On success the
    /// phase is `Done` and the included reactions can be read with
    /// [`Corda::included`] or materialized with [`Corda::reconstruction`].
    /// When a high confidence requirement cannot carry its required flux the
    /// build stops with [`CordaError::Infeasible`] and the phase is `Failed`.
    pub fn build(&mut self) -> Result<(), CordaError> {
        if self.phase != BuildPhase::Init {
            return Err(CordaError::AlreadyBuilt);
        }
        match self.run_tiers() {
            Ok(()) => {
                self.phase = BuildPhase::Done;
                info!(
                    "reconstruction complete, {} of {} directions included",
                    self.with_confidence(Confidence::High).len(),
                    self.conf.len()
                );
                Ok(())
            }
            Err(error) => {
                self.phase = BuildPhase::Failed;
                Err(error)
            }
        }
    }

    fn run_tiers(&mut self) -> Result<(), CordaError> {
        self.phase = BuildPhase::Tier3;
        let required = self.with_confidence(Confidence::High);
        info!("fixing {} high confidence directions", required.len());
        let need = self.associated(&required, None, true, true)?;
        self.promote(need.values().flatten());
        self.check_required()?;

        self.phase = BuildPhase::Tier2;
        self.graded_pass(Confidence::Medium)?;
        self.phase = BuildPhase::Tier1;
        self.graded_pass(Confidence::Low)?;

        self.phase = BuildPhase::Tier0;
        // Unknown directions become excludable but stay open, so the final
        // pass can still pull them in at the absent-reaction penalty
        let mut demoted: IndexSet<String> = IndexSet::new();
        for (vid, level) in self.conf.iter_mut() {
            if *level == Confidence::Unknown {
                *level = Confidence::Exclude;
                demoted.insert(vid.clone());
            }
        }
        let to_block: Vec<String> = self
            .conf
            .iter()
            .filter(|(vid, level)| **level != Confidence::High && !demoted.contains(*vid))
            .map(|(vid, _)| vid.clone())
            .collect();
        for vid in &to_block {
            let (lower, _) = self.problem.variable_bounds(vid)?;
            self.problem
                .update_variable_bounds(vid, lower, lower.max(0.0))?;
        }
        let include = self.with_confidence(Confidence::High);
        info!("finalizing support for {} included directions", include.len());
        let need = self.associated(&include, None, false, false)?;
        self.promote(need.values().flatten());
        self.check_required()?;

        let conf = &self.conf;
        let impossible = &self.impossible;
        self.redundancies
            .retain(|vid, _| conf.get(vid) == Some(&Confidence::High) && !impossible.contains(vid));
        Ok(())
    }

    /// One graded tier: find the cheapest support of every direction at
    /// `level`, include absent reactions with enough support, then include
    /// the directions which reach the required flux with all absent
    /// reactions blocked.
    fn graded_pass(&mut self, level: Confidence) -> Result<(), CordaError> {
        let targets = self.with_confidence(level);
        info!("grading {} directions at {:?} confidence", targets.len(), level);
        if targets.is_empty() {
            return Ok(());
        }
        let need = self.associated(&targets, None, false, true)?;

        // An absent reaction earns inclusion by supporting enough targets
        let mut support_counts: IndexMap<String, usize> = IndexMap::new();
        for vars in need.values() {
            for vid in vars {
                if self.conf.get(vid) == Some(&Confidence::Exclude) {
                    *support_counts.entry(vid.clone()).or_insert(0) += 1;
                }
            }
        }
        let supported: Vec<String> = support_counts
            .iter()
            .filter(|(_, count)| **count >= self.options.support)
            .map(|(vid, _)| vid.clone())
            .collect();
        self.promote(supported.iter());

        // Free flux check with every absent direction blocked
        let blocked: Vec<(String, (f64, f64))> = self
            .conf
            .iter()
            .filter(|(_, c)| **c == Confidence::Exclude)
            .map(|(vid, _)| Ok((vid.clone(), self.problem.variable_bounds(vid)?)))
            .collect::<Result<_, CordaError>>()?;
        for (vid, (lower, _)) in &blocked {
            self.problem
                .update_variable_bounds(vid, *lower, lower.max(0.0))?;
        }

        self.problem.clear_objective();
        self.problem.update_objective_sense(ObjectiveSense::Maximize);
        for vid in self.with_confidence(level) {
            self.problem.set_objective_coefficient(&vid, 1.0)?;
            let solution = self.solve()?;
            match solution.status {
                OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal => {
                    if solution.objective_value.unwrap_or(0.0) > self.options.required_flux {
                        self.conf.insert(vid.clone(), Confidence::High);
                    }
                }
                OptimizationStatus::Infeasible | OptimizationStatus::Unbounded => {}
                other => return Err(CordaError::SolverFailure(other)),
            }
            self.problem.set_objective_coefficient(&vid, 0.0)?;
        }
        self.problem.clear_objective();
        self.problem.update_objective_sense(ObjectiveSense::Minimize);
        for (vid, (lower, upper)) in &blocked {
            self.problem.update_variable_bounds(vid, *lower, *upper)?;
        }
        Ok(())
    }

    /// Find the minimal support of each target direction
    ///
    /// For every target the required flux is forced and the total penalty on
    /// absent (and, when `penalize_medium` is set, graded) directions is
    /// minimized; the directions carrying flux at the optimum are its
    /// support. With `redundancies` set, up to `redundancy_limit` passes are
    /// run per target with used directions made slightly more expensive,
    /// uncovering alternative pathways; the number of alternatives found
    /// beyond the first is recorded per target.
    ///
    /// Targets unable to carry flux are excluded, recorded as impossible, and
    /// map to an empty support list.
    pub fn associated(
        &mut self,
        targets: &[String],
        conf: Option<&IndexMap<String, Confidence>>,
        penalize_medium: bool,
        redundancies: bool,
    ) -> Result<IndexMap<String, Vec<String>>, CordaError> {
        let conf = conf.cloned().unwrap_or_else(|| self.conf.clone());
        let base_penalties = self.penalties(&conf, penalize_medium);
        let max_iter = if redundancies {
            self.options.redundancy_limit
        } else {
            1
        };

        let mut result = IndexMap::with_capacity(targets.len());
        for vid in targets {
            self.problem.clear_objective();
            self.problem.update_objective_sense(ObjectiveSense::Minimize);
            let (old_lower, old_upper) = self.problem.variable_bounds(vid)?;
            if old_upper < self.tolerance {
                debug!("{vid} cannot carry any flux");
                self.mark_impossible(vid);
                result.insert(vid.clone(), Vec::new());
                continue;
            }
            self.problem.update_variable_bounds(
                vid,
                old_lower.max(self.options.required_flux),
                UPPER,
            )?;

            let mut penalties = base_penalties.clone();
            let mut needed: IndexSet<String> = IndexSet::new();
            let mut iteration = 0;
            let mut has_new = true;
            while has_new && iteration < max_iter {
                for (pvid, penalty) in &penalties {
                    self.problem.set_objective_coefficient(pvid, *penalty)?;
                }
                let solution = self.solve()?;
                iteration += 1;
                let values = match solution.status {
                    OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal => {
                        solution.variable_values.unwrap_or_default()
                    }
                    OptimizationStatus::Infeasible | OptimizationStatus::Unbounded => {
                        debug!("{vid} cannot reach the required flux");
                        self.mark_impossible(vid);
                        break;
                    }
                    other => return Err(CordaError::SolverFailure(other)),
                };
                let need: Vec<String> = values
                    .iter()
                    .filter(|(v, flux)| {
                        **flux > self.tolerance
                            && *v != vid
                            && conf.get(*v).is_some_and(|c| c.is_penalized())
                    })
                    .map(|(v, _)| v.clone())
                    .collect();
                has_new = need.iter().any(|v| !needed.contains(v));
                if redundancies && iteration > 1 && has_new {
                    *self.redundancies.entry(vid.clone()).or_insert(0) += 1;
                }
                for v in &need {
                    if !needed.contains(v) {
                        if let Some(penalty) = penalties.get_mut(v) {
                            *penalty *= COST_INCREASE;
                            self.problem.set_objective_coefficient(v, *penalty)?;
                        }
                    }
                }
                needed.extend(need);
            }
            self.problem
                .update_variable_bounds(vid, old_lower, old_upper)?;
            result.insert(vid.clone(), needed.into_iter().collect());
        }
        self.problem.clear_objective();
        Ok(result)
    }

    fn penalties(
        &self,
        conf: &IndexMap<String, Confidence>,
        penalize_medium: bool,
    ) -> IndexMap<String, f64> {
        let mut penalties = IndexMap::new();
        for (vid, level) in conf {
            match level {
                Confidence::Exclude => {
                    penalties.insert(vid.clone(), self.options.penalty_factor);
                }
                Confidence::Low | Confidence::Medium if penalize_medium => {
                    penalties.insert(vid.clone(), 1.0);
                }
                _ => {}
            }
        }
        penalties
    }

    fn mark_impossible(&mut self, vid: &str) {
        if !self.impossible.iter().any(|v| v == vid) {
            self.impossible.push(vid.to_string());
        }
        self.conf.insert(vid.to_string(), Confidence::Exclude);
    }

    fn promote<'a, I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for vid in vars {
            self.conf.insert(vid.clone(), Confidence::High);
        }
    }

    fn with_confidence(&self, level: Confidence) -> Vec<String> {
        self.conf
            .iter()
            .filter(|(_, c)| **c == level)
            .map(|(vid, _)| vid.clone())
            .collect()
    }

    /// Fail when a reaction required at high confidence lost both directions
    fn check_required(&self) -> Result<(), CordaError> {
        let current = self.reduced_confidence(&self.conf);
        let initial = self.reduced_confidence(&self.initial_conf);
        let failed: Vec<String> = initial
            .iter()
            .filter(|(rid, level)| {
                **level == Confidence::High && current.get(*rid) != Some(&Confidence::High)
            })
            .map(|(rid, _)| rid.clone())
            .collect();
        if failed.is_empty() {
            Ok(())
        } else {
            warn!("required reactions cannot carry flux: {failed:?}");
            Err(CordaError::Infeasible(failed))
        }
    }

    fn solve(&mut self) -> Result<ProblemSolution, CordaError> {
        *self.solves.entry(self.phase).or_insert(0) += 1;
        Ok(self.problem.optimize()?)
    }

    // endregion Build

    // region Results

    /// Per-reaction confidence, reduced over the two direction variables
    fn reduced_confidence(
        &self,
        conf: &IndexMap<String, Confidence>,
    ) -> IndexMap<String, Confidence> {
        self.model
            .reactions
            .values()
            .map(|reaction| {
                let forward = conf
                    .get(&reaction.get_forward_id())
                    .copied()
                    .unwrap_or_default();
                let reverse = conf
                    .get(&reaction.get_reverse_id())
                    .copied()
                    .unwrap_or_default();
                (reaction.id.clone(), forward.max(reverse))
            })
            .collect()
    }

    /// Which reactions (by id, demand pseudo-reactions included) made it into
    /// the reconstruction
    pub fn included(&self) -> IndexMap<String, bool> {
        self.reduced_confidence(&self.conf)
            .into_iter()
            .map(|(rid, level)| (rid, level == Confidence::High))
            .collect()
    }

    /// Summarize the reconstruction
    ///
    /// With `reversible` set the counts are per reaction (a reaction is
    /// included when either direction is); otherwise they are per direction
    /// variable.
    pub fn summary(&self, reversible: bool) -> ReconstructionSummary {
        let (current, initial) = if reversible {
            (
                self.reduced_confidence(&self.conf),
                self.reduced_confidence(&self.initial_conf),
            )
        } else {
            (self.conf.clone(), self.initial_conf.clone())
        };
        let status = match self.phase {
            BuildPhase::Done => BuildStatus::Complete,
            BuildPhase::Failed => BuildStatus::Incomplete,
            _ => BuildStatus::NotBuilt,
        };
        let mut summary = ReconstructionSummary {
            status,
            reversible,
            total: initial.len(),
            included: 0,
            unclear: TierCounts::default(),
            exclude: TierCounts::default(),
            low_medium: TierCounts::default(),
            high: TierCounts::default(),
        };
        for (id, level) in &initial {
            let included = current.get(id) == Some(&Confidence::High);
            let counts = match level {
                Confidence::Unknown => &mut summary.unclear,
                Confidence::Exclude => &mut summary.exclude,
                Confidence::Low | Confidence::Medium => &mut summary.low_medium,
                Confidence::High => &mut summary.high,
            };
            counts.total += 1;
            if included {
                counts.included += 1;
                summary.included += 1;
            }
        }
        summary
    }

    /// Human readable form of [`Corda::summary`]
    pub fn info(&self, reversible: bool) -> String {
        self.summary(reversible).to_string()
    }

    /// Materialize the reconstruction as a model
    ///
    /// Included reactions get their input-model bounds back, demand
    /// pseudo-reactions are dropped, and orphan metabolites and genes are
    /// pruned. The input objective is conserved when all of its reactions
    /// survive.
    pub fn reconstruction(&self, id: Option<&str>) -> Model {
        let reduced = self.reduced_confidence(&self.conf);
        let keep: Vec<&str> = self
            .model
            .reactions
            .keys()
            .filter(|rid| {
                reduced.get(*rid) == Some(&Confidence::High) && !self.mocks.contains(*rid)
            })
            .map(|rid| rid.as_str())
            .collect();
        let mut sub = self.model.subnetwork(keep, id);
        for reaction in sub.reactions.values_mut() {
            if let Some((lower, upper)) = self.saved_bounds.get(&reaction.id) {
                reaction.lower_bound = *lower;
                reaction.upper_bound = *upper;
            }
        }
        sub
    }

    /// Check which targets the universe model can reach at all
    ///
    /// Maximizes each demand pseudo-reaction on an unrestricted copy of the
    /// problem, one solve per target, in parallel. Useful to weed out
    /// unreachable targets before a build.
    pub fn screen_targets(&self) -> Result<Vec<(String, bool)>, CordaError> {
        self.mocks
            .par_iter()
            .map(|rid| {
                let variable = self.model.reactions[rid].get_forward_id();
                let mut lp = self.problem.clone();
                lp.clear_objective();
                lp.update_objective_sense(ObjectiveSense::Maximize);
                lp.set_objective_coefficient(&variable, 1.0)?;
                let solution = lp.optimize()?;
                let reachable = solution.is_optimal()
                    && solution.objective_value.unwrap_or(0.0) > self.tolerance;
                Ok((rid.clone(), reachable))
            })
            .collect()
    }

    // endregion Results

    // region Accessors

    /// The working model, demand pseudo-reactions included
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Current phase of the build state machine
    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// Directions that were required at some point but cannot carry flux
    pub fn impossible(&self) -> &[String] {
        &self.impossible
    }

    /// Redundant pathway counts per target direction
    pub fn redundancies(&self) -> &IndexMap<String, u32> {
        &self.redundancies
    }

    /// Current confidence per direction variable
    pub fn confidences(&self) -> &IndexMap<String, Confidence> {
        &self.conf
    }

    /// Number of LP solves performed, per build phase
    pub fn solve_counts(&self) -> &IndexMap<BuildPhase, usize> {
        &self.solves
    }

    // endregion Accessors
}
