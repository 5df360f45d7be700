//! Condition-specific network reconstruction (CORDA)
//!
//! The worker in [`corda`] carves a condition-specific sub-network out of a
//! genome scale model, driven by per-reaction confidence tiers. Confidence
//! tiers are processed in fixed priority order (3 → 2 → 1 → 0), each tier
//! building on the inclusions fixed by the previous one.

pub mod corda;
pub mod report;
pub mod targets;

use serde::Serialize;
use thiserror::Error;

use crate::confidence::ConfidenceError;
use crate::optimize::problem::ProblemError;
use crate::optimize::solvers::SolverError;
use crate::optimize::OptimizationStatus;

/// Default flux cap applied to all working reactions during reconstruction
pub(crate) const UPPER: f64 = 1e6;
/// Cost increase applied to already used reactions when searching for
/// redundant pathways
pub(crate) const COST_INCREASE: f64 = 1.01;
/// Prefix of the demand pseudo-reactions added for metabolite targets
pub const DEMAND_PREFIX: &str = "EX_CORDA_";

/// The state of the reconstruction state machine
///
/// Tiers run strictly in the order 3 → 2 → 1 → 0. `Failed` means a
/// high-confidence requirement could not carry its required flux.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BuildPhase {
    /// Worker constructed, build not started
    Init,
    /// Fixing high confidence reactions and their minimal support
    Tier3,
    /// Grading medium confidence reactions
    Tier2,
    /// Grading low confidence reactions
    Tier1,
    /// Resolving unknown reactions and final pruning
    Tier0,
    /// Build finished
    Done,
    /// A required high confidence flux was unreachable
    Failed,
}

/// Errors raised by the reconstruction worker
#[derive(Debug, Error)]
pub enum CordaError {
    /// A high-confidence requirement can not carry its required flux; the
    /// reconstruction is incomplete
    #[error("reconstruction incomplete: required flux unreachable for {0:?}")]
    Infeasible(Vec<String>),
    /// The LP backend failed
    #[error(transparent)]
    Solver(#[from] SolverError),
    /// The LP backend halted without a usable verdict
    #[error("solver halted with status {0:?}")]
    SolverFailure(OptimizationStatus),
    /// Every reaction of the model needs a confidence entry
    #[error("no confidence assigned to reaction {0}")]
    MissingConfidence(String),
    /// The redundancy bound must allow at least one pathway per target
    #[error("redundancy limit must be at least 1, got {0}")]
    InvalidRedundancyLimit(usize),
    /// Penalizing absent reactions less than low-confidence ones would
    /// invert the search
    #[error("penalty factor must be at least 1, got {0}")]
    InvalidPenaltyFactor(f64),
    /// The support threshold must require at least one occurrence
    #[error("support threshold must be at least 1, got {0}")]
    InvalidSupport(usize),
    /// The worker is single use, as one build consumes its working bounds
    #[error("this reconstruction has already been built")]
    AlreadyBuilt,
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error(transparent)]
    Confidence(#[from] ConfidenceError),
}
