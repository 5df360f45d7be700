//! Core rust implementation of CORDA, a crate for reconstructing
//! condition-specific metabolic networks from a genome scale model and
//! per-reaction confidences (Schultz et al. 2016).

pub mod confidence;
pub mod configuration;
pub mod metabolic_model;
pub mod optimize;
pub mod reconstruction;
mod utils;

pub use confidence::{reaction_confidence, Confidence};
pub use configuration::{Solver, CONFIGURATION};
pub use reconstruction::corda::{Corda, CordaOptions, CordaOptionsBuilder};
pub use reconstruction::report::ReconstructionSummary;
pub use reconstruction::targets::MetaboliteTarget;
pub use reconstruction::{BuildPhase, CordaError};
