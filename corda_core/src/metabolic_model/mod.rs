//! Representation of genome scale metabolic models

pub mod gene;
pub mod metabolite;
pub mod model;
pub mod reaction;
