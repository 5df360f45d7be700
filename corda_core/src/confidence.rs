//! Confidence tiers for reactions and genes, and evaluation of gene protein
//! reaction rules into a reaction confidence.
//!
//! Confidence follows the CORDA convention: -1 (absent, do not include),
//! 0 (unknown), 1 (low), 2 (medium) and 3 (high). A reaction inherits its
//! confidence from its GPR rule with `and` taking the minimum and `or` the
//! maximum over the participating genes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metabolic_model::gene::{Gpr, GprOperation};

/// A confidence tier
///
/// The derived ordering runs from `Exclude` (lowest) to `High` (highest),
/// matching the numeric -1..=3 scale.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Confidence {
    /// Absent, should not be part of the reconstruction (-1)
    Exclude,
    /// Nothing is known about the reaction (0)
    #[default]
    Unknown,
    /// Low confidence (1)
    Low,
    /// Medium confidence (2)
    Medium,
    /// High confidence, must be part of the reconstruction (3)
    High,
}

impl Confidence {
    /// The numeric value of the tier on the CORDA -1..=3 scale
    pub fn value(self) -> i32 {
        match self {
            Confidence::Exclude => -1,
            Confidence::Unknown => 0,
            Confidence::Low => 1,
            Confidence::Medium => 2,
            Confidence::High => 3,
        }
    }

    /// Whether the tier is penalized during minimal support searches
    pub(crate) fn is_penalized(self) -> bool {
        matches!(
            self,
            Confidence::Exclude | Confidence::Low | Confidence::Medium
        )
    }
}

impl TryFrom<i32> for Confidence {
    type Error = ConfidenceError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Confidence::Exclude),
            0 => Ok(Confidence::Unknown),
            1 => Ok(Confidence::Low),
            2 => Ok(Confidence::Medium),
            3 => Ok(Confidence::High),
            other => Err(ConfidenceError::InvalidValue(other)),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfidenceError {
    /// Confidence values must lie in -1..=3
    #[error("{0} is not a valid confidence value (allowed: -1, 0, 1, 2, 3)")]
    InvalidValue(i32),
    /// `not` has no meaning for confidence evaluation
    #[error("GPR rules with `not` operations cannot be scored for confidence")]
    UnsupportedOperation,
}

/// Strip transcript dot-notation from a gene id
///
/// `"ENSG01.2"` refers to a transcript of `"ENSG01"`; confidences are keyed
/// by the bare gene id.
pub fn format_gid(gid: &str) -> String {
    match gid.split_once('.') {
        Some((base, rest)) if rest.chars().all(|c| c.is_ascii_digit()) => base.to_string(),
        _ => gid.to_string(),
    }
}

/// Calculate the confidence of a reaction from its GPR rule
///
/// `and` nodes evaluate to the minimum of their children, `or` nodes to the
/// maximum; a gene missing from `gene_confidence` (and a missing rule)
/// defaults to [`Confidence::Unknown`]. Pure function, no side effects.
pub fn reaction_confidence(
    gpr: Option<&Gpr>,
    gene_confidence: &IndexMap<String, Confidence>,
) -> Result<Confidence, ConfidenceError> {
    match gpr {
        Some(rule) => eval_gpr_confidence(rule, gene_confidence),
        None => Ok(Confidence::Unknown),
    }
}

fn eval_gpr_confidence(
    gpr: &Gpr,
    gene_confidence: &IndexMap<String, Confidence>,
) -> Result<Confidence, ConfidenceError> {
    match gpr {
        Gpr::Operation(op) => match op {
            GprOperation::Or { left, right } => {
                let l = eval_gpr_confidence(left, gene_confidence)?;
                let r = eval_gpr_confidence(right, gene_confidence)?;
                Ok(l.max(r))
            }
            GprOperation::And { left, right } => {
                let l = eval_gpr_confidence(left, gene_confidence)?;
                let r = eval_gpr_confidence(right, gene_confidence)?;
                Ok(l.min(r))
            }
            GprOperation::Not { .. } => Err(ConfidenceError::UnsupportedOperation),
        },
        Gpr::GeneNode(gene) => Ok(gene_confidence
            .get(&format_gid(gene))
            .copied()
            .unwrap_or(Confidence::Unknown)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::gene::GprOperatorType;

    fn gene_confidences() -> IndexMap<String, Confidence> {
        let mut conf = IndexMap::new();
        conf.insert("g1".to_string(), Confidence::Exclude);
        conf.insert("g2".to_string(), Confidence::Low);
        conf.insert("g3".to_string(), Confidence::Medium);
        conf.insert("g4".to_string(), Confidence::High);
        conf
    }

    fn gene(id: &str) -> Gpr {
        Gpr::new_gene_node(id)
    }

    #[test]
    fn and_is_min_or_is_max() {
        let conf = gene_confidences();

        // g1 and g2 or g3 parses as (g1 and g2) or g3
        let rule = Gpr::or(Gpr::and(gene("g1"), gene("g2")), gene("g3"));
        assert_eq!(
            reaction_confidence(Some(&rule), &conf).unwrap(),
            Confidence::Medium
        );

        // g1 and (g2 or g3)
        let rule = Gpr::and(gene("g1"), Gpr::or(gene("g2"), gene("g3")));
        assert_eq!(
            reaction_confidence(Some(&rule), &conf).unwrap(),
            Confidence::Exclude
        );

        // g1 or g2 or g4 or g5 (g5 unknown)
        let rule = Gpr::or(
            Gpr::or(Gpr::or(gene("g1"), gene("g2")), gene("g4")),
            gene("g5"),
        );
        assert_eq!(
            reaction_confidence(Some(&rule), &conf).unwrap(),
            Confidence::High
        );

        // g3 and g6 (g6 unknown)
        let rule = Gpr::and(gene("g3"), gene("g6"));
        assert_eq!(
            reaction_confidence(Some(&rule), &conf).unwrap(),
            Confidence::Unknown
        );
    }

    #[test]
    fn missing_rule_is_unknown() {
        let conf = gene_confidences();
        assert_eq!(
            reaction_confidence(None, &conf).unwrap(),
            Confidence::Unknown
        );
    }

    #[test]
    fn transcripts_share_gene_confidence() {
        let conf = gene_confidences();
        let rule = gene("g4.2");
        assert_eq!(
            reaction_confidence(Some(&rule), &conf).unwrap(),
            Confidence::High
        );
        // A dotted suffix that isn't a transcript number is its own id
        assert_eq!(format_gid("g4.x"), "g4.x");
        assert_eq!(format_gid("g4."), "g4");
    }

    #[test]
    fn not_rules_are_rejected() {
        let conf = gene_confidences();
        let rule = Gpr::new_unary_operation(GprOperatorType::Not, gene("g4")).unwrap();
        assert_eq!(
            reaction_confidence(Some(&rule), &conf),
            Err(ConfidenceError::UnsupportedOperation)
        );
    }

    #[test]
    fn numeric_round_trip() {
        for value in -1..=3 {
            assert_eq!(Confidence::try_from(value).unwrap().value(), value);
        }
        assert!(Confidence::try_from(4).is_err());
        assert!(Confidence::try_from(-2).is_err());
    }

    #[test]
    fn ordering_matches_numeric_scale() {
        assert!(Confidence::Exclude < Confidence::Unknown);
        assert!(Confidence::Unknown < Confidence::Low);
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
    }
}
