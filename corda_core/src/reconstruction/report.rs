//! Summaries of a reconstruction run

use std::fmt;
use std::fmt::Display;

use serde::Serialize;

/// Outcome of a build, as reported to the user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BuildStatus {
    /// `build` has not run yet
    NotBuilt,
    /// Every high confidence requirement carries its required flux
    Complete,
    /// The build failed on a high confidence requirement
    Incomplete,
}

impl Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStatus::NotBuilt => write!(f, "not built"),
            BuildStatus::Complete => write!(f, "reconstruction complete"),
            BuildStatus::Incomplete => write!(f, "reconstruction incomplete"),
        }
    }
}

/// Included/total counts for one confidence category
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub included: usize,
    pub total: usize,
}

impl Display for TierCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.included, self.total)
    }
}

/// A structured summary of a reconstruction
///
/// Counts are per reaction when `reversible` is set (a reaction is included
/// when either of its directions is) and per direction variable otherwise.
/// Demand pseudo-reactions count towards `total` and the high category.
#[derive(Clone, Debug, Serialize)]
pub struct ReconstructionSummary {
    pub status: BuildStatus,
    pub reversible: bool,
    /// All entries, demand pseudo-reactions included
    pub total: usize,
    /// Entries included in the reconstruction
    pub included: usize,
    pub unclear: TierCounts,
    pub exclude: TierCounts,
    pub low_medium: TierCounts,
    pub high: TierCounts,
}

impl Display for ReconstructionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "build status: {}", self.status)?;
        if self.status == BuildStatus::NotBuilt {
            writeln!(f, "#reactions (including demands): {}", self.total)?;
            writeln!(f, "Reaction confidence:")?;
            writeln!(f, " - unclear: {}", self.unclear.total)?;
            writeln!(f, " - exclude: {}", self.exclude.total)?;
            writeln!(f, " - low and medium: {}", self.low_medium.total)?;
            write!(f, " - high: {}", self.high.total)
        } else {
            writeln!(f, "Inc. reactions: {}/{}", self.included, self.total)?;
            writeln!(f, " - unclear: {}", self.unclear)?;
            writeln!(f, " - exclude: {}", self.exclude)?;
            writeln!(f, " - low and medium: {}", self.low_medium)?;
            write!(f, " - high: {}", self.high)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_built_lists_category_totals() {
        let summary = ReconstructionSummary {
            status: BuildStatus::NotBuilt,
            reversible: true,
            total: 6,
            included: 0,
            unclear: TierCounts { included: 0, total: 1 },
            exclude: TierCounts { included: 0, total: 1 },
            low_medium: TierCounts { included: 0, total: 3 },
            high: TierCounts { included: 0, total: 1 },
        };
        let text = summary.to_string();
        assert!(text.contains("build status: not built"));
        assert!(text.contains("#reactions (including demands): 6"));
        assert!(text.contains(" - low and medium: 3"));
    }

    #[test]
    fn built_lists_inclusion_ratios() {
        let summary = ReconstructionSummary {
            status: BuildStatus::Complete,
            reversible: true,
            total: 6,
            included: 4,
            unclear: TierCounts { included: 0, total: 1 },
            exclude: TierCounts { included: 0, total: 1 },
            low_medium: TierCounts { included: 3, total: 3 },
            high: TierCounts { included: 1, total: 1 },
        };
        let text = summary.to_string();
        assert!(text.contains("build status: reconstruction complete"));
        assert!(text.contains("Inc. reactions: 4/6"));
        assert!(text.contains(" - low and medium: 3/3"));
    }

    #[test]
    fn summaries_serialize_to_json() {
        let summary = ReconstructionSummary {
            status: BuildStatus::Complete,
            reversible: true,
            total: 6,
            included: 4,
            unclear: TierCounts::default(),
            exclude: TierCounts::default(),
            low_medium: TierCounts { included: 3, total: 3 },
            high: TierCounts { included: 1, total: 1 },
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["status"], "Complete");
        assert_eq!(value["included"], 4);
        assert_eq!(value["high"]["total"], 1);
    }
}
