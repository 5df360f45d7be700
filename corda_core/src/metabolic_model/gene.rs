//! This module provides the Gene struct, representing a gene, and the Gpr
//! AST, representing a gene protein reaction rule
use std::fmt::{Display, Formatter};
use std::hash::Hash;

use derive_builder::Builder;
use indexmap::IndexSet;
use thiserror::Error;

/// Structure Representing a Gene
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
pub struct Gene {
    /// Used to identify the gene
    pub id: String,
    /// Human Readable Gene Name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Notes about the gene
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Gene Annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Gene {
    /// Create a new gene with just an id
    pub fn with_id(id: &str) -> Gene {
        GeneBuilder::default().id(id.to_string()).build().unwrap()
    }
}

impl Display for Gene {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl Hash for Gene {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Representation of a Gene Protein Reaction Rule as an AST
///
/// Parsing GPR rule strings into this AST is left to the model reader which
/// produced the [`crate::metabolic_model::model::Model`]; everything in this
/// crate consumes the tree form.
#[derive(Clone, Debug, PartialEq)]
pub enum Gpr {
    /// Operation on two genes (see [`GprOperation`])
    Operation(GprOperation),
    /// A terminal gene Node, holding the gene id
    GeneNode(String),
}

impl Gpr {
    /// Create a new binary operation node
    pub fn new_binary_operation(
        left: Gpr,
        operator: GprOperatorType,
        right: Gpr,
    ) -> Result<Gpr, GprError> {
        let op = match operator {
            GprOperatorType::Or => GprOperation::Or {
                left: Box::new(left),
                right: Box::new(right),
            },
            GprOperatorType::And => GprOperation::And {
                left: Box::new(left),
                right: Box::new(right),
            },
            GprOperatorType::Not => return Err(GprError::InvalidBinaryOp),
        };
        Ok(Gpr::Operation(op))
    }

    /// Create a new unary operation node
    pub fn new_unary_operation(operator: GprOperatorType, operand: Gpr) -> Result<Gpr, GprError> {
        let op = match operator {
            GprOperatorType::Not => GprOperation::Not {
                val: Box::new(operand),
            },
            _ => return Err(GprError::InvalidUnaryOp),
        };
        Ok(Gpr::Operation(op))
    }

    /// Create a new gene node
    pub fn new_gene_node(gene: &str) -> Gpr {
        Gpr::GeneNode(gene.to_string())
    }

    /// Shorthand for an `and` node over two subtrees
    pub fn and(left: Gpr, right: Gpr) -> Gpr {
        Gpr::Operation(GprOperation::And {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Shorthand for an `or` node over two subtrees
    pub fn or(left: Gpr, right: Gpr) -> Gpr {
        Gpr::Operation(GprOperation::Or {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Collect the ids of all genes appearing in the rule
    pub fn genes(&self) -> IndexSet<String> {
        let mut found = IndexSet::new();
        self.collect_genes(&mut found);
        found
    }

    fn collect_genes(&self, found: &mut IndexSet<String>) {
        match self {
            Gpr::Operation(op) => match op {
                GprOperation::Or { left, right } | GprOperation::And { left, right } => {
                    left.collect_genes(found);
                    right.collect_genes(found);
                }
                GprOperation::Not { val } => val.collect_genes(found),
            },
            Gpr::GeneNode(gene) => {
                found.insert(gene.clone());
            }
        }
    }

    /// Generate a GPR string with gene ids from the GPR AST
    pub fn to_string_id(&self) -> String {
        match self {
            Gpr::Operation(op) => match op {
                GprOperation::Or { left, right } => {
                    format!("({} or {})", left.to_string_id(), right.to_string_id())
                }
                GprOperation::And { left, right } => {
                    format!("({} and {})", left.to_string_id(), right.to_string_id())
                }
                GprOperation::Not { val } => {
                    format!("(not {})", val)
                }
            },
            Gpr::GeneNode(gene) => gene.to_string(),
        }
    }
}

impl Display for Gpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_id())
    }
}

/// Possible operations on genes
#[derive(Clone, Debug, PartialEq)]
pub enum GprOperation {
    Or { left: Box<Gpr>, right: Box<Gpr> },
    And { left: Box<Gpr>, right: Box<Gpr> },
    Not { val: Box<Gpr> },
}

/// Types of Allowed GPR Operations
pub enum GprOperatorType {
    /// Or, results in active if either left or right are active
    Or,
    /// And, results in active if both left and right are active
    And,
    /// Not, results in active if val is inactive
    Not,
}

#[derive(Clone, Debug, Error)]
pub enum GprError {
    #[error("Invalid Binary Operation")]
    InvalidBinaryOp,
    #[error("Invalid Unary Operation")]
    InvalidUnaryOp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let single = Gpr::new_gene_node("Rv0001");
        assert_eq!(format!("{}", single), "Rv0001");

        let nested = Gpr::or(
            Gpr::and(Gpr::new_gene_node("Rv0001"), Gpr::new_gene_node("Rv0002")),
            Gpr::new_gene_node("Rv0003"),
        );
        assert_eq!(format!("{}", nested), "((Rv0001 and Rv0002) or Rv0003)");
    }

    #[test]
    fn collect_genes() {
        let gpr = Gpr::and(
            Gpr::new_gene_node("g1"),
            Gpr::or(Gpr::new_gene_node("g2"), Gpr::new_gene_node("g1")),
        );
        let genes = gpr.genes();
        assert_eq!(genes.len(), 2);
        assert!(genes.contains("g1"));
        assert!(genes.contains("g2"));
    }

    #[test]
    fn not_is_not_binary() {
        let left = Gpr::new_gene_node("g1");
        let right = Gpr::new_gene_node("g2");
        assert!(Gpr::new_binary_operation(left, GprOperatorType::Not, right).is_err());
    }
}
