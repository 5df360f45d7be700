//! Provides struct representing a linear optimization problem
use indexmap::IndexMap;
use thiserror::Error;

use crate::configuration::{Solver, CONFIGURATION};
use crate::optimize::constraint::Constraint;
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::solvers::clarabel::ClarabelSolver;
use crate::optimize::solvers::microlp::MicrolpSolver;
use crate::optimize::solvers::{SolverBackend, SolverError};
use crate::optimize::variable::Variable;
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// A linear optimization problem
///
/// The reconstruction loop solves the same structural problem hundreds to
/// thousands of times with different objective coefficients and variable
/// bounds. To keep the repeated solves cheap, the constraint rows are lowered
/// into an index-resolved sparse form once ([`RowAssembly`]) and cached;
/// bounds, objective, and right hand sides are read fresh on every solve,
/// and only structural edits (adding or removing variables or constraints)
/// invalidate the cache.
#[derive(Debug, Clone)]
pub struct Problem {
    /// Objective to optimize
    objective: Objective,
    /// Variables of the optimization problem
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem
    constraints: IndexMap<String, Constraint>,
    /// Current status of the optimization problem
    status: OptimizationStatus,
    /// Cached sparse row form of the constraints, None when stale
    assembly: Option<RowAssembly>,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem
    pub fn new(objective_sense: ObjectiveSense) -> Self {
        Self {
            objective: Objective::new(objective_sense),
            variables: IndexMap::new(),
            constraints: IndexMap::new(),
            status: OptimizationStatus::Unoptimized,
            assembly: None,
        }
    }

    /// Create a new maximization problem
    pub fn new_maximization() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new minimization problem
    pub fn new_minimization() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }
    // endregion Creation Functions

    // region Adding Variables
    /// Add a variable to the optimization problem
    pub fn add_variable(&mut self, mut variable: Variable) -> Result<(), ProblemError> {
        if self.variables.contains_key(&variable.id) {
            return Err(ProblemError::VariableIdAlreadyExists);
        }
        if variable.lower_bound > variable.upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        variable.index = self.variables.len();
        self.variables.insert(variable.id.clone(), variable);
        self.assembly = None;
        Ok(())
    }

    /// Create a new variable and add it to the optimization problem
    pub fn add_new_variable(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        self.add_variable(Variable::new(id, lower_bound, upper_bound))
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Add a constraint to the problem
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ProblemError> {
        self.validate_constraint(&constraint)?;
        self.constraints
            .insert(constraint.get_id().to_string(), constraint);
        self.assembly = None;
        Ok(())
    }

    /// Create a new equality constraint and add it to the problem
    pub fn add_new_equality_constraint(
        &mut self,
        id: &str,
        terms: &[(&str, f64)],
        equals: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(Constraint::new_equality(id, terms, equals))
    }

    /// Create a new inequality constraint and add it to the problem
    pub fn add_new_inequality_constraint(
        &mut self,
        id: &str,
        terms: &[(&str, f64)],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(Constraint::new_inequality(id, terms, lower_bound, upper_bound))
    }
    // endregion Adding Constraints

    // region Objective
    /// Update the objective sense of the problem
    pub fn update_objective_sense(&mut self, sense: ObjectiveSense) {
        self.objective.set_sense(sense);
    }

    /// Set the objective coefficient of a variable
    pub fn set_objective_coefficient(
        &mut self,
        variable_id: &str,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        if !self.variables.contains_key(variable_id) {
            return Err(ProblemError::NonExistentVariablesInObjective);
        }
        self.objective.set_coefficient(variable_id, coefficient);
        Ok(())
    }

    /// Remove all terms from the objective
    pub fn clear_objective(&mut self) {
        self.objective.clear();
    }

    /// Access the objective
    pub fn objective(&self) -> &Objective {
        &self.objective
    }
    // endregion Objective

    // region Variable Access
    /// Update the bounds of a variable
    ///
    /// Bound updates do not invalidate the cached assembly.
    pub fn update_variable_bounds(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        match self.variables.get_mut(id) {
            Some(var) => {
                var.lower_bound = lower_bound;
                var.upper_bound = upper_bound;
                Ok(())
            }
            None => Err(ProblemError::NonExistentVariable),
        }
    }

    /// Get the bounds of a variable
    pub fn variable_bounds(&self, id: &str) -> Result<(f64, f64), ProblemError> {
        match self.variables.get(id) {
            Some(var) => Ok((var.lower_bound, var.upper_bound)),
            None => Err(ProblemError::NonExistentVariable),
        }
    }

    /// Whether a variable with the given id exists
    pub fn contains_variable(&self, id: &str) -> bool {
        self.variables.contains_key(id)
    }

    /// Iterate over the variable ids in insertion order
    pub fn variable_ids(&self) -> impl Iterator<Item = &String> {
        self.variables.keys()
    }

    /// Number of variables in the problem
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Number of constraints in the problem
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub(crate) fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }
    // endregion Variable Access

    // region Removal
    /// Remove a variable from the problem, along with all constraint and
    /// objective terms referencing it
    pub fn delete_variable(&mut self, variable_id: &str) -> Result<(), ProblemError> {
        if self.variables.shift_remove(variable_id).is_none() {
            return Err(ProblemError::NonExistentVariable);
        }
        self.objective.set_coefficient(variable_id, 0.0);
        for constraint in self.constraints.values_mut() {
            match constraint {
                Constraint::Equality { terms, .. } | Constraint::Inequality { terms, .. } => {
                    terms.retain(|t| t.variable != variable_id);
                }
            }
        }
        // Re-pack the column indices
        for (index, var) in self.variables.values_mut().enumerate() {
            var.index = index;
        }
        self.assembly = None;
        Ok(())
    }

    /// Remove a constraint (by id) from the problem
    pub fn remove_constraint(&mut self, constraint_id: &str) {
        self.constraints.shift_remove(constraint_id);
        self.assembly = None;
    }
    // endregion Removal

    // region Validation Functions
    /// Check that a constraint to be added is valid to add to this Problem
    fn validate_constraint(&self, constraint: &Constraint) -> Result<(), ProblemError> {
        if self.constraints.contains_key(constraint.get_id()) {
            return Err(ProblemError::ConstraintAlreadyExists);
        }
        if let Constraint::Inequality {
            lower_bound,
            upper_bound,
            ..
        } = constraint
        {
            if lower_bound > upper_bound {
                return Err(ProblemError::InvalidConstraintBounds);
            }
        }
        for term in constraint.get_terms() {
            if !self.variables.contains_key(&term.variable) {
                return Err(ProblemError::NonExistentVariablesInConstraint);
            }
        }
        Ok(())
    }
    // endregion Validation Functions

    // region Solving
    /// Solve the problem with the globally configured solver
    pub fn optimize(&mut self) -> Result<ProblemSolution, SolverError> {
        let solver = CONFIGURATION.read().unwrap().solver;
        self.optimize_with(solver)
    }

    /// Solve the problem with a specific solver backend
    pub fn optimize_with(&mut self, solver: Solver) -> Result<ProblemSolution, SolverError> {
        self.ensure_assembly();
        let solution = match solver {
            Solver::Microlp => MicrolpSolver.solve(self),
            Solver::Clarabel => ClarabelSolver.solve(self),
        }?;
        self.status = solution.status;
        Ok(solution)
    }

    /// Current status of the problem (status of the most recent solve)
    pub fn status(&self) -> OptimizationStatus {
        self.status
    }
    // endregion Solving

    // region Assembly
    /// Build the cached row assembly if it is stale
    fn ensure_assembly(&mut self) {
        if self.assembly.is_some() {
            return;
        }
        let mut rows: Vec<AssembledRow> = Vec::with_capacity(self.constraints.len());
        // Equality rows first, so conic backends can group them
        for constraint in self.constraints.values() {
            if let Constraint::Equality { terms, equals, .. } = constraint {
                rows.push(AssembledRow {
                    terms: self.resolve_terms(terms),
                    kind: RowKind::Equality(*equals),
                });
            }
        }
        let num_equalities = rows.len();
        for constraint in self.constraints.values() {
            if let Constraint::Inequality {
                terms,
                lower_bound,
                upper_bound,
                ..
            } = constraint
            {
                rows.push(AssembledRow {
                    terms: self.resolve_terms(terms),
                    kind: RowKind::Range(*lower_bound, *upper_bound),
                });
            }
        }
        self.assembly = Some(RowAssembly {
            rows,
            num_equalities,
        });
    }

    fn resolve_terms(
        &self,
        terms: &[crate::optimize::constraint::ConstraintTerm],
    ) -> Vec<(usize, f64)> {
        terms
            .iter()
            .map(|t| (self.variables[&t.variable].index, t.coefficient))
            .collect()
    }

    pub(crate) fn assembly(&self) -> &RowAssembly {
        self.assembly
            .as_ref()
            .expect("assembly must be built before solving")
    }
    // endregion Assembly
}

/// Index-resolved sparse form of the constraints, cached between solves
#[derive(Debug, Clone)]
pub(crate) struct RowAssembly {
    /// All constraint rows, equality rows first
    pub rows: Vec<AssembledRow>,
    /// How many of the leading rows are equalities
    pub num_equalities: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct AssembledRow {
    /// (column index, coefficient) pairs of the row
    pub terms: Vec<(usize, f64)>,
    pub kind: RowKind,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum RowKind {
    /// Row must equal the right hand side
    Equality(f64),
    /// Row must lie between the two bounds
    Range(f64, f64),
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("Tried to add a variable with the same id as an existing variable")]
    VariableIdAlreadyExists,
    /// Error when trying to add variable with invalid bounds
    #[error("Tried to set a variable with lower_bound>upper_bound")]
    InvalidVariableBounds,
    /// Error when trying to add a constraint with the same id as an existing constraint
    #[error("Tried to add a constraint with the same id as an existing constraint")]
    ConstraintAlreadyExists,
    /// Error when trying to add a constraint with invalid bounds
    #[error("Tried to add an inequality constraint with lower_bound > upper_bound")]
    InvalidConstraintBounds,
    /// Error when trying to add a constraint that contains variables not in the problem
    #[error("Tried to add a constraint with variables not in the problem")]
    NonExistentVariablesInConstraint,
    /// Error when trying to add an objective term which includes variables not in the problem
    #[error("Tried adding an objective term with variables not in the problem")]
    NonExistentVariablesInObjective,
    /// Error when trying to perform an update or drop on a variable that doesn't exist
    #[error("Tried to access a variable that doesn't exist")]
    NonExistentVariable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_problem() {
        let max_problem = Problem::new_maximization();
        assert_eq!(
            max_problem.objective().get_sense(),
            ObjectiveSense::Maximize
        );

        let min_problem = Problem::new_minimization();
        assert_eq!(
            min_problem.objective().get_sense(),
            ObjectiveSense::Minimize
        );
    }

    #[test]
    fn add_variables() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", 64., 100.).unwrap();
        problem.add_new_variable("y", 0., 10.).unwrap();

        assert_eq!(problem.num_variables(), 2);
        assert_eq!(problem.variable_bounds("x").unwrap(), (64., 100.));

        // Duplicate ids are rejected
        assert!(matches!(
            problem.add_new_variable("x", 0., 1.),
            Err(ProblemError::VariableIdAlreadyExists)
        ));
    }

    #[test]
    fn add_bad_variable() {
        let mut problem = Problem::new_maximization();
        assert!(matches!(
            problem.add_new_variable("x", 100., 64.),
            Err(ProblemError::InvalidVariableBounds)
        ));
    }

    #[test]
    fn add_constraints() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", 0., 100.).unwrap();
        problem.add_new_variable("y", 0., 100.).unwrap();

        problem
            .add_new_equality_constraint("balance", &[("x", 2.), ("y", 3.)], 200.)
            .unwrap();
        problem
            .add_new_inequality_constraint("range", &[("x", 1.), ("y", 1.)], 10., 20.)
            .unwrap();
        assert_eq!(problem.num_constraints(), 2);

        // Unknown variables are rejected
        assert!(matches!(
            problem.add_new_equality_constraint("bad", &[("z", 1.)], 0.),
            Err(ProblemError::NonExistentVariablesInConstraint)
        ));
        // Reversed bounds are rejected
        assert!(matches!(
            problem.add_new_inequality_constraint("bad", &[("x", 1.)], 200., 100.),
            Err(ProblemError::InvalidConstraintBounds)
        ));
    }

    #[test]
    fn delete_variable_scrubs_terms() {
        let mut problem = Problem::new_minimization();
        problem.add_new_variable("x", 0., 1.).unwrap();
        problem.add_new_variable("y", 0., 1.).unwrap();
        problem
            .add_new_equality_constraint("balance", &[("x", 1.), ("y", -1.)], 0.)
            .unwrap();
        problem.set_objective_coefficient("x", 1.0).unwrap();

        problem.delete_variable("x").unwrap();
        assert!(!problem.contains_variable("x"));
        assert_eq!(problem.objective().get_coefficient("x"), 0.0);
        let remaining = problem.constraints.get("balance").unwrap();
        assert_eq!(remaining.get_terms().len(), 1);
        // Remaining variable indices re-packed
        assert_eq!(problem.variables.get("y").unwrap().index, 0);
    }

    #[test]
    fn assembly_orders_equalities_first() {
        let mut problem = Problem::new_minimization();
        problem.add_new_variable("x", 0., 1.).unwrap();
        problem
            .add_new_inequality_constraint("range", &[("x", 1.)], 0., 1.)
            .unwrap();
        problem
            .add_new_equality_constraint("balance", &[("x", 1.)], 0.)
            .unwrap();
        problem.ensure_assembly();
        let assembly = problem.assembly();
        assert_eq!(assembly.rows.len(), 2);
        assert_eq!(assembly.num_equalities, 1);
        assert!(matches!(assembly.rows[0].kind, RowKind::Equality(_)));
    }

    #[test]
    fn fresh_problems_assemble_on_solve() {
        // No manual assembly step is needed before the first solve
        let mut problem = Problem::new_minimization();
        problem.add_new_variable("x", 0., 2.).unwrap();
        problem
            .add_new_equality_constraint("fix", &[("x", 1.)], 1.)
            .unwrap();
        let solution = problem.optimize().unwrap();
        assert!(solution.is_optimal());
        assert!((solution.variable_values.unwrap()["x"] - 1.).abs() < 1e-6);
    }

    #[test]
    fn bound_updates_keep_assembly() {
        let mut problem = Problem::new_minimization();
        problem.add_new_variable("x", 0., 1.).unwrap();
        problem
            .add_new_equality_constraint("balance", &[("x", 1.)], 0.)
            .unwrap();
        problem.ensure_assembly();
        problem.update_variable_bounds("x", 0., 5.).unwrap();
        assert!(problem.assembly.is_some());

        // Structural edits invalidate
        problem.add_new_variable("y", 0., 1.).unwrap();
        assert!(problem.assembly.is_none());
    }
}
