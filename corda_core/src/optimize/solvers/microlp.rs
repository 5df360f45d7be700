//! Implements a solver interface for the microlp simplex solver
//!
//! microlp returns vertex (basic) solutions, which the minimal-support
//! searches of the reconstruction rely on: on a degenerate optimal face a
//! vertex names one pathway, not a blend of all of them. This is the default
//! backend.

use indexmap::IndexMap;
use microlp::{ComparisonOp, OptimizationDirection, Problem as LpProblem};

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::{Problem, RowKind};
use crate::optimize::solvers::{SolverBackend, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

pub(crate) struct MicrolpSolver;

impl SolverBackend for MicrolpSolver {
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let direction = match problem.objective().get_sense() {
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
        };
        let mut lp = LpProblem::new(direction);

        // Variables, in column order; bounds are read fresh from the problem
        let mut columns = Vec::with_capacity(problem.num_variables());
        let mut ids = Vec::with_capacity(problem.num_variables());
        for variable in problem.variables() {
            let coefficient = problem.objective().get_coefficient(&variable.id);
            columns.push(lp.add_var(coefficient, (variable.lower_bound, variable.upper_bound)));
            ids.push(variable.id.clone());
        }

        // Constraint rows from the cached assembly
        for row in &problem.assembly().rows {
            let terms: Vec<_> = row
                .terms
                .iter()
                .map(|(column, coefficient)| (columns[*column], *coefficient))
                .collect();
            match row.kind {
                RowKind::Equality(equals) => {
                    lp.add_constraint(terms.as_slice(), ComparisonOp::Eq, equals);
                }
                RowKind::Range(lower, upper) => {
                    if lower.is_finite() {
                        lp.add_constraint(terms.as_slice(), ComparisonOp::Ge, lower);
                    }
                    if upper.is_finite() {
                        lp.add_constraint(terms.as_slice(), ComparisonOp::Le, upper);
                    }
                }
            }
        }

        match lp.solve() {
            Ok(solution) => {
                let mut values = IndexMap::with_capacity(ids.len());
                for (id, column) in ids.into_iter().zip(columns) {
                    values.insert(id, solution[column]);
                }
                Ok(ProblemSolution {
                    status: OptimizationStatus::Optimal,
                    objective_value: Some(solution.objective()),
                    variable_values: Some(values),
                })
            }
            Err(microlp::Error::Infeasible) => {
                Ok(ProblemSolution::failed(OptimizationStatus::Infeasible))
            }
            Err(microlp::Error::Unbounded) => {
                Ok(ProblemSolution::failed(OptimizationStatus::Unbounded))
            }
            Err(other) => Err(SolverError::Backend(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_a_small_lp() {
        // min x + 2y subject to x + y = 10, 0 <= x <= 6, 0 <= y <= 10
        let mut problem = Problem::new_minimization();
        problem.add_new_variable("x", 0., 6.).unwrap();
        problem.add_new_variable("y", 0., 10.).unwrap();
        problem
            .add_new_equality_constraint("sum", &[("x", 1.), ("y", 1.)], 10.)
            .unwrap();
        problem.set_objective_coefficient("x", 1.).unwrap();
        problem.set_objective_coefficient("y", 2.).unwrap();

        let solution = problem
            .optimize_with(crate::configuration::Solver::Microlp)
            .unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        assert!((solution.objective_value.unwrap() - 14.).abs() < 1e-6);
        let values = solution.variable_values.unwrap();
        assert!((values["x"] - 6.).abs() < 1e-6);
        assert!((values["y"] - 4.).abs() < 1e-6);
    }

    #[test]
    fn reports_infeasible_as_status() {
        // x >= 5 conflicts with x + 0y = 1
        let mut problem = Problem::new_minimization();
        problem.add_new_variable("x", 5., 10.).unwrap();
        problem
            .add_new_equality_constraint("fix", &[("x", 1.)], 1.)
            .unwrap();
        let solution = problem
            .optimize_with(crate::configuration::Solver::Microlp)
            .unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
        assert!(solution.objective_value.is_none());
    }

    #[test]
    fn maximizes_when_asked() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", 0., 7.).unwrap();
        problem
            .add_new_inequality_constraint("cap", &[("x", 1.)], 0., 5.)
            .unwrap();
        problem.set_objective_coefficient("x", 1.).unwrap();
        let solution = problem
            .optimize_with(crate::configuration::Solver::Microlp)
            .unwrap();
        assert!((solution.objective_value.unwrap() - 5.).abs() < 1e-6);
    }
}
