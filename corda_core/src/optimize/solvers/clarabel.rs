//! Implements a solver interface for Clarabel
//!
//! Clarabel is an interior point conic solver; the LP is lowered to
//! `min q'x  s.t.  Ax + s = b,  s in ZeroCone x NonnegativeCone`. Interior
//! point optima sit in the middle of degenerate optimal faces, so this
//! backend is offered as an alternative rather than the default (see the
//! microlp backend).

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettings, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use indexmap::IndexMap;

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::{Problem, RowKind};
use crate::optimize::solvers::{SolverBackend, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

pub(crate) struct ClarabelSolver;

impl SolverBackend for ClarabelSolver {
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let n = problem.num_variables();

        // Objective vector; Clarabel always minimizes
        let maximize = problem.objective().get_sense() == ObjectiveSense::Maximize;
        let mut q = vec![0.0; n];
        let mut ids = Vec::with_capacity(n);
        for variable in problem.variables() {
            let mut coefficient = problem.objective().get_coefficient(&variable.id);
            if maximize {
                coefficient = -coefficient;
            }
            q[variable.index] = coefficient;
            ids.push(variable.id.clone());
        }

        // Rows: equalities (zero cone) first, then one-sided inequalities and
        // variable bound rows (nonnegative cone)
        let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut b: Vec<f64> = Vec::new();
        let push_row = |columns: &mut Vec<Vec<(usize, f64)>>,
                            b: &mut Vec<f64>,
                            terms: &[(usize, f64)],
                            scale: f64,
                            rhs: f64| {
            let row = b.len();
            for (column, coefficient) in terms {
                columns[*column].push((row, scale * coefficient));
            }
            b.push(rhs);
        };

        let assembly = problem.assembly();
        for row in &assembly.rows[..assembly.num_equalities] {
            if let RowKind::Equality(equals) = row.kind {
                push_row(&mut columns, &mut b, &row.terms, 1.0, equals);
            }
        }
        let num_equalities = b.len();
        for row in &assembly.rows[assembly.num_equalities..] {
            if let RowKind::Range(lower, upper) = row.kind {
                if upper.is_finite() {
                    push_row(&mut columns, &mut b, &row.terms, 1.0, upper);
                }
                if lower.is_finite() {
                    push_row(&mut columns, &mut b, &row.terms, -1.0, -lower);
                }
            }
        }
        for variable in problem.variables() {
            let term = [(variable.index, 1.0)];
            if variable.upper_bound.is_finite() {
                push_row(&mut columns, &mut b, &term, 1.0, variable.upper_bound);
            }
            if variable.lower_bound.is_finite() {
                push_row(&mut columns, &mut b, &term, -1.0, -variable.lower_bound);
            }
        }

        // Flatten the per-column entries into CSC form
        let num_rows = b.len();
        let mut colptr = Vec::with_capacity(n + 1);
        let mut rowval = Vec::new();
        let mut nzval = Vec::new();
        colptr.push(0);
        for column in columns {
            for (row, value) in column {
                rowval.push(row);
                nzval.push(value);
            }
            colptr.push(rowval.len());
        }
        let a = CscMatrix::new(num_rows, n, colptr, rowval, nzval);
        let p = CscMatrix::zeros((n, n));

        let mut cones: Vec<SupportedConeT<f64>> = Vec::new();
        if num_equalities > 0 {
            cones.push(SupportedConeT::ZeroConeT(num_equalities));
        }
        if num_rows > num_equalities {
            cones.push(SupportedConeT::NonnegativeConeT(num_rows - num_equalities));
        }

        let settings = DefaultSettings {
            verbose: false,
            ..DefaultSettings::default()
        };
        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = match solver.solution.status {
            SolverStatus::Solved => OptimizationStatus::Optimal,
            SolverStatus::AlmostSolved => OptimizationStatus::AlmostOptimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                OptimizationStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                OptimizationStatus::Unbounded
            }
            SolverStatus::NumericalError => OptimizationStatus::NumericalError,
            _ => OptimizationStatus::SolverHalted,
        };
        if !matches!(
            status,
            OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal
        ) {
            return Ok(ProblemSolution::failed(status));
        }

        let mut objective_value = solver.solution.obj_val;
        if maximize {
            objective_value = -objective_value;
        }
        let mut values = IndexMap::with_capacity(n);
        for (index, id) in ids.into_iter().enumerate() {
            values.insert(id, solver.solution.x[index]);
        }
        Ok(ProblemSolution {
            status,
            objective_value: Some(objective_value),
            variable_values: Some(values),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Solver;

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

        let solution = problem.optimize_with(Solver::Clarabel).unwrap();
        assert!(solution.is_optimal());
        assert!((solution.objective_value.unwrap() - 14.).abs() < 1e-4);
        let values = solution.variable_values.unwrap();
        assert!((values["x"] - 6.).abs() < 1e-4);
        assert!((values["y"] - 4.).abs() < 1e-4);
    }

    #[test]
    fn reports_infeasible_as_status() {
        let mut problem = Problem::new_minimization();
        problem.add_new_variable("x", 5., 10.).unwrap();
        problem
            .add_new_equality_constraint("fix", &[("x", 1.)], 1.)
            .unwrap();
        let solution = problem.optimize_with(Solver::Clarabel).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
    }
}
