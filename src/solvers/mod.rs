//! The interface between a [Problem] and concrete nonlinear solvers.
//!
//! Solver libraries (IPOPT, SNOPT, ...) expect a flat callback surface:
//! raw arrays for the iterate, bounds and constraint values, and the
//! constraint Jacobian in coordinate/triplet form with a pattern queried
//! once. [FlatProblem] is that surface, expressed with caller-supplied
//! output slices; it is implemented for [Problem] so an adapter never
//! needs to know about variable sets, constraint sets or cost terms.
use std::fmt::{Display, Formatter};

use crate::problem::Problem;

/// The flat callback surface of a sparse nonlinear solver.
///
/// All slice arguments are caller-allocated with the documented lengths:
/// `n = num_variables()`, `m = num_constraints()`, `nnz = jacobian_nnz()`.
/// Evaluation methods take `&mut self` because evaluating moves the
/// problem's current point to `x`.
pub trait FlatProblem {
    /// Number of optimization variables, `n`.
    fn num_variables(&self) -> usize;

    /// Writes the variable bounds into `x_l` and `x_u` (length `n` each).
    fn variable_bounds(&self, x_l: &mut [f64], x_u: &mut [f64]);

    /// Writes the starting point into `x` (length `n`).
    fn initial_point(&self, x: &mut [f64]);

    /// The objective value `f(x)`.
    fn objective(&mut self, x: &[f64]) -> f64;

    /// Writes the objective gradient `∇f(x)` into `grad` (length `n`).
    fn objective_grad(&mut self, x: &[f64], grad: &mut [f64]);

    /// Number of constraint rows, `m`.
    fn num_constraints(&self) -> usize;

    /// Writes the constraint bounds into `g_l` and `g_u` (length `m` each).
    fn constraint_bounds(&self, g_l: &mut [f64], g_u: &mut [f64]);

    /// Writes the constraint values `g(x)` into `g` (length `m`).
    fn constraints(&mut self, x: &[f64], g: &mut [f64]);

    /// Number of structural nonzeros in the constraint Jacobian, `nnz`.
    fn jacobian_nnz(&mut self) -> usize;

    /// Writes the Jacobian coordinates into `rows` and `cols`
    /// (length `nnz` each). Queried once per solve.
    fn jacobian_indices(&mut self, rows: &mut [usize], cols: &mut [usize]);

    /// Writes the Jacobian values at `x` into `values` (length `nnz`),
    /// in the order reported by [FlatProblem::jacobian_indices].
    fn jacobian_values(&mut self, x: &[f64], values: &mut [f64]);
}

impl FlatProblem for Problem {
    fn num_variables(&self) -> usize {
        Problem::num_variables(self)
    }

    fn variable_bounds(&self, x_l: &mut [f64], x_u: &mut [f64]) {
        for (i, bound) in Problem::variable_bounds(self).into_iter().enumerate() {
            x_l[i] = bound.min;
            x_u[i] = bound.max;
        }
    }

    fn initial_point(&self, x: &mut [f64]) {
        x.copy_from_slice(&self.starting_values());
    }

    fn objective(&mut self, x: &[f64]) -> f64 {
        self.eval_cost(x)
    }

    fn objective_grad(&mut self, x: &[f64], grad: &mut [f64]) {
        grad.copy_from_slice(&self.eval_cost_gradient(x));
    }

    fn num_constraints(&self) -> usize {
        Problem::num_constraints(self)
    }

    fn constraint_bounds(&self, g_l: &mut [f64], g_u: &mut [f64]) {
        for (i, bound) in Problem::constraint_bounds(self).into_iter().enumerate() {
            g_l[i] = bound.min;
            g_u[i] = bound.max;
        }
    }

    fn constraints(&mut self, x: &[f64], g: &mut [f64]) {
        g.copy_from_slice(&self.eval_constraints(x));
    }

    fn jacobian_nnz(&mut self) -> usize {
        Problem::jacobian_nnz(self)
    }

    fn jacobian_indices(&mut self, rows: &mut [usize], cols: &mut [usize]) {
        for (i, &(row, col)) in self.jacobian_sparsity().iter().enumerate() {
            rows[i] = row;
            cols[i] = col;
        }
    }

    fn jacobian_values(&mut self, x: &[f64], values: &mut [f64]) {
        self.eval_jacobian_values(x, values);
    }
}

/// A solver that can drive a [Problem] to a solution through its
/// [FlatProblem] surface, leaving the solution in the problem's variable
/// sets.
pub trait Solver {
    /// Runs the solver until convergence or failure. Implementations
    /// should call [Problem::save_current] once per accepted iterate.
    fn solve(&mut self, problem: &mut Problem) -> Result<(), ResolutionError>;
}

/// Represents an error that occurred while solving a problem.
#[derive(Debug, PartialEq, Clone)]
pub enum ResolutionError {
    /// The problem is unbounded: the cost can be made arbitrarily small
    /// without violating any constraint.
    Unbounded,
    /// There exists no point satisfying all of the constraints.
    Infeasible,
    /// The solver gave up before converging.
    IterationLimit,
    /// Another error occurred.
    Other(&'static str),
}

impl Display for ResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionError::Unbounded => write!(f, "unbounded: the cost can decrease forever"),
            ResolutionError::Infeasible => write!(f, "infeasible: no point satisfies all constraints"),
            ResolutionError::IterationLimit => write!(f, "the iteration limit was reached"),
            ResolutionError::Other(msg) => write!(f, "unexpected solver error: {}", msg),
        }
    }
}

impl std::error::Error for ResolutionError {}
