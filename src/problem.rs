//! The [Problem] owns the structured model and exposes the flat evaluation
//! contract a nonlinear solver expects.
//!
//! A problem lives through two phases. During registration, variable sets,
//! constraint sets and cost terms are added; the flat layouts grow as
//! blocks are registered. The first evaluation freezes the layouts: from
//! then on only *values* change, never counts, bounds or sparsity. Every
//! registration method checks the phase and panics after the freeze,
//! because a layout change mid-solve would corrupt the solver's internal
//! linear algebra.
use sprs::CsMat;

use crate::bound::Bound;
use crate::constraint::{ConstraintContainer, ConstraintReport, ConstraintSet};
use crate::cost::{CostContainer, CostTerm};
use crate::variable::{VariableContainer, VariableSet};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Building,
    Frozen,
}

/// A nonlinear program: variable sets, constraint sets and weighted cost
/// terms, aggregated into the flat vectors and sparse matrices a solver
/// consumes.
///
/// ```
/// # use good_nlp::{Bound, Problem, VariableBlock};
/// let mut problem = Problem::new();
/// problem.add_variable_set(Box::new(
///     VariableBlock::new("x", 2)
///         .bounds(Bound::new(-5., 5.))
///         .initial(&[1., 2.]),
/// ));
/// assert_eq!(problem.num_variables(), 2);
/// assert_eq!(problem.starting_values(), vec![1., 2.]);
/// // No cost terms: a pure feasibility problem evaluates to zero.
/// assert_eq!(problem.eval_cost(&[0., 0.]), 0.);
/// ```
///
/// The evaluation entry points ([Problem::eval_cost],
/// [Problem::eval_cost_gradient], [Problem::eval_constraints],
/// [Problem::eval_jacobian_values]) all re-apply the supplied flat vector
/// before reading anything downstream, so a solver may call them in any
/// order and always observes results consistent with its latest iterate.
#[derive(Default)]
pub struct Problem {
    variables: VariableContainer,
    constraints: ConstraintContainer,
    costs: CostContainer,
    phase: Phase,
    /// Iterates snapshotted by [Problem::save_current], oldest first.
    history: Vec<Vec<f64>>,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Building
    }
}

impl Problem {
    /// Creates an empty problem, in the registration phase.
    pub fn new() -> Self {
        Problem::default()
    }

    // --- registration ---

    /// Registers a variable set. Its variables occupy the next positions
    /// of the flat variable vector.
    ///
    /// # Panics
    /// Panics if any evaluation has already happened.
    pub fn add_variable_set(&mut self, set: Box<dyn VariableSet>) {
        self.assert_building("add a variable set");
        self.variables.add(set);
    }

    /// Registers a constraint set. Its rows occupy the next positions of
    /// the flat constraint vector.
    ///
    /// # Panics
    /// Panics if any evaluation has already happened.
    pub fn add_constraint_set(&mut self, set: Box<dyn ConstraintSet>) {
        self.assert_building("add a constraint set");
        self.constraints.add(set);
    }

    /// Registers a cost term with its weight.
    ///
    /// # Panics
    /// Panics if any evaluation has already happened.
    pub fn add_cost(&mut self, term: Box<dyn CostTerm>, weight: f64) {
        self.assert_building("add a cost term");
        self.costs.add(term, weight);
    }

    fn assert_building(&self, what: &str) {
        assert_eq!(
            self.phase,
            Phase::Building,
            "cannot {} once the problem has been evaluated: \
             the flat layout reported to the solver is frozen",
            what
        );
    }

    // --- layout queries ---

    /// Total number of optimization variables.
    pub fn num_variables(&self) -> usize {
        self.variables.total_len()
    }

    /// The bounds on all variables, in flat order.
    pub fn variable_bounds(&self) -> Vec<Bound> {
        self.variables.bounds()
    }

    /// The current variable values, used as the solver's starting point.
    pub fn starting_values(&self) -> Vec<f64> {
        self.variables.flat_values()
    }

    /// Total number of constraint rows.
    pub fn num_constraints(&self) -> usize {
        self.constraints.total_len()
    }

    /// The bounds on all constraint rows, in flat order.
    pub fn constraint_bounds(&self) -> Vec<Bound> {
        self.constraints.bounds()
    }

    /// True iff at least one cost term is registered.
    pub fn has_cost_terms(&self) -> bool {
        self.costs.has_terms()
    }

    // --- evaluation ---

    /// Overwrites the structured variable sets from a flat vector. This is
    /// the single mutation point deciding which point in variable space
    /// later queries refer to, and the call that freezes the layout.
    ///
    /// # Panics
    /// Panics if `x.len()` differs from [Problem::num_variables].
    pub fn set_variables(&mut self, x: &[f64]) {
        self.phase = Phase::Frozen;
        self.variables.set_from_flat(x);
    }

    /// The cost function value at `x`. Exactly `0.0` when the problem has
    /// no cost terms.
    pub fn eval_cost(&mut self, x: &[f64]) -> f64 {
        self.set_variables(x);
        if !self.costs.has_terms() {
            return 0.;
        }
        self.costs.value(&self.variables)
    }

    /// The cost function gradient at `x`, of length [Problem::num_variables].
    pub fn eval_cost_gradient(&mut self, x: &[f64]) -> Vec<f64> {
        self.set_variables(x);
        self.costs.gradient(&self.variables)
    }

    /// The constraint values at `x`, of length [Problem::num_constraints].
    pub fn eval_constraints(&mut self, x: &[f64]) -> Vec<f64> {
        self.set_variables(x);
        self.constraints.update(&self.variables);
        self.constraints.values().to_vec()
    }

    /// The fixed `(row, col)` coordinates at which the constraint Jacobian
    /// may hold nonzeros. Solvers query this once; the coordinates and
    /// their order then stay valid for every later
    /// [Problem::eval_jacobian_values] call.
    ///
    /// Calling this freezes the layout, like any evaluation.
    pub fn jacobian_sparsity(&mut self) -> &[(usize, usize)] {
        self.phase = Phase::Frozen;
        self.constraints.update(&self.variables);
        self.constraints.sparsity()
    }

    /// Number of structural nonzeros in the constraint Jacobian.
    pub fn jacobian_nnz(&mut self) -> usize {
        self.jacobian_sparsity().len()
    }

    /// Writes the Jacobian values at `x` into `values`, in the exact order
    /// of [Problem::jacobian_sparsity].
    ///
    /// # Panics
    /// Panics if `values.len()` differs from [Problem::jacobian_nnz].
    pub fn eval_jacobian_values(&mut self, x: &[f64], values: &mut [f64]) {
        self.set_variables(x);
        self.constraints.update(&self.variables);
        self.constraints.write_jacobian_values(values);
    }

    /// The full constraint Jacobian at the most recently evaluated point,
    /// assembled as a CSR matrix.
    ///
    /// # Panics
    /// Panics if no evaluation has populated the Jacobian yet.
    pub fn jacobian(&self) -> CsMat<f64> {
        self.constraints.jacobian()
    }

    // --- diagnostics ---

    /// Classifies every constraint row at the current variable values as
    /// satisfied or violated, within `tolerance`. Purely diagnostic: it
    /// never panics on violations and does not move the current point.
    pub fn status_report(&mut self, tolerance: f64) -> ConstraintReport {
        self.phase = Phase::Frozen;
        self.constraints.update(&self.variables);
        self.constraints.report(tolerance)
    }

    /// Prints [Problem::status_report] to stdout.
    pub fn print_status(&mut self, tolerance: f64) {
        println!("{}", self.status_report(tolerance));
    }

    // --- solution access and history ---

    /// Read-only view of the structured variable sets, for extracting the
    /// solution after the solve.
    pub fn variables(&self) -> &VariableContainer {
        &self.variables
    }

    /// The current flat variable values.
    pub fn variable_values(&self) -> Vec<f64> {
        self.variables.flat_values()
    }

    /// Snapshots the current variable values. Solver adapters call this
    /// once per accepted iterate so that intermediate solutions can be
    /// inspected afterwards with [Problem::set_to_iteration].
    pub fn save_current(&mut self) {
        self.history.push(self.variables.flat_values());
    }

    /// Number of snapshots taken so far.
    pub fn iteration_count(&self) -> usize {
        self.history.len()
    }

    /// Restores the variable values snapshotted at `iteration`. Iteration 0
    /// is the first snapshot, typically the solver's starting point.
    ///
    /// # Panics
    /// Panics if `iteration >= self.iteration_count()`.
    pub fn set_to_iteration(&mut self, iteration: usize) {
        assert!(
            iteration < self.history.len(),
            "iteration {} was never saved ({} snapshots exist)",
            iteration,
            self.history.len()
        );
        let snapshot = self.history[iteration].clone();
        self.variables.set_from_flat(&snapshot);
    }
}
