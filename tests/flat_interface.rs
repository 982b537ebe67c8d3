//! Exercises the solver-facing callback surface the way an adapter for a
//! sparse NLP solver would: sizes and bounds first, the sparsity pattern
//! once, then repeated value queries with caller-allocated buffers.
use float_eq::assert_float_eq;
use good_nlp::{
    Bound, ConstraintSet, CostTerm, FlatProblem, Problem, VariableBlock, VariableContainer,
};
use sprs::TriMat;

/// minimise x0² + x1²
struct SquaredNorm;

impl CostTerm for SquaredNorm {
    fn name(&self) -> &str {
        "squared_norm"
    }
    fn value(&self, vars: &VariableContainer) -> f64 {
        vars.flat_values().iter().map(|x| x * x).sum()
    }
    fn gradient(&self, vars: &VariableContainer) -> Vec<f64> {
        vars.flat_values().iter().map(|x| 2. * x).collect()
    }
}

/// x0 + x1 == 1
struct SumToOne;

impl ConstraintSet for SumToOne {
    fn name(&self) -> &str {
        "sum_to_one"
    }
    fn len(&self) -> usize {
        1
    }
    fn bounds(&self) -> Vec<Bound> {
        vec![Bound::fixed(1.)]
    }
    fn values(&self, vars: &VariableContainer) -> Vec<f64> {
        let x = vars.flat_values();
        vec![x[0] + x[1]]
    }
    fn jacobian(&self, vars: &VariableContainer) -> TriMat<f64> {
        let mut block = TriMat::new((1, vars.total_len()));
        block.add_triplet(0, 0, 1.);
        block.add_triplet(0, 1, 1.);
        block
    }
}

fn build() -> Problem {
    let mut problem = Problem::new();
    problem.add_variable_set(Box::new(
        VariableBlock::new("x", 2)
            .bounds(Bound::new(-10., 10.))
            .initial(&[2., -1.]),
    ));
    problem.add_cost(Box::new(SquaredNorm), 1.);
    problem.add_constraint_set(Box::new(SumToOne));
    problem
}

#[test]
fn callback_sequence_with_buffers() {
    let mut problem = build();

    // An adapter queries the shape of the problem first.
    let n = FlatProblem::num_variables(&problem);
    let m = FlatProblem::num_constraints(&problem);
    assert_eq!((n, m), (2, 1));

    let (mut x_l, mut x_u) = (vec![0.; n], vec![0.; n]);
    FlatProblem::variable_bounds(&problem, &mut x_l, &mut x_u);
    assert_eq!(x_l, vec![-10., -10.]);
    assert_eq!(x_u, vec![10., 10.]);

    let (mut g_l, mut g_u) = (vec![0.; m], vec![0.; m]);
    FlatProblem::constraint_bounds(&problem, &mut g_l, &mut g_u);
    assert_eq!((g_l[0], g_u[0]), (1., 1.));

    let mut x = vec![0.; n];
    problem.initial_point(&mut x);
    assert_eq!(x, vec![2., -1.]);

    // The sparsity pattern is queried once...
    let nnz = FlatProblem::jacobian_nnz(&mut problem);
    let (mut rows, mut cols) = (vec![0; nnz], vec![0; nnz]);
    problem.jacobian_indices(&mut rows, &mut cols);
    assert_eq!(rows, vec![0, 0]);
    assert_eq!(cols, vec![0, 1]);

    // ...then value queries repeat in arbitrary order.
    let mut grad = vec![0.; n];
    let mut g = vec![0.; m];
    let mut jac = vec![0.; nnz];
    for point in [[2., -1.], [0.5, 0.5], [-3., 4.]] {
        let cost = problem.objective(&point);
        problem.objective_grad(&point, &mut grad);
        problem.constraints(&point, &mut g);
        problem.jacobian_values(&point, &mut jac);

        let expected_cost = point[0] * point[0] + point[1] * point[1];
        assert_float_eq!(cost, expected_cost, abs <= 1e-12);
        assert_float_eq!(grad[0], 2. * point[0], abs <= 1e-12);
        assert_float_eq!(grad[1], 2. * point[1], abs <= 1e-12);
        assert_float_eq!(g[0], point[0] + point[1], abs <= 1e-12);
        assert_eq!(jac, vec![1., 1.]);
    }
}

#[test]
fn gradient_reflects_the_supplied_point_not_stale_state() {
    let mut problem = build();
    // Evaluate the cost somewhere, then the gradient somewhere else: each
    // entry point re-applies its own x.
    problem.eval_cost(&[5., 5.]);
    let grad = problem.eval_cost_gradient(&[1., 0.]);
    assert_eq!(grad, vec![2., 0.]);
    assert_eq!(problem.variable_values(), vec![1., 0.]);
}

#[test]
fn iteration_history_snapshots_and_restores() {
    let mut problem = build();
    assert_eq!(problem.iteration_count(), 0);

    problem.set_variables(&[2., -1.]);
    problem.save_current();
    problem.set_variables(&[0.6, 0.4]);
    problem.save_current();
    problem.set_variables(&[0.5, 0.5]);
    problem.save_current();
    assert_eq!(problem.iteration_count(), 3);

    problem.set_to_iteration(0);
    assert_eq!(problem.variable_values(), vec![2., -1.]);
    problem.set_to_iteration(2);
    assert_eq!(problem.variable_values(), vec![0.5, 0.5]);
}

#[test]
#[should_panic(expected = "was never saved")]
fn restoring_an_unsaved_iteration_panics() {
    let mut problem = build();
    problem.set_to_iteration(0);
}
