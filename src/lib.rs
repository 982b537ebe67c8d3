//! A nonlinear programming modeler that keeps your problem structured and
//! feeds solvers the flat arrays they want.
//!
//! You model an NLP as named blocks: [VariableSet]s (decision variables
//! with [Bound]s), [ConstraintSet]s (constraint rows with bounds and a
//! sparse Jacobian block) and weighted [CostTerm]s. A [Problem] aggregates
//! the blocks, in registration order, into the flat variable vector,
//! constraint vector, gradient and coordinate-form Jacobian that sparse
//! nonlinear solvers (IPOPT, SNOPT, ...) consume, and guarantees the
//! mapping between the two views stays stable for the whole solve.
//!
//! ```rust
//! use good_nlp::{Bound, CostTerm, Problem, VariableBlock, VariableContainer};
//!
//! /// minimise (x0 - 1)² + (x1 - 2)²
//! struct Distance;
//!
//! impl CostTerm for Distance {
//!     fn name(&self) -> &str {
//!         "distance"
//!     }
//!     fn value(&self, vars: &VariableContainer) -> f64 {
//!         let x = vars.flat_values();
//!         (x[0] - 1.).powi(2) + (x[1] - 2.).powi(2)
//!     }
//!     fn gradient(&self, vars: &VariableContainer) -> Vec<f64> {
//!         let x = vars.flat_values();
//!         vec![2. * (x[0] - 1.), 2. * (x[1] - 2.)]
//!     }
//! }
//!
//! let mut problem = Problem::new();
//! problem.add_variable_set(Box::new(
//!     VariableBlock::new("x", 2).bounds(Bound::new(-10., 10.)),
//! ));
//! problem.add_cost(Box::new(Distance), 1.);
//!
//! assert_eq!(problem.num_variables(), 2);
//! assert_eq!(problem.eval_cost(&[0., 0.]), 5.);
//! assert_eq!(problem.eval_cost_gradient(&[0., 0.]), vec![-2., -4.]);
//! ```
//!
//! Once a problem has been evaluated its layout is frozen: counts, bounds
//! and the Jacobian sparsity pattern may no longer change, and the
//! registration methods panic if called. Solvers rely on those quantities
//! being queried once and staying valid.

pub use bound::Bound;
pub use constraint::{ConstraintContainer, ConstraintReport, ConstraintSet};
pub use cost::{CostContainer, CostTerm};
pub use problem::Problem;
pub use solvers::{FlatProblem, ResolutionError, Solver};
pub use variable::{VariableBlock, VariableContainer, VariableSet};

mod bound;
pub mod constraint;
pub mod cost;
pub mod problem;
pub mod solvers;
pub mod variable;
