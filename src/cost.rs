//! Cost terms define the scalar objective the solver minimises.
//!
//! Each [CostTerm] contributes a weighted scalar and a full-length
//! gradient; the [CostContainer] sums the contributions into the single
//! value and gradient the solver sees. A problem with no cost terms is a
//! pure feasibility problem and evaluates to a zero cost.
use crate::variable::VariableContainer;

/// A named scalar-valued term of the objective function.
pub trait CostTerm {
    /// The name of this term, used for diagnostics.
    fn name(&self) -> &str;

    /// The term's value at the variable values currently stored in `vars`.
    fn value(&self, vars: &VariableContainer) -> f64;

    /// The term's gradient, as a dense vector of length `vars.total_len()`.
    /// Components the term does not depend on must be present and zero,
    /// not omitted.
    fn gradient(&self, vars: &VariableContainer) -> Vec<f64>;
}

/// An ordered collection of weighted [CostTerm]s, aggregated into one
/// scalar value and one gradient vector.
#[derive(Default)]
pub struct CostContainer {
    terms: Vec<(Box<dyn CostTerm>, f64)>,
}

impl CostContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        CostContainer::default()
    }

    /// Registers a term with its weight.
    pub fn add(&mut self, term: Box<dyn CostTerm>, weight: f64) {
        self.terms.push((term, weight));
    }

    /// True iff at least one term is registered. Lets callers short-circuit
    /// cost evaluation for pure feasibility problems.
    pub fn has_terms(&self) -> bool {
        !self.terms.is_empty()
    }

    /// The aggregate cost `Σ weightᵢ · valueᵢ` at the current variable
    /// values. Exactly `0.0` when no term is registered.
    pub fn value(&self, vars: &VariableContainer) -> f64 {
        self.terms
            .iter()
            .map(|(term, weight)| weight * term.value(vars))
            .sum()
    }

    /// The aggregate gradient `Σ weightᵢ · ∇ᵢ`, elementwise over the full
    /// flat-variable-length vector. All zeros when no term is registered.
    ///
    /// # Panics
    /// Panics if a term returns a gradient of the wrong length.
    pub fn gradient(&self, vars: &VariableContainer) -> Vec<f64> {
        let mut total = vec![0.; vars.total_len()];
        for (term, weight) in &self.terms {
            let gradient = term.gradient(vars);
            assert_eq!(
                gradient.len(),
                total.len(),
                "cost term '{}' returned a gradient of length {} for {} variables",
                term.name(),
                gradient.len(),
                total.len()
            );
            for (sum, g) in total.iter_mut().zip(gradient) {
                *sum += weight * g;
            }
        }
        total
    }
}
