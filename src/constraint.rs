//! Constraints define the (in)equalities that must hold in the solution.
//!
//! A [ConstraintSet] is a named block of constraint rows with one [Bound]
//! per row and a sparse Jacobian block expressed against the full flat
//! variable vector. The [ConstraintContainer] stacks the registered blocks
//! into the single constraint vector and Jacobian the solver sees, and
//! pins down the Jacobian sparsity pattern on the first evaluation.
use std::fmt::{Display, Formatter};

use sprs::{CsMat, TriMat};

use crate::bound::Bound;
use crate::variable::VariableContainer;

/// A named block of scalar constraint rows.
///
/// The Jacobian block is reported as triplets with row indices local to
/// this block and column indices in the *global* flat variable layout
/// (use [VariableContainer::offset_of] to find where a variable set starts).
/// Entries not reported are structural zeros.
///
/// The set of reported coordinates, including their emission order, must
/// be identical on every call: solvers query the sparsity pattern once and
/// then only ask for values. Only the numeric values may change with `vars`.
pub trait ConstraintSet {
    /// The name of this block, used for diagnostics.
    fn name(&self) -> &str;

    /// Number of constraint rows in this block.
    fn len(&self) -> usize;

    /// True when the block contains no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One [Bound] per row. An equality `g(x) == 0` is `Bound::zero()`.
    fn bounds(&self) -> Vec<Bound>;

    /// Evaluates the rows at the variable values currently stored in `vars`.
    fn values(&self, vars: &VariableContainer) -> Vec<f64>;

    /// The Jacobian block at the current variable values, as a triplet
    /// matrix of shape `(self.len(), vars.total_len())`.
    fn jacobian(&self, vars: &VariableContainer) -> TriMat<f64>;
}

/// An ordered collection of [ConstraintSet]s.
///
/// Row blocks are stacked in registration order, mirroring how
/// [VariableContainer](crate::VariableContainer) stacks variable sets.
/// The first call to [ConstraintContainer::update] freezes the global
/// sparsity pattern; later updates refresh the values at those fixed
/// coordinates and panic if a set reports different coordinates.
#[derive(Default)]
pub struct ConstraintContainer {
    sets: Vec<Box<dyn ConstraintSet>>,
    /// Row offset of each set in the stacked constraint vector.
    row_offsets: Vec<usize>,
    total_len: usize,
    /// Global `(row, col)` coordinates, fixed at the first update.
    /// Order: sets in registration order, each set's triplets in emission order.
    pattern: Option<Vec<(usize, usize)>>,
    /// Jacobian values at the pattern coordinates, refreshed by every update.
    jacobian_values: Vec<f64>,
    /// Stacked constraint values, refreshed by every update.
    values: Vec<f64>,
    /// Column count of the assembled Jacobian, recorded at the first update.
    num_cols: usize,
}

impl ConstraintContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        ConstraintContainer::default()
    }

    /// Registers a set. Its rows occupy the next `set.len()` positions of
    /// the stacked constraint vector.
    pub fn add(&mut self, set: Box<dyn ConstraintSet>) {
        self.row_offsets.push(self.total_len);
        self.total_len += set.len();
        self.sets.push(set);
    }

    /// Total number of constraint rows across all registered sets.
    pub fn total_len(&self) -> usize {
        self.total_len
    }

    /// True when no set has been registered.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// The bounds of all sets, stacked in registration order.
    pub fn bounds(&self) -> Vec<Bound> {
        let mut bounds = Vec::with_capacity(self.total_len);
        for set in &self.sets {
            bounds.extend(set.bounds());
        }
        bounds
    }

    /// Recomputes every set's values and Jacobian block against the
    /// variable values currently stored in `vars`.
    ///
    /// # Panics
    /// Panics if a set reports a value vector or Jacobian block of the
    /// wrong shape, a column outside the variable layout, or a sparsity
    /// pattern differing from the one recorded at the first update.
    pub fn update(&mut self, vars: &VariableContainer) {
        let num_cols = vars.total_len();

        self.values.clear();
        let mut coordinates = Vec::new();
        self.jacobian_values.clear();
        for set in &self.sets {
            let row_offset = self.values.len();
            let values = set.values(vars);
            assert_eq!(
                values.len(),
                set.len(),
                "constraint set '{}' declared {} rows but returned {} values",
                set.name(),
                set.len(),
                values.len()
            );
            self.values.extend(values);

            let block = set.jacobian(vars);
            assert_eq!(
                (block.rows(), block.cols()),
                (set.len(), num_cols),
                "constraint set '{}' returned a jacobian block of shape {:?}, expected {:?}",
                set.name(),
                (block.rows(), block.cols()),
                (set.len(), num_cols)
            );
            for (&value, (row, col)) in block.triplet_iter() {
                coordinates.push((row_offset + row, col));
                self.jacobian_values.push(value);
            }
        }

        match &self.pattern {
            None => {
                self.pattern = Some(coordinates);
                self.num_cols = num_cols;
            }
            Some(pattern) => {
                assert_eq!(
                    coordinates.len(),
                    pattern.len(),
                    "jacobian sparsity pattern drifted: {} nonzeros reported, {} expected",
                    coordinates.len(),
                    pattern.len()
                );
                for (i, (got, expected)) in coordinates.iter().zip(pattern).enumerate() {
                    assert_eq!(
                        got, expected,
                        "jacobian sparsity pattern drifted at nonzero {}: \
                         got coordinate {:?}, expected {:?}",
                        i, got, expected
                    );
                }
            }
        }
    }

    /// The stacked constraint values from the last [ConstraintContainer::update].
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The fixed `(row, col)` coordinates of the Jacobian nonzeros.
    ///
    /// # Panics
    /// Panics if called before the first [ConstraintContainer::update]:
    /// there is no pattern to report yet.
    pub fn sparsity(&self) -> &[(usize, usize)] {
        self.pattern
            .as_deref()
            .expect("jacobian sparsity queried before the first evaluation")
    }

    /// Number of structural nonzeros in the Jacobian.
    pub fn jacobian_nnz(&self) -> usize {
        self.sparsity().len()
    }

    /// Writes the Jacobian values from the last update into `out`, in the
    /// exact order of [ConstraintContainer::sparsity].
    ///
    /// # Panics
    /// Panics if `out.len()` differs from the number of nonzeros.
    pub fn write_jacobian_values(&self, out: &mut [f64]) {
        assert_eq!(
            out.len(),
            self.jacobian_values.len(),
            "jacobian value buffer has length {} but the pattern has {} nonzeros",
            out.len(),
            self.jacobian_values.len()
        );
        out.copy_from_slice(&self.jacobian_values);
    }

    /// Assembles the full Jacobian from the last update as a CSR matrix of
    /// shape `(total constraint rows, total variables)`.
    /// Duplicate coordinates, if any, are summed.
    pub fn jacobian(&self) -> CsMat<f64> {
        let mut triplets = TriMat::new((self.total_len, self.num_cols));
        for (&(row, col), &value) in self.sparsity().iter().zip(&self.jacobian_values) {
            triplets.add_triplet(row, col, value);
        }
        triplets.to_csr()
    }

    /// Classifies every row of every set against its bound, using the
    /// values from the last [ConstraintContainer::update]. Never panics on
    /// violations: this is a diagnostic, not a check.
    pub fn report(&self, tolerance: f64) -> ConstraintReport {
        let mut rows = Vec::with_capacity(self.total_len);
        for (set, &row_offset) in self.sets.iter().zip(&self.row_offsets) {
            for (i, bound) in set.bounds().into_iter().enumerate() {
                let value = self.values[row_offset + i];
                rows.push(ReportRow {
                    set_name: set.name().to_owned(),
                    index: i,
                    value,
                    bound,
                });
            }
        }
        ConstraintReport { rows, tolerance }
    }
}

/// One row of a [ConstraintReport].
struct ReportRow {
    set_name: String,
    index: usize,
    value: f64,
    bound: Bound,
}

/// A human-readable classification of every constraint row as satisfied or
/// violated, produced by [Problem::status_report](crate::Problem::status_report).
pub struct ConstraintReport {
    rows: Vec<ReportRow>,
    tolerance: f64,
}

impl ConstraintReport {
    /// Number of rows violating their bound by more than the tolerance.
    pub fn num_violated(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| !row.bound.is_satisfied(row.value, self.tolerance))
            .count()
    }

    /// True when every row satisfies its bound within the tolerance.
    pub fn all_satisfied(&self) -> bool {
        self.num_violated() == 0
    }
}

impl Display for ConstraintReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "status of {} constraints (tolerance {}):",
            self.rows.len(),
            self.tolerance
        )?;
        for row in &self.rows {
            let status = if row.bound.is_satisfied(row.value, self.tolerance) {
                "ok".to_owned()
            } else {
                format!("VIOLATED by {:.3e}", row.bound.violation(row.value))
            };
            writeln!(
                f,
                "  {}[{}]: {:+.6} in {}  {}",
                row.set_name, row.index, row.value, row.bound, status
            )?;
        }
        write!(
            f,
            "  {} satisfied, {} violated",
            self.rows.len() - self.num_violated(),
            self.num_violated()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::{VariableBlock, VariableContainer};

    /// `x0 * x1 == 1`, the smallest nonlinear equality.
    struct Product;

    impl ConstraintSet for Product {
        fn name(&self) -> &str {
            "product"
        }
        fn len(&self) -> usize {
            1
        }
        fn bounds(&self) -> Vec<Bound> {
            vec![Bound::fixed(1.)]
        }
        fn values(&self, vars: &VariableContainer) -> Vec<f64> {
            let x = vars.flat_values();
            vec![x[0] * x[1]]
        }
        fn jacobian(&self, vars: &VariableContainer) -> TriMat<f64> {
            let x = vars.flat_values();
            let mut block = TriMat::new((1, vars.total_len()));
            block.add_triplet(0, 0, x[1]);
            block.add_triplet(0, 1, x[0]);
            block
        }
    }

    fn two_vars() -> VariableContainer {
        let mut vars = VariableContainer::new();
        vars.add(Box::new(VariableBlock::new("x", 2)));
        vars
    }

    #[test]
    fn pattern_is_recorded_once_and_values_refresh() {
        let mut vars = two_vars();
        let mut constraints = ConstraintContainer::new();
        constraints.add(Box::new(Product));

        vars.set_from_flat(&[2., 3.]);
        constraints.update(&vars);
        assert_eq!(constraints.sparsity(), &[(0, 0), (0, 1)]);
        assert_eq!(constraints.values(), &[6.]);

        vars.set_from_flat(&[5., 7.]);
        constraints.update(&vars);
        assert_eq!(constraints.sparsity(), &[(0, 0), (0, 1)]);
        let mut nonzeros = [0.; 2];
        constraints.write_jacobian_values(&mut nonzeros);
        assert_eq!(nonzeros, [7., 5.]);
    }

    #[test]
    fn assembled_jacobian_places_blocks_at_row_offsets() {
        let mut vars = two_vars();
        let mut constraints = ConstraintContainer::new();
        constraints.add(Box::new(Product));
        constraints.add(Box::new(Product));

        vars.set_from_flat(&[2., 3.]);
        constraints.update(&vars);
        let jacobian = constraints.jacobian();
        assert_eq!(jacobian.shape(), (2, 2));
        assert_eq!(jacobian.get(0, 0), Some(&3.));
        assert_eq!(jacobian.get(1, 1), Some(&2.));
    }

    /// A set whose pattern depends on the sign of `x0`. Illegal.
    struct Drifting;

    impl ConstraintSet for Drifting {
        fn name(&self) -> &str {
            "drifting"
        }
        fn len(&self) -> usize {
            1
        }
        fn bounds(&self) -> Vec<Bound> {
            vec![Bound::zero()]
        }
        fn values(&self, _vars: &VariableContainer) -> Vec<f64> {
            vec![0.]
        }
        fn jacobian(&self, vars: &VariableContainer) -> TriMat<f64> {
            let x = vars.flat_values();
            let mut block = TriMat::new((1, vars.total_len()));
            let col = if x[0] > 0. { 0 } else { 1 };
            block.add_triplet(0, col, 1.);
            block
        }
    }

    #[test]
    #[should_panic(expected = "sparsity pattern drifted")]
    fn pattern_drift_is_fatal() {
        let mut vars = two_vars();
        let mut constraints = ConstraintContainer::new();
        constraints.add(Box::new(Drifting));

        vars.set_from_flat(&[1., 0.]);
        constraints.update(&vars);
        vars.set_from_flat(&[-1., 0.]);
        constraints.update(&vars);
    }
}
