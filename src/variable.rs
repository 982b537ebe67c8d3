//! A [VariableSet] is a named, ordered block of decision variables.
//! The goal of the solver is to find optimal values for all variables in a problem.
//!
//! Sets are registered into a [VariableContainer], which defines the
//! canonical flat layout: all sets concatenated in registration order.
//! The container is the single source of truth for the position of every
//! scalar in the flat vector the solver manipulates.
use fnv::FnvHashMap;

use crate::bound::Bound;

/// A named block of scalar decision variables.
///
/// Domain code implements this trait once per logical quantity
/// (end-effector positions, contact forces, phase durations, ...).
/// For plain value storage, use the ready-made [VariableBlock].
///
/// Implementations must keep their size constant for their whole life:
/// the flat layout is frozen when the first evaluation happens.
pub trait VariableSet {
    /// The name of this block, used for lookups and diagnostics.
    fn name(&self) -> &str;

    /// Number of scalar variables in this block.
    fn len(&self) -> usize;

    /// True when the block contains no variables.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The current values, in block order.
    fn values(&self) -> Vec<f64>;

    /// Overwrites the block from a flat slice of exactly [VariableSet::len] values.
    fn set_values(&mut self, values: &[f64]);

    /// One [Bound] per variable, in block order.
    fn bounds(&self) -> Vec<Bound>;
}

/// A [VariableSet] that simply stores its values, covering the common case
/// where a block has no structure beyond its numbers and bounds.
///
/// ```
/// # use good_nlp::{Bound, VariableBlock, VariableSet};
/// let block = VariableBlock::new("base_pos", 3)
///     .bounds(Bound::new(-1., 1.))
///     .initial(&[0., 0.5, -0.5]);
/// assert_eq!(block.len(), 3);
/// assert_eq!(block.values(), vec![0., 0.5, -0.5]);
/// ```
#[derive(Clone, Debug)]
pub struct VariableBlock {
    name: String,
    values: Vec<f64>,
    bounds: Vec<Bound>,
}

impl VariableBlock {
    /// Creates a block of `len` variables, all zero and unbounded.
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        VariableBlock {
            name: name.into(),
            values: vec![0.; len],
            bounds: vec![Bound::free(); len],
        }
    }

    /// Applies the same bound to every variable in the block.
    pub fn bounds(mut self, bound: Bound) -> Self {
        self.bounds = vec![bound; self.values.len()];
        self
    }

    /// Sets one bound per variable.
    ///
    /// # Panics
    /// Panics if `bounds.len()` differs from the block length.
    pub fn bounds_per_variable(mut self, bounds: Vec<Bound>) -> Self {
        assert_eq!(
            bounds.len(),
            self.values.len(),
            "variable block '{}' has {} variables but {} bounds were supplied",
            self.name,
            self.values.len(),
            bounds.len()
        );
        self.bounds = bounds;
        self
    }

    /// Sets the starting values the solver will be given.
    ///
    /// # Panics
    /// Panics if `values.len()` differs from the block length.
    pub fn initial(mut self, values: &[f64]) -> Self {
        assert_eq!(
            values.len(),
            self.values.len(),
            "variable block '{}' has {} variables but {} initial values were supplied",
            self.name,
            self.values.len(),
            values.len()
        );
        self.values.copy_from_slice(values);
        self
    }
}

impl VariableSet for VariableBlock {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn values(&self) -> Vec<f64> {
        self.values.clone()
    }

    fn set_values(&mut self, values: &[f64]) {
        assert_eq!(
            values.len(),
            self.values.len(),
            "variable block '{}' received {} values for {} variables",
            self.name,
            values.len(),
            self.values.len()
        );
        self.values.copy_from_slice(values);
    }

    fn bounds(&self) -> Vec<Bound> {
        self.bounds.clone()
    }
}

/// An ordered collection of [VariableSet]s defining the flat vector layout.
///
/// The flat position of the i-th scalar of the k-th registered set is
/// `offset(k) + i`, where `offset(k)` is the total size of sets `0..k`.
/// Disassembling an incoming flat vector and assembling values, gradients
/// and Jacobian columns all use this one mapping.
#[derive(Default)]
pub struct VariableContainer {
    sets: Vec<Box<dyn VariableSet>>,
    /// Flat offset of each set, kept in sync with `sets`.
    offsets: Vec<usize>,
    /// Name lookup; the first set registered under a name wins.
    by_name: FnvHashMap<String, usize>,
    total_len: usize,
}

impl VariableContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        VariableContainer::default()
    }

    /// Registers a set. Its variables occupy the next `set.len()` positions
    /// of the flat vector, after everything registered before it.
    pub fn add(&mut self, set: Box<dyn VariableSet>) {
        let index = self.sets.len();
        self.by_name.entry(set.name().to_owned()).or_insert(index);
        self.offsets.push(self.total_len);
        self.total_len += set.len();
        self.sets.push(set);
    }

    /// Total number of scalar variables across all registered sets.
    pub fn total_len(&self) -> usize {
        self.total_len
    }

    /// True when no set has been registered.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Number of registered sets.
    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    /// Distributes a flat vector into the registered sets, overwriting
    /// their stored values.
    ///
    /// # Panics
    /// Panics if `flat.len() != self.total_len()`. The caller promised to
    /// respect the previously reported count; continuing with a wrong
    /// length would silently shift every block.
    pub fn set_from_flat(&mut self, flat: &[f64]) {
        assert_eq!(
            flat.len(),
            self.total_len,
            "flat variable vector has length {} but the problem has {} variables",
            flat.len(),
            self.total_len
        );
        for (set, &offset) in self.sets.iter_mut().zip(&self.offsets) {
            let len = set.len();
            set.set_values(&flat[offset..offset + len]);
        }
    }

    /// The current values of all sets, concatenated in registration order.
    /// Inverse of [VariableContainer::set_from_flat].
    pub fn flat_values(&self) -> Vec<f64> {
        let mut flat = Vec::with_capacity(self.total_len);
        for set in &self.sets {
            flat.extend(set.values());
        }
        flat
    }

    /// The bounds of all sets, concatenated in the same order as the values.
    pub fn bounds(&self) -> Vec<Bound> {
        let mut bounds = Vec::with_capacity(self.total_len);
        for set in &self.sets {
            bounds.extend(set.bounds());
        }
        bounds
    }

    /// The flat offset of the first scalar of the named set, or `None` if
    /// no set was registered under that name.
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).map(|&i| self.offsets[i])
    }

    /// Looks a set up by name.
    pub fn get(&self, name: &str) -> Option<&dyn VariableSet> {
        self.by_name.get(name).map(move |&i| &*self.sets[i])
    }

    /// Looks a set up by name, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut dyn VariableSet> {
        let index = self.by_name.get(name).copied()?;
        Some(&mut *self.sets[index])
    }

    /// Iterates over the registered sets with their flat offsets,
    /// in registration order.
    pub fn iter_with_offsets(&self) -> impl Iterator<Item = (usize, &dyn VariableSet)> {
        self.offsets
            .iter()
            .zip(&self.sets)
            .map(|(&offset, set)| (offset, &**set))
    }
}
