//! A [Bound] is a closed interval `[min, max]` attached to a single scalar:
//! an optimization variable or a constraint row.
//! Either end may be infinite, and `min == max` expresses an equality.
use std::collections::Bound as RangeBound;
use std::fmt::{Display, Formatter};
use std::ops::RangeBounds;

/// An inclusive interval constraining the feasible range of one scalar.
///
/// ```
/// # use good_nlp::Bound;
/// assert_eq!(Bound::from_range(1..2), Bound::new(1., 2.));
/// assert_eq!(Bound::from_range(1..), Bound::new(1., f64::INFINITY));
/// assert_eq!(Bound::from_range(..=2), Bound::new(f64::NEG_INFINITY, 2.));
/// assert_eq!(Bound::from_range::<f64, _>(..), Bound::free());
/// ```
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Bound {
    /// Lower end of the interval. `f64::NEG_INFINITY` for a one-sided bound.
    pub min: f64,
    /// Upper end of the interval. `f64::INFINITY` for a one-sided bound.
    pub max: f64,
}

impl Bound {
    /// Creates the bound `[min, max]`.
    ///
    /// # Panics
    /// Panics if `min > max`: such a bound makes every value infeasible
    /// and is always a modeling mistake.
    pub fn new<N1: Into<f64>, N2: Into<f64>>(min: N1, max: N2) -> Self {
        let (min, max) = (min.into(), max.into());
        assert!(
            min <= max,
            "invalid bound: min ({}) is greater than max ({})",
            min,
            max
        );
        Bound { min, max }
    }

    /// An unbounded scalar: `(-inf, +inf)`.
    pub fn free() -> Self {
        Bound {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// The equality `value == 0`, the most common constraint bound.
    pub fn zero() -> Self {
        Bound { min: 0., max: 0. }
    }

    /// The equality `value == v`, expressed as the degenerate interval `[v, v]`.
    pub fn fixed<N: Into<f64>>(v: N) -> Self {
        let v = v.into();
        Bound { min: v, max: v }
    }

    /// Builds a bound from any of the standard range syntaxes.
    ///
    /// ```
    /// # use good_nlp::Bound;
    /// assert_eq!(Bound::from_range(-1.0..=1.0), Bound::new(-1, 1));
    /// ```
    pub fn from_range<N: Into<f64> + Copy, B: RangeBounds<N>>(range: B) -> Self {
        Bound::new(
            match range.start_bound() {
                RangeBound::Included(&x) => x.into(),
                RangeBound::Excluded(&x) => x.into(),
                RangeBound::Unbounded => f64::NEG_INFINITY,
            },
            match range.end_bound() {
                RangeBound::Included(&x) => x.into(),
                RangeBound::Excluded(&x) => x.into(),
                RangeBound::Unbounded => f64::INFINITY,
            },
        )
    }

    /// Whether `value` lies within the interval, widened by `tolerance` on
    /// both sides. A value exactly on an endpoint is satisfied at any
    /// tolerance, including zero.
    pub fn is_satisfied(&self, value: f64, tolerance: f64) -> bool {
        value >= self.min - tolerance && value <= self.max + tolerance
    }

    /// By how much `value` lies outside the interval. Zero for feasible
    /// values, positive otherwise.
    pub fn violation(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.
        }
    }
}

impl Default for Bound {
    /// The default bound leaves the scalar unconstrained.
    fn default() -> Self {
        Bound::free()
    }
}

impl Display for Bound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
