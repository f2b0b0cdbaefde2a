use std::{cmp::Ordering, marker::PhantomData};

use uom::si::{f64::Ratio, ratio::ratio};

use super::{Constrained, Constraint, ConstraintError};

/// Supplies 0 and 1 for types used in the closed unit interval [0, 1].
pub trait UnitBounds: PartialOrd {
    fn zero() -> Self;
    fn one() -> Self;
}

impl UnitBounds for f64 {
    fn zero() -> Self {
        0.0
    }
    fn one() -> Self {
        1.0
    }
}

impl UnitBounds for Ratio {
    fn zero() -> Self {
        Ratio::new::<ratio>(0.0)
    }
    fn one() -> Self {
        Ratio::new::<ratio>(1.0)
    }
}

/// Marker type enforcing that a value lies in the closed unit interval: `0 ≤ x ≤ 1`.
///
/// Conversions and selectivities are reported with this bound.
///
/// # Examples
///
/// ```
/// use twine_reactors::support::constraint::UnitInterval;
///
/// let x = UnitInterval::new(0.393).unwrap();
/// assert_eq!(x.into_inner(), 0.393);
///
/// assert!(UnitInterval::new(-0.0001).is_err());
/// assert!(UnitInterval::new(1.0001).is_err());
///
/// // Round-off just outside the interval can be snapped to the nearest bound.
/// let snapped = UnitInterval::snap(1.0 + 1e-12, 1e-9).unwrap();
/// assert_eq!(snapped.into_inner(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitInterval;

impl UnitInterval {
    /// Constructs `Constrained<T, UnitInterval>` if 0 ≤ value ≤ 1.
    ///
    /// # Errors
    ///
    /// - [`ConstraintError::BelowMinimum`] if less than zero.
    /// - [`ConstraintError::AboveMaximum`] if greater than one.
    /// - [`ConstraintError::NotANumber`] if comparison is undefined (e.g., NaN).
    pub fn new<T: UnitBounds>(value: T) -> Result<Constrained<T, UnitInterval>, ConstraintError> {
        Constrained::<T, UnitInterval>::new(value)
    }

    /// Constructs a unit-interval `f64`, snapping values within `tolerance`
    /// of either bound onto that bound.
    ///
    /// # Errors
    ///
    /// Fails like [`UnitInterval::new`] when the value lies farther than
    /// `tolerance` outside the interval.
    pub fn snap(value: f64, tolerance: f64) -> Result<Constrained<f64, UnitInterval>, ConstraintError> {
        let snapped = if value < 0.0 && value >= -tolerance {
            0.0
        } else if value > 1.0 && value <= 1.0 + tolerance {
            1.0
        } else {
            value
        };
        Self::new(snapped)
    }

    /// Returns the lower bound (zero) as a constrained value.
    #[must_use]
    pub fn zero<T: UnitBounds>() -> Constrained<T, UnitInterval> {
        Constrained {
            value: T::zero(),
            _marker: PhantomData,
        }
    }

    /// Returns the upper bound (one) as a constrained value.
    #[must_use]
    pub fn one<T: UnitBounds>() -> Constrained<T, UnitInterval> {
        Constrained {
            value: T::one(),
            _marker: PhantomData,
        }
    }
}

impl<T: UnitBounds> Constraint<T> for UnitInterval {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match (value.partial_cmp(&T::zero()), value.partial_cmp(&T::one())) {
            (None, _) | (_, None) => Err(ConstraintError::NotANumber),
            (Some(Ordering::Less), _) => Err(ConstraintError::BelowMinimum),
            (_, Some(Ordering::Greater)) => Err(ConstraintError::AboveMaximum),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use uom::si::ratio::percent;

    #[test]
    fn floats() {
        assert!(UnitInterval::new(0.0).is_ok());
        assert!(UnitInterval::new(1.0).is_ok());
        assert_eq!(UnitInterval::new(-0.1), Err(ConstraintError::BelowMinimum));
        assert_eq!(UnitInterval::new(1.1), Err(ConstraintError::AboveMaximum));
        assert_eq!(UnitInterval::new(f64::NAN), Err(ConstraintError::NotANumber));
    }

    #[test]
    fn snapping_respects_tolerance() {
        assert_eq!(UnitInterval::snap(-1e-12, 1e-9).unwrap().into_inner(), 0.0);
        assert_eq!(UnitInterval::snap(0.5, 1e-9).unwrap().into_inner(), 0.5);
        assert!(UnitInterval::snap(-1e-6, 1e-9).is_err());
        assert!(UnitInterval::snap(1.0 + 1e-6, 1e-9).is_err());
    }

    #[test]
    fn ratios() {
        let r = UnitInterval::new(Ratio::new::<percent>(39.3)).unwrap();
        assert!((r.into_inner().get::<ratio>() - 0.393).abs() < 1e-12);
        assert_eq!(UnitInterval::one::<Ratio>().into_inner().get::<ratio>(), 1.0);
        assert_eq!(UnitInterval::zero::<f64>().into_inner(), 0.0);
    }
}
