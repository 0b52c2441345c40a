//! Unit newtypes for photometric quantities.
//!
//! The three file formats store lengths in different units (IES in feet or
//! meters, EULUMDAT in millimeters) while the common model always uses
//! meters. Conversions go through these wrappers so a millimeter value can
//! never be assigned to a meter field by accident.
//!
//! # Usage
//!
//! ```
//! use lumen_core::units::{Feet, Meters, Millimeters};
//!
//! let length: Meters = Feet(3.28084).into();
//! assert!((length.value() - 1.0).abs() < 1e-3);
//!
//! let width: Meters = Millimeters(600.0).into();
//! assert_eq!(width.value(), 0.6);
//!
//! let back: Millimeters = Meters(0.6).into();
//! assert_eq!(back.value(), 600.0);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// Meters per international foot.
pub const METERS_PER_FOOT: f64 = 0.3048;

/// Meters per millimeter.
pub const METERS_PER_MILLIMETER: f64 = 0.001;

/// Macro to implement common arithmetic operations for unit types
macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $unit_name)
            }
        }

        impl $type {
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn abs(self) -> Self {
                Self(self.0.abs())
            }

            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }
    };
}

// =============================================================================
// Length Units
// =============================================================================

/// Length in meters (the common model's unit)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Meters(pub f64);

impl_unit_ops!(Meters, "m");

/// Length in millimeters (EULUMDAT geometry block)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Millimeters(pub f64);

impl_unit_ops!(Millimeters, "mm");

/// Length in feet (IES files with units type 1)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Feet(pub f64);

impl_unit_ops!(Feet, "ft");

impl From<Feet> for Meters {
    fn from(value: Feet) -> Self {
        Meters(value.0 * METERS_PER_FOOT)
    }
}

impl From<Meters> for Feet {
    fn from(value: Meters) -> Self {
        Feet(value.0 / METERS_PER_FOOT)
    }
}

impl From<Millimeters> for Meters {
    fn from(value: Millimeters) -> Self {
        Meters(value.0 * METERS_PER_MILLIMETER)
    }
}

impl From<Meters> for Millimeters {
    fn from(value: Meters) -> Self {
        Millimeters(value.0 / METERS_PER_MILLIMETER)
    }
}

// =============================================================================
// Angle Units
// =============================================================================

/// Angle in degrees (all angular grids are stored in degrees)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Degrees(pub f64);

impl_unit_ops!(Degrees, "°");

impl Degrees {
    #[inline]
    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }

    /// Normalize into [0, 360).
    #[inline]
    pub fn normalized(self) -> Self {
        Degrees(self.0.rem_euclid(360.0))
    }

    /// Shortest azimuthal distance, taking the 360° wraparound into account.
    ///
    /// `Degrees(350.0).azimuth_distance(Degrees(0.0))` is 10°, not 350°.
    #[inline]
    pub fn azimuth_distance(self, other: Self) -> f64 {
        let direct = (self.0 - other.0).abs();
        direct.min(360.0 - direct).abs()
    }
}
