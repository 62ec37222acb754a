//! Unit wrappers for the few physical quantities that cross the engine boundary.
//!
//! Setpoints, base voltages and simulation times all travel as bare `f64` in the engine's
//! command interface. Wrapping them keeps a machine setpoint from being passed where a run time
//! is expected.
//!
//! ```
//! use stabsim_core::units::{Megawatts, Seconds};
//!
//! let setpoint = Megawatts(187.3) + Megawatts(29.7);
//! assert!((setpoint.value() - 217.0).abs() < 1e-9);
//! assert_eq!(Seconds(20.0).to_string(), "20s");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

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

        impl $type {
            /// Raw value in the unit's native scale.
            #[inline]
            pub fn value(self) -> f64 {
                self.0
            }
        }

        impl fmt::Display for $type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", self.0, $unit_name)
            }
        }
    };
}

/// Active power in megawatts (MW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Megawatts(pub f64);

impl_unit_ops!(Megawatts, "MW");

/// Voltage in kilovolts (kV)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Kilovolts(pub f64);

impl_unit_ops!(Kilovolts, "kV");

/// Simulation time in seconds.
///
/// Displays without a trailing `.0` for whole seconds, which is what artifact names rely on
/// (`..._20s.csv`).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Seconds(pub f64);

impl_unit_ops!(Seconds, "s");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_seconds_display_without_fraction() {
        assert_eq!(Seconds(20.0).to_string(), "20s");
        assert_eq!(Seconds(12.5).to_string(), "12.5s");
    }

    #[test]
    fn megawatts_arithmetic() {
        let delta = Megawatts(217.0) - Megawatts(187.0);
        assert_eq!(delta, Megawatts(30.0));
    }
}
