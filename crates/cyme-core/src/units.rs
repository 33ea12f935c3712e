//! Unit newtypes and GLM number formatting.
//!
//! CYME stores voltages in kV and lengths in meters, while GridLAB-D
//! property values carry their unit as a suffix (`"7.2 kV"`, `"12.00 m"`).
//! The newtypes keep line-to-line and line-to-neutral voltages from being
//! mixed up; [`format_g`] reproduces the `%g` style numbers found in GLM
//! files.
//!
//! # Usage
//!
//! ```
//! use cyme_core::units::{format_g, Kilovolts};
//!
//! let ll = Kilovolts(12.47);
//! let ln = ll.line_to_neutral();
//! assert_eq!(format_g(ln.value(), 4), "7.2");
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// Implements arithmetic and accessors shared by every unit type
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
                write!(f, "{} {}", format_g(self.0, 6), $unit_name)
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
        }
    };
}

/// Voltage in kilovolts (kV)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kilovolts(pub f64);

impl_unit_ops!(Kilovolts, "kV");

impl Kilovolts {
    /// Line-to-neutral magnitude of a line-to-line voltage
    #[inline]
    pub fn line_to_neutral(self) -> Kilovolts {
        Kilovolts(self.0 / 3f64.sqrt())
    }

    #[inline]
    pub fn volts(self) -> f64 {
        self.0 * 1000.0
    }
}

/// Length in meters (m)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Meters(pub f64);

impl_unit_ops!(Meters, "m");

impl Meters {
    /// Straight-line distance between two points in a cross-section plane
    pub fn between(a: (f64, f64), b: (f64, f64)) -> Meters {
        Meters(((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt())
    }
}

/// Meters in one statute mile
pub const METERS_PER_MILE: f64 = 1609.344;

// =============================================================================
// Number formatting
// =============================================================================

/// Format a number like C's `%.{sig}g`: `sig` significant digits, trailing
/// zeros removed, scientific notation for very large or small magnitudes.
pub fn format_g(value: f64, sig: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let sig = sig.max(1);
    let sci = format!("{:.*e}", sig - 1, value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exponent < -4 || exponent >= sig as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (sig as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

/// Format a complex value like `%.{sig}g%+.{sig}gj`
pub fn format_complex(re: f64, im: f64, sig: usize) -> String {
    let imag = format_g(im, sig);
    if imag.starts_with('-') {
        format!("{}{}j", format_g(re, sig), imag)
    } else {
        format!("{}+{}j", format_g(re, sig), imag)
    }
}

/// Parse the leading number of a value such as `"2.40178 kV"`.
pub fn leading_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(i, c)| {
            !(c.is_ascii_digit()
                || *c == '.'
                || ((*c == '-' || *c == '+') && *i == 0)
                || *c == 'e'
                || *c == 'E')
        })
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse::<f64>().ok()
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
