//! Expected output of a set of installed panels.
//!
//! Each item contributes its rated power per square metre of reference panel
//! scaled by the installed area:
//!
//! ```text
//! power × area / (width_mm × height_mm / 1_000_000)
//! ```
//!
//! The sum is scaled by site insolation, divided by 1000 and rounded to two
//! decimal places, half away from zero.

use std::fmt;

/// Square millimetres in one square metre.
const MM2_PER_M2: f64 = 1_000_000.0;

/// One line item as seen by the calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerInput {
    /// Rated power of the reference panel in watts.
    pub power: f64,
    /// Installed area in square metres.
    pub area: f64,
    /// Reference panel width in millimetres.
    pub width: i32,
    /// Reference panel height in millimetres.
    pub height: i32,
}

/// Inputs the formula cannot evaluate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerCalculationError {
    DegenerateDimensions { width: i32, height: i32 },
    NonFiniteResult,
}

impl fmt::Display for PowerCalculationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateDimensions { width, height } => write!(
                f,
                "panel dimensions must be positive, got {width}x{height} mm"
            ),
            Self::NonFiniteResult => write!(f, "total power is not a finite number"),
        }
    }
}

impl std::error::Error for PowerCalculationError {}

impl PowerInput {
    fn contribution(&self) -> Result<f64, PowerCalculationError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(PowerCalculationError::DegenerateDimensions {
                width: self.width,
                height: self.height,
            });
        }
        let reference_area = f64::from(self.width) * f64::from(self.height) / MM2_PER_M2;
        Ok(self.power * self.area / reference_area)
    }
}

/// Relative slack, in ulps, within which a scaled value counts as a tie.
const TIE_ULPS: f64 = 4.0;

/// Round to two decimal places, half away from zero.
///
/// Decimal ties such as `1.005` are not exact in binary and scale to just
/// below `.5`; values within a few ulps of a tie are rounded as the tie.
///
/// # Examples
/// ```
/// use solar_backend::domain::round_to_hundredths;
///
/// assert_eq!(round_to_hundredths(0.125), 0.13);
/// assert_eq!(round_to_hundredths(-0.125), -0.13);
/// assert_eq!(round_to_hundredths(1.005), 1.01);
/// ```
pub fn round_to_hundredths(value: f64) -> f64 {
    let scaled = value * 100.0;
    let slack = scaled.abs() * f64::EPSILON * TIE_ULPS;
    (scaled + slack.copysign(scaled)).round() / 100.0
}

/// Compute the total expected power for `items` at `insolation`.
///
/// # Examples
/// ```
/// use solar_backend::domain::{PowerInput, calculate_total_power};
///
/// let items = [PowerInput { power: 300.0, area: 2.0, width: 1000, height: 2000 }];
/// assert_eq!(calculate_total_power(&items, 5.0), Ok(1.5));
/// ```
pub fn calculate_total_power(
    items: &[PowerInput],
    insolation: f64,
) -> Result<f64, PowerCalculationError> {
    let mut sum = 0.0;
    for item in items {
        sum += item.contribution()?;
    }
    let total = round_to_hundredths(sum * insolation / 1000.0);
    if total.is_finite() {
        Ok(total)
    } else {
        Err(PowerCalculationError::NonFiniteResult)
    }
}
