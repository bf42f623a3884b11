//! Tick-based time representation.
//!
//! Patterns and the scheduler share one fixed resolution: 96 ticks per
//! quarter note. Changing it invalidates every stored pattern.

use core::fmt;
use core::str::FromStr;

/// Ticks per quarter note.
pub const TICKS_PER_QUARTER: u32 = 96;

/// Ticks per sixteenth note (one drum-grid step).
pub const TICKS_PER_SIXTEENTH: u32 = TICKS_PER_QUARTER / 4;

/// Tempo used when the host does not report one.
pub const DEFAULT_TEMPO: f64 = 120.0;

/// A musical time signature, e.g. 6/8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeSignature {
    /// Beats per bar
    pub numerator: u32,
    /// Note value of one beat (4 = quarter, 8 = eighth)
    pub denominator: u32,
}

impl TimeSignature {
    /// Common time.
    pub const FOUR_FOUR: Self = Self::new(4, 4);

    /// The time signatures offered by the plugin's selector, in menu order.
    pub const CHOICES: [Self; 8] = [
        Self::new(4, 4),
        Self::new(3, 4),
        Self::new(6, 8),
        Self::new(7, 8),
        Self::new(5, 4),
        Self::new(9, 8),
        Self::new(12, 8),
        Self::new(2, 4),
    ];

    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self { numerator, denominator }
    }

    /// A signature with a zero part cannot describe a bar.
    pub const fn is_valid(self) -> bool {
        self.numerator > 0 && self.denominator > 0
    }

    /// Bar length in quarter notes (6/8 = 3.0).
    pub fn beats_per_bar(self) -> f64 {
        self.numerator as f64 * (4.0 / self.denominator as f64)
    }

    /// Bar length in ticks.
    pub fn ticks_per_bar(self) -> f64 {
        TICKS_PER_QUARTER as f64 * self.beats_per_bar()
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::FOUR_FOUR
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Error returned when a string is not of the form `N/D`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseTimeSignatureError;

impl fmt::Display for ParseTimeSignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("time signature must look like 4/4 with non-zero parts")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseTimeSignatureError {}

impl FromStr for TimeSignature {
    type Err = ParseTimeSignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, den) = s.trim().split_once('/').ok_or(ParseTimeSignatureError)?;
        let numerator = num.trim().parse().map_err(|_| ParseTimeSignatureError)?;
        let denominator = den.trim().parse().map_err(|_| ParseTimeSignatureError)?;
        let sig = Self::new(numerator, denominator);
        if sig.is_valid() {
            Ok(sig)
        } else {
            Err(ParseTimeSignatureError)
        }
    }
}

/// Length of one loop cycle in ticks: `num_bars * ticks_per_bar`.
pub fn pattern_length_ticks(num_bars: u32, time_signature: TimeSignature) -> f64 {
    num_bars as f64 * time_signature.ticks_per_bar()
}

/// Floored modulo: the result has the sign of `modulus`, so negative
/// positions still land inside `[0, modulus)`.
pub fn floor_mod(value: f64, modulus: f64) -> f64 {
    let r = value - modulus * libm::floor(value / modulus);
    // value/modulus can round up for tiny negative values
    if r >= modulus {
        0.0
    } else {
        r
    }
}
