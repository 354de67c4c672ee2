//! Exact resource quantities.
//!
//! A quantity is a display string plus the exact magnitude it denotes. The
//! magnitude is kept in a reduced rational form so that `4096Mi` and `4Gi`
//! compare equal without any floating point rescaling.

use std::fmt;
use std::str::FromStr;

use crate::QuantityError;

/// Binary SI suffixes in ascending order, one step of 1024 apart.
pub const BINARY_SUFFIXES: [&str; 6] = ["Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];

/// Exact magnitude stored as `residue * 2^pow2 * 5^pow5`.
///
/// `residue` is coprime to 10 (or zero, with both powers zero), which makes the
/// representation unique: two magnitudes are equal iff their fields are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Magnitude {
    residue: i128,
    pow2: i32,
    pow5: i32,
}

impl Magnitude {
    /// The zero magnitude.
    pub const ZERO: Self = Self {
        residue: 0,
        pow2: 0,
        pow5: 0,
    };

    /// Build a magnitude equal to `coefficient * 2^pow2 * 5^pow5`.
    ///
    /// Returns `None` if reducing the coefficient pushes an exponent past `i32`.
    pub fn new(coefficient: i128, pow2: i32, pow5: i32) -> Option<Self> {
        Self::from_integer(coefficient).scaled(pow2, pow5)
    }

    /// Build a magnitude from a whole number.
    pub fn from_integer(value: i128) -> Self {
        if value == 0 {
            return Self::ZERO;
        }

        let mut residue = value;
        let mut pow2 = 0;
        let mut pow5 = 0;
        while residue % 2 == 0 {
            residue /= 2;
            pow2 += 1;
        }
        while residue % 5 == 0 {
            residue /= 5;
            pow5 += 1;
        }

        Self {
            residue,
            pow2,
            pow5,
        }
    }

    /// Multiply by `2^pow2 * 5^pow5`, or `None` if an exponent overflows.
    pub fn scaled(self, pow2: i32, pow5: i32) -> Option<Self> {
        if self.is_zero() {
            return Some(self);
        }
        Some(Self {
            residue: self.residue,
            pow2: self.pow2.checked_add(pow2)?,
            pow5: self.pow5.checked_add(pow5)?,
        })
    }

    /// Multiply by `10^exponent`, or `None` if an exponent overflows.
    pub fn scaled_by_ten(self, exponent: i32) -> Option<Self> {
        self.scaled(exponent, exponent)
    }

    /// Returns true if this magnitude is zero.
    pub fn is_zero(&self) -> bool {
        self.residue == 0
    }

    /// Returns true if this magnitude is below zero.
    pub fn is_negative(&self) -> bool {
        self.residue < 0
    }

    /// Returns true if this magnitude is a whole number.
    pub fn is_integer(&self) -> bool {
        self.is_zero() || (self.pow2 >= 0 && self.pow5 >= 0)
    }

    /// The exact integer value, if this magnitude is whole and fits in an `i128`.
    pub fn to_integer(self) -> Option<i128> {
        if self.is_zero() {
            return Some(0);
        }
        let pow2 = u32::try_from(self.pow2).ok()?;
        let pow5 = u32::try_from(self.pow5).ok()?;

        2i128
            .checked_pow(pow2)?
            .checked_mul(5i128.checked_pow(pow5)?)?
            .checked_mul(self.residue)
    }
}

/// A resource quantity such as `500m`, `4Gi` or `1e3`.
///
/// Parsed quantities compare by magnitude. Quantities that could not be parsed
/// are carried as opaque strings and compare by text only; they are never
/// rewritten.
#[derive(Debug, Clone)]
pub struct Quantity {
    display: String,
    magnitude: Option<Magnitude>,
}

impl Quantity {
    /// Create a quantity from an already-known display form and magnitude.
    pub(crate) fn with_magnitude(display: String, magnitude: Magnitude) -> Self {
        Self {
            display,
            magnitude: Some(magnitude),
        }
    }

    /// Create an opaque quantity that is carried through unchanged.
    pub fn opaque(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            magnitude: None,
        }
    }

    /// Parse a quantity, keeping the input as an opaque string when it does not parse.
    pub fn parse_lossy(display: impl Into<String>) -> Self {
        let display = display.into();
        match parse_magnitude(&display) {
            Ok(magnitude) => Self::with_magnitude(display, magnitude),
            Err(_) => Self::opaque(display),
        }
    }

    /// The display form.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// The exact magnitude, or `None` for opaque quantities.
    pub fn magnitude(&self) -> Option<Magnitude> {
        self.magnitude
    }

    /// Returns true if this quantity could not be parsed.
    pub fn is_opaque(&self) -> bool {
        self.magnitude.is_none()
    }

    /// Returns true if both quantities have the same display form.
    pub fn is_identical(&self, other: &Self) -> bool {
        self.display == other.display
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        match (self.magnitude, other.magnitude) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.display == other.display,
            _ => false,
        }
    }
}

impl Eq for Quantity {}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let magnitude = parse_magnitude(s)?;
        Ok(Self::with_magnitude(s.to_string(), magnitude))
    }
}

impl serde::Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.display)
    }
}

impl<'de> serde::Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Validation happens upstream; anything unparsable is carried as-is.
        let display = String::deserialize(deserializer)?;
        Ok(Self::parse_lossy(display))
    }
}

/// Parse `[+-]<digits>[.<digits>]<suffix>` into an exact magnitude.
fn parse_magnitude(s: &str) -> Result<Magnitude, QuantityError> {
    if s.is_empty() {
        return Err(QuantityError::Empty);
    }

    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let number_len = unsigned
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(number_len);
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));

    if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
        return Err(QuantityError::InvalidNumber(s.to_string()));
    }

    let mut coefficient: i128 = 0;
    for digit in whole.bytes().chain(fraction.bytes()) {
        coefficient = coefficient
            .checked_mul(10)
            .and_then(|c| c.checked_add(i128::from(digit - b'0')))
            .ok_or_else(|| QuantityError::OutOfRange(s.to_string()))?;
    }

    let (binary_pow, decimal_exp) =
        parse_suffix(suffix).ok_or_else(|| QuantityError::UnknownSuffix(suffix.to_string()))?;

    let fraction_digits =
        i32::try_from(fraction.len()).map_err(|_| QuantityError::OutOfRange(s.to_string()))?;
    let decimal_exp = decimal_exp
        .checked_sub(fraction_digits)
        .ok_or_else(|| QuantityError::OutOfRange(s.to_string()))?;
    let pow2 = binary_pow
        .checked_add(decimal_exp)
        .ok_or_else(|| QuantityError::OutOfRange(s.to_string()))?;

    let coefficient = if negative { -coefficient } else { coefficient };
    Magnitude::new(coefficient, pow2, decimal_exp)
        .ok_or_else(|| QuantityError::OutOfRange(s.to_string()))
}

/// Map a suffix to `(power of two, power of ten)`.
fn parse_suffix(suffix: &str) -> Option<(i32, i32)> {
    let parsed = match suffix {
        "" => (0, 0),
        "n" => (0, -9),
        "u" => (0, -6),
        "m" => (0, -3),
        "k" => (0, 3),
        "M" => (0, 6),
        "G" => (0, 9),
        "T" => (0, 12),
        "P" => (0, 15),
        "E" => (0, 18),
        "Ki" => (10, 0),
        "Mi" => (20, 0),
        "Gi" => (30, 0),
        "Ti" => (40, 0),
        "Pi" => (50, 0),
        "Ei" => (60, 0),
        _ => {
            let exponent = suffix.strip_prefix(['e', 'E'])?;
            (0, exponent.parse().ok()?)
        }
    };
    Some(parsed)
}
