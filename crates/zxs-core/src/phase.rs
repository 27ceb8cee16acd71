//! Spider phases: exact rational multiples of π.
//!
//! Phases are stored in units of π as a reduced fraction, normalized to
//! the half-open interval `[0, 2)`. Arithmetic stays exact so that undo
//! snapshots and serialized documents round-trip bit-for-bit.
//!
//! The parser accepts the phase grammar of the editor's input dialogs:
//! `1/2`, `2`, `0.25`, `pi`, `pi/2`, `3pi/4`, `-1/4` (all in units of π).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;
use winnow::combinator::{alt, opt, preceded};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::take_while;

/// An exact phase, `num/den` in units of π with `0 <= num/den < 2`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Phase {
    num: i64,
    den: i64,
}

impl Phase {
    pub const ZERO: Phase = Phase { num: 0, den: 1 };
    pub const PI: Phase = Phase { num: 1, den: 1 };

    /// Build a phase of `num/den · π`, reduced and wrapped into `[0, 2π)`.
    pub fn new(num: i64, den: i64) -> Self {
        assert!(den != 0, "phase denominator must be non-zero");
        Self::normalized(num as i128, den as i128)
    }

    fn normalized(mut num: i128, mut den: i128) -> Self {
        if den < 0 {
            num = -num;
            den = -den;
        }
        let g = gcd(num.unsigned_abs(), den as u128);
        if g > 1 {
            num /= g as i128;
            den /= g as i128;
        }
        // Wrap into [0, 2) turns of π.
        num = num.rem_euclid(2 * den);
        Phase {
            num: num as i64,
            den: den as i64,
        }
    }

    /// Numerator in units of π, after normalization.
    pub fn numer(self) -> i64 {
        self.num
    }

    /// Denominator in units of π, after normalization. Always positive.
    pub fn denom(self) -> i64 {
        self.den
    }

    pub fn is_zero(self) -> bool {
        self.num == 0
    }

    /// Whole multiple of π (0 or π).
    pub fn is_pauli(self) -> bool {
        self.den == 1
    }

    /// Multiple of π/2.
    pub fn is_clifford(self) -> bool {
        self.den <= 2
    }

    /// Approximate value in radians.
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64 * std::f64::consts::PI
    }

    /// Canonical fraction form in units of π: `"0"`, `"1"`, `"3/4"`.
    /// This is the serialized representation.
    pub fn fraction_str(self) -> String {
        if self.num == 0 {
            "0".to_string()
        } else if self.den == 1 {
            self.num.to_string()
        } else {
            format!("{}/{}", self.num, self.den)
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::ZERO
    }
}

impl Add for Phase {
    type Output = Phase;

    fn add(self, rhs: Phase) -> Phase {
        Phase::normalized(
            self.num as i128 * rhs.den as i128 + rhs.num as i128 * self.den as i128,
            self.den as i128 * rhs.den as i128,
        )
    }
}

impl Sub for Phase {
    type Output = Phase;

    fn sub(self, rhs: Phase) -> Phase {
        self + (-rhs)
    }
}

impl Neg for Phase {
    type Output = Phase;

    fn neg(self) -> Phase {
        Phase::normalized(-(self.num as i128), self.den as i128)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.num, self.den) {
            (0, _) => write!(f, "0"),
            (1, 1) => write!(f, "π"),
            (n, 1) => write!(f, "{n}π"),
            (1, d) => write!(f, "π/{d}"),
            (n, d) => write!(f, "{n}π/{d}"),
        }
    }
}

impl fmt::Debug for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Phase({self})")
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

// ─── Parsing ─────────────────────────────────────────────────────────────

/// The input string could not be read as a phase expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid phase expression: {0:?}")]
pub struct PhaseParseError(pub String);

impl FromStr for Phase {
    type Err = PhaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Phase::ZERO);
        }
        parse_phase
            .parse(trimmed)
            .map_err(|_| PhaseParseError(s.to_string()))
    }
}

fn parse_uint(input: &mut &str) -> ModalResult<i64> {
    let digits: &str = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    digits
        .parse::<i64>()
        .map_err(|_| winnow::error::ErrMode::Backtrack(ContextError::new()))
}

/// An integer or decimal literal, as an exact fraction.
fn parse_number(input: &mut &str) -> ModalResult<(i64, i64)> {
    let whole = parse_uint.parse_next(input)?;
    if let Some(frac) = opt(preceded('.', take_while(1.., |c: char| c.is_ascii_digit())))
        .parse_next(input)?
    {
        // Exact conversion: "0.25" → 25/100. Long tails would overflow the
        // scale factor, and no one types phases that precise.
        if frac.len() > 15 {
            return Err(winnow::error::ErrMode::Backtrack(ContextError::new()));
        }
        let scale = 10_i64.pow(frac.len() as u32);
        let frac_digits = frac
            .parse::<i64>()
            .map_err(|_| winnow::error::ErrMode::Backtrack(ContextError::new()))?;
        Ok((whole * scale + frac_digits, scale))
    } else {
        Ok((whole, 1))
    }
}

fn parse_pi(input: &mut &str) -> ModalResult<()> {
    alt(("pi", "π")).void().parse_next(input)
}

fn parse_phase(input: &mut &str) -> ModalResult<Phase> {
    let neg = opt('-').parse_next(input)?.is_some();
    let lead = opt(parse_number).parse_next(input)?;
    let has_pi = opt(parse_pi).parse_next(input)?.is_some();
    if lead.is_none() && !has_pi {
        return Err(winnow::error::ErrMode::Backtrack(ContextError::new()));
    }
    let (mut num, mut den) = lead.unwrap_or((1, 1));
    if let Some(divisor) = opt(preceded('/', parse_uint)).parse_next(input)? {
        if divisor == 0 {
            return Err(winnow::error::ErrMode::Backtrack(ContextError::new()));
        }
        den *= divisor;
    }
    if neg {
        num = -num;
    }
    Ok(Phase::new(num, den))
}

// ─── Serde ───────────────────────────────────────────────────────────────

impl Serialize for Phase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.fraction_str())
    }
}

impl<'de> Deserialize<'de> for Phase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
