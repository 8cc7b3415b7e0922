use crate::error::{MusicError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

/// Exact fraction used for every delta, duration and time value
///
/// Construction never normalizes, so `Rational::new(2, 4)` keeps its
/// representation; arithmetic always returns lowest terms with a positive
/// denominator. Equality and ordering compare values exactly, so
/// `2/4 == 1/2`. A zero denominator can be stored but takes no part in
/// arithmetic: every operation on it fails with
/// [`MusicError::DivisionByZero`]. Such a value equals only the identical
/// pair and sorts after every finite value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rational {
    pub numerator: i64,
    pub denominator: i64,
}

impl Rational {
    pub const ZERO: Rational = Rational {
        numerator: 0,
        denominator: 1,
    };

    pub const ONE: Rational = Rational {
        numerator: 1,
        denominator: 1,
    };

    /// Create a rational as given, without reducing it
    pub const fn new(numerator: i64, denominator: i64) -> Self {
        Rational {
            numerator,
            denominator,
        }
    }

    /// Create a rational from a whole number
    pub const fn from_int(n: i64) -> Self {
        Rational::new(n, 1)
    }

    /// Create a rational in lowest terms
    pub fn reduced(numerator: i64, denominator: i64) -> Result<Self> {
        Self::from_wide(numerator as i128, denominator as i128, "reduce")
    }

    /// This value in lowest terms
    pub fn reduce(self) -> Result<Self> {
        Self::reduced(self.numerator, self.denominator)
    }

    /// Convert to float
    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0 && self.denominator != 0
    }

    pub fn is_negative(&self) -> bool {
        let (n, d) = self.signed_wide();
        d != 0 && n < 0
    }

    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.guard()?;
        other.guard()?;
        let (a, b) = (self.wide(), other.wide());
        let numerator = (a.0 * b.1)
            .checked_add(b.0 * a.1)
            .ok_or(MusicError::overflow("add"))?;
        Self::from_wide(numerator, a.1 * b.1, "add")
    }

    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.guard()?;
        other.guard()?;
        let (a, b) = (self.wide(), other.wide());
        let numerator = (a.0 * b.1)
            .checked_sub(b.0 * a.1)
            .ok_or(MusicError::overflow("sub"))?;
        Self::from_wide(numerator, a.1 * b.1, "sub")
    }

    /// Negate, failing when the result does not fit
    pub fn checked_neg(self) -> Result<Self> {
        Rational::ZERO.checked_sub(self)
    }

    pub fn checked_mul(self, other: Self) -> Result<Self> {
        self.guard()?;
        other.guard()?;
        let (a, b) = (self.wide(), other.wide());
        Self::from_wide(a.0 * b.0, a.1 * b.1, "mul")
    }

    pub fn checked_div(self, other: Self) -> Result<Self> {
        self.guard()?;
        other.guard()?;
        if other.numerator == 0 {
            return Err(MusicError::division_by_zero(
                other.numerator,
                other.denominator,
            ));
        }
        let (a, b) = (self.wide(), other.wide());
        Self::from_wide(a.0 * b.1, a.1 * b.0, "div")
    }

    /// Multiply by a whole number
    pub fn scale_int(self, factor: i64) -> Result<Self> {
        self.checked_mul(Rational::from_int(factor))
    }

    /// Get the reciprocal
    pub fn recip(self) -> Result<Self> {
        Rational::ONE.checked_div(self)
    }

    fn guard(&self) -> Result<()> {
        if self.denominator == 0 {
            Err(MusicError::division_by_zero(
                self.numerator,
                self.denominator,
            ))
        } else {
            Ok(())
        }
    }

    fn wide(&self) -> (i128, i128) {
        (self.numerator as i128, self.denominator as i128)
    }

    /// Sign-normalized wide pair, denominator non-negative
    fn signed_wide(&self) -> (i128, i128) {
        let (n, d) = self.wide();
        if d < 0 {
            (-n, -d)
        } else {
            (n, d)
        }
    }

    fn from_wide(numerator: i128, denominator: i128, op: &'static str) -> Result<Self> {
        if denominator == 0 {
            return Err(MusicError::division_by_zero(
                clamp_i64(numerator),
                0,
            ));
        }
        let divisor = gcd_wide(numerator, denominator);
        let (mut n, mut d) = (numerator / divisor, denominator / divisor);
        if d < 0 {
            n = -n;
            d = -d;
        }
        match (i64::try_from(n), i64::try_from(d)) {
            (Ok(numerator), Ok(denominator)) => Ok(Rational {
                numerator,
                denominator,
            }),
            _ => Err(MusicError::overflow(op)),
        }
    }
}

/// Greatest common divisor of two integers, always non-negative.
///
/// `gcd(0, n) == |n|` and `gcd(0, 0) == 0`.
pub fn gcd(a: i64, b: i64) -> i64 {
    clamp_i64(gcd_wide(a as i128, b as i128))
}

/// Least common multiple, zero if either side is zero
pub fn lcm(a: i64, b: i64) -> i64 {
    if a == 0 || b == 0 {
        return 0;
    }
    let (a, b) = (a as i128, b as i128);
    clamp_i64((a / gcd_wide(a, b) * b).abs())
}

fn gcd_wide(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let temp = b;
        b = a % b;
        a = temp;
    }
    a
}

fn clamp_i64(n: i128) -> i64 {
    n.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

impl Default for Rational {
    fn default() -> Self {
        Rational::ZERO
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl FromStr for Rational {
    type Err = MusicError;

    /// Parse `"n/d"` or `"n"`; a zero denominator is rejected
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MusicError::InvalidRational(s.to_string());
        let (num, den) = match s.trim().split_once('/') {
            Some((n, d)) => (n.trim(), d.trim()),
            None => (s.trim(), "1"),
        };
        let numerator: i64 = num.parse().map_err(|_| invalid())?;
        let denominator: i64 = den.parse().map_err(|_| invalid())?;
        if denominator == 0 {
            return Err(MusicError::division_by_zero(numerator, denominator));
        }
        Ok(Rational::new(numerator, denominator))
    }
}

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Rational::from_int(n)
    }
}

impl From<(i64, i64)> for Rational {
    fn from((num, den): (i64, i64)) -> Self {
        Rational::new(num, den)
    }
}

impl PartialEq for Rational {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Rational {}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.denominator == 0, other.denominator == 0) {
            (false, false) => {
                let (a, b) = (self.signed_wide(), other.signed_wide());
                (a.0 * b.1).cmp(&(b.0 * a.1))
            }
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (true, true) => (self.numerator, self.denominator).cmp(&(other.numerator, other.denominator)),
        }
    }
}

// The operator impls panic on failure; interpreter code uses the checked_*
// forms and propagates the error instead.

impl Add for Rational {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.checked_add(other).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl Sub for Rational {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.checked_sub(other).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl Mul for Rational {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        self.checked_mul(other).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl Div for Rational {
    type Output = Self;

    fn div(self, other: Self) -> Self {
        self.checked_div(other).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl Neg for Rational {
    type Output = Self;

    fn neg(self) -> Self {
        self.checked_neg().unwrap_or_else(|e| panic!("{}", e))
    }
}
