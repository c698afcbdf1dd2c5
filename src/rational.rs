use crate::error::{ArithmeticError, ParseError};
use crate::grammar::decompose;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

/// Largest absolute exponent accepted in a scientific literal
pub const MAX_LITERAL_EXPONENT: u32 = 100_000;

/// An exact fraction of two big integers.
///
/// The denominator is always positive, the numerator carries the sign.
/// Values are not reduced eagerly: equality, ordering and hashing compare the
/// reduced form, and [`normalized`](Self::normalized) reduces on demand.
///
/// # Examples
///
/// ```
/// # use cruncher::RationalValue;
/// let third: RationalValue = "0.{3}R".parse().unwrap();
/// assert_eq!(third, RationalValue::new(1, 3).unwrap());
/// assert_eq!((&third + &third).to_exact_string(), "0.{6}R");
/// ```
#[derive(Debug, Clone)]
pub struct RationalValue {
    numerator: BigInt,
    denominator: BigInt,
}

impl RationalValue {
    /// Build `numerator / denominator`, moving the sign onto the numerator.
    ///
    /// # Errors
    ///
    /// Returns [`ArithmeticError::ZeroDenominator`] for a zero denominator.
    pub fn new<N, D>(numerator: N, denominator: D) -> Result<Self, ArithmeticError>
    where
        N: Into<BigInt>,
        D: Into<BigInt>,
    {
        let numerator = numerator.into();
        let denominator = denominator.into();
        if denominator.is_zero() {
            return Err(ArithmeticError::ZeroDenominator);
        }
        if denominator.is_negative() {
            Ok(Self::from_positive(-numerator, -denominator))
        } else {
            Ok(Self::from_positive(numerator, denominator))
        }
    }

    fn from_positive(numerator: BigInt, denominator: BigInt) -> Self {
        debug_assert!(denominator.is_positive());
        Self {
            numerator,
            denominator,
        }
    }

    /// `0 / 1`
    pub fn zero() -> Self {
        Self::from_positive(BigInt::zero(), BigInt::one())
    }

    /// `1 / 1`
    pub fn one() -> Self {
        Self::from_positive(BigInt::one(), BigInt::one())
    }

    /// Build a value from the pieces of a number literal.
    ///
    /// `integer` is the signed integer part, the other parts hold the digits
    /// before the repeating block, the repeating block and the decimal
    /// exponent.
    ///
    /// # Errors
    ///
    /// Fails when a part is not a valid number or the exponent is larger than
    /// [`MAX_LITERAL_EXPONENT`].
    pub fn from_components(
        integer: &str,
        non_repeating: Option<&str>,
        repeating: Option<&str>,
        exponent: Option<&str>,
    ) -> Result<Self, ArithmeticError> {
        let non_repeating = non_repeating.unwrap_or("");
        let repeating = repeating.unwrap_or("");

        let head = parse_integer(&format!("{}{}", integer, non_repeating))?;
        let (numerator, denominator) = if repeating.is_empty() {
            (head, ten_pow(non_repeating.len())?)
        } else {
            let full = parse_integer(&format!("{}{}{}", integer, non_repeating, repeating))?;
            (
                full - head,
                ten_pow(non_repeating.len() + repeating.len())? - ten_pow(non_repeating.len())?,
            )
        };

        let value = match exponent {
            None => Self::from_positive(numerator, denominator),
            Some(exponent) => {
                let exponent: i64 = exponent.parse().map_err(|_| {
                    ArithmeticError::Domain(format!("invalid exponent '{}'", exponent))
                })?;
                let scale = ten_pow(usize::try_from(exponent.unsigned_abs()).unwrap_or(usize::MAX))?;
                if exponent >= 0 {
                    Self::from_positive(numerator * scale, denominator)
                } else {
                    Self::from_positive(numerator, denominator * scale)
                }
            }
        };
        Ok(value.normalized())
    }

    /// The signed numerator
    pub fn numerator(&self) -> &BigInt {
        &self.numerator
    }

    /// The positive denominator
    pub fn denominator(&self) -> &BigInt {
        &self.denominator
    }

    /// The same value with numerator and denominator divided by their gcd
    #[must_use]
    pub fn normalized(&self) -> Self {
        let gcd = self.numerator.gcd(&self.denominator);
        if gcd.is_one() {
            return self.clone();
        }
        Self::from_positive(&self.numerator / &gcd, &self.denominator / &gcd)
    }

    /// Whether the value is zero
    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    /// Whether the value is a whole number
    pub fn is_integer(&self) -> bool {
        (&self.numerator % &self.denominator).is_zero()
    }

    /// Whether the value is below zero
    pub fn is_negative(&self) -> bool {
        self.numerator.is_negative()
    }

    /// `-1`, `0` or `1`
    pub fn signum(&self) -> i8 {
        match self.numerator.cmp(&BigInt::zero()) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    /// The absolute value
    #[must_use]
    pub fn abs(&self) -> Self {
        Self::from_positive(self.numerator.abs(), self.denominator.clone())
    }

    /// The integer part, rounded towards zero
    pub fn to_integer(&self) -> BigInt {
        &self.numerator / &self.denominator
    }

    /// Largest whole number not above the value
    #[must_use]
    pub fn floor(&self) -> Self {
        Self::from(self.numerator.div_floor(&self.denominator))
    }

    /// Smallest whole number not below the value
    #[must_use]
    pub fn ceil(&self) -> Self {
        Self::from(-(-&self.numerator).div_floor(&self.denominator))
    }

    /// `1 / self`
    ///
    /// # Errors
    ///
    /// Returns [`ArithmeticError::DivideByZero`] when the value is zero.
    pub fn reciprocal(&self) -> Result<Self, ArithmeticError> {
        if self.is_zero() {
            return Err(ArithmeticError::DivideByZero);
        }
        Self::new(self.denominator.clone(), self.numerator.clone())
    }

    /// `self / other`, computed as `self * (1 / other)`
    ///
    /// # Errors
    ///
    /// Returns [`ArithmeticError::DivideByZero`] when `other` is zero.
    pub fn checked_div(&self, other: &Self) -> Result<Self, ArithmeticError> {
        Ok(self * &other.reciprocal()?)
    }

    /// `self` raised to a whole power
    ///
    /// # Errors
    ///
    /// Fails for a negative power of zero or a power that does not fit `u32`.
    pub fn pow(&self, exponent: i64) -> Result<Self, ArithmeticError> {
        let magnitude = u32::try_from(exponent.unsigned_abs())
            .map_err(|_| ArithmeticError::Domain(format!("exponent {} is too large", exponent)))?;
        let base = if exponent < 0 {
            self.reciprocal()?
        } else {
            self.normalized()
        };
        Ok(Self::from_positive(
            base.numerator.pow(magnitude),
            base.denominator.pow(magnitude),
        ))
    }

    /// Render the value in the literal notation, marking a repeating block
    /// as `{digits}R`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cruncher::RationalValue;
    /// assert_eq!(RationalValue::new(-1, 7).unwrap().to_exact_string(), "-0.{142857}R");
    /// assert_eq!(RationalValue::new(31, 300).unwrap().to_exact_string(), "0.103{3}R");
    /// assert_eq!(RationalValue::new(-10, 4).unwrap().to_exact_string(), "-2.5");
    /// ```
    pub fn to_exact_string(&self) -> String {
        let value = self.normalized();
        let (integer, mut remainder) = value.numerator.abs().div_rem(&value.denominator);

        let mut rendered = String::new();
        if value.is_negative() {
            rendered.push('-');
        }
        rendered.push_str(&integer.to_str_radix(10));
        if remainder.is_zero() {
            return rendered;
        }

        let ten = BigInt::from(10);
        let mut digits = String::new();
        let mut seen: BTreeMap<BigInt, usize> = BTreeMap::new();
        let mut cycle_start = None;
        while !remainder.is_zero() {
            if let Some(&start) = seen.get(&remainder) {
                cycle_start = Some(start);
                break;
            }
            seen.insert(remainder.clone(), digits.len());
            let (digit, rest) = (remainder * &ten).div_rem(&value.denominator);
            digits.push_str(&digit.to_str_radix(10));
            remainder = rest;
        }
        rendered.push('.');
        match cycle_start {
            None => rendered.push_str(&digits),
            Some(start) => {
                let mut cycle = digits.split_off(start);
                // the digits before a cycle never end in zero, rotate the
                // cycle into them until they do not; it always holds a non zero digit
                while digits.ends_with('0') {
                    let first = cycle.remove(0);
                    digits.push(first);
                    cycle.push(first);
                }
                rendered.push_str(&digits);
                rendered.push('{');
                rendered.push_str(&cycle);
                rendered.push_str("}R");
            }
        }
        rendered
    }
}

fn parse_integer(digits: &str) -> Result<BigInt, ArithmeticError> {
    BigInt::from_str(digits)
        .map_err(|_| ArithmeticError::Domain(format!("'{}' is not an integer", digits)))
}

fn ten_pow(exponent: usize) -> Result<BigInt, ArithmeticError> {
    if exponent > MAX_LITERAL_EXPONENT as usize {
        return Err(ArithmeticError::Domain(format!(
            "exponent {} exceeds {}",
            exponent, MAX_LITERAL_EXPONENT
        )));
    }
    Ok(num_traits::pow::pow(BigInt::from(10), exponent))
}

impl From<BigInt> for RationalValue {
    fn from(integer: BigInt) -> Self {
        Self::from_positive(integer, BigInt::one())
    }
}

impl From<i64> for RationalValue {
    fn from(integer: i64) -> Self {
        Self::from(BigInt::from(integer))
    }
}

impl FromStr for RationalValue {
    type Err = ParseError;

    /// Parse a complete number literal
    fn from_str(literal: &str) -> Result<Self, ParseError> {
        let parts = decompose(literal).ok_or_else(|| ParseError::InvalidNumber {
            literal: literal.to_string(),
        })?;
        Ok(Self::from_components(
            &parts.integer,
            parts.non_repeating.as_deref(),
            parts.repeating.as_deref(),
            parts.exponent.as_deref(),
        )?)
    }
}

impl Display for RationalValue {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str(&self.to_exact_string())
    }
}

impl PartialEq for RationalValue {
    fn eq(&self, other: &Self) -> bool {
        &self.numerator * &other.denominator == &other.numerator * &self.denominator
    }
}

impl Eq for RationalValue {}

impl PartialOrd for RationalValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RationalValue {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.numerator * &other.denominator).cmp(&(&other.numerator * &self.denominator))
    }
}

impl Hash for RationalValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let value = self.normalized();
        value.numerator.hash(state);
        value.denominator.hash(state);
    }
}

impl<'a> Add<&'a RationalValue> for &'a RationalValue {
    type Output = RationalValue;

    fn add(self, other: &'a RationalValue) -> RationalValue {
        RationalValue::from_positive(
            &self.numerator * &other.denominator + &other.numerator * &self.denominator,
            &self.denominator * &other.denominator,
        )
    }
}

impl<'a> Sub<&'a RationalValue> for &'a RationalValue {
    type Output = RationalValue;

    fn sub(self, other: &'a RationalValue) -> RationalValue {
        RationalValue::from_positive(
            &self.numerator * &other.denominator - &other.numerator * &self.denominator,
            &self.denominator * &other.denominator,
        )
    }
}

impl<'a> Mul<&'a RationalValue> for &'a RationalValue {
    type Output = RationalValue;

    fn mul(self, other: &'a RationalValue) -> RationalValue {
        RationalValue::from_positive(
            &self.numerator * &other.numerator,
            &self.denominator * &other.denominator,
        )
    }
}

impl<'a> Neg for &'a RationalValue {
    type Output = RationalValue;

    fn neg(self) -> RationalValue {
        RationalValue::from_positive(-&self.numerator, self.denominator.clone())
    }
}

impl Add for RationalValue {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        &self + &other
    }
}

impl Sub for RationalValue {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        &self - &other
    }
}

impl Mul for RationalValue {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        &self * &other
    }
}

impl Neg for RationalValue {
    type Output = Self;

    fn neg(self) -> Self {
        -&self
    }
}
