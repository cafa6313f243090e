use std::{
    fmt::Display,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "usd";

//--------------------------------------        Cents         ---------------------------------------------------------
/// A monetary amount expressed in the currency's minor unit (e.g. cents for USD).
///
/// All prices enter the system through [`Cents::from_str`] and stay integral from then on, so the amount sent to the
/// payment processor is always exactly the order total that was stored.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, AddAssign, add_assign);
op!(inplace Cents, SubAssign, sub_assign);
op!(unary Cents, Neg, neg);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CentsConversionError(format!("Value {value} is too large to convert to Cents")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

/// Parses a decimal amount in major units ("49.99", "5", "0.5") into minor units.
///
/// At most two fractional digits are accepted. Anything finer cannot be charged and is rejected rather than rounded.
impl FromStr for Cents {
    type Err = CentsConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(CentsConversionError(format!("'{s}' is empty")));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(CentsConversionError(format!("'{s}' is not a decimal amount")));
        }
        if frac.len() > 2 {
            return Err(CentsConversionError(format!("'{s}' has more than two decimal places")));
        }
        let whole = if whole.is_empty() {
            0
        } else {
            whole.parse::<i64>().map_err(|e| CentsConversionError(format!("'{s}': {e}")))?
        };
        let frac = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|e| CentsConversionError(format!("'{s}': {e}")))? * 10,
            _ => frac.parse::<i64>().map_err(|e| CentsConversionError(format!("'{s}': {e}")))?,
        };
        let value = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(|| CentsConversionError(format!("'{s}' is too large")))?;
        Ok(Self(if negative { -value } else { value }))
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// `None` if the product does not fit in an `i64`. Order totals must go through this, never a wrapping multiply.
    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}
