//! Money type for representing monetary values.
//!
//! Amounts are integer minor units. The storefront speaks decimal strings
//! (`"125.0"`), which are parsed exactly rather than through `f64`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    CAD,
    EUR,
    GBP,
    AUD,
    JPY,
}

impl Currency {
    /// Get the currency code (e.g., "USD").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::CAD => "CAD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::AUD => "AUD",
            Currency::JPY => "JPY",
        }
    }

    /// Get the currency symbol (e.g., "$").
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::CAD => "CA$",
            Currency::EUR => "\u{20ac}",
            Currency::GBP => "\u{00a3}",
            Currency::AUD => "A$",
            Currency::JPY => "\u{00a5}",
        }
    }

    /// Get the number of decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            "CAD" => Some(Currency::CAD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "AUD" => Some(Currency::AUD),
            "JPY" => Some(Currency::JPY),
            _ => None,
        }
    }

    fn minor_per_major(&self) -> i64 {
        10_i64.pow(self.decimal_places())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A monetary value with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in smallest currency unit (e.g., cents).
    pub amount_cents: i64,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value from cents.
    pub fn new(amount_cents: i64, currency: Currency) -> Self {
        Self {
            amount_cents,
            currency,
        }
    }

    /// Create a Money value from whole major units.
    ///
    /// ```
    /// use optic_commerce::money::{Money, Currency};
    /// assert_eq!(Money::from_major(125, Currency::USD).amount_cents, 12500);
    /// ```
    pub fn from_major(amount: i64, currency: Currency) -> Self {
        Self::new(amount * currency.minor_per_major(), currency)
    }

    /// Parse a decimal string such as `"49.9"` or `"-3.25"`.
    ///
    /// Extra fractional digits beyond the currency's precision are rejected.
    ///
    /// ```
    /// use optic_commerce::money::{Money, Currency};
    /// let price = Money::parse_decimal("49.9", Currency::USD).unwrap();
    /// assert_eq!(price.amount_cents, 4990);
    /// ```
    pub fn parse_decimal(input: &str, currency: Currency) -> Option<Self> {
        let input = input.trim();
        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input.strip_prefix('+').unwrap_or(input)),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }
        let places = currency.decimal_places() as usize;
        let frac = frac.trim_end_matches('0');
        if frac.len() > places {
            return None;
        }

        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let frac_value: i64 = if frac.is_empty() {
            0
        } else {
            format!("{:0<places$}", frac).parse().ok()?
        };

        let amount = whole
            .checked_mul(currency.minor_per_major())?
            .checked_add(frac_value)?;
        Some(Self::new(if negative { -amount } else { amount }, currency))
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    /// Check if this is negative.
    pub fn is_negative(&self) -> bool {
        self.amount_cents < 0
    }

    /// Format as a display string (e.g., "$49.99").
    pub fn display(&self) -> String {
        format!("{}{}", self.currency.symbol(), self.display_amount())
    }

    /// Format as a plain decimal without symbol (e.g., "49.99").
    pub fn display_amount(&self) -> String {
        let places = self.currency.decimal_places() as usize;
        let sign = if self.amount_cents < 0 { "-" } else { "" };
        let abs = self.amount_cents.unsigned_abs();
        if places == 0 {
            return format!("{}{}", sign, abs);
        }
        let divisor = self.currency.minor_per_major() as u64;
        format!("{}{}.{:0places$}", sign, abs / divisor, abs % divisor)
    }

    /// Try to add another Money value, returning None on currency mismatch or overflow.
    pub fn try_add(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        self.amount_cents
            .checked_add(other.amount_cents)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// Try to subtract another Money value.
    pub fn try_subtract(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        self.amount_cents
            .checked_sub(other.amount_cents)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// Multiply by a quantity.
    pub fn try_multiply(&self, factor: i64) -> Option<Money> {
        self.amount_cents
            .checked_mul(factor)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// A whole-number percentage of this amount, rounded half away from zero.
    pub fn percentage(&self, percent: u32) -> Money {
        let scaled = self.amount_cents as i128 * percent as i128;
        let rounded = if scaled >= 0 {
            (scaled + 50) / 100
        } else {
            (scaled - 50) / 100
        };
        Money::new(rounded as i64, self.currency)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_major() {
        let m = Money::from_major(125, Currency::USD);
        assert_eq!(m.amount_cents, 12500);

        let m = Money::from_major(100, Currency::JPY);
        assert_eq!(m.amount_cents, 100);
    }

    #[test]
    fn test_parse_decimal() {
        let usd = Currency::USD;
        assert_eq!(Money::parse_decimal("49.99", usd).unwrap().amount_cents, 4999);
        assert_eq!(Money::parse_decimal("125.0", usd).unwrap().amount_cents, 12500);
        assert_eq!(Money::parse_decimal("7", usd).unwrap().amount_cents, 700);
        assert_eq!(Money::parse_decimal(".5", usd).unwrap().amount_cents, 50);
        assert_eq!(Money::parse_decimal("-3.25", usd).unwrap().amount_cents, -325);
        assert_eq!(Money::parse_decimal("10.500", usd).unwrap().amount_cents, 1050);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        let usd = Currency::USD;
        assert!(Money::parse_decimal("", usd).is_none());
        assert!(Money::parse_decimal("abc", usd).is_none());
        assert!(Money::parse_decimal("1.234", usd).is_none());
        assert!(Money::parse_decimal("1.2.3", usd).is_none());
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(4999, Currency::USD).display(), "$49.99");
        assert_eq!(Money::new(5, Currency::USD).display_amount(), "0.05");
        assert_eq!(Money::new(-150, Currency::USD).display_amount(), "-1.50");
        assert_eq!(Money::new(100, Currency::JPY).display(), "\u{00a5}100");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(1000, Currency::USD);
        let b = Money::new(300, Currency::USD);
        assert_eq!(a.try_add(&b).unwrap().amount_cents, 1300);
        assert_eq!(a.try_subtract(&b).unwrap().amount_cents, 700);
        assert_eq!(a.try_multiply(3).unwrap().amount_cents, 3000);
    }

    #[test]
    fn test_money_currency_mismatch() {
        let usd = Money::new(1000, Currency::USD);
        let eur = Money::new(1000, Currency::EUR);
        assert!(usd.try_add(&eur).is_none());
    }

    #[test]
    fn test_money_percentage() {
        assert_eq!(Money::new(10000, Currency::USD).percentage(20).amount_cents, 2000);
        // 20% of $0.13 = 2.6 cents, rounds to 3
        assert_eq!(Money::new(13, Currency::USD).percentage(20).amount_cents, 3);
    }

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("USD"), Some(Currency::USD));
        assert_eq!(Currency::from_code("cad"), Some(Currency::CAD));
        assert_eq!(Currency::from_code("INVALID"), None);
    }
}
