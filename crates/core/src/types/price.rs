//! Type-safe price representation using decimal arithmetic.
//!
//! The backend is the only party that computes monetary amounts; this type
//! exists so the client can carry and display them without float rounding.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A monetary amount with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., naira, not kobo).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the store's default currency (NGN).
    #[must_use]
    pub const fn naira(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::NGN)
    }

    /// Format for display with symbol and thousands grouping.
    ///
    /// Whole amounts omit the decimal part (`₦5,000`); fractional amounts
    /// keep two places (`₦5,000.50`).
    #[must_use]
    pub fn display(&self) -> String {
        let sign = if self.amount.is_sign_negative() {
            "-"
        } else {
            ""
        };
        let abs = self.amount.abs().round_dp(2);
        let whole = abs.trunc();
        let grouped = group_thousands(&whole.to_string());
        let fraction = abs - whole;

        if fraction.is_zero() {
            format!("{sign}{}{grouped}", self.currency_code.symbol())
        } else {
            let hundredths = (fraction * Decimal::from(100))
                .round()
                .to_u32()
                .unwrap_or(0);
            format!(
                "{sign}{}{grouped}.{hundredths:02}",
                self.currency_code.symbol()
            )
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    NGN,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Currency symbol for display.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::NGN => "\u{20a6}",
            Self::USD => "$",
            Self::EUR => "\u{20ac}",
            Self::GBP => "\u{a3}",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NGN => "NGN",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

/// Insert comma separators into a string of decimal digits.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
