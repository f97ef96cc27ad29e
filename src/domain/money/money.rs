//! Monetary amounts held as integer minor units

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Currency;

/// An exact monetary amount: an integer count of minor units in a currency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    currency: Currency,
    amount_minor: i64,
}

impl Money {
    /// Creates an amount from minor units (e.g. cents)
    pub fn of_minor(currency: Currency, amount_minor: i64) -> Self {
        Self {
            currency,
            amount_minor,
        }
    }

    /// Creates an amount from whole major units
    ///
    /// Returns `None` when the value does not fit in minor units.
    pub fn of_major(currency: Currency, amount_major: i64) -> Option<Self> {
        let factor = 10i64.checked_pow(currency.scale())?;
        let amount_minor = amount_major.checked_mul(factor)?;
        Some(Self::of_minor(currency, amount_minor))
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    pub fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = self.currency.scale();

        if scale == 0 {
            return write!(f, "{} {}", self.currency, self.amount_minor);
        }

        let sign = if self.amount_minor < 0 { "-" } else { "" };
        let magnitude = self.amount_minor.unsigned_abs();
        let factor = 10u64.pow(scale);

        write!(
            f,
            "{} {}{}.{:0width$}",
            self.currency,
            sign,
            magnitude / factor,
            magnitude % factor,
            width = scale as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn twd() -> Currency {
        Currency::of("TWD").unwrap()
    }

    #[test]
    fn test_display_with_scale() {
        let price = Money::of_minor(twd(), 15000);
        assert_eq!(price.to_string(), "TWD 150.00");

        let small = Money::of_minor(twd(), 5);
        assert_eq!(small.to_string(), "TWD 0.05");
    }

    #[test]
    fn test_display_negative_and_extreme() {
        assert_eq!(Money::of_minor(twd(), -1250).to_string(), "TWD -12.50");
        assert_eq!(
            Money::of_minor(twd(), i64::MIN).to_string(),
            "TWD -92233720368547758.08"
        );
    }

    #[test]
    fn test_display_zero_scale() {
        let yen = Money::of_minor(Currency::of("JPY").unwrap(), 480);
        assert_eq!(yen.to_string(), "JPY 480");
    }

    #[test]
    fn test_of_major() {
        let price = Money::of_major(twd(), 150).unwrap();
        assert_eq!(price.amount_minor(), 15000);
        assert!(Money::of_major(twd(), i64::MAX).is_none());
    }
}
