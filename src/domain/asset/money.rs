//! Money value object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::AssetError;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(AssetError::UnsupportedCurrency(other.to_string())),
        }
    }
}

/// An amount in a supported currency. The amount is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Money {
    amount: f64,
    currency: Currency,
}

impl Money {
    /// Creates money, rejecting negative or non-finite amounts.
    pub fn new(amount: f64, currency: Currency) -> Result<Self, AssetError> {
        let money = Self { amount, currency };
        money.validate()?;
        Ok(money)
    }

    /// Parses the currency code and validates the amount.
    pub fn parse(amount: f64, currency: &str) -> Result<Self, AssetError> {
        Self::new(amount, currency.parse()?)
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: 0.0,
            currency,
        }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn validate(&self) -> Result<(), AssetError> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(AssetError::InvalidAmount(self.amount));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}
