//! Pricing
//!
//! Exact currency arithmetic shared by the evaluator, the ledger and the projector.
//! Every amount is carried as a [`Money`] value in minor units, so repeated
//! add/subtract cycles never drift.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;

/// Number of fractional digits every amount is rounded to.
pub const SCALE: u32 = 2;

/// Errors raised while converting decimals and percentages into money.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// The decimal amount cannot be represented in minor units.
    #[error("amount {0} cannot be represented in minor units")]
    Unrepresentable(Decimal),

    /// Percentage calculation overflowed.
    #[error("percentage calculation overflowed")]
    PercentConversion,

    /// Currency code is not supported.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Round a decimal amount to two fractional digits, half-up, and express it as money.
///
/// # Errors
///
/// Returns [`PricingError::Unrepresentable`] if the amount overflows `i64` minor units.
pub fn to_money(amount: Decimal, currency: &Currency) -> Result<Money<'_, Currency>, PricingError> {
    let minor = amount
        .round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|value| value.to_i64())
        .ok_or(PricingError::Unrepresentable(amount))?;

    Ok(Money::from_minor(minor, currency))
}

/// Build a percentage from an integer number of percent (`15` -> 15%).
pub fn percent(points: u8) -> Percentage {
    Percentage::from(Decimal::new(i64::from(points), 2))
}

/// Calculate `percent` of `minor` minor units, rounded half-up to a whole minor unit.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the multiplication overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    exact_percent_of_minor(percent, minor)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)
}

/// Calculate `percent` of `minor` minor units without rounding.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the multiplication overflows.
pub fn exact_percent_of_minor(percent: &Percentage, minor: i64) -> Result<Decimal, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::PercentConversion)?;

    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)
}

/// Calculate `percent` of a money amount, rounded half-up to two digits.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the multiplication overflows.
pub fn percent_of<'a>(
    amount: &Money<'a, Currency>,
    percent: &Percentage,
) -> Result<Money<'a, Currency>, PricingError> {
    let minor = percent_of_minor(percent, amount.to_minor_units())?;

    Ok(Money::from_minor(minor, amount.currency()))
}

/// Zero in the given currency.
pub fn zero(currency: &Currency) -> Money<'_, Currency> {
    Money::from_minor(0, currency)
}

/// Format an amount with exactly two fractional digits and no currency symbol.
pub fn format_amount(amount: &Money<'_, Currency>) -> String {
    format!("{:.2}", Decimal::new(amount.to_minor_units(), SCALE))
}

/// Resolve an ISO currency code.
///
/// # Errors
///
/// Returns [`PricingError::UnknownCurrency`] for codes outside the supported set.
pub fn currency(code: &str) -> Result<&'static Currency, PricingError> {
    match code.trim().to_ascii_uppercase().as_str() {
        "PLN" => Ok(iso::PLN),
        "EUR" => Ok(iso::EUR),
        "USD" => Ok(iso::USD),
        "GBP" => Ok(iso::GBP),
        "CHF" => Ok(iso::CHF),
        "CZK" => Ok(iso::CZK),
        other => Err(PricingError::UnknownCurrency(other.to_string())),
    }
}
