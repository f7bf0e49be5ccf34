//! Discounts
//!
//! Discount rules for paying a single order. Two sources of discount exist and they
//! never stack:
//!
//! - paying the whole order with one traditional instrument listed in the order's
//!   promotions earns that instrument's flat discount;
//! - paying with points earns the points instrument's flat discount when the whole
//!   order is covered, or a flat 10% when at least 10% of the order value is covered.
//!
//! Any positive points amount forecloses the traditional discount for that order.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::warn;

use crate::{
    instruments::InstrumentCatalog,
    orders::Order,
    pricing::{self, PricingError},
};

/// Share of the order value that must be paid with points to earn the partial discount.
/// The same share is the discount granted.
pub const PARTIAL_POINTS_PERCENT: u8 = 10;

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq)]
pub enum DiscountError {
    /// A caller supplied an amount that violates the evaluator's contract.
    #[error("invalid argument for order {order_id}: {reason}")]
    InvalidArgument {
        /// Order the call was made for
        order_id: String,
        /// What was wrong with the argument
        reason: &'static str,
    },

    /// Traditional-only evaluation was asked about the points instrument.
    #[error("order {order_id}: {instrument_id} is the points instrument, not a traditional one")]
    InvalidOperation {
        /// Order the call was made for
        order_id: String,
        /// Offending instrument id
        instrument_id: String,
    },

    /// Percentage arithmetic overflowed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Pure discount rule evaluator over a read-only instrument catalog.
#[derive(Debug, Clone, Copy)]
pub struct DiscountEvaluator<'c, 'a> {
    catalog: &'c InstrumentCatalog<'a>,
    partial_share: Percentage,
}

impl<'c, 'a> DiscountEvaluator<'c, 'a> {
    /// Create an evaluator over `catalog`.
    pub fn new(catalog: &'c InstrumentCatalog<'a>) -> Self {
        Self {
            catalog,
            partial_share: pricing::percent(PARTIAL_POINTS_PERCENT),
        }
    }

    /// Discount for paying the whole order with a single traditional instrument.
    ///
    /// Zero unless `instrument_id` is listed in the order's promotions. Unknown
    /// instruments yield zero.
    ///
    /// # Errors
    ///
    /// - [`DiscountError::InvalidOperation`] if `instrument_id` is the points instrument.
    /// - [`DiscountError::Pricing`] if the percentage calculation overflows.
    pub fn full_traditional_discount(
        &self,
        order: &Order<'a>,
        instrument_id: &str,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        let zero = pricing::zero(order.value().currency());

        if instrument_id == self.catalog.points_id() {
            return Err(DiscountError::InvalidOperation {
                order_id: order.id().to_string(),
                instrument_id: instrument_id.to_string(),
            });
        }

        let Some(instrument) = self.catalog.by_id(instrument_id) else {
            warn!(
                order_id = order.id(),
                instrument_id, "unknown instrument, no discount"
            );

            return Ok(zero);
        };

        if !order.has_promotion(instrument_id) {
            return Ok(zero);
        }

        Ok(pricing::percent_of(order.value(), instrument.discount())?)
    }

    /// Discount earned by paying `points` of the order with the points instrument.
    ///
    /// # Errors
    ///
    /// - [`DiscountError::InvalidArgument`] if `points` is negative or exceeds the order value.
    /// - [`DiscountError::Pricing`] if the percentage calculation overflows.
    pub fn points_discount(
        &self,
        order: &Order<'a>,
        points: &Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        let value = order.value();
        let zero = pricing::zero(value.currency());
        let points_minor = points.to_minor_units();

        if points_minor < 0 {
            return Err(DiscountError::InvalidArgument {
                order_id: order.id().to_string(),
                reason: "points amount is negative",
            });
        }

        if points_minor > value.to_minor_units() {
            return Err(DiscountError::InvalidArgument {
                order_id: order.id().to_string(),
                reason: "points amount exceeds order value",
            });
        }

        if points_minor == 0 {
            return Ok(zero);
        }

        if points_minor == value.to_minor_units() {
            let Some(points_instrument) = self.catalog.points() else {
                warn!(
                    order_id = order.id(),
                    points_id = self.catalog.points_id(),
                    "points instrument missing, no full points discount"
                );

                return Ok(zero);
            };

            return Ok(pricing::percent_of(value, points_instrument.discount())?);
        }

        let threshold =
            pricing::exact_percent_of_minor(&self.partial_share, value.to_minor_units())?;

        if Decimal::from(points_minor) >= threshold {
            return Ok(pricing::percent_of(value, &self.partial_share)?);
        }

        Ok(zero)
    }

    /// Amount owed after the discount of a payment strategy.
    ///
    /// A positive `points` amount selects the points rules and ignores
    /// `traditional_instrument`; otherwise the full traditional discount of the
    /// given instrument applies (none when `None`).
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`Self::points_discount`] and
    /// [`Self::full_traditional_discount`].
    pub fn effective_value(
        &self,
        order: &Order<'a>,
        traditional_instrument: Option<&str>,
        points: &Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        let discount = if points.to_minor_units() != 0 {
            self.points_discount(order, points)?
        } else if let Some(instrument_id) = traditional_instrument {
            self.full_traditional_discount(order, instrument_id)?
        } else {
            pricing::zero(order.value().currency())
        };

        Ok(Money::from_minor(
            order.value().to_minor_units() - discount.to_minor_units(),
            order.value().currency(),
        ))
    }

    /// The minimum points amount that earns the partial points discount, rounded
    /// half-up to two digits.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::Pricing`] if the percentage calculation overflows.
    pub fn partial_points_amount(
        &self,
        order: &Order<'a>,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        Ok(pricing::percent_of(order.value(), &self.partial_share)?)
    }

    /// Catalog this evaluator reads from.
    pub fn catalog(&self) -> &'c InstrumentCatalog<'a> {
        self.catalog
    }
}
