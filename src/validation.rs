//! Validation
//!
//! Structural checks on loaded records, run before anything is converted into
//! orders or a catalog.

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::input::records::{InstrumentRecord, OrderRecord};

/// Validation Errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// An order has an empty or blank id.
    #[error("order id cannot be empty")]
    EmptyOrderId,

    /// An order value is negative.
    #[error("order value cannot be negative for order {0}")]
    NegativeOrderValue(String),

    /// A promotion names neither a known instrument nor the points instrument.
    #[error("unknown promotion id '{promotion}' for order {order_id}")]
    UnknownPromotion {
        /// Order listing the promotion
        order_id: String,
        /// Offending promotion id
        promotion: String,
    },

    /// An instrument has an empty or blank id.
    #[error("payment method id cannot be empty")]
    EmptyInstrumentId,

    /// Two instruments share an id.
    #[error("duplicate payment method id: {0}")]
    DuplicateInstrument(String),

    /// Discount outside `0..=100`.
    #[error("payment method {id} has discount {discount}, expected 0..=100")]
    DiscountOutOfRange {
        /// Instrument id
        id: String,
        /// Offending discount
        discount: i64,
    },

    /// An instrument limit is negative.
    #[error("payment method limit cannot be negative for {0}")]
    NegativeLimit(String),
}

/// Check orders and instruments against each other.
///
/// Instruments are checked first so promotion references are resolved against a
/// consistent set.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found, naming the offending id.
pub fn validate(
    orders: &[OrderRecord],
    instruments: &[InstrumentRecord],
    points_id: &str,
) -> Result<(), ValidationError> {
    let known = validate_instruments(instruments)?;

    for order in orders {
        if order.id.trim().is_empty() {
            return Err(ValidationError::EmptyOrderId);
        }

        if order.value < Decimal::ZERO {
            return Err(ValidationError::NegativeOrderValue(order.id.clone()));
        }

        if let Some(promotion) = order
            .promotions()
            .iter()
            .find(|p| p.as_str() != points_id && !known.contains(p.as_str()))
        {
            return Err(ValidationError::UnknownPromotion {
                order_id: order.id.clone(),
                promotion: promotion.clone(),
            });
        }
    }

    Ok(())
}

fn validate_instruments(
    instruments: &[InstrumentRecord],
) -> Result<FxHashSet<&str>, ValidationError> {
    let mut seen = FxHashSet::default();

    for instrument in instruments {
        if instrument.id.trim().is_empty() {
            return Err(ValidationError::EmptyInstrumentId);
        }

        if !seen.insert(instrument.id.as_str()) {
            return Err(ValidationError::DuplicateInstrument(instrument.id.clone()));
        }

        if !(0..=100).contains(&instrument.discount) {
            return Err(ValidationError::DiscountOutOfRange {
                id: instrument.id.clone(),
                discount: instrument.discount,
            });
        }

        if instrument.limit < Decimal::ZERO {
            return Err(ValidationError::NegativeLimit(instrument.id.clone()));
        }
    }

    Ok(seen)
}
