//! Payment Assignments

use std::fmt;

use rusty_money::{Money, iso::Currency};

use crate::instruments::InstrumentKey;

/// How a single order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStrategy {
    /// Whole order paid with a promoted traditional instrument, earning its discount.
    PromotedTraditional(InstrumentKey),

    /// Whole order paid with points, earning the points discount.
    FullPoints,

    /// 10% of the order paid with points, the rest with one traditional instrument.
    PartialPoints(InstrumentKey),

    /// Whole order paid with a traditional instrument at no discount.
    PlainTraditional(InstrumentKey),
}

impl PaymentStrategy {
    /// Traditional instrument involved in this strategy, if any.
    pub fn traditional_instrument(self) -> Option<InstrumentKey> {
        match self {
            PaymentStrategy::PromotedTraditional(key)
            | PaymentStrategy::PartialPoints(key)
            | PaymentStrategy::PlainTraditional(key) => Some(key),
            PaymentStrategy::FullPoints => None,
        }
    }

    /// Short label for reporting.
    pub fn label(self) -> &'static str {
        match self {
            PaymentStrategy::PromotedTraditional(_) => "promoted card",
            PaymentStrategy::FullPoints => "full points",
            PaymentStrategy::PartialPoints(_) => "partial points",
            PaymentStrategy::PlainTraditional(_) => "card",
        }
    }
}

impl fmt::Display for PaymentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Payment decision for one order on a complete assignment path.
///
/// `points + traditional + discount` always equals the order value.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment<'a> {
    /// Order the decision is for
    pub order_id: String,

    /// Chosen strategy
    pub strategy: PaymentStrategy,

    /// Amount settled with points
    pub points: Money<'a, Currency>,

    /// Amount settled with the traditional instrument
    pub traditional: Money<'a, Currency>,

    /// Discount earned
    pub discount: Money<'a, Currency>,
}

impl Assignment<'_> {
    /// Traditional instrument used by this assignment, if any.
    pub fn traditional_instrument(&self) -> Option<InstrumentKey> {
        self.strategy.traditional_instrument()
    }

    /// Sum of the amounts paid and the discount, in minor units.
    pub fn covered_minor(&self) -> i64 {
        self.points.to_minor_units()
            + self.traditional.to_minor_units()
            + self.discount.to_minor_units()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::PLN;

    use super::*;

    #[test]
    fn full_points_has_no_traditional_instrument() {
        assert_eq!(PaymentStrategy::FullPoints.traditional_instrument(), None);

        let key = InstrumentKey::default();

        assert_eq!(
            PaymentStrategy::PartialPoints(key).traditional_instrument(),
            Some(key)
        );
    }

    #[test]
    fn covered_amount_adds_every_part() {
        let assignment = Assignment {
            order_id: "ORDER1".to_string(),
            strategy: PaymentStrategy::PartialPoints(InstrumentKey::default()),
            points: Money::from_minor(1_000, PLN),
            traditional: Money::from_minor(8_000, PLN),
            discount: Money::from_minor(1_000, PLN),
        };

        assert_eq!(assignment.covered_minor(), 10_000);
    }

    #[test]
    fn strategy_display_uses_label() {
        assert_eq!(PaymentStrategy::FullPoints.to_string(), "full points");
    }
}
