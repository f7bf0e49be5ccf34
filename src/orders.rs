//! Orders

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

/// Identifiers of instruments advertising a full-payment discount for an order.
pub type Promotions = SmallVec<[String; 4]>;

/// A purchase order waiting to be paid.
#[derive(Clone, Debug, PartialEq)]
pub struct Order<'a> {
    id: String,
    value: Money<'a, Currency>,
    promotions: Promotions,
}

impl<'a> Order<'a> {
    /// Creates a new order without promotions.
    pub fn new(id: impl Into<String>, value: Money<'a, Currency>) -> Self {
        Self::with_promotions(id, value, Vec::<String>::new())
    }

    /// Creates a new order advertising the given promotions.
    ///
    /// Promotions behave as a set: duplicates are dropped, first occurrence wins.
    pub fn with_promotions<I, S>(
        id: impl Into<String>,
        value: Money<'a, Currency>,
        promotions: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique = Promotions::new();

        for promotion in promotions {
            let promotion = promotion.into();

            if !unique.contains(&promotion) {
                unique.push(promotion);
            }
        }

        Self {
            id: id.into(),
            value,
            promotions: unique,
        }
    }

    /// Returns the order identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the order value.
    pub fn value(&self) -> &Money<'a, Currency> {
        &self.value
    }

    /// Returns the promoted instrument ids.
    pub fn promotions(&self) -> &[String] {
        &self.promotions
    }

    /// Whether paying in full with `instrument_id` is advertised as promoted.
    pub fn has_promotion(&self, instrument_id: &str) -> bool {
        self.promotions.iter().any(|p| p == instrument_id)
    }
}

/// Sort orders by descending value, keeping input order among equal values.
pub fn by_descending_value<'o, 'a>(orders: &'o [Order<'a>]) -> Vec<&'o Order<'a>> {
    let mut sorted: Vec<&Order<'a>> = orders.iter().collect();

    sorted.sort_by_key(|order| std::cmp::Reverse(order.value().to_minor_units()));

    sorted
}
