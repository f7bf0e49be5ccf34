//! Solvers for Payment Allocation

use std::cmp::Ordering;

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    assignments::Assignment, discounts::DiscountError, instruments::InstrumentCatalog,
    ledger::LedgerError, orders::Order,
};

pub mod backtracking;

/// Solver Errors
///
/// Every variant aborts the whole search: they signal a broken precondition, not
/// an explorable branch.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Wrapped discount evaluation error.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Wrapped ledger error.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// An order is denominated in a different currency than the catalog.
    #[error("order {order_id} is in {order_currency}, catalog is in {catalog_currency}")]
    CurrencyMismatch {
        /// Offending order
        order_id: String,
        /// Order currency code
        order_currency: &'static str,
        /// Catalog currency code
        catalog_currency: &'static str,
    },
}

/// Objective value of a complete assignment, in minor units.
///
/// Ordered by total discount first, then by points used: a higher score is better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Score {
    /// Total discount earned
    pub discount: i64,

    /// Total capacity drawn from the points instrument
    pub points_used: i64,
}

impl Score {
    /// Create a score from minor-unit totals.
    pub const fn new(discount: i64, points_used: i64) -> Self {
        Self {
            discount,
            points_used,
        }
    }

    /// Component-wise sum.
    #[must_use]
    pub const fn plus(self, other: Score) -> Self {
        Self {
            discount: self.discount.saturating_add(other.discount),
            points_used: self.points_used.saturating_add(other.points_used),
        }
    }

    /// Whether this score should replace `best`.
    ///
    /// Any score beats no score; otherwise only a strictly greater score wins, so the
    /// first of several equal scores is kept.
    pub fn improves_on(&self, best: Option<&Score>) -> bool {
        best.is_none_or(|best| compare(self, best) == Ordering::Greater)
    }

    /// Total discount as money.
    pub fn discount_in<'a>(&self, currency: &'a Currency) -> Money<'a, Currency> {
        Money::from_minor(self.discount, currency)
    }

    /// Points used as money.
    pub fn points_used_in<'a>(&self, currency: &'a Currency) -> Money<'a, Currency> {
        Money::from_minor(self.points_used, currency)
    }
}

/// Total order over scores: more discount wins, ties go to more points used.
pub fn compare(a: &Score, b: &Score) -> Ordering {
    a.discount
        .cmp(&b.discount)
        .then_with(|| a.points_used.cmp(&b.points_used))
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

/// Best complete assignment found by a solver.
#[derive(Debug, Clone)]
pub struct Allocation<'a> {
    /// One assignment per order, in the order the search visited them
    pub assignments: Vec<Assignment<'a>>,

    /// Objective value of the assignments
    pub score: Score,

    /// Currency of every amount
    pub currency: &'a Currency,
}

impl<'a> Allocation<'a> {
    /// Total discount across all orders.
    pub fn total_discount(&self) -> Money<'a, Currency> {
        self.score.discount_in(self.currency)
    }

    /// Total capacity drawn from the points instrument.
    pub fn points_used(&self) -> Money<'a, Currency> {
        self.score.points_used_in(self.currency)
    }

    /// Assignment for a given order id.
    pub fn assignment_for(&self, order_id: &str) -> Option<&Assignment<'a>> {
        self.assignments.iter().find(|a| a.order_id == order_id)
    }
}

/// Outcome of an allocation search.
#[derive(Debug, Clone)]
pub enum Solution<'a> {
    /// Every order is paid within capacity.
    Complete(Allocation<'a>),

    /// No combination of strategies pays every order within capacity.
    NoCompleteAssignment,
}

impl<'a> Solution<'a> {
    /// Whether a complete assignment was found.
    pub fn is_complete(&self) -> bool {
        matches!(self, Solution::Complete(_))
    }

    /// The allocation, if one was found.
    pub fn allocation(&self) -> Option<&Allocation<'a>> {
        match self {
            Solution::Complete(allocation) => Some(allocation),
            Solution::NoCompleteAssignment => None,
        }
    }
}

/// Trait for allocating payment instruments to a batch of orders
pub trait Solver {
    /// Find the allocation with the maximum total discount.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] if a precondition of the search is broken.
    fn solve<'a>(
        orders: &[Order<'a>],
        catalog: &InstrumentCatalog<'a>,
    ) -> Result<Solution<'a>, SolverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn more_discount_wins_regardless_of_points() {
        let a = Score::new(1_000, 0);
        let b = Score::new(999, 50_000);

        assert_eq!(compare(&a, &b), Ordering::Greater);
        assert!(a.improves_on(Some(&b)));
        assert!(!b.improves_on(Some(&a)));
    }

    #[test]
    fn equal_discount_prefers_more_points() {
        let a = Score::new(1_000, 2_000);
        let b = Score::new(1_000, 1_000);

        assert_eq!(compare(&a, &b), Ordering::Greater);
        assert!(a.improves_on(Some(&b)));
        assert!(!b.improves_on(Some(&a)));
    }

    #[test]
    fn identical_scores_do_not_replace_best() {
        let a = Score::new(1_000, 1_000);

        assert_eq!(compare(&a, &a), Ordering::Equal);
        assert!(!a.improves_on(Some(&a)));
    }

    #[test]
    fn any_score_beats_nothing() {
        assert!(Score::default().improves_on(None));
    }

    #[test]
    fn scores_sort_by_discount_then_points() {
        let mut scores = [
            Score::new(10, 5),
            Score::new(20, 0),
            Score::new(10, 7),
            Score::new(0, 100),
        ];

        scores.sort();

        assert_eq!(
            scores,
            [
                Score::new(0, 100),
                Score::new(10, 5),
                Score::new(10, 7),
                Score::new(20, 0),
            ]
        );
    }

    #[test]
    fn plus_adds_component_wise() {
        assert_eq!(Score::new(1, 2).plus(Score::new(3, 4)), Score::new(4, 6));
    }
}
