//! Candidate payment strategies for a single order.

use rusty_money::{Money, iso::Currency};
use smallvec::{SmallVec, smallvec};

use crate::{
    assignments::{Assignment, PaymentStrategy},
    discounts::DiscountEvaluator,
    instruments::InstrumentKey,
    orders::Order,
    pricing,
    solvers::{Score, SolverError},
};

/// Capacity drawn by a candidate, one leg per instrument.
pub(crate) type Draws<'a> = SmallVec<[(InstrumentKey, Money<'a, Currency>); 2]>;

/// A way to pay one order, with the capacity it needs and what it earns.
#[derive(Debug, Clone)]
pub(crate) struct Candidate<'a> {
    pub(crate) assignment: Assignment<'a>,
    pub(crate) draws: Draws<'a>,
    pub(crate) score: Score,
}

/// Enumerate every strategy for `order` in exploration order:
///
/// 1. full payment with each promoted traditional instrument;
/// 2. full payment with points;
/// 3. 10% points plus the remainder on each traditional instrument;
/// 4. full payment at no discount with each traditional instrument that has no
///    positive promoted discount.
///
/// Feasibility against remaining capacity is left to the ledger.
pub(crate) fn enumerate<'a>(
    order: &Order<'a>,
    evaluator: &DiscountEvaluator<'_, 'a>,
) -> Result<SmallVec<[Candidate<'a>; 8]>, SolverError> {
    let catalog = evaluator.catalog();
    let value = *order.value();
    let currency = value.currency();
    let zero = pricing::zero(currency);

    let mut candidates = SmallVec::new();

    for promotion in order.promotions() {
        let Some(key) = catalog.key(promotion) else {
            continue;
        };

        if catalog.is_points(key) {
            continue;
        }

        let discount = evaluator.full_traditional_discount(order, promotion)?;
        let effective = minus(&value, &[&discount]);

        candidates.push(Candidate {
            assignment: assignment(
                order,
                PaymentStrategy::PromotedTraditional(key),
                zero,
                effective,
                discount,
            ),
            draws: smallvec![(key, effective)],
            score: Score::new(discount.to_minor_units(), 0),
        });
    }

    if let Some(points_key) = catalog.points_key() {
        let discount = evaluator.points_discount(order, &value)?;
        let paid = minus(&value, &[&discount]);

        candidates.push(Candidate {
            assignment: assignment(order, PaymentStrategy::FullPoints, paid, zero, discount),
            draws: smallvec![(points_key, value)],
            score: Score::new(discount.to_minor_units(), value.to_minor_units()),
        });

        let points = evaluator.partial_points_amount(order)?;
        let discount = evaluator.points_discount(order, &points)?;

        if discount.to_minor_units() > 0 {
            let remainder = minus(&value, &[&discount, &points]);

            for key in catalog.traditional_keys() {
                candidates.push(Candidate {
                    assignment: assignment(
                        order,
                        PaymentStrategy::PartialPoints(key),
                        points,
                        remainder,
                        discount,
                    ),
                    draws: smallvec![(points_key, points), (key, remainder)],
                    score: Score::new(discount.to_minor_units(), points.to_minor_units()),
                });
            }
        }
    }

    for key in catalog.traditional_keys() {
        let Some(instrument) = catalog.get(key) else {
            continue;
        };

        let id = instrument.id();

        if order.has_promotion(id) {
            let discount = evaluator.full_traditional_discount(order, id)?;

            if discount.to_minor_units() > 0 {
                continue;
            }
        }

        candidates.push(Candidate {
            assignment: assignment(
                order,
                PaymentStrategy::PlainTraditional(key),
                zero,
                value,
                zero,
            ),
            draws: smallvec![(key, value)],
            score: Score::default(),
        });
    }

    Ok(candidates)
}

fn assignment<'a>(
    order: &Order<'a>,
    strategy: PaymentStrategy,
    points: Money<'a, Currency>,
    traditional: Money<'a, Currency>,
    discount: Money<'a, Currency>,
) -> Assignment<'a> {
    Assignment {
        order_id: order.id().to_string(),
        strategy,
        points,
        traditional,
        discount,
    }
}

fn minus<'a>(
    from: &Money<'a, Currency>,
    amounts: &[&Money<'a, Currency>],
) -> Money<'a, Currency> {
    let drawn: i64 = amounts.iter().map(|amount| amount.to_minor_units()).sum();

    Money::from_minor(from.to_minor_units() - drawn, from.currency())
}
