//! Backtracking Solver
//!
//! Exhaustive depth-first search over every payment strategy of every order. Orders
//! are visited by descending value; each branch draws its capacity from a shared
//! [`CapacityLedger`] and gives it back when the branch is left.

use smallvec::SmallVec;
use tracing::{debug, instrument};

use crate::{
    assignments::Assignment,
    discounts::DiscountEvaluator,
    instruments::InstrumentCatalog,
    ledger::CapacityLedger,
    orders::{self, Order},
    solvers::{Allocation, Score, Solution, Solver, SolverError},
};

mod candidates;
pub mod observer;

use candidates::Candidate;

pub use observer::{AllocationObserver, NoopObserver, TracingObserver};

/// Counters collected while searching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Strategies committed to the ledger
    pub branches: u64,

    /// Paths on which every order was paid
    pub leaves: u64,

    /// Orders for which no strategy fitted the remaining capacity
    pub dead_ends: u64,
}

/// Solution together with search counters.
#[derive(Debug, Clone)]
pub struct SolveReport<'a> {
    /// Outcome of the search
    pub solution: Solution<'a>,

    /// Counters collected on the way
    pub stats: SearchStats,
}

/// Solver exploring every strategy combination with scoped capacity rollback
#[derive(Debug)]
pub struct BacktrackingSolver;

impl BacktrackingSolver {
    /// Solve while reporting search progress to `observer`.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] if an order is in a different currency than the
    /// catalog, or if discount evaluation or the ledger reject an amount.
    pub fn solve_with_observer<'a>(
        orders: &[Order<'a>],
        catalog: &InstrumentCatalog<'a>,
        observer: &mut dyn AllocationObserver,
    ) -> Result<Solution<'a>, SolverError> {
        Self::solve_with_stats(orders, catalog, observer).map(|report| report.solution)
    }

    /// Solve and return the search counters alongside the solution.
    ///
    /// # Errors
    ///
    /// See [`Self::solve_with_observer`].
    #[instrument(skip_all, fields(orders = orders.len(), instruments = catalog.len()))]
    pub fn solve_with_stats<'a>(
        orders: &[Order<'a>],
        catalog: &InstrumentCatalog<'a>,
        observer: &mut dyn AllocationObserver,
    ) -> Result<SolveReport<'a>, SolverError> {
        ensure_currency(orders, catalog)?;

        let evaluator = DiscountEvaluator::new(catalog);

        // Discounts do not depend on remaining capacity, so every order's strategies
        // are priced once up front.
        let plan = orders::by_descending_value(orders)
            .into_iter()
            .map(|order| {
                Ok(Step {
                    order,
                    candidates: candidates::enumerate(order, &evaluator)?,
                })
            })
            .collect::<Result<Vec<_>, SolverError>>()?;

        let mut ledger = CapacityLedger::from_catalog(catalog);

        let mut search = Search {
            plan: &plan,
            observer,
            path: Vec::with_capacity(plan.len()),
            best: None,
            stats: SearchStats::default(),
        };

        search.descend(0, &mut ledger, Score::default())?;

        let Search { best, stats, .. } = search;

        debug!(
            branches = stats.branches,
            leaves = stats.leaves,
            dead_ends = stats.dead_ends,
            found = best.is_some(),
            "search finished"
        );

        let solution = match best {
            Some(Best { score, assignments }) => Solution::Complete(Allocation {
                assignments,
                score,
                currency: catalog.currency(),
            }),
            None => Solution::NoCompleteAssignment,
        };

        Ok(SolveReport { solution, stats })
    }
}

impl Solver for BacktrackingSolver {
    fn solve<'a>(
        orders: &[Order<'a>],
        catalog: &InstrumentCatalog<'a>,
    ) -> Result<Solution<'a>, SolverError> {
        Self::solve_with_observer(orders, catalog, &mut NoopObserver)
    }
}

fn ensure_currency(
    orders: &[Order<'_>],
    catalog: &InstrumentCatalog<'_>,
) -> Result<(), SolverError> {
    let expected = catalog.currency().iso_alpha_code;

    match orders
        .iter()
        .find(|order| order.value().currency().iso_alpha_code != expected)
    {
        Some(order) => Err(SolverError::CurrencyMismatch {
            order_id: order.id().to_string(),
            order_currency: order.value().currency().iso_alpha_code,
            catalog_currency: expected,
        }),
        None => Ok(()),
    }
}

/// One level of the search: an order and its priced strategies.
struct Step<'s, 'a> {
    order: &'s Order<'a>,
    candidates: SmallVec<[Candidate<'a>; 8]>,
}

struct Best<'a> {
    score: Score,
    assignments: Vec<Assignment<'a>>,
}

struct Search<'s, 'a> {
    plan: &'s [Step<'s, 'a>],
    observer: &'s mut dyn AllocationObserver,
    path: Vec<Assignment<'a>>,
    best: Option<Best<'a>>,
    stats: SearchStats,
}

impl<'a> Search<'_, 'a> {
    fn descend(
        &mut self,
        depth: usize,
        ledger: &mut CapacityLedger<'a>,
        running: Score,
    ) -> Result<(), SolverError> {
        let plan = self.plan;

        let Some(step) = plan.get(depth) else {
            self.record_leaf(running);

            return Ok(());
        };

        let mut committed_any = false;

        for candidate in &step.candidates {
            let Some(mut commitment) = ledger.commit(&candidate.draws)? else {
                continue;
            };

            committed_any = true;
            self.stats.branches += 1;
            self.observer
                .on_branch(depth, step.order, &candidate.assignment);

            self.path.push(candidate.assignment.clone());

            let outcome = self.descend(
                depth + 1,
                commitment.ledger_mut(),
                running.plus(candidate.score),
            );

            self.path.pop();

            outcome?;
        }

        if !committed_any {
            self.stats.dead_ends += 1;
            self.observer.on_dead_end(depth, step.order);
        }

        Ok(())
    }

    fn record_leaf(&mut self, score: Score) {
        self.stats.leaves += 1;
        self.observer.on_leaf(score);

        let best = self.best.as_ref().map(|best| &best.score);

        if score.improves_on(best) {
            self.observer.on_new_best(score);
            self.best = Some(Best {
                score,
                assignments: self.path.clone(),
            });
        }
    }
}
