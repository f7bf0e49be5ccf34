//! Allocation Observer

use tracing::{debug, trace};

use crate::{assignments::Assignment, orders::Order, solvers::Score};

/// Observer trait for following the search as it explores branches.
///
/// Observers are passive: they never influence which branches are explored or
/// which allocation wins. When no observer is provided the solver uses
/// [`NoopObserver`].
pub trait AllocationObserver {
    /// Called after a strategy for `order` has been committed, before descending.
    ///
    /// # Parameters
    ///
    /// - `depth`: Position of the order in search order
    /// - `order`: The order being paid
    /// - `assignment`: The committed payment decision
    fn on_branch(&mut self, depth: usize, order: &Order<'_>, assignment: &Assignment<'_>);

    /// Called when no strategy for `order` fits the remaining capacity.
    fn on_dead_end(&mut self, depth: usize, order: &Order<'_>);

    /// Called whenever every order on the current path is paid.
    fn on_leaf(&mut self, _score: Score) {}

    /// Called when a leaf replaces the best allocation so far.
    fn on_new_best(&mut self, _score: Score) {}
}

/// No-op observer for unobserved solves.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl AllocationObserver for NoopObserver {
    fn on_branch(&mut self, _: usize, _: &Order<'_>, _: &Assignment<'_>) {}

    fn on_dead_end(&mut self, _: usize, _: &Order<'_>) {}
}

/// Observer narrating the search through `tracing`.
///
/// Branches and dead ends are emitted at `trace` level, improvements at `debug`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl AllocationObserver for TracingObserver {
    fn on_branch(&mut self, depth: usize, order: &Order<'_>, assignment: &Assignment<'_>) {
        trace!(
            depth,
            order_id = order.id(),
            strategy = %assignment.strategy,
            points = assignment.points.to_minor_units(),
            traditional = assignment.traditional.to_minor_units(),
            discount = assignment.discount.to_minor_units(),
            "branch"
        );
    }

    fn on_dead_end(&mut self, depth: usize, order: &Order<'_>) {
        trace!(depth, order_id = order.id(), "no feasible strategy");
    }

    fn on_new_best(&mut self, score: Score) {
        debug!(
            discount = score.discount,
            points_used = score.points_used, "new best allocation"
        );
    }
}
