//! Tenderplan prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    assignments::{Assignment, PaymentStrategy},
    discounts::{DiscountError, DiscountEvaluator},
    input::{Batch, InputError, InputFormat, build, load_instruments, load_orders},
    instruments::{CatalogError, DEFAULT_POINTS_ID, Instrument, InstrumentCatalog, InstrumentKey},
    ledger::{CapacityLedger, Commitment, LedgerError},
    orders::Order,
    receipt::{InstrumentTotal, PaymentTotals, ReceiptError},
    solvers::{
        Allocation, Score, Solution, Solver, SolverError,
        backtracking::{
            AllocationObserver, BacktrackingSolver, NoopObserver, SearchStats, SolveReport,
            TracingObserver,
        },
    },
    validation::ValidationError,
};
