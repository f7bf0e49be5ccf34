//! Receipt
//!
//! Collapses the winning allocation into per-instrument totals and renders them.

use std::{io, ops::Range};

use rusty_money::{Money, iso::Currency};
use slotmap::SecondaryMap;
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    instruments::{InstrumentCatalog, InstrumentKey},
    pricing::{self, format_amount},
    solvers::Solution,
};

/// Message printed when no allocation pays every order.
pub const NO_COMPLETE_ASSIGNMENT: &str =
    "No complete assignment: the instruments cannot pay every order.";

/// Errors that can occur when building or printing payment totals.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// An assignment references an instrument the catalog does not know.
    #[error("assignment for order {order_id} references an unknown instrument")]
    MissingInstrument {
        /// Order whose assignment is broken
        order_id: String,
        /// Key that failed to resolve
        key: InstrumentKey,
    },

    /// An assignment pays with points but the catalog has no points instrument.
    #[error("assignment for order {0} pays with points but there is no points instrument")]
    MissingPointsInstrument(String),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Amount spent through one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentTotal<'a> {
    /// Instrument id
    pub id: String,

    /// Sum of amounts paid through the instrument
    pub amount: Money<'a, Currency>,
}

#[derive(Debug, Clone)]
struct AssignmentRow<'a> {
    order_id: String,
    strategy: &'static str,
    instrument: Option<String>,
    points: Money<'a, Currency>,
    traditional: Money<'a, Currency>,
    discount: Money<'a, Currency>,
}

/// Per-instrument totals for the best allocation.
#[derive(Debug, Clone)]
pub struct PaymentTotals<'a> {
    totals: SmallVec<[InstrumentTotal<'a>; 8]>,
    rows: Vec<AssignmentRow<'a>>,
    discount: Money<'a, Currency>,
    complete: bool,
}

impl<'a> PaymentTotals<'a> {
    /// Sum every assignment of `solution` per instrument, in catalog order.
    ///
    /// A solution without a complete assignment yields empty totals.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if an assignment references an instrument that is
    /// not in `catalog`.
    pub fn from_solution(
        solution: &Solution<'a>,
        catalog: &InstrumentCatalog<'a>,
    ) -> Result<Self, ReceiptError> {
        let currency = catalog.currency();

        let Some(allocation) = solution.allocation() else {
            return Ok(Self {
                totals: SmallVec::new(),
                rows: Vec::new(),
                discount: pricing::zero(currency),
                complete: false,
            });
        };

        let mut spent: SecondaryMap<InstrumentKey, i64> =
            SecondaryMap::with_capacity(catalog.len());
        let mut rows = Vec::with_capacity(allocation.assignments.len());

        for assignment in &allocation.assignments {
            let points = assignment.points.to_minor_units();

            if points > 0 {
                let Some(key) = catalog.points_key() else {
                    return Err(ReceiptError::MissingPointsInstrument(
                        assignment.order_id.clone(),
                    ));
                };

                add_spend(&mut spent, key, points);
            }

            let instrument = match assignment.traditional_instrument() {
                Some(key) => {
                    let Some(instrument) = catalog.get(key) else {
                        return Err(ReceiptError::MissingInstrument {
                            order_id: assignment.order_id.clone(),
                            key,
                        });
                    };

                    add_spend(&mut spent, key, assignment.traditional.to_minor_units());

                    Some(instrument.id().to_string())
                }
                None => None,
            };

            rows.push(AssignmentRow {
                order_id: assignment.order_id.clone(),
                strategy: assignment.strategy.label(),
                instrument,
                points: assignment.points,
                traditional: assignment.traditional,
                discount: assignment.discount,
            });
        }

        let totals = catalog
            .iter()
            .map(|(key, instrument)| InstrumentTotal {
                id: instrument.id().to_string(),
                amount: Money::from_minor(spent.get(key).copied().unwrap_or_default(), currency),
            })
            .collect();

        Ok(Self {
            totals,
            rows,
            discount: allocation.total_discount(),
            complete: true,
        })
    }

    /// Whether a complete assignment was found.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Totals per instrument, in catalog order. Empty when no assignment was found.
    pub fn totals(&self) -> &[InstrumentTotal<'a>] {
        &self.totals
    }

    /// Total spent through a given instrument.
    pub fn amount_for(&self, instrument_id: &str) -> Option<Money<'a, Currency>> {
        self.totals
            .iter()
            .find(|total| total.id == instrument_id)
            .map(|total| total.amount)
    }

    /// Total discount earned.
    pub fn discount(&self) -> Money<'a, Currency> {
        self.discount
    }

    /// Total paid across every instrument.
    pub fn paid(&self) -> Money<'a, Currency> {
        let minor = self
            .totals
            .iter()
            .map(|total| total.amount.to_minor_units())
            .sum();

        Money::from_minor(minor, self.discount.currency())
    }

    /// Print `"<id> <amount>"` for every instrument with a positive total.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::IO`] if writing fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        if !self.complete {
            return writeln!(out, "{NO_COMPLETE_ASSIGNMENT}").map_err(|_err| ReceiptError::IO);
        }

        for total in &self.totals {
            if total.amount.to_minor_units() > 0 {
                writeln!(out, "{} {}", total.id, format_amount(&total.amount))
                    .map_err(|_err| ReceiptError::IO)?;
            }
        }

        Ok(())
    }

    /// Render every assignment and the per-instrument totals as tables.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::IO`] if writing fails.
    pub fn write_table(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        if !self.complete {
            return writeln!(out, "\n{NO_COMPLETE_ASSIGNMENT}\n").map_err(|_err| ReceiptError::IO);
        }

        let mut builder = Builder::default();

        builder.push_record([
            "Order",
            "Strategy",
            "Instrument",
            "Points",
            "Card",
            "Discount",
        ]);

        for row in &self.rows {
            builder.push_record([
                row.order_id.clone(),
                row.strategy.to_string(),
                row.instrument.clone().unwrap_or_default(),
                format_amount(&row.points),
                format_amount(&row.traditional),
                format_amount(&row.discount),
            ]);
        }

        write_table(&mut out, builder, 3..6)?;

        let mut builder = Builder::default();

        builder.push_record(["Instrument", "Total"]);

        for total in &self.totals {
            builder.push_record([total.id.clone(), format_amount(&total.amount)]);
        }

        write_table(&mut out, builder, 1..2)?;

        writeln!(
            out,
            " Paid: {}\n \x1b[1mDiscount: {}\x1b[0m\n",
            format_amount(&self.paid()),
            format_amount(&self.discount)
        )
        .map_err(|_err| ReceiptError::IO)
    }
}

fn add_spend(spent: &mut SecondaryMap<InstrumentKey, i64>, key: InstrumentKey, minor: i64) {
    match spent.get_mut(key) {
        Some(total) => *total += minor,
        None => {
            spent.insert(key, minor);
        }
    }
}

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    amount_columns: Range<usize>,
) -> Result<(), ReceiptError> {
    let mut table = builder.build();

    table.with(Theme::from(Style::modern_rounded()));
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(amount_columns), Alignment::right());

    writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)
}
