//! Integration tests for the backtracking allocation

use std::path::PathBuf;

use rusty_money::{Money, iso::PLN};
use testresult::TestResult;

use tenderplan::{
    input::{self, Batch},
    instruments::{DEFAULT_POINTS_ID, Instrument, InstrumentCatalog},
    orders::Order,
    receipt::PaymentTotals,
    solvers::{Score, Solution, Solver, backtracking::BacktrackingSolver},
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_batch(orders: &str, instruments: &str) -> TestResult<Batch<'static>> {
    let orders = input::load_orders(fixture(orders))?;
    let instruments = input::load_instruments(fixture(instruments))?;

    Ok(input::build(&orders, &instruments, DEFAULT_POINTS_ID, PLN)?)
}

#[test]
fn sample_batch_beats_plain_promotions() -> TestResult {
    let batch = load_batch("orders.json", "paymentmethods.json")?;

    let solution = BacktrackingSolver::solve(&batch.orders, &batch.catalog)?;
    let allocation = solution.allocation().ok_or("expected an allocation")?;

    // Paying every order with its promoted card alone earns 45.00
    assert!(allocation.total_discount().to_minor_units() >= 4_500);
    assert_eq!(allocation.score, Score::new(5_250, 9_500));
    assert_eq!(allocation.assignments.len(), batch.orders.len());

    for order in &batch.orders {
        let assignment = allocation
            .assignment_for(order.id())
            .ok_or("order without assignment")?;

        assert_eq!(assignment.covered_minor(), order.value().to_minor_units());

        // A positive points amount never earns more than the points rules allow
        if assignment.points.to_minor_units() > 0 {
            let value = order.value().to_minor_units();
            let share = assignment.discount.to_minor_units() * 100 / value;

            assert!(
                share == 10 || share == 15,
                "unexpected discount share {share}%"
            );
        }
    }

    Ok(())
}

#[test]
fn totals_respect_every_limit() -> TestResult {
    let batch = load_batch("orders.json", "paymentmethods.json")?;

    let solution = BacktrackingSolver::solve(&batch.orders, &batch.catalog)?;
    let totals = PaymentTotals::from_solution(&solution, &batch.catalog)?;

    assert!(totals.is_complete());

    for total in totals.totals() {
        let instrument = batch
            .catalog
            .by_id(&total.id)
            .ok_or("total for unknown instrument")?;

        let limit = instrument.limit().to_minor_units();

        assert!(total.amount.to_minor_units() <= limit);
    }

    assert_eq!(
        totals.amount_for("PUNKTY"),
        Some(Money::from_minor(8_750, PLN))
    );

    let card = |id: &str| totals.amount_for(id).map_or(0, |m| m.to_minor_units());

    assert_eq!(card("mZysk") + card("BosBankrut"), 36_000);
    assert_eq!(totals.paid(), Money::from_minor(44_750, PLN));
    assert_eq!(totals.discount(), Money::from_minor(5_250, PLN));

    Ok(())
}

#[test]
fn unsolvable_batch_is_reported_not_raised() -> TestResult {
    let batch = load_batch("orders_unsolvable.json", "paymentmethods.json")?;

    let solution = BacktrackingSolver::solve(&batch.orders, &batch.catalog)?;

    assert!(matches!(solution, Solution::NoCompleteAssignment));

    let totals = PaymentTotals::from_solution(&solution, &batch.catalog)?;

    assert!(!totals.is_complete());
    assert!(totals.totals().is_empty());

    Ok(())
}

#[test]
fn exhausted_points_fall_back_to_plain_card() -> TestResult {
    let catalog = InstrumentCatalog::with_instruments(
        DEFAULT_POINTS_ID,
        PLN,
        [
            Instrument::new(DEFAULT_POINTS_ID, 15, Money::from_minor(0, PLN))?,
            Instrument::new("mZysk", 10, Money::from_minor(18_000, PLN))?,
        ],
    )?;
    let orders = [Order::new("ORDER1", Money::from_minor(5_000, PLN))];

    let solution = BacktrackingSolver::solve(&orders, &catalog)?;
    let allocation = solution.allocation().ok_or("expected an allocation")?;
    let assignment = allocation.assignments.first().ok_or("missing assignment")?;

    assert_eq!(allocation.total_discount(), Money::from_minor(0, PLN));
    assert_eq!(assignment.strategy.label(), "card");
    assert_eq!(assignment.traditional, Money::from_minor(5_000, PLN));

    Ok(())
}

#[test]
fn identical_input_gives_identical_allocation() -> TestResult {
    let batch = load_batch("orders.json", "paymentmethods.json")?;

    let first = BacktrackingSolver::solve(&batch.orders, &batch.catalog)?;
    let second = BacktrackingSolver::solve(&batch.orders, &batch.catalog)?;

    assert_eq!(
        first.allocation().map(|a| a.assignments.clone()),
        second.allocation().map(|a| a.assignments.clone())
    );

    Ok(())
}

#[test]
fn report_lines_use_two_decimals() -> TestResult {
    let batch = load_batch("orders.json", "paymentmethods.json")?;

    let solution = BacktrackingSolver::solve(&batch.orders, &batch.catalog)?;
    let totals = PaymentTotals::from_solution(&solution, &batch.catalog)?;

    let mut out = Vec::new();
    totals.write_to(&mut out)?;

    let output = String::from_utf8(out)?;
    let mut lines = output.lines();

    assert_eq!(lines.next(), Some("PUNKTY 87.50"));

    for line in lines {
        let (id, amount) = line.split_once(' ').ok_or("malformed line")?;

        let cents = amount.split_once('.').map(|(_, cents)| cents.len());

        assert!(
            id == "mZysk" || id == "BosBankrut",
            "unexpected instrument {id}"
        );
        assert_eq!(cents, Some(2));
    }

    Ok(())
}
