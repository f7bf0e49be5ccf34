//! Tenderplan
//!
//! Tenderplan allocates payment instruments to a batch of orders so that the total
//! discount is as large as possible. Each instrument has a spending cap, one of them
//! is the points instrument with its own discount rules, and every order is paid in
//! full by one of four strategies. The search is exhaustive and exact: it tries every
//! combination, rolling capacity back between branches, and keeps the allocation with
//! the most discount, preferring more points when discounts tie.

pub mod assignments;
pub mod config;
pub mod discounts;
pub mod input;
pub mod instruments;
pub mod ledger;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod receipt;
pub mod solvers;
pub mod validation;
