//! Capacity Ledger
//!
//! Remaining spending capacity per instrument for a single allocation run.
//! Capacity is tracked in minor units in an arena keyed by [`InstrumentKey`], so a
//! release of the amount previously used restores the exact prior value.

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use slotmap::SecondaryMap;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    instruments::{InstrumentCatalog, InstrumentKey},
    pricing::SCALE,
};

/// Errors raised by ledger operations.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    /// A negative amount was passed to `try_use` or `release`.
    #[error("negative amount {amount} for instrument {instrument_id}")]
    NegativeAmount {
        /// Instrument id
        instrument_id: String,
        /// Offending amount
        amount: Decimal,
    },

    /// A release would lift remaining capacity above the original limit.
    #[error("releasing {amount} would exceed the limit of instrument {instrument_id}")]
    OverRelease {
        /// Instrument id
        instrument_id: String,
        /// Offending amount
        amount: Decimal,
    },

    /// The key does not belong to the catalog the ledger was seeded from.
    ///
    /// An untracked key resolves to no instrument, so the key is the only identity
    /// the error can carry.
    #[error("instrument {0:?} is not tracked by this ledger")]
    UnknownInstrument(InstrumentKey),
}

#[derive(Debug, Clone)]
struct Capacity {
    id: String,
    limit: i64,
    remaining: i64,
}

/// Per-instrument remaining capacity, owned by exactly one search run.
#[derive(Debug, Clone)]
pub struct CapacityLedger<'a> {
    capacities: SecondaryMap<InstrumentKey, Capacity>,
    currency: &'a Currency,
}

impl<'a> CapacityLedger<'a> {
    /// Seed a ledger with every instrument's original limit.
    pub fn from_catalog(catalog: &InstrumentCatalog<'a>) -> Self {
        let mut capacities = SecondaryMap::with_capacity(catalog.len());

        for (key, instrument) in catalog.iter() {
            let limit = instrument.limit().to_minor_units();

            capacities.insert(
                key,
                Capacity {
                    id: instrument.id().to_string(),
                    limit,
                    remaining: limit,
                },
            );
        }

        Self {
            capacities,
            currency: catalog.currency(),
        }
    }

    /// Remaining capacity of an instrument.
    pub fn remaining(&self, key: InstrumentKey) -> Option<Money<'a, Currency>> {
        self.capacities
            .get(key)
            .map(|capacity| Money::from_minor(capacity.remaining, self.currency))
    }

    /// Draw `amount` from an instrument if it has enough remaining capacity.
    ///
    /// Returns `false` without touching the ledger when capacity is insufficient.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NegativeAmount`] if `amount` is negative.
    /// - [`LedgerError::UnknownInstrument`] if `key` is not tracked.
    pub fn try_use(
        &mut self,
        key: InstrumentKey,
        amount: &Money<'_, Currency>,
    ) -> Result<bool, LedgerError> {
        let minor = amount.to_minor_units();
        let capacity = self.capacity_mut(key)?;

        if minor < 0 {
            return Err(negative(capacity, minor));
        }

        if capacity.remaining < minor {
            return Ok(false);
        }

        capacity.remaining -= minor;

        Ok(true)
    }

    /// Give back an amount previously drawn with [`Self::try_use`].
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NegativeAmount`] if `amount` is negative.
    /// - [`LedgerError::OverRelease`] if more is released than was drawn; the
    ///   ledger is left untouched.
    /// - [`LedgerError::UnknownInstrument`] if `key` is not tracked.
    pub fn release(
        &mut self,
        key: InstrumentKey,
        amount: &Money<'_, Currency>,
    ) -> Result<(), LedgerError> {
        let minor = amount.to_minor_units();
        let capacity = self.capacity_mut(key)?;

        if minor < 0 {
            return Err(negative(capacity, minor));
        }

        if minor > capacity.limit - capacity.remaining {
            return Err(LedgerError::OverRelease {
                instrument_id: capacity.id.clone(),
                amount: Decimal::new(minor, SCALE),
            });
        }

        capacity.remaining += minor;

        Ok(())
    }

    /// Draw every leg or none of them.
    ///
    /// On success returns a [`Commitment`] that gives every leg back when dropped.
    /// If any leg lacks capacity the legs already drawn are released and `None`
    /// is returned.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::try_use`] errors; legs drawn before the error are released.
    pub fn commit<'l>(
        &'l mut self,
        legs: &[(InstrumentKey, Money<'_, Currency>)],
    ) -> Result<Option<Commitment<'l, 'a>>, LedgerError> {
        let mut commitment = Commitment {
            ledger: self,
            legs: SmallVec::new(),
        };

        for (key, amount) in legs {
            if !commitment.ledger.try_use(*key, amount)? {
                return Ok(None);
            }

            commitment.legs.push((*key, amount.to_minor_units()));
        }

        Ok(Some(commitment))
    }

    fn capacity_mut(&mut self, key: InstrumentKey) -> Result<&mut Capacity, LedgerError> {
        self.capacities
            .get_mut(key)
            .ok_or(LedgerError::UnknownInstrument(key))
    }

    fn restore(&mut self, key: InstrumentKey, minor: i64) {
        if let Some(capacity) = self.capacities.get_mut(key) {
            capacity.remaining += minor;
        }
    }
}

fn negative(capacity: &Capacity, minor: i64) -> LedgerError {
    LedgerError::NegativeAmount {
        instrument_id: capacity.id.clone(),
        amount: Decimal::new(minor, SCALE),
    }
}

/// Capacity drawn for one branch of the search.
///
/// Every leg is released when the commitment goes out of scope, whichever way the
/// scope is left.
#[derive(Debug)]
pub struct Commitment<'l, 'a> {
    ledger: &'l mut CapacityLedger<'a>,
    legs: SmallVec<[(InstrumentKey, i64); 2]>,
}

impl<'a> Commitment<'_, 'a> {
    /// The ledger with this commitment applied, for exploring deeper branches.
    pub fn ledger_mut(&mut self) -> &mut CapacityLedger<'a> {
        self.ledger
    }
}

impl Drop for Commitment<'_, '_> {
    fn drop(&mut self) {
        while let Some((key, minor)) = self.legs.pop() {
            self.ledger.restore(key, minor);
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::PLN;
    use testresult::TestResult;

    use super::*;
    use crate::instruments::{DEFAULT_POINTS_ID, Instrument};

    fn pln(minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, PLN)
    }

    fn catalog<'a>() -> TestResult<InstrumentCatalog<'a>> {
        Ok(InstrumentCatalog::with_instruments(
            DEFAULT_POINTS_ID,
            PLN,
            [
                Instrument::new(DEFAULT_POINTS_ID, 15, pln(10_000))?,
                Instrument::new("mZysk", 10, pln(18_000))?,
            ],
        )?)
    }

    #[test]
    fn try_use_draws_only_with_enough_capacity() -> TestResult {
        let catalog = catalog()?;
        let key = catalog.key("mZysk").ok_or("missing key")?;
        let mut ledger = CapacityLedger::from_catalog(&catalog);

        assert!(ledger.try_use(key, &pln(18_000))?);
        assert_eq!(ledger.remaining(key), Some(pln(0)));

        assert!(!ledger.try_use(key, &pln(1))?);
        assert_eq!(ledger.remaining(key), Some(pln(0)));

        Ok(())
    }

    #[test]
    fn paired_use_and_release_round_trip_exactly() -> TestResult {
        let catalog = catalog()?;
        let key = catalog.key("mZysk").ok_or("missing key")?;
        let mut ledger = CapacityLedger::from_catalog(&catalog);
        let before = ledger.remaining(key);

        for amount in [1, 333, 9_999, 17_999, 5, 12_345] {
            assert!(ledger.try_use(key, &pln(amount))?);
            ledger.release(key, &pln(amount))?;
        }

        // Nested pairs, released in reverse
        let amounts = [4_999, 3_333, 101];

        for amount in amounts {
            assert!(ledger.try_use(key, &pln(amount))?);
        }

        for amount in amounts.iter().rev() {
            ledger.release(key, &pln(*amount))?;
        }

        assert_eq!(ledger.remaining(key), before);

        Ok(())
    }

    #[test]
    fn negative_amounts_are_rejected() -> TestResult {
        let catalog = catalog()?;
        let key = catalog.key("mZysk").ok_or("missing key")?;
        let mut ledger = CapacityLedger::from_catalog(&catalog);

        assert!(matches!(
            ledger.try_use(key, &pln(-1)),
            Err(LedgerError::NegativeAmount { instrument_id, .. }) if instrument_id == "mZysk"
        ));
        assert!(matches!(
            ledger.release(key, &pln(-1)),
            Err(LedgerError::NegativeAmount { .. })
        ));
        assert_eq!(ledger.remaining(key), Some(pln(18_000)));

        Ok(())
    }

    #[test]
    fn unknown_instrument_is_an_error() -> TestResult {
        let catalog = catalog()?;
        let mut ledger = CapacityLedger::from_catalog(&catalog);

        let key = InstrumentKey::default();
        let result = ledger.try_use(key, &pln(1));
        let message = LedgerError::UnknownInstrument(key).to_string();

        assert_eq!(result, Err(LedgerError::UnknownInstrument(key)));
        assert!(message.contains(&format!("{key:?}")));

        Ok(())
    }

    #[test]
    fn release_cannot_lift_capacity_above_the_limit() -> TestResult {
        let catalog = catalog()?;
        let key = catalog.key("mZysk").ok_or("missing key")?;
        let mut ledger = CapacityLedger::from_catalog(&catalog);

        assert!(ledger.try_use(key, &pln(500))?);

        let result = ledger.release(key, &pln(501));

        assert!(matches!(
            result,
            Err(LedgerError::OverRelease { instrument_id, .. }) if instrument_id == "mZysk"
        ));
        assert_eq!(ledger.remaining(key), Some(pln(17_500)));

        ledger.release(key, &pln(500))?;

        assert_eq!(ledger.remaining(key), Some(pln(18_000)));
        assert!(ledger.release(key, &pln(1)).is_err());

        Ok(())
    }

    #[test]
    fn commitment_releases_on_drop() -> TestResult {
        let catalog = catalog()?;
        let points = catalog.points_key().ok_or("missing points")?;
        let bank = catalog.key("mZysk").ok_or("missing key")?;
        let mut ledger = CapacityLedger::from_catalog(&catalog);

        {
            let mut commitment = ledger
                .commit(&[(points, pln(1_000)), (bank, pln(8_000))])?
                .ok_or("commit should succeed")?;

            let inner = commitment.ledger_mut();

            assert_eq!(inner.remaining(points), Some(pln(9_000)));
            assert_eq!(inner.remaining(bank), Some(pln(10_000)));
        }

        assert_eq!(ledger.remaining(points), Some(pln(10_000)));
        assert_eq!(ledger.remaining(bank), Some(pln(18_000)));

        Ok(())
    }

    #[test]
    fn failed_commit_rolls_back_earlier_legs() -> TestResult {
        let catalog = catalog()?;
        let points = catalog.points_key().ok_or("missing points")?;
        let bank = catalog.key("mZysk").ok_or("missing key")?;
        let mut ledger = CapacityLedger::from_catalog(&catalog);

        let commitment = ledger.commit(&[(points, pln(1_000)), (bank, pln(18_001))])?;

        assert!(commitment.is_none());
        drop(commitment);

        assert_eq!(ledger.remaining(points), Some(pln(10_000)));
        assert_eq!(ledger.remaining(bank), Some(pln(18_000)));

        Ok(())
    }
}
