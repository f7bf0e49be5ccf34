//! Payment Instruments

use decimal_percentage::Percentage;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use thiserror::Error;

use crate::pricing;

/// Identifier reserved for the points instrument unless configured otherwise.
pub const DEFAULT_POINTS_ID: &str = "PUNKTY";

new_key_type! {
    /// Instrument Key
    pub struct InstrumentKey;
}

/// Errors raised while building an instrument catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Two instruments share the same id.
    #[error("duplicate instrument id: {0}")]
    DuplicateInstrument(String),

    /// Discount outside `0..=100`.
    #[error("instrument {id} has discount {discount}%, expected 0..=100")]
    DiscountOutOfRange {
        /// Instrument id
        id: String,
        /// Offending discount
        discount: u8,
    },
}

/// A payment method: an ordinary (traditional) one or the points instrument.
#[derive(Debug, Clone)]
pub struct Instrument<'a> {
    id: String,
    discount_percent: u8,
    discount: Percentage,
    limit: Money<'a, Currency>,
}

impl<'a> Instrument<'a> {
    /// Create an instrument with a whole-percent discount and a spending cap.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DiscountOutOfRange`] if the discount exceeds 100%.
    pub fn new(
        id: impl Into<String>,
        discount_percent: u8,
        limit: Money<'a, Currency>,
    ) -> Result<Self, CatalogError> {
        let id = id.into();

        if discount_percent > 100 {
            return Err(CatalogError::DiscountOutOfRange {
                id,
                discount: discount_percent,
            });
        }

        Ok(Self {
            id,
            discount_percent,
            discount: pricing::percent(discount_percent),
            limit,
        })
    }

    /// Instrument id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Flat discount for paying an entire order with this instrument.
    pub fn discount(&self) -> &Percentage {
        &self.discount
    }

    /// Discount as whole percent.
    pub fn discount_percent(&self) -> u8 {
        self.discount_percent
    }

    /// Original spending cap.
    pub fn limit(&self) -> &Money<'a, Currency> {
        &self.limit
    }
}

/// Read-only set of instruments available to one allocation run.
///
/// Instruments live in an arena keyed by [`InstrumentKey`]; iteration always follows
/// insertion order so that searches over the catalog are deterministic.
#[derive(Debug)]
pub struct InstrumentCatalog<'a> {
    instruments: SlotMap<InstrumentKey, Instrument<'a>>,
    keys: FxHashMap<String, InstrumentKey>,
    order: SmallVec<[InstrumentKey; 8]>,
    points_id: String,
    points: Option<InstrumentKey>,
    currency: &'a Currency,
}

impl<'a> InstrumentCatalog<'a> {
    /// Create an empty catalog in which `points_id` designates the points instrument.
    pub fn new(points_id: impl Into<String>, currency: &'a Currency) -> Self {
        Self {
            instruments: SlotMap::with_key(),
            keys: FxHashMap::default(),
            order: SmallVec::new(),
            points_id: points_id.into(),
            points: None,
            currency,
        }
    }

    /// Build a catalog from a list of instruments.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateInstrument`] if two instruments share an id.
    pub fn with_instruments(
        points_id: impl Into<String>,
        currency: &'a Currency,
        instruments: impl IntoIterator<Item = Instrument<'a>>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new(points_id, currency);

        for instrument in instruments {
            catalog.insert(instrument)?;
        }

        Ok(catalog)
    }

    /// Add an instrument.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateInstrument`] if the id is already present.
    pub fn insert(&mut self, instrument: Instrument<'a>) -> Result<InstrumentKey, CatalogError> {
        if self.keys.contains_key(instrument.id()) {
            return Err(CatalogError::DuplicateInstrument(instrument.id().to_string()));
        }

        let id = instrument.id().to_string();
        let is_points = id == self.points_id;
        let key = self.instruments.insert(instrument);

        if is_points {
            self.points = Some(key);
        }

        self.keys.insert(id, key);
        self.order.push(key);

        Ok(key)
    }

    /// Look up an instrument by key.
    pub fn get(&self, key: InstrumentKey) -> Option<&Instrument<'a>> {
        self.instruments.get(key)
    }

    /// Look up an instrument key by id.
    pub fn key(&self, id: &str) -> Option<InstrumentKey> {
        self.keys.get(id).copied()
    }

    /// Look up an instrument by id.
    pub fn by_id(&self, id: &str) -> Option<&Instrument<'a>> {
        let key = self.key(id)?;

        self.get(key)
    }

    /// Id reserved for the points instrument.
    pub fn points_id(&self) -> &str {
        &self.points_id
    }

    /// Key of the points instrument, if the catalog has one.
    pub fn points_key(&self) -> Option<InstrumentKey> {
        self.points
    }

    /// The points instrument, if the catalog has one.
    pub fn points(&self) -> Option<&Instrument<'a>> {
        self.get(self.points?)
    }

    /// Whether `key` is the points instrument.
    pub fn is_points(&self, key: InstrumentKey) -> bool {
        self.points == Some(key)
    }

    /// Keys of all instruments except points, in insertion order.
    pub fn traditional_keys(&self) -> impl Iterator<Item = InstrumentKey> + '_ {
        self.order
            .iter()
            .copied()
            .filter(move |key| !self.is_points(*key))
    }

    /// All instruments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (InstrumentKey, &Instrument<'a>)> + '_ {
        self.order
            .iter()
            .filter_map(|&key| Some((key, self.instruments.get(key)?)))
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Currency of every amount in this catalog.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::PLN;
    use testresult::TestResult;

    use super::*;

    fn catalog<'a>() -> Result<InstrumentCatalog<'a>, CatalogError> {
        InstrumentCatalog::with_instruments(
            DEFAULT_POINTS_ID,
            PLN,
            [
                Instrument::new("mZysk", 10, Money::from_minor(18_000, PLN))?,
                Instrument::new(DEFAULT_POINTS_ID, 15, Money::from_minor(10_000, PLN))?,
                Instrument::new("BosBankrut", 5, Money::from_minor(20_000, PLN))?,
            ],
        )
    }

    #[test]
    fn points_instrument_is_detected() -> TestResult {
        let catalog = catalog()?;

        let points = catalog.points().ok_or("missing points")?;

        assert_eq!(points.id(), DEFAULT_POINTS_ID);
        assert_eq!(points.discount_percent(), 15);
        assert_eq!(catalog.key(DEFAULT_POINTS_ID), catalog.points_key());

        Ok(())
    }

    #[test]
    fn traditional_keys_follow_insertion_order() -> TestResult {
        let catalog = catalog()?;

        let ids: Vec<&str> = catalog
            .traditional_keys()
            .filter_map(|key| catalog.get(key))
            .map(Instrument::id)
            .collect();

        assert_eq!(ids, ["mZysk", "BosBankrut"]);
        assert_eq!(catalog.len(), 3);

        Ok(())
    }

    #[test]
    fn duplicate_ids_are_rejected() -> TestResult {
        let mut catalog = catalog()?;

        let result = catalog.insert(Instrument::new("mZysk", 1, Money::from_minor(1, PLN))?);

        assert_eq!(
            result,
            Err(CatalogError::DuplicateInstrument("mZysk".to_string()))
        );

        Ok(())
    }

    #[test]
    fn discount_above_hundred_is_rejected() {
        let result = Instrument::new("odd", 101, Money::from_minor(0, PLN));

        assert!(matches!(
            result,
            Err(CatalogError::DiscountOutOfRange { discount: 101, .. })
        ));
    }

    #[test]
    fn catalog_without_points_has_no_points_key() -> TestResult {
        let catalog = InstrumentCatalog::with_instruments(
            DEFAULT_POINTS_ID,
            PLN,
            [Instrument::new("mZysk", 10, Money::from_minor(100, PLN))?],
        )?;

        assert!(catalog.points_key().is_none());
        assert!(catalog.points().is_none());
        assert_eq!(catalog.traditional_keys().count(), 1);

        Ok(())
    }

    #[test]
    fn lookup_by_id_finds_only_known_instruments() -> TestResult {
        let catalog = catalog()?;

        let bank = catalog.by_id("BosBankrut").ok_or("missing instrument")?;

        assert_eq!(bank.discount_percent(), 5);
        assert!(catalog.by_id("Unknown").is_none());

        Ok(())
    }
}
