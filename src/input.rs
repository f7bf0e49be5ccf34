//! Input
//!
//! Loads orders and payment methods from JSON or YAML files and turns validated
//! records into [`Order`]s and an [`InstrumentCatalog`].

use std::{fs, io, path::Path};

use rusty_money::iso::Currency;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::{
    instruments::{CatalogError, Instrument, InstrumentCatalog},
    orders::Order,
    pricing::{self, PricingError},
    validation::{self, ValidationError},
};

pub mod records;

use records::{InstrumentRecord, OrderRecord};

/// Input Errors
#[derive(Debug, Error)]
pub enum InputError {
    /// IO error reading an input file
    #[error("Failed to read input file: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// File extension is neither JSON nor YAML
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    /// Records failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Catalog could not be built
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Amount could not be converted into money
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Serialization format of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// `.json`
    Json,

    /// `.yml` or `.yaml`
    Yaml,
}

impl InputFormat {
    /// Detect the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, InputError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yml" | "yaml") => Ok(Self::Yaml),
            _ => Err(InputError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Parse `contents` in this format.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Json`] or [`InputError::Yaml`] on malformed input.
    pub fn parse<T: DeserializeOwned>(self, contents: &str) -> Result<T, InputError> {
        Ok(match self {
            Self::Json => serde_json::from_str(contents)?,
            Self::Yaml => serde_norway::from_str(contents)?,
        })
    }
}

/// Orders and catalog ready for the solver.
#[derive(Debug)]
pub struct Batch<'a> {
    /// Orders to pay
    pub orders: Vec<Order<'a>>,

    /// Instruments to pay with
    pub catalog: InstrumentCatalog<'a>,
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let format = InputFormat::from_path(path)?;
    let contents = fs::read_to_string(path)?;

    format.parse(&contents)
}

/// Load order records from a JSON or YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_orders(path: impl AsRef<Path>) -> Result<Vec<OrderRecord>, InputError> {
    let path = path.as_ref();
    let orders: Vec<OrderRecord> = load(path)?;

    debug!(path = %path.display(), count = orders.len(), "loaded orders");

    Ok(orders)
}

/// Load payment method records from a JSON or YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_instruments(path: impl AsRef<Path>) -> Result<Vec<InstrumentRecord>, InputError> {
    let path = path.as_ref();
    let instruments: Vec<InstrumentRecord> = load(path)?;

    debug!(path = %path.display(), count = instruments.len(), "loaded payment methods");

    Ok(instruments)
}

/// Validate records and convert them into orders and a catalog in `currency`.
///
/// Amounts are rounded to two fractional digits, half-up.
///
/// # Errors
///
/// Returns an error if validation fails or an amount cannot be represented.
pub fn build<'a>(
    orders: &[OrderRecord],
    instruments: &[InstrumentRecord],
    points_id: &str,
    currency: &'a Currency,
) -> Result<Batch<'a>, InputError> {
    validation::validate(orders, instruments, points_id)?;

    let mut catalog = InstrumentCatalog::new(points_id, currency);

    for record in instruments {
        catalog.insert(Instrument::new(
            record.id.clone(),
            discount_percent(record)?,
            pricing::to_money(record.limit, currency)?,
        )?)?;
    }

    let orders = orders
        .iter()
        .map(|record| {
            Ok(Order::with_promotions(
                record.id.clone(),
                pricing::to_money(record.value, currency)?,
                record.promotions().iter().cloned(),
            ))
        })
        .collect::<Result<Vec<_>, InputError>>()?;

    if catalog.points_key().is_none() {
        debug!(points_id, "no points instrument in catalog");
    }

    Ok(Batch { orders, catalog })
}

fn discount_percent(record: &InstrumentRecord) -> Result<u8, ValidationError> {
    u8::try_from(record.discount).map_err(|_err| ValidationError::DiscountOutOfRange {
        id: record.id.clone(),
        discount: record.discount,
    })
}
