//! Input records
//!
//! Wire format of the order and payment method files, before validation.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de};

/// An order as it appears in the orders file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderRecord {
    /// Order id
    pub id: String,

    /// Order value, a number or a decimal string
    pub value: Decimal,

    /// Instrument ids with an advertised full-payment discount
    #[serde(default)]
    pub promotions: Option<Vec<String>>,
}

impl OrderRecord {
    /// Promotions, empty when the field was missing or null.
    pub fn promotions(&self) -> &[String] {
        self.promotions.as_deref().unwrap_or_default()
    }
}

/// A payment method as it appears in the payment methods file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstrumentRecord {
    /// Instrument id
    pub id: String,

    /// Whole-percent discount, a number or a numeric string
    #[serde(deserialize_with = "whole_number")]
    pub discount: i64,

    /// Spending cap, a number or a decimal string
    pub limit: Decimal,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WholeNumber {
    Number(i64),
    Text(String),
}

fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match WholeNumber::deserialize(deserializer)? {
        WholeNumber::Number(number) => Ok(number),
        WholeNumber::Text(text) => text
            .trim()
            .parse()
            .map_err(|err| de::Error::custom(format!("invalid whole number {text:?}: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use testresult::TestResult;

    use super::*;

    #[test]
    fn order_without_promotions_parses() -> TestResult {
        let order: OrderRecord = serde_json::from_str(r#"{"id": "ORDER4", "value": "50.00"}"#)?;

        assert_eq!(order.value, Decimal::from_str("50.00")?);
        assert!(order.promotions().is_empty());

        Ok(())
    }

    #[test]
    fn unknown_fields_are_ignored() -> TestResult {
        let instrument: InstrumentRecord = serde_norway::from_str(
            "id: mZysk\ndiscount: 10\nlimit: \"180.00\"\nbank: mBank\n",
        )?;

        assert_eq!(instrument.discount, 10);
        assert_eq!(instrument.limit, Decimal::from_str("180.00")?);

        Ok(())
    }

    #[test]
    fn discount_may_be_a_string() -> TestResult {
        let instrument: InstrumentRecord =
            serde_json::from_str(r#"{"id": "PUNKTY", "discount": "15", "limit": "100.00"}"#)?;

        assert_eq!(instrument.discount, 15);

        let result: Result<InstrumentRecord, _> =
            serde_json::from_str(r#"{"id": "PUNKTY", "discount": "15%", "limit": "100.00"}"#);

        assert!(result.is_err());

        Ok(())
    }

    #[test]
    fn null_promotions_are_empty() -> TestResult {
        let order: OrderRecord =
            serde_json::from_str(r#"{"id": "ORDER1", "value": 100, "promotions": null}"#)?;

        assert!(order.promotions().is_empty());

        Ok(())
    }
}
