//! Record normalizer
//!
//! Turns a raw adapter observation into a `NewDiscount`. Prices are parsed
//! leniently except for the discount price, and the discount percentage is always
//! recomputed from the parsed prices.

use rust_decimal::Decimal;

use crate::error::{AggregatorError, Result};
use crate::models::discount::NewDiscount;
use crate::scrapers::parser::{
    calculate_discount_percentage, decimal_to_f64, parse_timestamp, raw_price_to_decimal,
};
use crate::scrapers::{RawObservation, RawPrice, RawTimestamp};

/// Column widths of the `discounts` table; longer values reject the observation
pub const MAX_SOURCE_LEN: usize = 50;
pub const MAX_PRODUCT_NAME_LEN: usize = 255;
pub const MAX_CATEGORY_LEN: usize = 100;
pub const MAX_URL_LEN: usize = 500;
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Normalize one observation collected from `source`
pub fn normalize(raw: RawObservation, source: &str) -> Result<NewDiscount> {
    let product_name = non_empty(raw.product_name)
        .ok_or_else(|| AggregatorError::Validation("missing product name".to_string()))?;
    check_len("product name", &product_name, MAX_PRODUCT_NAME_LEN)?;
    check_len("source", source, MAX_SOURCE_LEN)?;

    let category = non_empty(raw.category);
    for (field, value, max) in [
        ("category", category.as_deref(), MAX_CATEGORY_LEN),
        ("image url", raw.image_url.as_deref(), MAX_URL_LEN),
        ("product url", raw.product_url.as_deref(), MAX_URL_LEN),
        ("description", raw.description.as_deref(), MAX_DESCRIPTION_LEN),
    ] {
        if let Some(value) = value {
            check_len(field, value, max)?;
        }
    }

    let discount_price = match raw.discount_price.as_ref() {
        None => {
            return Err(AggregatorError::Validation(format!(
                "missing discount price for '{}'",
                product_name
            )));
        }
        Some(price) => raw_price_to_decimal(price).ok_or_else(|| {
            AggregatorError::Validation(format!(
                "non-numeric discount price {:?} for '{}'",
                price, product_name
            ))
        })?,
    };
    if discount_price < Decimal::ZERO {
        return Err(AggregatorError::Validation(format!(
            "negative discount price {} for '{}'",
            discount_price, product_name
        )));
    }

    let original_price = raw
        .original_price
        .as_ref()
        .map(|price| lenient_price(price, &product_name));
    if let Some(original) = original_price {
        if original < Decimal::ZERO {
            return Err(AggregatorError::Validation(format!(
                "negative original price {} for '{}'",
                original, product_name
            )));
        }
    }

    let discount_percentage =
        original_price.and_then(|original| calculate_discount_percentage(original, discount_price));

    Ok(NewDiscount {
        source: source.to_string(),
        product_name,
        category,
        original_price: original_price.map(decimal_to_f64),
        discount_price: decimal_to_f64(discount_price),
        discount_percentage: discount_percentage.map(decimal_to_f64),
        valid_from: raw.valid_from.and_then(|t| timestamp(t, false)),
        valid_until: raw.valid_until.and_then(|t| timestamp(t, true)),
        image_url: raw.image_url,
        product_url: raw.product_url,
        description: raw.description,
        is_active: raw.is_active.unwrap_or(true),
    })
}

/// Unparsable original prices count as 0, which leaves the percentage absent
fn lenient_price(price: &RawPrice, product_name: &str) -> Decimal {
    raw_price_to_decimal(price).unwrap_or_else(|| {
        tracing::debug!(
            product = %product_name,
            price = ?price,
            "Unparsable original price, using 0"
        );
        Decimal::ZERO
    })
}

fn timestamp(value: RawTimestamp, end_of_day: bool) -> Option<chrono::NaiveDateTime> {
    match value {
        RawTimestamp::At(at) => Some(at),
        RawTimestamp::Text(text) => {
            let parsed = parse_timestamp(&text, end_of_day);
            if parsed.is_none() {
                tracing::debug!(value = %text, "Unparsable timestamp, leaving it absent");
            }
            parsed
        }
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(AggregatorError::Validation(format!(
            "{} is {} characters long, at most {} fit",
            field, len, max
        )));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
