//! Parsing helpers shared by every adapter and by the normalizer.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::RawPrice;

lazy_static! {
    // First number in a noisy price label ("nu 3,99", "2 voor 5.00")
    static ref PRICE_TOKEN_REGEX: Regex = Regex::new(r"-?\d+(?:[.,]\d+)*").unwrap();

    // "2026-10-27" or "2026-10-27 23:59" / "2026-10-27T23:59:00"
    static ref ISO_DATE_REGEX: Regex =
        Regex::new(r"\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2})?)?").unwrap();

    // Dutch day-first dates as printed on offer cards ("27-10-2026", "27/10/2026")
    static ref DAY_FIRST_DATE_REGEX: Regex = Regex::new(r"\b(\d{1,2})[-/](\d{1,2})[-/](\d{4})\b").unwrap();
}

const CURRENCY_MARKERS: [&str; 5] = ["€", "EUR", "$", "£", "â‚¬"];

/// Parse a price label into a decimal.
///
/// Currency markers and whitespace are stripped and a comma decimal separator is
/// read as a dot. When both separators appear the dot is taken as a thousands
/// separator ("1.299,00"). Returns `None` when no number can be read.
pub fn parse_price(text: &str) -> Option<Decimal> {
    let mut cleaned = text.to_string();
    for marker in CURRENCY_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    let cleaned: String = cleaned.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }

    if let Some(value) = decimal_from_label(&cleaned) {
        return Some(value);
    }

    PRICE_TOKEN_REGEX
        .find(&cleaned)
        .and_then(|m| decimal_from_label(m.as_str()))
}

fn decimal_from_label(label: &str) -> Option<Decimal> {
    let normalized = if label.contains(',') && label.contains('.') {
        label.replace('.', "").replace(',', ".")
    } else {
        label.replace(',', ".")
    };
    Decimal::from_str(&normalized).ok()
}

/// Decimal value of a raw price, `None` when it cannot be read as a number
pub fn raw_price_to_decimal(price: &RawPrice) -> Option<Decimal> {
    match price {
        RawPrice::Number(value) if value.is_finite() => Decimal::from_str(&value.to_string()).ok(),
        RawPrice::Number(_) => None,
        RawPrice::Text(text) => parse_price(text),
    }
}

/// `round(100 * (original - discount) / original, 2)`, or `None` when the original
/// price is not positive
pub fn calculate_discount_percentage(original: Decimal, discount: Decimal) -> Option<Decimal> {
    if original <= Decimal::ZERO {
        return None;
    }
    let percentage = (original - discount) / original * Decimal::ONE_HUNDRED;
    Some(percentage.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Stored representation of a decimal amount
pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(0.0)
}

/// Parse a timestamp label.
///
/// Accepts RFC 3339 (converted to UTC), ISO date-times with or without seconds,
/// ISO dates and day-first dates. A date without a time resolves to the start of
/// the day, or to its last second when `end_of_day` is set (validity end dates are
/// inclusive on offer cards).
pub fn parse_timestamp(text: &str, end_of_day: bool) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed);
        }
    }

    for format in ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(at_day_boundary(date, end_of_day));
        }
    }

    None
}

fn at_day_boundary(date: NaiveDate, end_of_day: bool) -> NaiveDateTime {
    if end_of_day {
        date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
    } else {
        date.and_time(NaiveTime::MIN)
    }
}

/// Extract every date mentioned in a validity label, in order of appearance
pub fn extract_dates(content: &str) -> Vec<NaiveDate> {
    let mut found: Vec<(usize, NaiveDate)> = Vec::new();

    for m in ISO_DATE_REGEX.find_iter(content) {
        if let Ok(date) = NaiveDate::parse_from_str(&m.as_str()[..10], "%Y-%m-%d") {
            found.push((m.start(), date));
        }
    }

    for cap in DAY_FIRST_DATE_REGEX.captures_iter(content) {
        let (Ok(day), Ok(month), Ok(year)) =
            (cap[1].parse::<u32>(), cap[2].parse::<u32>(), cap[3].parse::<i32>())
        else {
            continue;
        };
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            let start = cap.get(0).map(|m| m.start()).unwrap_or_default();
            found.push((start, date));
        }
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, date)| date).collect()
}

/// Split a validity label into `(valid_from, valid_until)`.
///
/// Two or more dates give a range; a single date is read as the end of the offer.
pub fn parse_validity(content: &str) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
    let dates = extract_dates(content);
    match dates.as_slice() {
        [] => (None, None),
        [until] => (None, Some(at_day_boundary(*until, true))),
        [from, .., until] => (
            Some(at_day_boundary(*from, false)),
            Some(at_day_boundary(*until, true)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_price_formats() {
        assert_eq!(parse_price("€3,99"), Some(dec!(3.99)));
        assert_eq!(parse_price(" € 5.99 "), Some(dec!(5.99)));
        assert_eq!(parse_price("1.299,00 EUR"), Some(dec!(1299.00)));
        assert_eq!(parse_price("nu 2,49"), Some(dec!(2.49)));
        assert_eq!(parse_price("gratis"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn test_raw_price_to_decimal() {
        assert_eq!(raw_price_to_decimal(&RawPrice::Number(4.99)), Some(dec!(4.99)));
        assert_eq!(raw_price_to_decimal(&RawPrice::Number(f64::NAN)), None);
        assert_eq!(raw_price_to_decimal(&RawPrice::Text("€1,50".into())), Some(dec!(1.50)));
    }

    #[test]
    fn test_calculate_discount_percentage() {
        assert_eq!(
            calculate_discount_percentage(dec!(5.99), dec!(3.99)),
            Some(dec!(33.39))
        );
        assert_eq!(
            calculate_discount_percentage(dec!(1.29), dec!(0.99)),
            Some(dec!(23.26))
        );
        assert_eq!(calculate_discount_percentage(dec!(0), dec!(1.00)), None);
        assert_eq!(calculate_discount_percentage(dec!(-2), dec!(1.00)), None);
    }

    #[test]
    fn test_parse_timestamp() {
        let expected = NaiveDate::from_ymd_opt(2026, 10, 27)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2026-10-27T12:30:00", false), Some(expected));
        assert_eq!(parse_timestamp("2026-10-27 12:30", false), Some(expected));
        assert_eq!(parse_timestamp("2026-10-27T14:30:00+02:00", false), Some(expected));

        let end = NaiveDate::from_ymd_opt(2026, 10, 27)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert_eq!(parse_timestamp("27-10-2026", true), Some(end));
        assert_eq!(parse_timestamp("volgende week", true), None);
    }

    #[test]
    fn test_parse_validity() {
        let (from, until) = parse_validity("Geldig van 21-10-2026 t/m 27-10-2026");
        assert_eq!(from.map(|d| d.date()), NaiveDate::from_ymd_opt(2026, 10, 21));
        assert_eq!(until.map(|d| d.date()), NaiveDate::from_ymd_opt(2026, 10, 27));

        let (from, until) = parse_validity("t/m 2026-11-02");
        assert_eq!(from, None);
        assert_eq!(until.map(|d| d.date()), NaiveDate::from_ymd_opt(2026, 11, 2));

        assert_eq!(parse_validity("Deze week"), (None, None));
    }
}
