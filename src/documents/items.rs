//! Line-item normalization: zips the parallel form arrays into [`LineItem`]s.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::models::LineItem;
use super::payload::Scalar;

pub const DEFAULT_QUANTITY: u64 = 1;
const NAME_SEPARATOR: &str = " - ";

lazy_static! {
    static ref LEADING_INTEGER: Regex = Regex::new(r"^[+-]?\d+").unwrap();
    static ref LEADING_DECIMAL: Regex = Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)").unwrap();
}

/// Build items from index-aligned names, quantities and prices.
///
/// `prices` is `None` for documents without a financial section; the items
/// then carry no unit price at all. Rows with a blank name are dropped, the
/// rest keep their order.
pub fn normalize_items(
    names: &[Scalar],
    quantities: &[Scalar],
    prices: Option<&[Scalar]>,
) -> Vec<LineItem> {
    names
        .iter()
        .enumerate()
        .filter_map(|(i, name)| {
            let name = name.as_text()?;
            if name.trim().is_empty() {
                return None;
            }
            let (code, description) = split_name(&name);
            Some(LineItem {
                quantity: parse_quantity(quantities.get(i)),
                unit_price: prices.map(|prices| parse_price(prices.get(i))),
                name,
                code,
                description,
            })
        })
        .collect()
}

/// Split `"CODE - DESCRIPTION"`. Extra separators stay in the description.
pub fn split_name(name: &str) -> (String, String) {
    match name.split_once(NAME_SEPARATOR) {
        Some((code, description)) => (code.trim().to_string(), description.trim().to_string()),
        None => (String::new(), name.to_string()),
    }
}

/// Leading integer of the value; missing, unparsable or negative input
/// yields [`DEFAULT_QUANTITY`]. Quantities past `u64::MAX` saturate.
pub fn parse_quantity(value: Option<&Scalar>) -> u64 {
    let Some(text) = value.and_then(Scalar::as_text) else {
        return DEFAULT_QUANTITY;
    };
    let Some(number) = LEADING_INTEGER.find(text.trim()) else {
        return DEFAULT_QUANTITY;
    };
    let number = number.as_str();
    let digits = match number.strip_prefix('-') {
        Some(rest) if rest.trim_start_matches('0').is_empty() => "0",
        Some(_) => return DEFAULT_QUANTITY,
        None => number.trim_start_matches('+'),
    };
    // Only digits remain, so a parse failure is always an overflow.
    digits.parse::<u64>().unwrap_or(u64::MAX)
}

/// Leading decimal of the value, accepting a comma as decimal separator.
/// Missing, unparsable or negative input yields zero.
pub fn parse_price(value: Option<&Scalar>) -> Decimal {
    parse_decimal(value)
        .filter(|price| *price >= Decimal::ZERO)
        .unwrap_or(Decimal::ZERO)
}

pub(crate) fn parse_decimal(value: Option<&Scalar>) -> Option<Decimal> {
    let text = value.and_then(Scalar::as_text)?;
    let text = text.trim();
    let normalized = if text.contains(',') && !text.contains('.') {
        text.replacen(',', ".", 1)
    } else {
        text.to_string()
    };
    let number = LEADING_DECIMAL.find(&normalized)?.as_str();
    let number = number.trim_start_matches('+').trim_end_matches('.');
    let number = match number.strip_prefix('-') {
        Some(rest) => format!("-0{}", rest),
        None => format!("0{}", number),
    };
    Decimal::from_str(&number).ok()
}
