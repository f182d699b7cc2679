//! Totals, payment conditions and pt-BR currency formatting.

use rust_decimal::{Decimal, RoundingStrategy};

use super::items::parse_decimal;
use super::models::{AmountOverflow, LineItem, PaymentCondition};
use super::payload::Scalar;

/// Sum of extended prices over the normalized items.
pub fn grand_total(items: &[LineItem]) -> Result<Decimal, AmountOverflow> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        let Some(price) = item.extended_price()? else {
            return Ok(total);
        };
        total
            .checked_add(price)
            .ok_or_else(|| AmountOverflow("grand total".to_string()))
    })
}

/// Zip condition labels with their values, drop blank labels and put rows
/// with an explicit value ahead of the rows that take the grand total.
///
/// The ordering relies on `sort_by_key` being stable: rows in the same tier
/// keep the order the user entered them in.
pub fn build_conditions(labels: &[Scalar], values: &[Scalar]) -> Vec<PaymentCondition> {
    let mut conditions: Vec<PaymentCondition> = labels
        .iter()
        .enumerate()
        .filter_map(|(i, label)| {
            let label = label.as_text()?.trim().to_string();
            if label.is_empty() {
                return None;
            }
            Some(PaymentCondition {
                label,
                fixed_value: parse_decimal(values.get(i)).unwrap_or(Decimal::ZERO),
            })
        })
        .collect();

    conditions.sort_by_key(PaymentCondition::absorbs_remainder);
    conditions
}

/// One rendered row of the payment summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionRow {
    /// `None` for the synthetic total-only row.
    pub label: Option<String>,
    pub amount: Decimal,
}

pub fn condition_rows(conditions: &[PaymentCondition], total: Decimal) -> Vec<ConditionRow> {
    if conditions.is_empty() {
        return vec![ConditionRow {
            label: None,
            amount: total,
        }];
    }

    conditions
        .iter()
        .map(|c| ConditionRow {
            label: Some(c.label.clone()),
            amount: if c.absorbs_remainder() { total } else { c.fixed_value },
        })
        .collect()
}

/// Item-row money: always two fraction digits, e.g. `R$ 1.234,50`.
pub fn format_item_currency(value: Decimal) -> String {
    format!("R$ {}", format_brl_number(value, 2, 2))
}

/// Summary money: at least two, at most three fraction digits.
pub fn format_total_currency(value: Decimal) -> String {
    format!("R$ {}", format_brl_number(value, 2, 3))
}

/// Format with `.` thousands grouping and `,` decimal separator.
pub fn format_brl_number(value: Decimal, min_fraction: u32, max_fraction: u32) -> String {
    let rounded = value
        .round_dp_with_strategy(max_fraction, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let digits = rounded.scale().max(min_fraction) as usize;
    let plain = format!("{:.*}", digits, rounded.abs());

    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (plain.clone(), String::new()),
    };

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped},{frac_part}")
    }
}
