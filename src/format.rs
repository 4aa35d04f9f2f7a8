//! Display formatting. Values are only rounded here, never in the model.

/// en-US style number: comma grouping, at most two fraction digits,
/// trailing zeros dropped (`1234.5` -> `1,234.5`, `3.0` -> `3`).
pub fn format_number(value: f64) -> String {
    format_grouped(value, 2)
}

fn format_grouped(value: f64, max_fraction_digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞" } else { "-∞" }.to_string();
    }

    let formatted = format!("{:.*}", max_fraction_digits, value.abs());
    let (integer_part, decimal_part) = match formatted.split_once('.') {
        Some((i, d)) => (i, d.trim_end_matches('0')),
        None => (formatted.as_str(), ""),
    };

    let grouped = integer_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(",");

    // rounding can turn a tiny negative into zero, which has no sign
    let negative = value < 0.0 && (integer_part != "0" || !decimal_part.is_empty());
    let sign = if negative { "-" } else { "" };

    if decimal_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{decimal_part}")
    }
}

pub fn format_currency(value: f64, currency: &str) -> String {
    let formatted_number = match currency {
        "JPY" => format_grouped(value, 0),
        _ => format_number(value),
    };

    match currency {
        "USD" | "CAD" | "AUD" | "HKD" | "SGD" => format!("${formatted_number}"),
        "EUR" => format!("{formatted_number} €"),
        "GBP" => format!("£{formatted_number}"),
        "JPY" => format!("¥{formatted_number}"),
        _ => format!("{formatted_number} {currency}"),
    }
}

pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else if amount >= 1.0 {
        format!("{amount:.2}")
    } else if amount >= 0.01 {
        format!("{amount:.4}")
    } else {
        format!("{amount:.8}")
    }
}

pub fn format_multiplier(multiplier: f64) -> String {
    if multiplier >= 10.0 {
        format!("{multiplier:.1}x")
    } else if multiplier >= 0.1 {
        format!("{multiplier:.2}x")
    } else {
        format!("{multiplier:.3}x")
    }
}
