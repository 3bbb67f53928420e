//! Human-readable formatting for prices, market figures and percent changes.
//!
//! The `*_str` variants accept the upstream decimal strings directly; a value
//! that fails to parse is rendered the same as a non-finite number.

const COMPACT_UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

/// Format a USD amount, with more decimals for sub-dollar prices.
pub fn currency(value: f64) -> String {
    if !value.is_finite() {
        return "$0.00".to_owned();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    let body = if abs < 0.01 {
        format!("{abs:.6}")
    } else if abs < 1.0 {
        format!("{abs:.4}")
    } else if abs < 1000.0 {
        format!("{abs:.2}")
    } else if abs >= 1e6 {
        compact(abs)
    } else {
        group_thousands(&trim_fraction(format!("{abs:.2}")))
    };

    format!("{sign}${body}")
}

pub fn currency_str(raw: &str) -> String {
    currency(parse(raw))
}

/// Format a market figure (supply, market cap) in compact notation.
pub fn large_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_owned();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{}", compact(value.abs()))
}

pub fn large_number_str(raw: &str) -> String {
    large_number(parse(raw))
}

/// Signed percent with two decimals, e.g. `+2.50%`.
pub fn percent_change(value: f64) -> String {
    if !value.is_finite() {
        return "0.00%".to_owned();
    }
    // avoid rendering negative zero as "+-0.00%"
    let value = if value == 0.0 { 0.0 } else { value };
    let sign = if value >= 0.0 { "+" } else { "" };
    format!("{sign}{value:.2}%")
}

pub fn percent_change_str(raw: &str) -> String {
    percent_change(parse(raw))
}

fn parse(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(f64::NAN)
}

/// Up to two fraction digits with a K/M/B/T suffix; `abs` must be non-negative.
fn compact(abs: f64) -> String {
    for (index, &(scale, suffix)) in COMPACT_UNITS.iter().enumerate() {
        if abs < scale {
            continue;
        }
        let scaled = round2(abs / scale);
        // 999.999K rounds up into the next unit
        if scaled >= 1000.0 && index > 0 {
            let (bigger, bigger_suffix) = COMPACT_UNITS[index - 1];
            return format!("{}{}", trim_fraction(format!("{:.2}", abs / bigger)), bigger_suffix);
        }
        return format!("{}{suffix}", trim_fraction(format!("{scaled:.2}")));
    }
    let rounded = round2(abs);
    if rounded >= 1000.0 {
        return "1K".to_owned();
    }
    trim_fraction(format!("{rounded:.2}"))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Trims trailing zeros (and a dangling point) from a fixed-point string.
fn trim_fraction(formatted: String) -> String {
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted
    }
}

/// Inserts `,` every three integer digits of an unsigned decimal string.
fn group_thousands(formatted: &str) -> String {
    let (integer, fraction) = match formatted.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (formatted, None),
    };

    let grouped = integer
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",");

    match fraction {
        Some(fraction) => format!("{grouped}.{fraction}"),
        None => grouped,
    }
}
