//! Conversions between typed amounts and stored minor units (cents).

/// Parses a typed amount into cents.
///
/// Everything except digits and separators is dropped. When both `.` and
/// `,` remain, commas are thousands separators; a lone comma is the decimal
/// separator. Empty or unparsable input is 0.
pub fn normalize_amount(input: &str) -> i64 {
    let kept: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let normalized = if kept.contains('.') {
        kept.replace(',', "")
    } else {
        kept.replace(',', ".")
    };
    if normalized.is_empty() {
        return 0;
    }
    match normalized.parse::<f64>() {
        Ok(amount) if amount.is_finite() => {
            let cents = (amount * 100.0).round();
            if cents.is_finite() && cents <= i64::MAX as f64 {
                cents as i64
            } else {
                0
            }
        }
        _ => 0,
    }
}

/// Draft text for a stored amount. Missing and zero amounts are blank.
pub fn cents_to_input(cents: Option<i64>) -> String {
    match cents {
        None | Some(0) => String::new(),
        Some(cents) => {
            let sign = if cents < 0 { "-" } else { "" };
            format!("{sign}{}", plain_amount(cents.unsigned_abs()))
        }
    }
}

fn plain_amount(abs: u64) -> String {
    let (whole, frac) = (abs / 100, abs % 100);
    match frac {
        0 => format!("{whole}"),
        f if f % 10 == 0 => format!("{whole}.{}", f / 10),
        f => format!("{whole}.{f:02}"),
    }
}

/// Display text for an amount, e.g. `€1,234.5`.
pub fn format_amount(cents: Option<i64>) -> String {
    let Some(cents) = cents else {
        return "Amount not set".to_string();
    };
    let sign = if cents < 0 { "-" } else { "" };
    let plain = plain_amount(cents.unsigned_abs());
    let (whole, frac) = match plain.split_once('.') {
        Some((whole, frac)) => (whole.to_string(), Some(frac.to_string())),
        None => (plain, None),
    };
    let grouped = group_thousands(&whole);
    match frac {
        Some(frac) => format!("{sign}€{grouped}.{frac}"),
        None => format!("{sign}€{grouped}"),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalizes_typed_amounts() {
        assert_eq!(normalize_amount("1,234.5"), 123_450);
        assert_eq!(normalize_amount(""), 0);
        assert_eq!(normalize_amount("abc"), 0);
        assert_eq!(normalize_amount("12,5"), 1_250);
        assert_eq!(normalize_amount("€ 99.99"), 9_999);
        assert_eq!(normalize_amount("1.2.3"), 0);
        assert_eq!(normalize_amount("."), 0);
        assert_eq!(normalize_amount("0.005"), 1);
    }

    #[test]
    fn blank_draft_for_missing_or_zero() {
        assert_eq!(cents_to_input(None), "");
        assert_eq!(cents_to_input(Some(0)), "");
        assert_eq!(cents_to_input(Some(150_000)), "1500");
        assert_eq!(cents_to_input(Some(123_450)), "1234.5");
        assert_eq!(cents_to_input(Some(5)), "0.05");
    }

    #[test]
    fn formats_for_display() {
        assert_eq!(format_amount(None), "Amount not set");
        assert_eq!(format_amount(Some(0)), "€0");
        assert_eq!(format_amount(Some(123_450)), "€1,234.5");
        assert_eq!(format_amount(Some(100_000_000)), "€1,000,000");
        assert_eq!(format_amount(Some(1_999)), "€19.99");
        assert_eq!(format_amount(Some(-250)), "-€2.5");
    }

    #[test]
    fn extreme_stored_amounts_format() {
        assert_eq!(format_amount(Some(i64::MIN)), "-€92,233,720,368,547,758.08");
        assert_eq!(format_amount(Some(i64::MAX)), "€92,233,720,368,547,758.07");
        assert_eq!(cents_to_input(Some(i64::MIN)), "-92233720368547758.08");
    }

    proptest! {
        #[test]
        fn stored_amounts_survive_a_draft_round_trip(cents in 0i64..10_000_000_000) {
            prop_assert_eq!(normalize_amount(&cents_to_input(Some(cents))), cents);
        }
    }
}
