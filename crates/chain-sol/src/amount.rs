//! Conversion between base units and human-readable amounts.
//!
//! Every builder API takes raw base units (lamports, token base units).
//! These helpers exist for the presentation layer only and never go through
//! floating point.

use crate::error::SolError;

/// Decimals of native SOL.
pub const SOL_DECIMALS: u8 = 9;

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Parse a decimal string such as `"1.5"` into base units.
///
/// Rejects negative values, more fractional digits than `decimals`, and
/// results that overflow `u64`. Zero parses successfully; whether zero is an
/// acceptable amount is up to the builder.
pub fn parse_ui_amount(input: &str, decimals: u8) -> Result<u64, SolError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(SolError::InvalidAmount("empty amount".into()));
    }
    if s.starts_with('-') {
        return Err(SolError::InvalidAmount(format!("negative amount: {s}")));
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(SolError::InvalidAmount(format!("not a number: {s}")));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(SolError::InvalidAmount(format!("not a number: {s}")));
    }
    if frac.len() > decimals as usize {
        return Err(SolError::InvalidAmount(format!(
            "{s} has more than {decimals} fractional digits"
        )));
    }

    let overflow = || SolError::InvalidAmount(format!("{s} overflows u64 base units"));
    let scale = 10u64.checked_pow(decimals as u32).ok_or_else(overflow)?;

    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u64>().map_err(|_| overflow())?
    };

    let frac_units = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = decimals as usize);
        padded.parse::<u64>().map_err(|_| overflow())?
    };

    whole_units
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_units))
        .ok_or_else(overflow)
}

/// Format base units as a decimal string, trimming trailing zeros.
pub fn format_ui_amount(base_units: u64, decimals: u8) -> String {
    if decimals == 0 {
        return base_units.to_string();
    }
    let digits = format!("{base_units:0>width$}", width = decimals as usize + 1);
    let (whole, frac) = digits.split_at(digits.len() - decimals as usize);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{frac}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_sol() {
        assert_eq!(parse_ui_amount("1", SOL_DECIMALS).unwrap(), LAMPORTS_PER_SOL);
        assert_eq!(parse_ui_amount("1.5", SOL_DECIMALS).unwrap(), 1_500_000_000);
        assert_eq!(parse_ui_amount("0.000000001", SOL_DECIMALS).unwrap(), 1);
        assert_eq!(parse_ui_amount(".25", 2).unwrap(), 25);
        assert_eq!(parse_ui_amount("3.", 2).unwrap(), 300);
    }

    #[test]
    fn zero_parses_to_zero() {
        assert_eq!(parse_ui_amount("0", SOL_DECIMALS).unwrap(), 0);
        assert_eq!(parse_ui_amount("0.0", SOL_DECIMALS).unwrap(), 0);
    }

    #[test]
    fn rejects_bad_input() {
        for bad in ["", "-1", "abc", "1.2.3", ".", "1e9", " - "] {
            assert!(parse_ui_amount(bad, 9).is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn rejects_excess_precision() {
        let err = parse_ui_amount("0.0000000001", SOL_DECIMALS).unwrap_err();
        assert!(err.to_string().contains("fractional digits"));
    }

    #[test]
    fn rejects_overflow() {
        assert!(parse_ui_amount("18446744074", SOL_DECIMALS).is_err());
        assert!(parse_ui_amount("18446744073.709551615", SOL_DECIMALS).is_ok());
    }

    #[test]
    fn formats_amounts() {
        assert_eq!(format_ui_amount(1_500_000_000, SOL_DECIMALS), "1.5");
        assert_eq!(format_ui_amount(1, SOL_DECIMALS), "0.000000001");
        assert_eq!(format_ui_amount(2_000_000_000, SOL_DECIMALS), "2");
        assert_eq!(format_ui_amount(0, 6), "0");
        assert_eq!(format_ui_amount(42, 0), "42");
    }

    #[test]
    fn format_then_parse_is_identity() {
        for units in [0u64, 1, 999, 1_000_000, u64::MAX] {
            let text = format_ui_amount(units, 6);
            assert_eq!(parse_ui_amount(&text, 6).unwrap(), units);
        }
    }
}
