use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Largest serial day number a spreadsheet can represent (9999-12-31).
const MAX_SPREADSHEET_SERIAL: i64 = 2_958_465;

/// Canonical form of an account code: surrounding whitespace and any
/// trailing ".0" (left behind when a spreadsheet stores codes as floats) are
/// removed. Applying it twice gives the same result as applying it once.
pub fn normalize_account_code(raw: &str) -> String {
    let mut code = raw.trim();
    while let Some(stripped) = code.strip_suffix(".0") {
        code = stripped.trim();
    }
    code.to_string()
}

/// First character of the code, which is the SYSCOHADA account class.
pub fn account_class(code: &str) -> Option<char> {
    code.chars().next()
}

/// Parses a date cell against each format in turn, then as a spreadsheet
/// serial number when `allow_serial` is set.
pub fn parse_date_flexible(raw: &str, formats: &[String], allow_serial: bool) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    for format in formats {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }

    if allow_serial {
        return parse_decimal_strict(value).and_then(spreadsheet_serial_to_date);
    }

    None
}

pub fn spreadsheet_serial_to_date(serial: Decimal) -> Option<NaiveDate> {
    let days = serial.trunc().to_i64()?;
    if !(1..=MAX_SPREADSHEET_SERIAL).contains(&days) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(days as u64))
}

/// Period key of a date: `YYYYMM`.
pub fn period_key(date: NaiveDate) -> String {
    format!("{:04}{:02}", date.year(), date.month())
}

/// Strict decimal parse: plain or scientific notation, nothing else.
pub fn parse_decimal_strict(raw: &str) -> Option<Decimal> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

/// Sum that reports overflow as `None` instead of panicking.
pub fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
}

/// Renders an amount the way the statements display it: the integer part
/// only, digits grouped by three with a space ("1 234 567").
pub fn format_thousands(amount: Decimal) -> String {
    let truncated = amount.trunc();
    if truncated.is_zero() {
        return "0".to_string();
    }

    let digits = truncated.abs().normalize().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if truncated.is_sign_negative() {
        grouped.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ProcessingConfig;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_account_code() {
        assert_eq!(normalize_account_code("601"), "601");
        assert_eq!(normalize_account_code("601.0"), "601");
        assert_eq!(normalize_account_code(" 601 "), "601");
        assert_eq!(normalize_account_code(" 601.0 "), "601");
        assert_eq!(normalize_account_code("4011"), "4011");
        // Only a literal ".0" suffix is dropped.
        assert_eq!(normalize_account_code("601.5"), "601.5");
        assert_eq!(normalize_account_code("60"), "60");
    }

    #[test]
    fn test_normalize_account_code_is_idempotent() {
        for raw in ["601", "601.0", " 601 ", "601.0.0", "601 .0", "  ", "521.00"] {
            let once = normalize_account_code(raw);
            assert_eq!(normalize_account_code(&once), once, "raw input {:?}", raw);
        }
    }

    #[test]
    fn test_account_class() {
        assert_eq!(account_class("601"), Some('6'));
        assert_eq!(account_class(""), None);
    }

    #[test]
    fn test_parse_date_flexible() {
        let formats = ProcessingConfig::default().date_formats;
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        assert_eq!(parse_date_flexible("01/03/2024", &formats, true), Some(expected));
        assert_eq!(parse_date_flexible("2024-03-01", &formats, true), Some(expected));
        assert_eq!(
            parse_date_flexible("2024-03-01 00:00:00", &formats, true),
            Some(expected)
        );
        assert_eq!(parse_date_flexible("01.03.2024", &formats, true), Some(expected));
        assert_eq!(parse_date_flexible("not a date", &formats, true), None);
        assert_eq!(parse_date_flexible("", &formats, true), None);
        assert_eq!(parse_date_flexible("31/02/2024", &formats, true), None);
    }

    #[test]
    fn test_parse_spreadsheet_serial_dates() {
        let formats = ProcessingConfig::default().date_formats;
        let new_year = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        assert_eq!(parse_date_flexible("45292", &formats, true), Some(new_year));
        assert_eq!(parse_date_flexible("45292.0", &formats, true), Some(new_year));
        assert_eq!(parse_date_flexible("45292", &formats, false), None);
        assert_eq!(parse_date_flexible("-3", &formats, true), None);
    }

    #[test]
    fn test_period_key() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(period_key(date), "202403");
    }

    #[test]
    fn test_parse_decimal_strict() {
        assert_eq!(parse_decimal_strict("1000"), Some(dec!(1000)));
        assert_eq!(parse_decimal_strict(" 1250.50 "), Some(dec!(1250.50)));
        assert_eq!(parse_decimal_strict("1e3"), Some(dec!(1000)));
        assert_eq!(parse_decimal_strict("-15"), Some(dec!(-15)));
        assert_eq!(parse_decimal_strict("abc"), None);
        assert_eq!(parse_decimal_strict(""), None);
    }

    #[test]
    fn test_checked_sum() {
        assert_eq!(checked_sum([dec!(1.5), dec!(2), dec!(-0.5)]), Some(dec!(3)));
        assert_eq!(checked_sum(Vec::new()), Some(Decimal::ZERO));
        assert_eq!(checked_sum([Decimal::MAX]), Some(Decimal::MAX));
        assert_eq!(checked_sum([Decimal::MAX, Decimal::ONE]), None);
        assert_eq!(checked_sum([Decimal::MIN, -Decimal::ONE]), None);
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(dec!(0)), "0");
        assert_eq!(format_thousands(dec!(999)), "999");
        assert_eq!(format_thousands(dec!(1000)), "1 000");
        assert_eq!(format_thousands(dec!(1234567.89)), "1 234 567");
        assert_eq!(format_thousands(dec!(-2500000)), "-2 500 000");
        assert_eq!(format_thousands(dec!(-0.4)), "0");
    }
}
