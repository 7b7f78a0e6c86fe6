//! Calendar helpers: lenient date parsing, "today" in the configured offset,
//! and the long Spanish date used on documents.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc, Weekday};

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Offset used when nothing is configured (America/La_Paz, no DST).
pub fn default_offset() -> FixedOffset {
    FixedOffset::west_opt(4 * 3600).unwrap_or_else(|| Utc.fix())
}

/// Parses `-04:00`, `+05:30`, `UTC-4`, `GMT+2` or a bare `-4`.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("UTC")
        .or_else(|| trimmed.strip_prefix("GMT"))
        .unwrap_or(trimmed)
        .trim();

    if body.is_empty() || body.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }

    let (sign, digits) = match body.as_bytes()[0] {
        b'+' => (1, &body[1..]),
        b'-' => (-1, &body[1..]),
        _ => (1, body),
    };

    let (hours, minutes) = match digits.split_once(':') {
        Some((hours, minutes)) => (hours.parse::<i32>().ok()?, minutes.parse::<i32>().ok()?),
        None => (digits.parse::<i32>().ok()?, 0),
    };
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// The current calendar date as seen from `offset`.
pub fn today_in(offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&offset).date_naive()
}

/// Accepts `d/m/yyyy`, `d-m-yy`, `yyyy-mm-dd` and RFC 3339 timestamps.
/// Two-digit years land in the 2000s.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    let parts: Vec<&str> = value.split(['/', '-']).collect();
    if parts.len() == 3 && parts.iter().all(|part| is_digits(part)) {
        let (first, second, third) = (parts[0], parts[1], parts[2]);

        if first.len() == 4 && (1..=2).contains(&second.len()) && (1..=2).contains(&third.len()) {
            return NaiveDate::from_ymd_opt(
                first.parse().ok()?,
                second.parse().ok()?,
                third.parse().ok()?,
            );
        }

        if (1..=2).contains(&first.len())
            && (1..=2).contains(&second.len())
            && (2..=4).contains(&third.len())
        {
            let mut year: i32 = third.parse().ok()?;
            if third.len() == 2 {
                year += 2000;
            }
            return NaiveDate::from_ymd_opt(year, second.parse().ok()?, first.parse().ok()?);
        }

        return None;
    }

    DateTime::parse_from_rfc3339(value).ok().map(|timestamp| timestamp.date_naive())
}

/// `LUNES 15 DE ENERO DE 2024`: weekday, day, month and year, upper-cased,
/// without the comma that usually follows the weekday.
pub fn format_long_date(date: NaiveDate) -> String {
    let month = MONTHS[date.month0() as usize];
    format!("{} {} de {} de {}", weekday_name(date.weekday()), date.day(), month, date.year())
        .to_uppercase()
}

/// `dd/mm/yyyy`, the short form used in spreadsheets and templates.
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "lunes",
        Weekday::Tue => "martes",
        Weekday::Wed => "miércoles",
        Weekday::Thu => "jueves",
        Weekday::Fri => "viernes",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

fn is_digits(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{format_long_date, format_short_date, parse_flexible_date, parse_utc_offset};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn parses_day_first_dates() {
        assert_eq!(parse_flexible_date("15/01/2024"), Some(date(2024, 1, 15)));
        assert_eq!(parse_flexible_date("5-3-24"), Some(date(2024, 3, 5)));
        assert_eq!(parse_flexible_date(" 1/12/2025 "), Some(date(2025, 12, 1)));
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_flexible_date("2024-02-29"), Some(date(2024, 2, 29)));
        assert_eq!(parse_flexible_date("2024-03-05T10:00:00-04:00"), Some(date(2024, 3, 5)));
    }

    #[test]
    fn rejects_impossible_or_garbled_dates() {
        assert_eq!(parse_flexible_date("31/02/2024"), None);
        assert_eq!(parse_flexible_date("mañana"), None);
        assert_eq!(parse_flexible_date(""), None);
        assert_eq!(parse_flexible_date("1/2"), None);
    }

    #[test]
    fn long_date_is_upper_cased_without_comma() {
        assert_eq!(format_long_date(date(2024, 1, 15)), "LUNES 15 DE ENERO DE 2024");
        assert_eq!(format_long_date(date(2024, 3, 6)), "MIÉRCOLES 6 DE MARZO DE 2024");
        assert_eq!(format_long_date(date(2025, 11, 1)), "SÁBADO 1 DE NOVIEMBRE DE 2025");
    }

    #[test]
    fn short_date_is_zero_padded() {
        assert_eq!(format_short_date(date(2024, 3, 5)), "05/03/2024");
    }

    #[test]
    fn parses_offsets_in_common_spellings() {
        let la_paz = -4 * 3600;
        assert_eq!(parse_utc_offset("-04:00").map(|o| o.local_minus_utc()), Some(la_paz));
        assert_eq!(parse_utc_offset("UTC-4").map(|o| o.local_minus_utc()), Some(la_paz));
        assert_eq!(parse_utc_offset("+05:30").map(|o| o.local_minus_utc()), Some(19_800));
        assert_eq!(parse_utc_offset("Z").map(|o| o.local_minus_utc()), Some(0));
        assert_eq!(parse_utc_offset("America/La_Paz"), None);
        assert_eq!(parse_utc_offset("+25"), None);
    }
}
