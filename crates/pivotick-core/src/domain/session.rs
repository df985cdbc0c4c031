use time::{Date, Duration, Month, OffsetDateTime, UtcOffset};

/// Offset of the Taipei exchanges (no daylight saving).
pub const TAIPEI_OFFSET_HOURS: i8 = 8;

const ROC_EPOCH_YEAR: i32 = 1911;

/// Current trading-session date in Taipei time.
pub fn session_date_now() -> Date {
    session_date_at(OffsetDateTime::now_utc())
}

/// Trading-session date for the given instant.
pub fn session_date_at(instant: OffsetDateTime) -> Date {
    match UtcOffset::from_hms(TAIPEI_OFFSET_HOURS, 0, 0) {
        Ok(offset) => instant.to_offset(offset).date(),
        Err(_) => instant.date(),
    }
}

/// Last calendar day of the month before `date`.
///
/// Monthly exchange feeds are keyed by any day of the month, so this names the
/// previous month's file.
pub fn previous_month(date: Date) -> Date {
    let first_of_month = date - Duration::days(i64::from(date.day()) - 1);
    first_of_month.previous_day().unwrap_or(first_of_month)
}

/// Parse a slash-separated exchange date.
///
/// Years below 1911 are taken as ROC (Minguo) years, so both `113/01/05` and
/// `2024/01/05` yield 2024-01-05. Hyphens are accepted as separators.
pub fn parse_exchange_date(raw: &str) -> Option<Date> {
    let cleaned = raw.trim().replace('-', "/");
    let mut parts = cleaned.split('/').map(str::trim);
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u8>().ok()?;
    let day = parts.next()?.parse::<u8>().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let year = if year < ROC_EPOCH_YEAR {
        year + ROC_EPOCH_YEAR
    } else {
        year
    };
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn parses_roc_dates() {
        assert_eq!(parse_exchange_date("113/01/05"), Some(date!(2024 - 01 - 05)));
        assert_eq!(parse_exchange_date(" 99/12/31 "), Some(date!(2010 - 12 - 31)));
    }

    #[test]
    fn parses_gregorian_dates() {
        assert_eq!(parse_exchange_date("2024/01/05"), Some(date!(2024 - 01 - 05)));
        assert_eq!(parse_exchange_date("2024-01-05"), Some(date!(2024 - 01 - 05)));
    }

    #[test]
    fn rejects_malformed_dates() {
        assert_eq!(parse_exchange_date("113/13/05"), None);
        assert_eq!(parse_exchange_date("113/01"), None);
        assert_eq!(parse_exchange_date("113/01/05/1"), None);
        assert_eq!(parse_exchange_date("today"), None);
    }

    #[test]
    fn previous_month_crosses_year_boundaries() {
        assert_eq!(previous_month(date!(2024 - 07 - 01)), date!(2024 - 06 - 30));
        assert_eq!(previous_month(date!(2024 - 03 - 31)), date!(2024 - 02 - 29));
        assert_eq!(previous_month(date!(2024 - 01 - 05)), date!(2023 - 12 - 31));
    }

    #[test]
    fn session_date_rolls_over_at_taipei_midnight() {
        assert_eq!(
            session_date_at(datetime!(2024-01-05 15:59:59 UTC)),
            date!(2024 - 01 - 05)
        );
        assert_eq!(
            session_date_at(datetime!(2024-01-05 16:00:00 UTC)),
            date!(2024 - 01 - 06)
        );
    }
}
