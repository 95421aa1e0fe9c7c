// Spreadsheet date serials (1900 date system)
//
// Serial 1 is 1900-01-01. Excel counts a fictitious 1900-02-29 as serial 60,
// so serials up to 60 count from 1899-12-31 and later ones from 1899-12-30.
// Serial 60 therefore lands on 1900-03-01, the same day as 61.
//
// calamine does not expose the workbook's 1904 flag through `as_f64()`;
// 1904-system workbooks will read four years early.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Largest serial Excel can represent (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.999_999;

const SECONDS_PER_DAY: i64 = 86_400;

/// Decode a serial into a UTC timestamp. The fractional part is the time of
/// day, rounded to the nearest second. Out-of-range serials yield `None`.
pub fn serial_to_datetime(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() || !(0.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }

    let mut days = serial.floor() as i64;
    let mut seconds = (serial.fract() * SECONDS_PER_DAY as f64).round() as i64;
    if seconds >= SECONDS_PER_DAY {
        days += 1;
        seconds -= SECONDS_PER_DAY;
    }

    let epoch = if days <= 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };

    let date = epoch.checked_add_signed(Duration::days(days))?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(midnight.and_utc() + Duration::seconds(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    // Known Excel serial values - if these drift, every imported PO date does
    #[test]
    fn test_serial_known_values() {
        let cases = [
            (1.0, ymd(1900, 1, 1)),
            (59.0, ymd(1900, 2, 28)),
            (60.0, ymd(1900, 3, 1)),
            (61.0, ymd(1900, 3, 1)),
            (36526.0, ymd(2000, 1, 1)),
            (45292.0, ymd(2024, 1, 1)),
            (45351.0, ymd(2024, 2, 29)),
        ];
        for (serial, expected) in cases {
            assert_eq!(serial_to_datetime(serial), Some(expected), "serial {serial}");
        }
    }

    #[test]
    fn test_serial_time_of_day() {
        let noon = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(serial_to_datetime(45292.5), Some(noon));

        let late = Utc.with_ymd_and_hms(2024, 1, 1, 18, 30, 15).unwrap();
        let fraction = (18.0 * 3600.0 + 30.0 * 60.0 + 15.0) / 86400.0;
        assert_eq!(serial_to_datetime(45292.0 + fraction), Some(late));
    }

    #[test]
    fn test_serial_rounds_up_to_next_day() {
        assert_eq!(serial_to_datetime(45292.999_999_9), Some(ymd(2024, 1, 2)));
    }

    #[test]
    fn test_serial_out_of_range() {
        assert_eq!(serial_to_datetime(-1.0), None);
        assert_eq!(serial_to_datetime(3_000_000.0), None);
        assert_eq!(serial_to_datetime(f64::NAN), None);
    }
}
