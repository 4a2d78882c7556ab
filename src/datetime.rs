//! Date and time values stored as decimal days.
//!
//! The integral part of a [`DateTime`] is the number of days that have
//! passed since 1899-12-30; the fractional part is the fraction of the
//! 24 hour day that has elapsed. This is the encoding SWMM writes into
//! the start date and period timestamps of its binary output files.

use chrono::{NaiveDate, NaiveDateTime};

/// Decimal days since 1899-12-30.
pub type DateTime = f64;

/// Days between 0001-01-01 and the 1899-12-30 epoch.
pub const DATE_DELTA: i64 = 693594;

const SECS_PER_DAY: f64 = 86400.0;

static MONTH_TXT: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

static DAYS_PER_MONTH: [[i32; 12]; 2] = [
    [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31],
    [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31],
];

/// Field ordering used when formatting or parsing a date string.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DateFormat {
    YearMonthDay,
    MonthDayYear,
    DayMonthYear,
}

fn div_mod(n: i32, d: i32) -> (i32, i32) {
    if d == 0 {
        (0, 0)
    } else {
        (n / d, n % d)
    }
}

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in `month` of `year`, or 0 for a month outside 1–12.
pub fn days_per_month(year: i32, month: i32) -> i32 {
    if !(1..=12).contains(&month) {
        return 0;
    }
    DAYS_PER_MONTH[is_leap_year(year) as usize][(month - 1) as usize]
}

/// Encodes a calendar date as decimal days.
///
/// Returns the sentinel `-DATE_DELTA` when the date is not a valid
/// proleptic Gregorian date between years 1 and 9999.
pub fn encode_date(year: i32, month: i32, day: i32) -> DateTime {
    if !(1..=9999).contains(&year) || !(1..=12).contains(&month) {
        return -(DATE_DELTA as f64);
    }
    if day < 1 || day > days_per_month(year, month) {
        return -(DATE_DELTA as f64);
    }

    let leap = is_leap_year(year) as usize;
    let mut doy = day;
    for m in 1..month {
        doy += DAYS_PER_MONTH[leap][(m - 1) as usize];
    }
    let y = (year - 1) as i64;
    (y * 365 + y / 4 - y / 100 + y / 400 + doy as i64 - DATE_DELTA) as f64
}

/// Encodes a time of day as the fraction of a day.
pub fn encode_time(hour: i32, minute: i32, second: i32) -> DateTime {
    if hour >= 0 && minute >= 0 && second >= 0 {
        ((hour * 3600 + minute * 60 + second) as f64) / SECS_PER_DAY
    } else {
        0.0
    }
}

/// Decodes the date part of a value into `(year, month, day)`.
pub fn decode_date(date: DateTime) -> (i32, i32, i32) {
    const D1: i32 = 365;
    const D4: i32 = D1 * 4 + 1;
    const D100: i32 = D4 * 25 - 1;
    const D400: i32 = D100 * 4 + 1;

    let mut t = date.floor() as i64 + DATE_DELTA;
    if t <= 0 {
        return (0, 1, 1);
    }
    t -= 1;

    let mut year = 1;
    while t >= i64::from(D400) {
        t -= i64::from(D400);
        year += 400;
    }
    let (mut centuries, mut rem) = div_mod(t as i32, D100);
    if centuries == 4 {
        centuries -= 1;
        rem += D100;
    }
    year += centuries * 100;
    let (quads, rem) = div_mod(rem, D4);
    year += quads * 4;
    let (mut ones, mut rem) = div_mod(rem, D1);
    if ones == 4 {
        ones -= 1;
        rem += D1;
    }
    year += ones;

    let leap = is_leap_year(year) as usize;
    let mut month = 1;
    let mut day = rem;
    loop {
        let len = DAYS_PER_MONTH[leap][(month - 1) as usize];
        if day < len {
            break;
        }
        day -= len;
        month += 1;
    }
    (year, month, day + 1)
}

/// Decodes the time part of a value into `(hour, minute, second)`.
pub fn decode_time(time: DateTime) -> (i32, i32, i32) {
    let frac_day = (time - time.floor()) * SECS_PER_DAY;
    let mut secs = (frac_day + 0.5).floor() as i32;
    if secs >= 86400 {
        secs = 86399;
    }
    let (mins, second) = div_mod(secs, 60);
    let (mut hour, minute) = div_mod(mins, 60);
    if hour > 23 {
        hour = 0;
    }
    (hour, minute, second)
}

/// Day of the week, with 1 = Sunday.
pub fn day_of_week(date: DateTime) -> i32 {
    let t = date.floor() as i64 + DATE_DELTA;
    (t % 7) as i32 + 1
}

pub fn day_of_year(date: DateTime) -> i32 {
    let (year, _, _) = decode_date(date);
    let start_of_year = encode_date(year, 1, 1);
    (date.floor() - start_of_year) as i32 + 1
}

pub fn month_of_year(date: DateTime) -> i32 {
    let (_, month, _) = decode_date(date);
    month
}

pub fn hour_of_day(date: DateTime) -> i32 {
    let frac_day = date - date.floor();
    (24.0 * frac_day) as i32
}

/// Formats the date part with an uppercase three letter month, e.g.
/// `2024-FEB-29`, `FEB-29-2024` or `29-FEB-2024` depending on `format`.
pub fn date_to_string(date: DateTime, format: DateFormat) -> String {
    let (year, month, day) = decode_date(date);
    let month_txt = MONTH_TXT[(month - 1) as usize];
    match format {
        DateFormat::YearMonthDay => format!("{:4}-{}-{:02}", year, month_txt, day),
        DateFormat::MonthDayYear => format!("{}-{:02}-{:4}", month_txt, day, year),
        DateFormat::DayMonthYear => format!("{:02}-{}-{:4}", day, month_txt, year),
    }
}

/// Formats the time part as `hh:mm:ss`.
pub fn time_to_string(time: DateTime) -> String {
    let (hour, minute, second) = decode_time(time);
    format!("{:02}:{:02}:{:02}", hour, minute, second)
}

/// Month number for a three letter month name, ignoring case.
pub fn find_month(s: &str) -> Option<i32> {
    let prefix = s.trim().get(..3)?.to_ascii_uppercase();
    MONTH_TXT
        .iter()
        .position(|txt| **txt == prefix)
        .map(|idx| idx as i32 + 1)
}

/// Parses a date string with `-` or `/` separators in the field order
/// given by `format`. The month may be numeric or a three letter name.
pub fn parse_date(s: &str, format: DateFormat) -> Option<DateTime> {
    let parts = s.trim().split(|c| c == '-' || c == '/').collect::<Vec<_>>();
    if parts.len() != 3 {
        return None;
    }

    let (y, m, d) = match format {
        DateFormat::YearMonthDay => (parts[0], parts[1], parts[2]),
        DateFormat::MonthDayYear => (parts[2], parts[0], parts[1]),
        DateFormat::DayMonthYear => (parts[2], parts[1], parts[0]),
    };

    let year = y.trim().parse::<i32>().ok()?;
    let day = d.trim().parse::<i32>().ok()?;
    let month = match m.trim().parse::<i32>() {
        Ok(n) => n,
        Err(_) => find_month(m)?,
    };

    let date = encode_date(year, month, day);
    if date == -(DATE_DELTA as f64) {
        None
    } else {
        Some(date)
    }
}

/// Parses a `hh:mm:ss` time string; minutes and seconds may be omitted.
pub fn parse_time(s: &str) -> Option<DateTime> {
    let mut fields = s.trim().split(':');
    let hour = fields.next()?.trim().parse::<i32>().ok()?;
    let minute = match fields.next() {
        Some(f) => f.trim().parse::<i32>().ok()?,
        None => 0,
    };
    let second = match fields.next() {
        Some(f) => f.trim().parse::<i32>().ok()?,
        None => 0,
    };
    if hour < 0 || minute < 0 || second < 0 {
        return None;
    }
    Some(encode_time(hour, minute, second))
}

pub fn add_seconds(date: DateTime, seconds: f64) -> DateTime {
    let d = date.floor();
    let (hour, minute, second) = decode_time(date);
    d + (3600.0 * hour as f64 + 60.0 * minute as f64 + second as f64 + seconds) / SECS_PER_DAY
}

/// Adds the day count of `days` to `date`, carrying the time of day of
/// both values through hours, minutes and seconds.
pub fn add_days(date: DateTime, days: DateTime) -> DateTime {
    let d = date.floor() + days.floor();
    let (h1, m1, s1) = decode_time(date);
    let (h2, m2, s2) = decode_time(days);
    d + encode_time(h1 + h2, m1 + m2, s1 + s2)
}

/// Whole seconds between two values, positive when `date1` is later.
pub fn time_diff(date1: DateTime, date2: DateTime) -> i64 {
    ((date1 - date2) * SECS_PER_DAY + 0.5).floor() as i64
}

/// Bridges a decimal-days value into a [`chrono::NaiveDateTime`].
///
/// Returns `None` for the invalid-date sentinel and anything else chrono
/// cannot represent.
pub fn to_naive(date: DateTime) -> Option<NaiveDateTime> {
    let (year, month, day) = decode_date(date);
    let (hour, minute, second) = decode_time(date);
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)?.and_hms_opt(
        hour as u32,
        minute as u32,
        second as u32,
    )
}
