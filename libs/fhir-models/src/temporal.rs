//! Partial date and time values
//!
//! The standard allows reduced-precision dates (`2024`, `2024-03`), times
//! with optional seconds and fractions, and date-times with an optional
//! offset. Values keep exactly the precision they were written with so that
//! re-rendering reproduces the input text.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use std::fmt;
use std::str::FromStr;

/// Why a temporal literal was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TemporalError(pub(crate) &'static str);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

/// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartialDate {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl PartialDate {
    pub fn year(year: i32) -> Self {
        Self {
            year,
            month: None,
            day: None,
        }
    }

    pub fn year_month(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
            day: None,
        }
    }

    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month: Some(month),
            day: Some(day),
        }
    }

    pub fn precision(&self) -> DatePrecision {
        match (self.month, self.day) {
            (Some(_), Some(_)) => DatePrecision::Day,
            (Some(_), None) => DatePrecision::Month,
            _ => DatePrecision::Year,
        }
    }

    /// First calendar day covered by this value
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month.unwrap_or(1), self.day.unwrap_or(1))
    }

    fn is_valid(&self) -> bool {
        (0..=9999).contains(&self.year)
            && !(self.month.is_none() && self.day.is_some())
            && self.to_naive_date().is_some()
    }
}

impl FromStr for PartialDate {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        let date = match parts.as_slice() {
            [y] => Self::year(parse_digits(y, 4)? as i32),
            [y, m] => Self::year_month(parse_digits(y, 4)? as i32, parse_digits(m, 2)?),
            [y, m, d] => Self::ymd(
                parse_digits(y, 4)? as i32,
                parse_digits(m, 2)?,
                parse_digits(d, 2)?,
            ),
            _ => return Err(TemporalError("expected YYYY, YYYY-MM or YYYY-MM-DD")),
        };

        if !date.is_valid() {
            return Err(TemporalError("date is out of range"));
        }
        Ok(date)
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.year)?;
        if let Some(month) = self.month {
            write!(f, "-{:02}", month)?;
            if let Some(day) = self.day {
                write!(f, "-{:02}", day)?;
            }
        }
        Ok(())
    }
}

/// `hh:mm`, `hh:mm:ss` or `hh:mm:ss.fff`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartialTime {
    pub hour: u32,
    pub minute: u32,
    pub second: Option<u32>,
    /// Fraction digits as written (without the dot)
    pub fraction: Option<String>,
}

impl PartialTime {
    pub fn hms(hour: u32, minute: u32, second: u32) -> Self {
        Self {
            hour,
            minute,
            second: Some(second),
            fraction: None,
        }
    }

    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        let nanos = match &self.fraction {
            Some(digits) => {
                let padded: String = digits.chars().chain("000000000".chars()).take(9).collect();
                padded.parse().ok()?
            }
            None => 0,
        };
        NaiveTime::from_hms_nano_opt(self.hour, self.minute, self.second.unwrap_or(0), nanos)
    }
}

impl FromStr for PartialTime {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (main, fraction) = match s.split_once('.') {
            Some((main, frac)) => {
                if frac.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(TemporalError("fraction must be digits"));
                }
                (main, Some(frac.to_string()))
            }
            None => (s, None),
        };

        let parts: Vec<&str> = main.split(':').collect();
        let time = match parts.as_slice() {
            [hh, mm] if fraction.is_none() => Self {
                hour: parse_digits(hh, 2)?,
                minute: parse_digits(mm, 2)?,
                second: None,
                fraction: None,
            },
            [hh, mm, ss] => Self {
                hour: parse_digits(hh, 2)?,
                minute: parse_digits(mm, 2)?,
                second: Some(parse_digits(ss, 2)?),
                fraction,
            },
            _ => return Err(TemporalError("expected hh:mm[:ss[.fff]]")),
        };

        if time.to_naive_time().is_none() {
            return Err(TemporalError("time is out of range"));
        }
        Ok(time)
    }
}

impl fmt::Display for PartialTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)?;
        if let Some(second) = self.second {
            write!(f, ":{:02}", second)?;
            if let Some(fraction) = &self.fraction {
                write!(f, ".{}", fraction)?;
            }
        }
        Ok(())
    }
}

/// Time-zone designator; `Z` and `+00:00` are kept apart so text round-trips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TzOffset {
    Utc,
    /// Offset in minutes east of UTC
    Fixed(i32),
}

impl TzOffset {
    pub fn seconds(&self) -> i32 {
        match self {
            Self::Utc => 0,
            Self::Fixed(minutes) => minutes * 60,
        }
    }

    fn parse(tz: &str) -> Result<Self, TemporalError> {
        if tz == "Z" {
            return Ok(Self::Utc);
        }
        let sign = match tz.as_bytes().first() {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return Err(TemporalError("expected Z or +hh:mm")),
        };
        let (hh, mm) = tz[1..]
            .split_once(':')
            .ok_or(TemporalError("expected Z or +hh:mm"))?;
        let hours: i32 = parse_digits(hh, 2)? as i32;
        let minutes: i32 = parse_digits(mm, 2)? as i32;
        if hours > 14 || minutes > 59 {
            return Err(TemporalError("offset is out of range"));
        }
        Ok(Self::Fixed(sign * (hours * 60 + minutes)))
    }
}

impl fmt::Display for TzOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utc => f.write_str("Z"),
            Self::Fixed(minutes) => {
                let sign = if *minutes < 0 { '-' } else { '+' };
                let abs = minutes.abs();
                write!(f, "{}{:02}:{:02}", sign, abs / 60, abs % 60)
            }
        }
    }
}

/// A date, optionally followed by a time of day and offset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartialDateTime {
    pub date: PartialDate,
    pub time: Option<PartialTime>,
    pub offset: Option<TzOffset>,
}

impl PartialDateTime {
    pub fn from_date(date: PartialDate) -> Self {
        Self {
            date,
            time: None,
            offset: None,
        }
    }

    /// Full precision down to seconds with an offset, as `instant` requires
    pub fn is_instant(&self) -> bool {
        self.date.precision() == DatePrecision::Day
            && self.time.as_ref().is_some_and(|t| t.second.is_some())
            && self.offset.is_some()
    }

    /// Convert to a chrono timestamp when a time and offset are present
    pub fn to_chrono(&self) -> Option<DateTime<FixedOffset>> {
        let date = self.date.to_naive_date()?;
        let time = self.time.as_ref()?.to_naive_time()?;
        let offset = FixedOffset::east_opt(self.offset?.seconds())?;
        offset
            .from_local_datetime(&NaiveDateTime::new(date, time))
            .single()
    }
}

impl FromStr for PartialDateTime {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((date_part, rest)) = s.split_once('T') else {
            return Ok(Self::from_date(s.parse()?));
        };

        let date: PartialDate = date_part.parse()?;
        if date.precision() != DatePrecision::Day {
            return Err(TemporalError("a time requires a full date"));
        }

        let (time_part, offset) = split_offset(rest)?;
        Ok(Self {
            date,
            time: Some(time_part.parse()?),
            offset,
        })
    }
}

impl fmt::Display for PartialDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date)?;
        if let Some(time) = &self.time {
            write!(f, "T{}", time)?;
            if let Some(offset) = &self.offset {
                write!(f, "{}", offset)?;
            }
        }
        Ok(())
    }
}

fn split_offset(rest: &str) -> Result<(&str, Option<TzOffset>), TemporalError> {
    if let Some(time) = rest.strip_suffix('Z') {
        return Ok((time, Some(TzOffset::Utc)));
    }
    match rest.rfind(['+', '-']) {
        Some(pos) => {
            let (time, tz) = rest.split_at(pos);
            Ok((time, Some(TzOffset::parse(tz)?)))
        }
        None => Ok((rest, None)),
    }
}

fn parse_digits(s: &str, width: usize) -> Result<u32, TemporalError> {
    if s.len() != width || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(TemporalError("unexpected digit count"));
    }
    s.parse().map_err(|_| TemporalError("not a number"))
}
