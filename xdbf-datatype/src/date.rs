use crate::error::{Error, Result};
use crate::{Date, Datetime, FIELD_DATE_FORMAT};
use time::{Month, OffsetDateTime};

/// Years in header are stored as offset to 1900.
pub const YEAR_OFFSET: i32 = 1900;
pub const MAX_YEAR: i32 = YEAR_OFFSET + u8::MAX as i32;

/// LastUpdate is the 3-byte date of last update in table header.
///
/// | byte | value         |
/// |------|---------------|
/// | 0    | year - 1900   |
/// | 1    | month, 1 - 12 |
/// | 2    | day, 1 - 31   |
///
/// The finest granularity is one day and no timezone is stored.
/// All conversions treat the date as local date, and the time of day
/// is always midnight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LastUpdate {
    year: u8,
    month: u8,
    day: u8,
}

impl LastUpdate {
    #[inline]
    pub fn from_date(date: Date) -> Result<Self> {
        let year = date.year();
        if !(YEAR_OFFSET..=MAX_YEAR).contains(&year) {
            return Err(Error::DateOutOfRange(year));
        }
        Ok(LastUpdate {
            year: (year - YEAR_OFFSET) as u8,
            month: date.month() as u8,
            day: date.day(),
        })
    }

    /// Copy raw bytes without validation.
    /// Existing files may carry dates that do not exist in calendar,
    /// which is only reported on [`LastUpdate::to_date`].
    #[inline]
    pub fn from_bytes(bs: [u8; 3]) -> Self {
        LastUpdate {
            year: bs[0],
            month: bs[1],
            day: bs[2],
        }
    }

    #[inline]
    pub fn to_bytes(&self) -> [u8; 3] {
        [self.year, self.month, self.day]
    }

    #[inline]
    pub fn to_date(&self) -> Result<Date> {
        let month = Month::try_from(self.month)?;
        let date = Date::from_calendar_date(self.year as i32 + YEAR_OFFSET, month, self.day)?;
        Ok(date)
    }

    /// Returns midnight of the encoded date.
    #[inline]
    pub fn to_datetime(&self) -> Result<Datetime> {
        self.to_date().map(|d| d.midnight())
    }

    /// Encode current local date.
    #[inline]
    pub fn today() -> Result<Self> {
        Self::from_date(today())
    }

    /// Lower precision of given datetime to the granularity of this format.
    #[inline]
    pub fn lower_precision(dt: Datetime) -> Datetime {
        dt.date().midnight()
    }
}

/// Returns current local date.
///
/// Local offset may be indeterminate, e.g. in multi-threaded process
/// on some platforms, then UTC is used instead.
#[inline]
pub fn today() -> Date {
    match OffsetDateTime::now_local() {
        Ok(now) => now.date(),
        Err(e) => {
            log::debug!("local offset unavailable, fall back to UTC: {}", e);
            OffsetDateTime::now_utc().date()
        }
    }
}

/// Format date as 8-byte YYYYMMDD, used by date fields.
#[inline]
pub fn format_field_date(date: Date) -> Result<String> {
    date.format(&FIELD_DATE_FORMAT)
        .map_err(|_| Error::InvalidDate(date.to_string()))
}

/// Parse 8-byte YYYYMMDD of date fields.
#[inline]
pub fn parse_field_date(s: &str) -> Result<Date> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidDate(s.to_string()));
    }
    Date::parse(s, &FIELD_DATE_FORMAT).map_err(|_| Error::InvalidDate(s.to_string()))
}
