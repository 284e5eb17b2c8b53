//! Text form of numeric and float fields.
//!
//! Both types store right-justified ASCII digits with optional sign
//! and decimal point. Values are normalized through fixed decimal so
//! the stored text always has exactly the declared decimal places.
use crate::error::{Error, Result};
use crate::Decimal;

/// Format numeric text with given decimal places.
///
/// Extra fractional digits are rounded half up, and a value rounded
/// to zero loses its sign.
/// Precision is bounded by fixed decimal, i.e. 65 digits in total
/// and 30 fractional digits, so longer text is rejected even if the
/// field is wide enough.
#[inline]
pub fn format_number(text: &str, decimals: u8) -> Result<String> {
    let text = text.trim();
    let mut dec: Decimal = text
        .parse()
        .map_err(|_| Error::InvalidNumber(text.to_string()))?;
    if (decimals as isize) < dec.frac() as isize {
        dec.round(decimals as isize);
    }
    if dec.is_zero() {
        dec.set_pos();
    }
    Ok(dec.to_string(decimals as isize))
}

/// Parse integral value.
/// Text with decimal point is accepted only if all fractional digits are zero.
#[inline]
pub fn parse_i64(text: &str) -> Result<i64> {
    let text = text.trim();
    if let Ok(v) = text.parse::<i64>() {
        return Ok(v);
    }
    let invalid = || Error::InvalidNumber(text.to_string());
    let (intg, frac) = text.split_once('.').ok_or_else(invalid)?;
    if !frac.bytes().all(|b| b == b'0') {
        return Err(invalid());
    }
    match intg {
        "" | "-" | "+" if !frac.is_empty() => Ok(0),
        _ => intg.parse::<i64>().map_err(|_| invalid()),
    }
}

#[inline]
pub fn parse_f64(text: &str) -> Result<f64> {
    let text = text.trim();
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Error::InvalidNumber(text.to_string())),
    }
}
