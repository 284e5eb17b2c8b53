//! Packing of field values inside a record.
//!
//! All values are stored as fixed-width text. Character, logical and
//! date values are left-justified, numeric values are right-justified,
//! and unused bytes are filled with spaces.
use crate::error::{Error, Result};
use xdbf_datatype::date::{format_field_date, parse_field_date};
use xdbf_datatype::number::format_number;
use xdbf_datatype::{parse_logical, Encoding, FieldDescriptor, FieldType, Utf8};

pub const PADDING: u8 = b' ';

/// Write text of a field into its slot.
/// The slot is left untouched if the value is rejected.
pub fn pack_value(
    field: &FieldDescriptor,
    text: &str,
    enc: &dyn Encoding,
    slot: &mut [u8],
) -> Result<()> {
    debug_assert_eq!(field.length() as usize, slot.len());
    match field.field_type() {
        FieldType::Character => {
            let bs = enc.encode(text)?;
            check_width(field, bs.len(), slot.len())?;
            write_left(slot, &bs);
        }
        FieldType::Numeric { decimals } | FieldType::Float { decimals } => {
            if text.trim().is_empty() {
                slot.fill(PADDING);
                return Ok(());
            }
            let s = format_number(text, decimals).map_err(|_| invalid_value(field, text))?;
            check_width(field, s.len(), slot.len())?;
            write_right(slot, s.as_bytes());
        }
        FieldType::Logical => {
            let b = match parse_logical(text).map_err(|_| invalid_value(field, text))? {
                Some(true) => b'T',
                Some(false) => b'F',
                None if text.trim() == "?" => b'?',
                None => PADDING,
            };
            check_width(field, 1, slot.len())?;
            write_left(slot, &[b]);
        }
        FieldType::Date => {
            let text = text.trim();
            if text.is_empty() {
                slot.fill(PADDING);
                return Ok(());
            }
            let date = parse_field_date(text).map_err(|_| invalid_value(field, text))?;
            let s = format_field_date(date)?;
            check_width(field, s.len(), slot.len())?;
            write_left(slot, s.as_bytes());
        }
    }
    Ok(())
}

/// Read text of a field from its slot, with padding trimmed.
/// Only character values go through the table encoding,
/// other types are plain ASCII.
pub fn unpack_value(field: &FieldDescriptor, slot: &[u8], enc: &dyn Encoding) -> Result<String> {
    let text = match field.field_type() {
        FieldType::Character => enc.decode(slot)?,
        _ => Utf8.decode(slot)?,
    };
    Ok(text.trim_matches(|c| c == ' ' || c == '\0').to_string())
}

#[inline]
fn check_width(field: &FieldDescriptor, len: usize, width: usize) -> Result<()> {
    if len > width {
        return Err(Error::ValueTooWide {
            field: field.name().to_string(),
            width,
            len,
        });
    }
    Ok(())
}

#[inline]
fn invalid_value(field: &FieldDescriptor, text: &str) -> Error {
    Error::InvalidValue {
        field: field.name().to_string(),
        value: text.to_string(),
    }
}

#[inline]
fn write_left(slot: &mut [u8], bs: &[u8]) {
    slot[..bs.len()].copy_from_slice(bs);
    slot[bs.len()..].fill(PADDING);
}

#[inline]
fn write_right(slot: &mut [u8], bs: &[u8]) {
    let pad = slot.len() - bs.len();
    slot[..pad].fill(PADDING);
    slot[pad..].copy_from_slice(bs);
}
