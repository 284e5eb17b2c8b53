use crate::error::{Error, Result};
use crate::header::{
    pack_field, unpack_fields, Header, CODE_PAGE_OFFSET, DESCRIPTOR_LEN, EOF_MARKER, HEADER_LEN,
    HEADER_TERMINATOR, INDEX_FLAG_OFFSET, RECORD_ACTIVE, RECORD_DELETED,
};
use crate::record::{pack_value, unpack_value};
use indexmap::IndexMap;
use semistr::SemiStr;
use std::fmt;
use std::io::Write;
use std::ops::Range;
use std::sync::Arc;
use xdbf_datatype::date::{format_field_date, parse_field_date};
use xdbf_datatype::number::{parse_f64, parse_i64};
use xdbf_datatype::{
    code_page_id, parse_logical, Date, Datetime, Encoding, EncodingRef, FieldDescriptor,
    FieldType, LastUpdate, Utf8, MAX_FIELD_NAME_LEN,
};

/// Table is the in-memory image of one table file.
///
/// The byte buffer is the single source of truth: header, field
/// descriptors and all records are kept in the exact on-disk layout,
/// and every mutation is applied to it directly.
///
/// Schema can be changed only before the first record is appended.
/// Tables parsed from existing bytes are locked from the start.
pub struct Table {
    enc: EncodingRef,
    header: Header,
    fields: IndexMap<SemiStr, FieldDescriptor>,
    // byte offset of each field inside a record, same order as fields.
    offsets: Vec<usize>,
    schema_locked: bool,
    // append 0x1A when serialized.
    eof_marker: bool,
    buf: Vec<u8>,
}

impl Table {
    /// Create an empty table.
    /// Text is stored with given encoding, or UTF-8 if not specified.
    pub fn new(enc: Option<EncodingRef>) -> Self {
        let code_page = code_page_id(enc.as_deref().map(|e| e as &dyn Encoding));
        let enc = enc.unwrap_or_else(|| Arc::new(Utf8));
        let last_update = LastUpdate::today().unwrap_or_else(|e| {
            log::warn!("current date can not be encoded in header: {}", e);
            LastUpdate::default()
        });
        let header = Header::empty(last_update);
        let mut buf = vec![0u8; header.header_len as usize];
        header.pack_into(&mut buf);
        buf[INDEX_FLAG_OFFSET] = 0x00;
        buf[CODE_PAGE_OFFSET] = code_page;
        buf[HEADER_LEN] = HEADER_TERMINATOR;
        Table {
            enc,
            header,
            fields: IndexMap::new(),
            offsets: vec![],
            schema_locked: false,
            eof_marker: true,
            buf,
        }
    }

    /// Parse table from complete file content.
    ///
    /// The content must be exactly header length plus all records,
    /// optionally followed by one EOF marker.
    pub fn from_bytes(mut data: Vec<u8>, enc: Option<EncodingRef>) -> Result<Self> {
        let enc = enc.unwrap_or_else(|| Arc::new(Utf8));
        let header = Header::unpack(&data)?;
        let slots = unpack_fields(&data, &header, &*enc)?;
        let expected = header.content_len();
        let eof_marker = match data.len() {
            n if n == expected => false,
            n if n == expected + 1 && data[expected] == EOF_MARKER => true,
            actual => return Err(Error::SizeMismatch { actual, expected }),
        };
        data.truncate(expected);
        let mut fields = IndexMap::with_capacity(slots.len());
        let mut offsets = Vec::with_capacity(slots.len());
        for slot in slots {
            let name = SemiStr::new(slot.desc.name());
            if fields.contains_key(&name) {
                return Err(Error::DuplicateField(slot.desc.name().to_string()));
            }
            fields.insert(name, slot.desc);
            offsets.push(slot.offset);
        }
        log::debug!(
            "parsed table with {} fields and {} records",
            fields.len(),
            header.record_count
        );
        Ok(Table {
            enc,
            header,
            fields,
            offsets,
            schema_locked: true,
            eof_marker,
            buf: data,
        })
    }

    /// Returns serialized bytes of the table.
    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut res = Vec::with_capacity(self.buf.len() + 1);
        res.extend_from_slice(&self.buf);
        if self.eof_marker {
            res.push(EOF_MARKER);
        }
        res
    }

    #[inline]
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.buf)?;
        if self.eof_marker {
            writer.write_all(&[EOF_MARKER])?;
        }
        Ok(())
    }

    /* schema operations */

    #[inline]
    pub fn add_text_field(&mut self, name: &str, length: u8) -> Result<()> {
        self.add_field(name, FieldType::Character, length)
    }

    #[inline]
    pub fn add_number_field(&mut self, name: &str, length: u8, decimals: u8) -> Result<()> {
        self.add_field(name, FieldType::numeric(decimals), length)
    }

    #[inline]
    pub fn add_float_field(&mut self, name: &str, length: u8, decimals: u8) -> Result<()> {
        self.add_field(name, FieldType::float(decimals), length)
    }

    #[inline]
    pub fn add_boolean_field(&mut self, name: &str) -> Result<()> {
        self.add_fixed_field(name, FieldType::Logical)
    }

    #[inline]
    pub fn add_date_field(&mut self, name: &str) -> Result<()> {
        self.add_fixed_field(name, FieldType::Date)
    }

    #[inline]
    fn add_fixed_field(&mut self, name: &str, ty: FieldType) -> Result<()> {
        let length = ty.fixed_len().unwrap_or_default();
        self.add_field(name, ty, length)
    }

    /// Add a new field at the end of field list.
    ///
    /// Name longer than 10 bytes (in table encoding) is truncated.
    /// Fails if schema is locked or name already exists.
    pub fn add_field(&mut self, name: &str, ty: FieldType, length: u8) -> Result<()> {
        if self.schema_locked {
            return Err(Error::SchemaLocked(name.to_string()));
        }
        debug_assert_eq!(0, self.header.record_count);
        if name.contains('\0') {
            return Err(Error::InvalidValue {
                field: name.to_string(),
                value: name.to_string(),
            });
        }
        let name = self.truncate_name(name)?;
        if self.fields.contains_key(name) {
            return Err(Error::DuplicateField(name.to_string()));
        }
        let desc = FieldDescriptor::new(name, ty, length)?;
        let offset = self.header.record_len as usize;
        let header_len = self.header.header_len as usize + DESCRIPTOR_LEN;
        let record_len = offset + length as usize;
        if header_len > u16::MAX as usize || record_len > u16::MAX as usize {
            return Err(Error::TooManyFields(name.to_string()));
        }
        let mut block = [0u8; DESCRIPTOR_LEN];
        pack_field(&desc, &*self.enc, &mut block)?;
        // no record exists, so descriptors are followed only by the terminator.
        self.buf.truncate(self.header.header_len as usize - 1);
        self.buf.extend_from_slice(&block);
        self.buf.push(HEADER_TERMINATOR);
        self.header.header_len = header_len as u16;
        self.header.record_len = record_len as u16;
        self.header.pack_into(&mut self.buf);
        self.fields.insert(SemiStr::new(name), desc);
        self.offsets.push(offset);
        debug_assert!(self.lengths_consistent());
        Ok(())
    }

    /// Truncate name to the longest prefix whose encoded bytes fit
    /// in descriptor, without splitting a character.
    fn truncate_name<'a>(&self, name: &'a str) -> Result<&'a str> {
        if self.enc.encode(name)?.len() <= MAX_FIELD_NAME_LEN {
            return Ok(name);
        }
        let mut end = 0;
        for (idx, c) in name.char_indices() {
            let next = idx + c.len_utf8();
            if self.enc.encode(&name[..next])?.len() > MAX_FIELD_NAME_LEN {
                break;
            }
            end = next;
        }
        Ok(&name[..end])
    }

    #[inline]
    fn lengths_consistent(&self) -> bool {
        let header_len = HEADER_LEN + DESCRIPTOR_LEN * self.fields.len() + 1;
        let record_len = 1 + self
            .fields
            .values()
            .map(|f| f.length() as usize)
            .sum::<usize>();
        header_len == self.header.header_len as usize
            && record_len == self.header.record_len as usize
            && self.buf.len() == self.header.content_len()
    }

    /* introspection */

    #[inline]
    pub fn fields(&self) -> impl ExactSizeIterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    #[inline]
    pub fn field(&self, idx: usize) -> Option<&FieldDescriptor> {
        self.fields.get_index(idx).map(|(_, f)| f)
    }

    #[inline]
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    #[inline]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.values().map(|f| f.name()).collect()
    }

    #[inline]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn record_count(&self) -> usize {
        self.header.record_count as usize
    }

    #[inline]
    pub fn header_len(&self) -> usize {
        self.header.header_len as usize
    }

    #[inline]
    pub fn record_len(&self) -> usize {
        self.header.record_len as usize
    }

    #[inline]
    pub fn signature(&self) -> u8 {
        self.header.signature
    }

    /// Returns language driver byte in header.
    #[inline]
    pub fn code_page(&self) -> u8 {
        self.buf[CODE_PAGE_OFFSET]
    }

    #[inline]
    pub fn encoding(&self) -> &dyn Encoding {
        &*self.enc
    }

    #[inline]
    pub fn is_schema_locked(&self) -> bool {
        self.schema_locked
    }

    /// Returns decimal places of a numeric or float field.
    #[inline]
    pub fn decimal_places(&self, name: &str) -> Result<u8> {
        let field = self
            .fields
            .get(name)
            .ok_or_else(|| Error::FieldNotFound(name.to_string()))?;
        field
            .decimal_places()
            .ok_or_else(|| Error::NotNumericField(name.to_string()))
    }

    /* last update */

    /// Returns date of last update, at midnight local time.
    #[inline]
    pub fn last_updated(&self) -> Result<Datetime> {
        Ok(self.header.last_update.to_datetime()?)
    }

    #[inline]
    pub fn refresh_last_updated(&mut self) -> Result<()> {
        self.update_last_update(LastUpdate::today()?);
        Ok(())
    }

    /// Set date of last update. Time of day is discarded.
    #[inline]
    pub fn set_last_updated(&mut self, dt: Datetime) -> Result<()> {
        self.update_last_update(LastUpdate::from_date(dt.date())?);
        Ok(())
    }

    #[inline]
    fn update_last_update(&mut self, lu: LastUpdate) {
        self.header.last_update = lu;
        self.header.pack_into(&mut self.buf);
    }

    /* record operations */

    /// Append a blank record at the end and return its index.
    /// The schema is locked afterwards.
    pub fn append_record(&mut self) -> Result<usize> {
        if self.fields.is_empty() {
            return Err(Error::NoFieldsDefined);
        }
        let idx = self.header.record_count;
        let record_count = idx
            .checked_add(1)
            .ok_or_else(|| Error::InvalidFormat("record count overflow".to_string()))?;
        if !self.schema_locked {
            log::debug!("lock schema with {} fields", self.fields.len());
            self.schema_locked = true;
        }
        let new_len = self.buf.len() + self.header.record_len as usize;
        self.buf.resize(new_len, RECORD_ACTIVE);
        self.header.record_count = record_count;
        self.header.pack_into(&mut self.buf);
        Ok(idx as usize)
    }

    #[inline]
    pub fn field_value(&self, row: usize, name: &str) -> Result<String> {
        let idx = self.field_index(name)?;
        self.field_value_at(row, idx)
    }

    #[inline]
    pub fn field_value_at(&self, row: usize, idx: usize) -> Result<String> {
        let range = self.field_range(row, idx)?;
        unpack_value(&self.fields[idx], &self.buf[range], &*self.enc)
    }

    #[inline]
    pub fn set_field_value(&mut self, row: usize, name: &str, value: &str) -> Result<()> {
        let idx = self.field_index(name)?;
        self.set_field_value_at(row, idx, value)
    }

    #[inline]
    pub fn set_field_value_at(&mut self, row: usize, idx: usize, value: &str) -> Result<()> {
        let range = self.field_range(row, idx)?;
        pack_value(&self.fields[idx], value, &*self.enc, &mut self.buf[range])
    }

    /// Returns all field values of a record in declaration order.
    #[inline]
    pub fn row(&self, row: usize) -> Result<Vec<String>> {
        (0..self.fields.len())
            .map(|idx| self.field_value_at(row, idx))
            .collect()
    }

    pub fn i64_field_value(&self, row: usize, name: &str) -> Result<i64> {
        let text = self.numeric_text(row, name)?;
        parse_i64(&text).map_err(|e| Error::Conversion {
            field: name.to_string(),
            source: e,
        })
    }

    pub fn f64_field_value(&self, row: usize, name: &str) -> Result<f64> {
        let text = self.numeric_text(row, name)?;
        parse_f64(&text).map_err(|e| Error::Conversion {
            field: name.to_string(),
            source: e,
        })
    }

    /// Returns None if the logical value is not set.
    pub fn bool_field_value(&self, row: usize, name: &str) -> Result<Option<bool>> {
        let text = self.typed_text(row, name, FieldType::Logical)?;
        parse_logical(&text).map_err(|e| Error::Conversion {
            field: name.to_string(),
            source: e,
        })
    }

    /// Returns None if the date is blank.
    pub fn date_field_value(&self, row: usize, name: &str) -> Result<Option<Date>> {
        let text = self.typed_text(row, name, FieldType::Date)?;
        if text.is_empty() {
            return Ok(None);
        }
        parse_field_date(&text)
            .map(Some)
            .map_err(|e| Error::Conversion {
                field: name.to_string(),
                source: e,
            })
    }

    #[inline]
    pub fn set_i64_field_value(&mut self, row: usize, name: &str, value: i64) -> Result<()> {
        self.check_numeric(name)?;
        self.set_field_value(row, name, &value.to_string())
    }

    #[inline]
    pub fn set_f64_field_value(&mut self, row: usize, name: &str, value: f64) -> Result<()> {
        self.check_numeric(name)?;
        self.set_field_value(row, name, &value.to_string())
    }

    #[inline]
    pub fn set_bool_field_value(&mut self, row: usize, name: &str, value: bool) -> Result<()> {
        self.check_type(name, FieldType::Logical)?;
        self.set_field_value(row, name, if value { "T" } else { "F" })
    }

    #[inline]
    pub fn set_date_field_value(&mut self, row: usize, name: &str, value: Date) -> Result<()> {
        self.check_type(name, FieldType::Date)?;
        let text = format_field_date(value)?;
        self.set_field_value(row, name, &text)
    }

    /// Returns whether the record is marked as deleted.
    #[inline]
    pub fn is_deleted(&self, row: usize) -> Result<bool> {
        let range = self.record_range(row)?;
        Ok(self.buf[range.start] == RECORD_DELETED)
    }

    /// Mark or unmark the record as deleted.
    /// The record stays in place.
    #[inline]
    pub fn set_deleted(&mut self, row: usize, deleted: bool) -> Result<()> {
        let range = self.record_range(row)?;
        self.buf[range.start] = if deleted {
            RECORD_DELETED
        } else {
            RECORD_ACTIVE
        };
        Ok(())
    }

    #[inline]
    fn field_index(&self, name: &str) -> Result<usize> {
        self.fields
            .get_index_of(name)
            .ok_or_else(|| Error::FieldNotFound(name.to_string()))
    }

    #[inline]
    fn record_range(&self, row: usize) -> Result<Range<usize>> {
        let count = self.record_count();
        if row >= count {
            return Err(Error::RecordOutOfBound { index: row, count });
        }
        let record_len = self.header.record_len as usize;
        let start = self.header.header_len as usize + row * record_len;
        Ok(start..start + record_len)
    }

    #[inline]
    fn field_range(&self, row: usize, idx: usize) -> Result<Range<usize>> {
        let field = self.field(idx).ok_or(Error::FieldIndexOutOfBound(idx))?;
        let record = self.record_range(row)?;
        let start = record.start + self.offsets[idx];
        Ok(start..start + field.length() as usize)
    }

    #[inline]
    fn check_numeric(&self, name: &str) -> Result<()> {
        let idx = self.field_index(name)?;
        if !self.fields[idx].field_type().is_numeric() {
            return Err(Error::NotNumericField(name.to_string()));
        }
        Ok(())
    }

    /// Logical and date types do not carry payload, so plain
    /// equality is enough.
    #[inline]
    fn check_type(&self, name: &str, ty: FieldType) -> Result<()> {
        let idx = self.field_index(name)?;
        let actual = self.fields[idx].field_type();
        if actual != ty {
            return Err(Error::TypeMismatch {
                field: name.to_string(),
                expected: ty,
                actual,
            });
        }
        Ok(())
    }

    #[inline]
    fn numeric_text(&self, row: usize, name: &str) -> Result<String> {
        self.check_numeric(name)?;
        self.field_value(row, name)
    }

    #[inline]
    fn typed_text(&self, row: usize, name: &str, ty: FieldType) -> Result<String> {
        self.check_type(name, ty)?;
        self.field_value(row, name)
    }
}

impl Default for Table {
    #[inline]
    fn default() -> Self {
        Table::new(None)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("encoding", &self.enc.name())
            .field("header", &self.header)
            .field("fields", &self.fields.values().collect::<Vec<_>>())
            .field("schema_locked", &self.schema_locked)
            .field("eof_marker", &self.eof_marker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Result<Table> {
        let mut table = Table::new(None);
        table.add_boolean_field("TESTBOOL")?;
        table.add_text_field("TESTTEXT", 10)?;
        table.add_date_field("TESTDATE")?;
        table.add_number_field("TESTNUM", 10, 0)?;
        table.add_float_field("TESTFLOAT", 10, 2)?;
        for (i, (b, text, date, num, flt)) in [
            ("T", "test0", "20180101", "42", "42.01"),
            ("F", "test1", "20180102", "43", "43.02"),
            ("T", "test2", "20180103", "44", "44.03"),
        ]
        .into_iter()
        .enumerate()
        {
            assert_eq!(i, table.append_record()?);
            table.set_field_value(i, "TESTBOOL", b)?;
            table.set_field_value(i, "TESTTEXT", text)?;
            table.set_field_value(i, "TESTDATE", date)?;
            table.set_field_value(i, "TESTNUM", num)?;
            table.set_field_value(i, "TESTFLOAT", flt)?;
        }
        Ok(table)
    }

    #[test]
    fn test_new_table() -> Result<()> {
        let table = Table::new(None);
        assert_eq!(0x03, table.signature());
        assert_eq!(xdbf_datatype::ANSI_CODE_PAGE, table.code_page());
        assert_eq!(33, table.header_len());
        assert_eq!(1, table.record_len());
        assert_eq!(0, table.field_count());
        assert_eq!(0, table.record_count());
        assert!(!table.is_schema_locked());
        let bs = table.to_bytes();
        assert_eq!(34, bs.len());
        assert_eq!(HEADER_TERMINATOR, bs[32]);
        assert_eq!(EOF_MARKER, bs[33]);
        Ok(())
    }

    #[test]
    fn test_lengths() -> Result<()> {
        let table = sample_table()?;
        assert_eq!(33 + 32 * 5, table.header_len());
        assert_eq!(1 + 1 + 10 + 8 + 10 + 10, table.record_len());
        assert_eq!(
            table.header_len() + 3 * table.record_len() + 1,
            table.to_bytes().len()
        );
        Ok(())
    }

    #[test]
    fn test_rows() -> Result<()> {
        let table = sample_table()?;
        assert_eq!(
            vec!["T", "test0", "20180101", "42", "42.01"],
            table.row(0)?
        );
        assert_eq!(
            vec!["F", "test1", "20180102", "43", "43.02"],
            table.row(1)?
        );
        assert_eq!(
            vec!["T", "test2", "20180103", "44", "44.03"],
            table.row(2)?
        );
        assert!(matches!(
            table.row(3),
            Err(Error::RecordOutOfBound { index: 3, count: 3 })
        ));
        Ok(())
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let table = sample_table()?;
        let bs = table.to_bytes();
        let parsed = Table::from_bytes(bs.clone(), None)?;
        assert!(parsed.is_schema_locked());
        assert_eq!(bs, parsed.to_bytes());
        assert_eq!(table.field_names(), parsed.field_names());
        for i in 0..3 {
            assert_eq!(table.row(i)?, parsed.row(i)?);
        }
        let mut out = vec![];
        parsed.write_to(&mut out)?;
        assert_eq!(bs, out);
        Ok(())
    }

    #[test]
    fn test_schema_lock() -> Result<()> {
        let mut table = Table::new(None);
        assert!(matches!(table.append_record(), Err(Error::NoFieldsDefined)));
        table.add_text_field("NAME", 4)?;
        assert!(matches!(
            table.add_text_field("NAME", 8),
            Err(Error::DuplicateField(_))
        ));
        table.append_record()?;
        assert!(table.is_schema_locked());
        assert!(matches!(
            table.add_boolean_field("FLAG"),
            Err(Error::SchemaLocked(_))
        ));
        assert_eq!(1, table.field_count());
        Ok(())
    }

    #[test]
    fn test_truncate_field_name() -> Result<()> {
        let mut table = Table::new(None);
        table.add_text_field("FieldName!shouldBeTruncated", 10)?;
        assert_eq!(vec!["FieldName!"], table.field_names());
        // two-byte chars are never split.
        table.add_text_field("ééééééé", 10)?;
        assert_eq!("ééééé", table.field(1).map(|f| f.name()).unwrap());
        let parsed = Table::from_bytes(table.to_bytes(), None)?;
        assert_eq!(table.field_names(), parsed.field_names());
        Ok(())
    }

    #[test]
    fn test_invalid_field() {
        let mut table = Table::new(None);
        assert!(table.add_number_field("NUM", 3, 2).is_err());
        assert!(table.add_field("FLAG", FieldType::Logical, 2).is_err());
        assert!(table.add_text_field("A\0B", 2).is_err());
        assert_eq!(0, table.field_count());
        assert_eq!(33, table.header_len());
    }

    #[test]
    fn test_decimal_places() -> Result<()> {
        let table = sample_table()?;
        assert_eq!(2, table.decimal_places("TESTFLOAT")?);
        assert_eq!(0, table.decimal_places("TESTNUM")?);
        assert!(matches!(
            table.decimal_places("TESTTEXT"),
            Err(Error::NotNumericField(_))
        ));
        assert!(matches!(
            table.decimal_places("MISSING"),
            Err(Error::FieldNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_typed_values() -> Result<()> {
        let mut table = Table::new(None);
        table.add_number_field("INT", 6, 2)?;
        table.add_float_field("FLT", 8, 3)?;
        table.add_boolean_field("FLAG")?;
        table.add_date_field("DAY")?;
        table.add_text_field("TEXT", 4)?;
        table.append_record()?;
        table.set_field_value(0, "INT", "640")?;
        assert_eq!("640.00", table.field_value(0, "INT")?);
        assert_eq!(640, table.i64_field_value(0, "INT")?);
        table.set_i64_field_value(0, "INT", -12)?;
        assert_eq!(-12, table.i64_field_value(0, "INT")?);
        table.set_f64_field_value(0, "FLT", 3.25)?;
        assert_eq!("3.250", table.field_value(0, "FLT")?);
        assert_eq!(3.25, table.f64_field_value(0, "FLT")?);
        table.set_field_value(0, "INT", "1.5")?;
        assert!(matches!(
            table.i64_field_value(0, "INT"),
            Err(Error::Conversion { .. })
        ));
        assert!(matches!(
            table.i64_field_value(0, "TEXT"),
            Err(Error::NotNumericField(_))
        ));

        assert_eq!(None, table.bool_field_value(0, "FLAG")?);
        table.set_bool_field_value(0, "FLAG", true)?;
        assert_eq!(Some(true), table.bool_field_value(0, "FLAG")?);
        assert!(matches!(
            table.set_bool_field_value(0, "DAY", true),
            Err(Error::TypeMismatch { .. })
        ));

        assert_eq!(None, table.date_field_value(0, "DAY")?);
        let date = LastUpdate::from_bytes([120, 2, 29]).to_date()?;
        table.set_date_field_value(0, "DAY", date)?;
        assert_eq!("20200229", table.field_value(0, "DAY")?);
        assert_eq!(Some(date), table.date_field_value(0, "DAY")?);
        Ok(())
    }

    #[test]
    fn test_number_rounding() -> Result<()> {
        let mut table = Table::new(None);
        table.add_number_field("AMOUNT", 10, 2)?;
        table.add_number_field("COUNT", 10, 0)?;
        table.add_float_field("RATIO", 6, 3)?;
        table.append_record()?;
        for (input, stored) in [
            ("42.019", "42.02"),
            ("42.015", "42.02"),
            ("42.014", "42.01"),
            ("-0.001", "0.00"),
        ] {
            table.set_field_value(0, "AMOUNT", input)?;
            assert_eq!(stored, table.field_value(0, "AMOUNT")?);
        }
        table.set_field_value(0, "COUNT", "42.6")?;
        assert_eq!("43", table.field_value(0, "COUNT")?);
        assert_eq!(43, table.i64_field_value(0, "COUNT")?);
        table.set_f64_field_value(0, "RATIO", 0.12345)?;
        assert_eq!("0.123", table.field_value(0, "RATIO")?);
        // rounding carry still has to fit the width.
        assert!(matches!(
            table.set_field_value(0, "RATIO", "99.9999"),
            Err(Error::ValueTooWide { .. })
        ));
        assert_eq!("0.123", table.field_value(0, "RATIO")?);
        Ok(())
    }

    #[test]
    fn test_field_value_errors() -> Result<()> {
        let mut table = sample_table()?;
        assert!(matches!(
            table.set_field_value(0, "MISSING", "x"),
            Err(Error::FieldNotFound(_))
        ));
        assert!(matches!(
            table.set_field_value(3, "TESTTEXT", "x"),
            Err(Error::RecordOutOfBound { .. })
        ));
        assert!(matches!(
            table.field_value_at(0, 5),
            Err(Error::FieldIndexOutOfBound(5))
        ));
        assert!(matches!(
            table.set_field_value(0, "TESTTEXT", "longer than ten"),
            Err(Error::ValueTooWide { .. })
        ));
        assert_eq!("test0", table.field_value(0, "TESTTEXT")?);
        table.set_field_value_at(0, 1, "")?;
        assert_eq!("", table.field_value_at(0, 1)?);
        Ok(())
    }

    #[test]
    fn test_deleted_flag() -> Result<()> {
        let mut table = sample_table()?;
        assert!(!table.is_deleted(1)?);
        table.set_deleted(1, true)?;
        assert!(table.is_deleted(1)?);
        let parsed = Table::from_bytes(table.to_bytes(), None)?;
        assert!(parsed.is_deleted(1)?);
        assert!(!parsed.is_deleted(0)?);
        // field values stay readable.
        assert_eq!("test1", parsed.field_value(1, "TESTTEXT")?);
        table.set_deleted(1, false)?;
        assert!(!table.is_deleted(1)?);
        assert!(table.set_deleted(3, true).is_err());
        Ok(())
    }

    #[test]
    fn test_last_updated() -> Result<()> {
        let mut table = sample_table()?;
        let today = xdbf_datatype::date::today().midnight();
        table.refresh_last_updated()?;
        assert_eq!(today, table.last_updated()?);
        let mut parsed = Table::from_bytes(table.to_bytes(), None)?;
        parsed.refresh_last_updated()?;
        assert_eq!(today, parsed.last_updated()?);

        let dt = LastUpdate::from_bytes([99, 7, 15]).to_datetime()?;
        table.set_last_updated(dt)?;
        assert_eq!(dt, table.last_updated()?);
        assert_eq!(&[99, 7, 15][..], &table.to_bytes()[1..4]);
        let too_early = LastUpdate::from_bytes([0, 1, 1]).to_date()?.previous_day();
        if let Some(d) = too_early {
            assert!(table.set_last_updated(d.midnight()).is_err());
        }
        Ok(())
    }

    #[test]
    fn test_from_bytes_size_mismatch() -> Result<()> {
        let mut bs = sample_table()?.to_bytes();
        bs.push(0x00);
        assert!(matches!(
            Table::from_bytes(bs.clone(), None),
            Err(Error::SizeMismatch { .. })
        ));
        bs.truncate(bs.len() - 3);
        assert!(matches!(
            Table::from_bytes(bs, None),
            Err(Error::SizeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_from_bytes_without_eof() -> Result<()> {
        let mut bs = sample_table()?.to_bytes();
        bs.pop();
        let table = Table::from_bytes(bs.clone(), None)?;
        assert_eq!(bs, table.to_bytes());
        assert_eq!(3, table.record_count());
        Ok(())
    }
}
