//! Header codec of table file.
//!
//! Header:
//!
//! | offset | length(B) | field                              |
//! |--------|-----------|------------------------------------|
//! | 0      | 1         | signature, 0x03 without memo       |
//! | 1      | 3         | date of last update                |
//! | 4      | 4         | record count, little endian        |
//! | 8      | 2         | header length, little endian       |
//! | 10     | 2         | record length, little endian       |
//! | 12     | 16        | reserved                           |
//! | 28     | 1         | index flag, 0x00 without index     |
//! | 29     | 1         | language driver (code page)        |
//! | 30     | 2         | reserved                           |
//! | 32     | 32 * n    | field descriptors                  |
//! | 32+32n | 1         | end of header, 0x0D                |
//!
//! Field descriptor:
//!
//! | offset | length(B) | field                              |
//! |--------|-----------|------------------------------------|
//! | 0      | 11        | name, terminated by 0x00           |
//! | 11     | 1         | type tag                           |
//! | 12     | 4         | reserved                           |
//! | 16     | 1         | field length                       |
//! | 17     | 1         | decimal places                     |
//! | 18     | 14        | reserved                           |
use crate::error::{Error, Result};
use xdbf_datatype::{Encoding, FieldDescriptor, FieldType, LastUpdate, MAX_FIELD_NAME_LEN};

pub const HEADER_LEN: usize = 32;
pub const DESCRIPTOR_LEN: usize = 32;
/// Name area including the NUL terminator.
pub const FIELD_NAME_AREA: usize = MAX_FIELD_NAME_LEN + 1;
pub const HEADER_TERMINATOR: u8 = 0x0D;
pub const EOF_MARKER: u8 = 0x1A;
pub const SIGNATURE_NO_MEMO: u8 = 0x03;
pub const INDEX_FLAG_OFFSET: usize = 28;
pub const CODE_PAGE_OFFSET: usize = 29;
pub const END_OF_FIELD_NAME: u8 = 0x00;
/// Deletion flag of each record.
pub const RECORD_ACTIVE: u8 = 0x20;
pub const RECORD_DELETED: u8 = 0x2A;

const TYPE_TAG_OFFSET: usize = 11;
const LENGTH_OFFSET: usize = 16;
const DECIMALS_OFFSET: usize = 17;

/// Fixed part of table header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub signature: u8,
    pub last_update: LastUpdate,
    pub record_count: u32,
    pub header_len: u16,
    pub record_len: u16,
}

impl Header {
    /// Header of table without any field and record.
    #[inline]
    pub fn empty(last_update: LastUpdate) -> Self {
        Header {
            signature: SIGNATURE_NO_MEMO,
            last_update,
            record_count: 0,
            header_len: (HEADER_LEN + 1) as u16,
            // deletion flag only.
            record_len: 1,
        }
    }

    #[inline]
    pub fn unpack(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(Error::BufferTooShort(buf.len()));
        }
        let header = Header {
            signature: buf[0],
            last_update: LastUpdate::from_bytes([buf[1], buf[2], buf[3]]),
            record_count: u32::from_le_bytes(buf[4..8].try_into()?),
            header_len: u16::from_le_bytes(buf[8..10].try_into()?),
            record_len: u16::from_le_bytes(buf[10..12].try_into()?),
        };
        let header_len = header.header_len as usize;
        if header_len < HEADER_LEN + 1 || header_len > buf.len() {
            return Err(Error::InvalidHeaderLength {
                header_len,
                actual: buf.len(),
            });
        }
        Ok(header)
    }

    /// Write fixed fields into first 12 bytes of buffer.
    /// Reserved bytes and language driver are left untouched.
    #[inline]
    pub fn pack_into(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_LEN);
        buf[0] = self.signature;
        buf[1..4].copy_from_slice(&self.last_update.to_bytes());
        buf[4..8].copy_from_slice(&self.record_count.to_le_bytes());
        buf[8..10].copy_from_slice(&self.header_len.to_le_bytes());
        buf[10..12].copy_from_slice(&self.record_len.to_le_bytes());
    }

    /// Number of descriptors declared by header length.
    #[inline]
    pub fn field_count(&self) -> usize {
        (self.header_len as usize - HEADER_LEN - 1) / DESCRIPTOR_LEN
    }

    /// Total bytes of header and all records, excluding EOF marker.
    #[inline]
    pub fn content_len(&self) -> usize {
        self.header_len as usize + self.record_count as usize * self.record_len as usize
    }
}

/// Field descriptor with its byte offset inside a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    pub desc: FieldDescriptor,
    pub offset: usize,
}

/// Unpack all field descriptors declared by header.
///
/// Descriptors with unknown type tag are skipped, but their bytes
/// still occupy the record, so offsets of following fields are kept.
pub fn unpack_fields(buf: &[u8], header: &Header, enc: &dyn Encoding) -> Result<Vec<FieldSlot>> {
    let field_count = header.field_count();
    let mut slots = Vec::with_capacity(field_count);
    // first byte of record is deletion flag.
    let mut offset = 1usize;
    for i in 0..field_count {
        let start = HEADER_LEN + i * DESCRIPTOR_LEN;
        let block = &buf[start..start + DESCRIPTOR_LEN];
        let name = unpack_field_name(block, start, enc)?;
        let tag = block[TYPE_TAG_OFFSET];
        let length = block[LENGTH_OFFSET];
        match FieldType::from_tag(tag, block[DECIMALS_OFFSET]) {
            Some(ty) => slots.push(FieldSlot {
                desc: FieldDescriptor::new_unchecked(&name, ty, length),
                offset,
            }),
            None => {
                log::warn!(
                    "skip field '{}' with unsupported type tag 0x{:02x}",
                    name,
                    tag
                );
            }
        }
        offset += length as usize;
    }
    if offset > header.record_len as usize {
        return Err(Error::InvalidFormat(format!(
            "fields occupy {} bytes, but record length is {}",
            offset, header.record_len
        )));
    }
    Ok(slots)
}

#[inline]
fn unpack_field_name(block: &[u8], start: usize, enc: &dyn Encoding) -> Result<String> {
    let name_bytes = &block[..FIELD_NAME_AREA];
    let end = name_bytes
        .iter()
        .position(|b| *b == END_OF_FIELD_NAME)
        .ok_or(Error::EndOfFieldMarkerMissing(start, start + FIELD_NAME_AREA))?;
    let name = enc.decode(&name_bytes[..end])?;
    Ok(name.into_owned())
}

/// Pack one field descriptor into 32-byte block.
/// Name must be already truncated to fit.
pub fn pack_field(desc: &FieldDescriptor, enc: &dyn Encoding, block: &mut [u8]) -> Result<()> {
    debug_assert_eq!(DESCRIPTOR_LEN, block.len());
    let name = enc.encode(desc.name())?;
    if name.len() > MAX_FIELD_NAME_LEN {
        return Err(Error::InvalidFormat(format!(
            "field name '{}' exceeds {} bytes",
            desc.name(),
            MAX_FIELD_NAME_LEN
        )));
    }
    block.fill(0);
    block[..name.len()].copy_from_slice(&name);
    block[TYPE_TAG_OFFSET] = desc.field_type().tag();
    block[LENGTH_OFFSET] = desc.length();
    block[DECIMALS_OFFSET] = desc.decimal_places().unwrap_or(0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use xdbf_datatype::Utf8;

    fn header_bytes(fields: &[[u8; DESCRIPTOR_LEN]], record_len: u16) -> Vec<u8> {
        let lu = LastUpdate::from_bytes([118, 1, 1]);
        let mut header = Header::empty(lu);
        header.header_len = (HEADER_LEN + DESCRIPTOR_LEN * fields.len() + 1) as u16;
        header.record_len = record_len;
        let mut buf = vec![0u8; HEADER_LEN];
        header.pack_into(&mut buf);
        for f in fields {
            buf.extend_from_slice(f);
        }
        buf.push(HEADER_TERMINATOR);
        buf
    }

    fn block(name: &str, tag: u8, length: u8, decimals: u8) -> [u8; DESCRIPTOR_LEN] {
        let mut b = [0u8; DESCRIPTOR_LEN];
        b[..name.len()].copy_from_slice(name.as_bytes());
        b[TYPE_TAG_OFFSET] = tag;
        b[LENGTH_OFFSET] = length;
        b[DECIMALS_OFFSET] = decimals;
        b
    }

    #[test]
    fn test_header_pack_unpack() -> Result<()> {
        let header = Header {
            signature: SIGNATURE_NO_MEMO,
            last_update: LastUpdate::from_bytes([118, 3, 4]),
            record_count: 0x01020304,
            header_len: 97,
            record_len: 0x0506,
        };
        let mut buf = vec![0u8; 97];
        header.pack_into(&mut buf);
        assert_eq!(
            &[0x03, 118, 3, 4, 0x04, 0x03, 0x02, 0x01, 97, 0, 0x06, 0x05][..],
            &buf[..12]
        );
        assert_eq!(header, Header::unpack(&buf)?);
        assert_eq!(2, header.field_count());
        Ok(())
    }

    #[test]
    fn test_header_too_short() {
        assert!(matches!(
            Header::unpack(&[0x03; 31]),
            Err(Error::BufferTooShort(31))
        ));
        let mut buf = vec![0u8; 33];
        Header::empty(LastUpdate::default()).pack_into(&mut buf);
        assert!(Header::unpack(&buf).is_ok());
        // declared header is longer than buffer.
        buf[8] = 65;
        assert!(matches!(
            Header::unpack(&buf),
            Err(Error::InvalidHeaderLength {
                header_len: 65,
                actual: 33
            })
        ));
        buf[8] = 32;
        assert!(Header::unpack(&buf).is_err());
    }

    #[test]
    fn test_unpack_fields() -> Result<()> {
        let buf = header_bytes(
            &[
                block("TESTBOOL", b'L', 1, 0),
                block("TESTTEXT", b'C', 10, 0),
                block("TESTFLOAT", b'F', 10, 2),
            ],
            22,
        );
        let header = Header::unpack(&buf)?;
        let slots = unpack_fields(&buf, &header, &Utf8)?;
        assert_eq!(3, slots.len());
        assert_eq!("TESTBOOL", slots[0].desc.name());
        assert_eq!(1, slots[0].offset);
        assert_eq!(FieldType::Character, slots[1].desc.field_type());
        assert_eq!(2, slots[1].offset);
        assert_eq!(FieldType::float(2), slots[2].desc.field_type());
        assert_eq!(12, slots[2].offset);
        Ok(())
    }

    #[test]
    fn test_unpack_fields_skip_unknown_tag() -> Result<()> {
        let buf = header_bytes(
            &[
                block("MEMO", b'M', 10, 0),
                block("FLAG", b'L', 1, 0),
            ],
            12,
        );
        let header = Header::unpack(&buf)?;
        let slots = unpack_fields(&buf, &header, &Utf8)?;
        assert_eq!(1, slots.len());
        assert_eq!("FLAG", slots[0].desc.name());
        assert_eq!(11, slots[0].offset);
        Ok(())
    }

    #[test]
    fn test_unpack_fields_missing_end_of_name() -> Result<()> {
        let mut buf = header_bytes(&[block("NAME", b'C', 4, 0)], 5);
        buf[HEADER_LEN..HEADER_LEN + FIELD_NAME_AREA].fill(b'A');
        let header = Header::unpack(&buf)?;
        let res = unpack_fields(&buf, &header, &Utf8);
        assert!(matches!(res, Err(Error::EndOfFieldMarkerMissing(32, 43))));
        Ok(())
    }

    #[test]
    fn test_unpack_fields_exceed_record() -> Result<()> {
        let buf = header_bytes(&[block("NAME", b'C', 10, 0)], 5);
        let header = Header::unpack(&buf)?;
        assert!(matches!(
            unpack_fields(&buf, &header, &Utf8),
            Err(Error::InvalidFormat(_))
        ));
        Ok(())
    }

    #[test]
    fn test_pack_field() -> Result<()> {
        let desc = FieldDescriptor::new("TESTNUM", FieldType::numeric(2), 10)?;
        let mut b = [0xffu8; DESCRIPTOR_LEN];
        pack_field(&desc, &Utf8, &mut b)?;
        assert_eq!(block("TESTNUM", b'N', 10, 2), b);
        let long = FieldDescriptor::new_unchecked("ELEVENBYTES", FieldType::Logical, 1);
        assert!(pack_field(&long, &Utf8, &mut b).is_err());
        Ok(())
    }
}
