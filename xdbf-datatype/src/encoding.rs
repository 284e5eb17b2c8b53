//! Character encoding of text stored in a table.
//!
//! The table never transcodes by itself. Callers inject an [`Encoding`]
//! implementation, usually a thin wrapper over a code page crate, and the
//! table uses it for field names and character values. The only thing
//! derived from the encoding is the legacy language driver byte stored
//! in the header.
use crate::error::{Error, Result};
use std::borrow::Cow;
use std::sync::Arc;

/// Language driver byte written when the encoding is absent or unknown.
pub const ANSI_CODE_PAGE: u8 = 0x57;

/// Known language drivers, keyed by encoding name.
const CODE_PAGES: [(&str, u8); 17] = [
    ("Big5", 0x78),
    ("ISO 8859-2", 0x1b),
    ("IBM Code Page 865", 0x66),
    ("IBM Code Page 863", 0x6c),
    ("IBM Code Page 852", 0x87),
    ("IBM Code Page 860", 0x24),
    ("IBM Code Page 866", 0x65),
    ("IBM Code Page 850", 0x37),
    ("Windows 874", 0x7c),
    ("ISO 8859-9", 0x88),
    ("Windows 1250", 0xc8),
    ("Windows 1251", 0xc9),
    ("Windows 1252", 0x59),
    ("Windows 1253", 0xcb),
    ("Windows 1254", 0xca),
    ("Windows 1257", 0xcc),
    ("Shift JIS", 0x7b),
];

/// Shared handle of encoding held by a table.
pub type EncodingRef = Arc<dyn Encoding + Send + Sync>;

pub trait Encoding {
    /// Name of the encoding, used to look up the language driver byte.
    fn name(&self) -> &str;

    fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>>;

    fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>>;
}

/// Pass-through encoding used when the caller does not supply one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Utf8;

impl Encoding for Utf8 {
    #[inline]
    fn name(&self) -> &str {
        "UTF-8"
    }

    #[inline]
    fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>> {
        std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|_| Error::Decode(self.name().to_string()))
    }

    #[inline]
    fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>> {
        Ok(Cow::Borrowed(text.as_bytes()))
    }
}

/// Returns the language driver byte of given encoding.
#[inline]
pub fn code_page_id(enc: Option<&dyn Encoding>) -> u8 {
    enc.and_then(|e| {
        let name = e.name();
        CODE_PAGES.iter().find(|(n, _)| *n == name).map(|(_, id)| *id)
    })
    .unwrap_or(ANSI_CODE_PAGE)
}

/// Returns the encoding name of given language driver byte,
/// if it is one of the known drivers.
#[inline]
pub fn code_page_name(id: u8) -> Option<&'static str> {
    CODE_PAGES.iter().find(|(_, i)| *i == id).map(|(n, _)| *n)
}
