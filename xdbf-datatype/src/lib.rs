//! Datatypes of xdbf.
//!
//! Field type model, date codec, numeric formatting and the
//! character encoding seam shared by table codec.
pub mod date;
pub mod encoding;
pub mod error;
pub mod field;
pub mod number;

pub use date::LastUpdate;
pub use encoding::{code_page_id, code_page_name, Encoding, EncodingRef, Utf8, ANSI_CODE_PAGE};
pub use error::{Error, Result};
pub use field::{parse_logical, FieldDescriptor, FieldType, MAX_FIELD_NAME_LEN};

pub use fxd::FixedDecimal as Decimal;
pub use time::format_description::{self, FormatItem};
pub use time::Date;
pub use time::PrimitiveDateTime as Datetime;

use static_init::dynamic;

/// Format of date fields, e.g. 20181201.
#[dynamic]
pub static FIELD_DATE_FORMAT: Vec<FormatItem<'static>> =
    format_description::parse("[year][month][day]").unwrap();
