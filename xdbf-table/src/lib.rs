//! Table codec of xdbf.
//!
//! A table is kept as one byte buffer in the on-disk layout of
//! dBASE III files: a fixed header, field descriptors, then fixed-width
//! records. [`Table`] provides schema and record operations over
//! the buffer, and whole-file load and save.
pub mod error;
pub mod header;
pub mod io;
pub mod record;
pub mod table;

pub use error::{Error, Result};
pub use table::Table;
pub use xdbf_datatype::{
    Date, Datetime, Encoding, EncodingRef, FieldDescriptor, FieldType, LastUpdate, Utf8,
};
