use std::array::TryFromSliceError;
use thiserror::Error;
use xdbf_datatype::{Error as DataTypeError, FieldType};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    // malformed input
    #[error("buffer of {0} bytes is too short for table header")]
    BufferTooShort(usize),
    #[error("invalid header length {header_len} with buffer of {actual} bytes")]
    InvalidHeaderLength { header_len: usize, actual: usize },
    #[error("encoded content is {actual} bytes, but header expected {expected}")]
    SizeMismatch { actual: usize, expected: usize },
    #[error("end-of-field marker missing from field bytes, offset [{0},{1}]")]
    EndOfFieldMarkerMissing(usize, usize),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    // schema violation
    #[error("schema is locked, field '{0}' can not be added")]
    SchemaLocked(String),
    #[error("field '{0}' already exists")]
    DuplicateField(String),
    #[error("too many fields, {0} exceeds length limit")]
    TooManyFields(String),
    // usage violation
    #[error("no fields defined in table")]
    NoFieldsDefined,
    #[error("field '{0}' not found")]
    FieldNotFound(String),
    #[error("field index {0} out of bound")]
    FieldIndexOutOfBound(usize),
    #[error("record index {index} out of bound, record count {count}")]
    RecordOutOfBound { index: usize, count: usize },
    #[error("field '{0}' is not numeric")]
    NotNumericField(String),
    #[error("field '{field}' has type {actual}, but {expected} is required")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        actual: FieldType,
    },
    #[error("value of {len} bytes exceeds width {width} of field '{field}'")]
    ValueTooWide {
        field: String,
        width: usize,
        len: usize,
    },
    #[error("invalid value '{value}' for field '{field}'")]
    InvalidValue { field: String, value: String },
    // conversion failure
    #[error("failed to convert value of field '{field}': {source}")]
    Conversion {
        field: String,
        source: DataTypeError,
    },
    #[error(transparent)]
    DataType(#[from] DataTypeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<TryFromSliceError> for Error {
    #[inline]
    fn from(src: TryFromSliceError) -> Error {
        Error::InvalidFormat(src.to_string())
    }
}
