use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("failed to decode bytes with encoding {0}")]
    Decode(String),
    #[error("failed to encode text with encoding {0}")]
    Encode(String),
    #[error("invalid date '{0}'")]
    InvalidDate(String),
    #[error("year {0} out of range [1900, 2155]")]
    DateOutOfRange(i32),
    #[error("invalid logical value '{0}'")]
    InvalidLogical(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("invalid length {length} for field type {tag}")]
    InvalidFieldLength { tag: char, length: u16 },
}

impl From<time::error::ComponentRange> for Error {
    #[inline]
    fn from(src: time::error::ComponentRange) -> Self {
        Error::InvalidDate(src.to_string())
    }
}
