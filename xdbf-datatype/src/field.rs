use crate::error::{Error, Result};
use semistr::SemiStr;
use std::fmt;

/// Usable bytes of field name in descriptor.
/// The 11th byte is reserved for the NUL terminator.
pub const MAX_FIELD_NAME_LEN: usize = 10;
pub const LOGICAL_FIELD_LEN: u8 = 1;
pub const DATE_FIELD_LEN: u8 = 8;

/// FieldType is the closed set of column types.
/// Only numeric types carry decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Character,
    Numeric { decimals: u8 },
    Float { decimals: u8 },
    Logical,
    Date,
}

impl FieldType {
    #[inline]
    pub fn numeric(decimals: u8) -> Self {
        FieldType::Numeric { decimals }
    }

    #[inline]
    pub fn float(decimals: u8) -> Self {
        FieldType::Float { decimals }
    }

    /// Returns one-byte type tag in field descriptor.
    #[inline]
    pub fn tag(&self) -> u8 {
        match self {
            FieldType::Character => b'C',
            FieldType::Numeric { .. } => b'N',
            FieldType::Float { .. } => b'F',
            FieldType::Logical => b'L',
            FieldType::Date => b'D',
        }
    }

    /// Build field type from tag and decimal places in descriptor.
    /// Returns None if tag is not supported.
    #[inline]
    pub fn from_tag(tag: u8, decimals: u8) -> Option<Self> {
        let ty = match tag {
            b'C' => FieldType::Character,
            b'N' => FieldType::Numeric { decimals },
            b'F' => FieldType::Float { decimals },
            b'L' => FieldType::Logical,
            b'D' => FieldType::Date,
            _ => return None,
        };
        Some(ty)
    }

    #[inline]
    pub fn decimals(&self) -> Option<u8> {
        match self {
            FieldType::Numeric { decimals } | FieldType::Float { decimals } => Some(*decimals),
            _ => None,
        }
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Numeric { .. } | FieldType::Float { .. })
    }

    /// Returns the fixed length of the type, if any.
    #[inline]
    pub fn fixed_len(&self) -> Option<u8> {
        match self {
            FieldType::Logical => Some(LOGICAL_FIELD_LEN),
            FieldType::Date => Some(DATE_FIELD_LEN),
            _ => None,
        }
    }

    /// Check whether given length is valid for this type.
    #[inline]
    pub fn validate_len(&self, length: u8) -> Result<()> {
        let valid = match self {
            FieldType::Character => length >= 1,
            FieldType::Numeric { decimals } | FieldType::Float { decimals } => {
                // at least one integral digit besides the point.
                length >= 1 && (*decimals == 0 || *decimals as u16 + 1 < length as u16)
            }
            FieldType::Logical => length == LOGICAL_FIELD_LEN,
            FieldType::Date => length == DATE_FIELD_LEN,
        };
        if valid {
            Ok(())
        } else {
            Err(Error::InvalidFieldLength {
                tag: self.tag() as char,
                length: length as u16,
            })
        }
    }
}

impl fmt::Display for FieldType {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decimals() {
            Some(d) => write!(f, "{}({})", self.tag() as char, d),
            None => write!(f, "{}", self.tag() as char),
        }
    }
}

/// Parse text of logical field.
/// Blank and '?' both mean the value is not set.
#[inline]
pub fn parse_logical(text: &str) -> Result<Option<bool>> {
    match text.trim() {
        "T" | "t" | "Y" | "y" => Ok(Some(true)),
        "F" | "f" | "N" | "n" => Ok(Some(false)),
        "" | "?" => Ok(None),
        other => Err(Error::InvalidLogical(other.to_string())),
    }
}

/// FieldDescriptor describes one column of the table.
/// It never changes once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: SemiStr,
    ty: FieldType,
    length: u8,
}

impl FieldDescriptor {
    /// Create a new descriptor with validated length.
    /// Name truncation depends on encoding and is done by caller.
    #[inline]
    pub fn new(name: &str, ty: FieldType, length: u8) -> Result<Self> {
        ty.validate_len(length)?;
        Ok(FieldDescriptor {
            name: SemiStr::new(name),
            ty,
            length,
        })
    }

    /// Create descriptor read from existing file, without length check.
    #[inline]
    pub fn new_unchecked(name: &str, ty: FieldType, length: u8) -> Self {
        FieldDescriptor {
            name: SemiStr::new(name),
            ty,
            length,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    #[inline]
    pub fn field_type(&self) -> FieldType {
        self.ty
    }

    #[inline]
    pub fn length(&self) -> u8 {
        self.length
    }

    #[inline]
    pub fn decimal_places(&self) -> Option<u8> {
        self.ty.decimals()
    }
}
