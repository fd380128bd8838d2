//! Wire tags for typed values.

use crate::error::{CacheError, Result};
use crate::value::TypedValue;

/// One byte identifying the variant of an encoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    Null = 0,
    Bool = 1,
    I8 = 2,
    I16 = 3,
    I32 = 4,
    I64 = 5,
    U8 = 6,
    U16 = 7,
    U32 = 8,
    U64 = 9,
    F16 = 10,
    F32 = 11,
    F64 = 12,
    Decimal = 13,
    Str = 14,
    Bytes = 15,
    Timestamp = 16,
    TimestampTz = 17,
    Time = 18,
    TimeTz = 19,
    Duration = 20,
    DurationNs = 21,
}

impl Tag {
    pub fn of(value: &TypedValue) -> Self {
        match value {
            TypedValue::Null => Tag::Null,
            TypedValue::Bool(_) => Tag::Bool,
            TypedValue::I8(_) => Tag::I8,
            TypedValue::I16(_) => Tag::I16,
            TypedValue::I32(_) => Tag::I32,
            TypedValue::I64(_) => Tag::I64,
            TypedValue::U8(_) => Tag::U8,
            TypedValue::U16(_) => Tag::U16,
            TypedValue::U32(_) => Tag::U32,
            TypedValue::U64(_) => Tag::U64,
            TypedValue::F16(_) => Tag::F16,
            TypedValue::F32(_) => Tag::F32,
            TypedValue::F64(_) => Tag::F64,
            TypedValue::Decimal(_) => Tag::Decimal,
            TypedValue::Str(_) => Tag::Str,
            TypedValue::Bytes(_) => Tag::Bytes,
            TypedValue::Timestamp(_) => Tag::Timestamp,
            TypedValue::TimestampTz(_) => Tag::TimestampTz,
            TypedValue::Time(_) => Tag::Time,
            TypedValue::TimeTz(_) => Tag::TimeTz,
            TypedValue::Duration(_) => Tag::Duration,
            TypedValue::DurationNs(_) => Tag::DurationNs,
        }
    }

    /// Payload size for fixed-width tags, `None` for variable-length ones.
    pub fn fixed_len(self) -> Option<usize> {
        match self {
            Tag::Null => Some(0),
            Tag::Bool | Tag::I8 | Tag::U8 => Some(1),
            Tag::I16 | Tag::U16 | Tag::F16 => Some(2),
            Tag::I32 | Tag::U32 | Tag::F32 => Some(4),
            Tag::I64 | Tag::U64 | Tag::F64 | Tag::DurationNs => Some(8),
            Tag::Time => Some(8),
            Tag::Timestamp | Tag::TimeTz => Some(12),
            Tag::TimestampTz | Tag::Duration => Some(16),
            Tag::Decimal | Tag::Str | Tag::Bytes => None,
        }
    }
}

impl TryFrom<u8> for Tag {
    type Error = CacheError;

    fn try_from(byte: u8) -> Result<Self> {
        let tag = match byte {
            0 => Tag::Null,
            1 => Tag::Bool,
            2 => Tag::I8,
            3 => Tag::I16,
            4 => Tag::I32,
            5 => Tag::I64,
            6 => Tag::U8,
            7 => Tag::U16,
            8 => Tag::U32,
            9 => Tag::U64,
            10 => Tag::F16,
            11 => Tag::F32,
            12 => Tag::F64,
            13 => Tag::Decimal,
            14 => Tag::Str,
            15 => Tag::Bytes,
            16 => Tag::Timestamp,
            17 => Tag::TimestampTz,
            18 => Tag::Time,
            19 => Tag::TimeTz,
            20 => Tag::Duration,
            21 => Tag::DurationNs,
            other => return Err(CacheError::Decode(format!("unknown value tag {}", other))),
        };
        Ok(tag)
    }
}
