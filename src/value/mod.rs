//! Value Module
//!
//! Tagged values and the record containers the codec serializes.

mod record;

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, TimeDelta};
use half::f16;
use rust_decimal::Decimal;

use crate::error::{CacheError, Result};

pub use record::{Payload, Record, RecordSet};

// == Zoned Time ==
/// A time of day with an attached UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZonedTime {
    pub time: NaiveTime,
    pub offset: FixedOffset,
}

impl ZonedTime {
    pub fn new(time: NaiveTime, offset: FixedOffset) -> Self {
        Self { time, offset }
    }
}

impl fmt::Display for ZonedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.time.format("%H:%M:%S%.f"), self.offset)
    }
}

// == Typed Value ==
/// A single value inside a record.
///
/// Every variant keeps its width or precision so that decoding restores the
/// same variant, not merely an equal number.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F16(f16),
    F32(f32),
    F64(f64),
    /// Exact decimal, scale included (`3.30` stays `3.30`)
    Decimal(Decimal),
    Str(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    /// Instant plus the offset it was recorded in
    TimestampTz(DateTime<FixedOffset>),
    Time(NaiveTime),
    TimeTz(ZonedTime),
    /// Calendar duration, normalized to days + seconds + nanoseconds
    Duration(TimeDelta),
    /// High-resolution duration in nanoseconds
    DurationNs(i64),
}

impl TypedValue {
    /// Short name of the variant, used in error messages and fingerprints.
    pub fn kind(&self) -> &'static str {
        match self {
            TypedValue::Null => "null",
            TypedValue::Bool(_) => "bool",
            TypedValue::I8(_) => "i8",
            TypedValue::I16(_) => "i16",
            TypedValue::I32(_) => "i32",
            TypedValue::I64(_) => "i64",
            TypedValue::U8(_) => "u8",
            TypedValue::U16(_) => "u16",
            TypedValue::U32(_) => "u32",
            TypedValue::U64(_) => "u64",
            TypedValue::F16(_) => "f16",
            TypedValue::F32(_) => "f32",
            TypedValue::F64(_) => "f64",
            TypedValue::Decimal(_) => "decimal",
            TypedValue::Str(_) => "str",
            TypedValue::Bytes(_) => "bytes",
            TypedValue::Timestamp(_) => "datetime",
            TypedValue::TimestampTz(_) => "datetime_tz",
            TypedValue::Time(_) => "time",
            TypedValue::TimeTz(_) => "time_tz",
            TypedValue::Duration(_) => "timedelta",
            TypedValue::DurationNs(_) => "timedelta64",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    /// Converts a scalar JSON value.
    ///
    /// Integers become `I64` (or `U64` above `i64::MAX`), other numbers
    /// `F64`. Arrays and objects have no stable tagged form and are rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        use serde_json::Value;

        match value {
            Value::Null => Ok(TypedValue::Null),
            Value::Bool(b) => Ok(TypedValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(TypedValue::I64(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(TypedValue::U64(u))
                } else if let Some(f) = n.as_f64() {
                    Ok(TypedValue::F64(f))
                } else {
                    Err(CacheError::UnsupportedType(format!("number {}", n)))
                }
            }
            Value::String(s) => Ok(TypedValue::Str(s.clone())),
            Value::Array(_) => Err(CacheError::UnsupportedType(
                "JSON array cannot be used as a value".to_string(),
            )),
            Value::Object(_) => Err(CacheError::UnsupportedType(
                "JSON object cannot be used as a value".to_string(),
            )),
        }
    }
}

// == Duration Normalization ==
const SECONDS_PER_DAY: i64 = 86_400;
const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// Splits a duration into (days, seconds within the day, nanoseconds).
/// Only the day count carries the sign.
pub(crate) fn split_duration(delta: TimeDelta) -> (i64, u32, u32) {
    let mut seconds = delta.num_seconds();
    let mut nanos = delta.subsec_nanos();
    if nanos < 0 {
        seconds -= 1;
        nanos += NANOS_PER_SECOND;
    }
    let days = seconds.div_euclid(SECONDS_PER_DAY);
    let rest = seconds.rem_euclid(SECONDS_PER_DAY);
    (days, rest as u32, nanos as u32)
}

// == Conversions ==
macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for TypedValue {
                fn from(value: $ty) -> Self {
                    TypedValue::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f16 => F16,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
    String => Str,
    Vec<u8> => Bytes,
    NaiveDateTime => Timestamp,
    DateTime<FixedOffset> => TimestampTz,
    NaiveTime => Time,
    ZonedTime => TimeTz,
    TimeDelta => Duration,
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::Str(value.to_string())
    }
}

impl From<&[u8]> for TypedValue {
    fn from(value: &[u8]) -> Self {
        TypedValue::Bytes(value.to_vec())
    }
}

impl<T: Into<TypedValue>> From<Option<T>> for TypedValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(TypedValue::Null, Into::into)
    }
}
