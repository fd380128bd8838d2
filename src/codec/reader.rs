//! Decoding half of the codec.
//!
//! Every read is bounds-checked; a short or inconsistent buffer is a
//! `Decode` error, never a panic.

use std::str::FromStr;

use bytes::Buf;
use chrono::{DateTime, FixedOffset, NaiveTime, TimeDelta};
use half::f16;
use rust_decimal::Decimal;

use crate::codec::tag::Tag;
use crate::error::{CacheError, Result};
use crate::value::{Record, RecordSet, TypedValue, ZonedTime};

const SECONDS_PER_DAY: i64 = 86_400;

pub(crate) struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        if self.buf.len() < len {
            return Err(CacheError::Decode(format!(
                "truncated {}: need {} bytes, have {}",
                what,
                len,
                self.buf.len()
            )));
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    pub fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?.get_u8())
    }

    fn len(&mut self, what: &str) -> Result<usize> {
        Ok(self.take(4, what)?.get_u32_le() as usize)
    }

    /// Fails unless every byte has been consumed.
    pub fn finish(self, what: &str) -> Result<()> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(CacheError::Decode(format!(
                "{} trailing bytes after {}",
                self.buf.len(),
                what
            )))
        }
    }

    pub fn record_set(&mut self) -> Result<RecordSet> {
        let count = self.len("record count")?;
        let mut records = RecordSet::new();
        for _ in 0..count {
            records.push(self.record()?);
        }
        Ok(records)
    }

    pub fn record(&mut self) -> Result<Record> {
        let count = self.len("field count")?;
        let mut record = Record::new();
        for _ in 0..count {
            let name_len = self.len("field name length")?;
            let name = std::str::from_utf8(self.take(name_len, "field name")?)
                .map_err(|e| CacheError::Decode(format!("field name is not UTF-8: {}", e)))?;
            let value = self.value()?;
            if record.insert(name, value).is_some() {
                return Err(CacheError::Decode(format!("duplicate field '{}'", name)));
            }
        }
        Ok(record)
    }

    fn value(&mut self) -> Result<TypedValue> {
        let tag = Tag::try_from(self.u8("value tag")?)?;
        let len = self.len("value length")?;
        if let Some(expected) = tag.fixed_len() {
            if len != expected {
                return Err(CacheError::Decode(format!(
                    "{:?} payload must be {} bytes, found {}",
                    tag, expected, len
                )));
            }
        }
        let payload = self.take(len, "value payload")?;
        decode_payload(tag, payload)
    }
}

fn decode_payload(tag: Tag, mut p: &[u8]) -> Result<TypedValue> {
    let value = match tag {
        Tag::Null => TypedValue::Null,
        Tag::Bool => match p.get_u8() {
            0 => TypedValue::Bool(false),
            1 => TypedValue::Bool(true),
            other => return Err(CacheError::Decode(format!("invalid bool byte {}", other))),
        },
        Tag::I8 => TypedValue::I8(p.get_i8()),
        Tag::I16 => TypedValue::I16(p.get_i16_le()),
        Tag::I32 => TypedValue::I32(p.get_i32_le()),
        Tag::I64 => TypedValue::I64(p.get_i64_le()),
        Tag::U8 => TypedValue::U8(p.get_u8()),
        Tag::U16 => TypedValue::U16(p.get_u16_le()),
        Tag::U32 => TypedValue::U32(p.get_u32_le()),
        Tag::U64 => TypedValue::U64(p.get_u64_le()),
        Tag::F16 => TypedValue::F16(f16::from_bits(p.get_u16_le())),
        Tag::F32 => TypedValue::F32(f32::from_bits(p.get_u32_le())),
        Tag::F64 => TypedValue::F64(f64::from_bits(p.get_u64_le())),
        Tag::Decimal => {
            let text = utf8(p, "decimal")?;
            let decimal = Decimal::from_str(text)
                .map_err(|e| CacheError::Decode(format!("invalid decimal '{}': {}", text, e)))?;
            TypedValue::Decimal(decimal)
        }
        Tag::Str => TypedValue::Str(utf8(p, "string")?.to_string()),
        Tag::Bytes => TypedValue::Bytes(p.to_vec()),
        Tag::Timestamp => {
            let seconds = p.get_i64_le();
            let nanos = p.get_u32_le();
            let instant = DateTime::from_timestamp(seconds, nanos)
                .ok_or_else(|| CacheError::Decode("timestamp out of range".to_string()))?;
            TypedValue::Timestamp(instant.naive_utc())
        }
        Tag::TimestampTz => {
            let offset = offset(p.get_i32_le())?;
            let seconds = p.get_i64_le();
            let nanos = p.get_u32_le();
            let instant = DateTime::from_timestamp(seconds, nanos)
                .ok_or_else(|| CacheError::Decode("timestamp out of range".to_string()))?;
            TypedValue::TimestampTz(instant.with_timezone(&offset))
        }
        Tag::Time => TypedValue::Time(time_of_day(&mut p)?),
        Tag::TimeTz => {
            let offset = offset(p.get_i32_le())?;
            TypedValue::TimeTz(ZonedTime::new(time_of_day(&mut p)?, offset))
        }
        Tag::Duration => {
            let days = p.get_i64_le();
            let seconds = p.get_u32_le();
            let nanos = p.get_u32_le();
            TypedValue::Duration(join_delta(days, seconds, nanos)?)
        }
        Tag::DurationNs => TypedValue::DurationNs(p.get_i64_le()),
    };
    Ok(value)
}

fn utf8<'a>(bytes: &'a [u8], what: &str) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| CacheError::Decode(format!("{} is not UTF-8: {}", what, e)))
}

fn offset(seconds: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(seconds)
        .ok_or_else(|| CacheError::Decode(format!("invalid UTC offset {}s", seconds)))
}

fn time_of_day(p: &mut &[u8]) -> Result<NaiveTime> {
    let seconds = p.get_u32_le();
    let nanos = p.get_u32_le();
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanos)
        .ok_or_else(|| CacheError::Decode(format!("invalid time of day {}s {}ns", seconds, nanos)))
}

fn join_delta(days: i64, seconds: u32, nanos: u32) -> Result<TimeDelta> {
    let invalid = || CacheError::Decode("duration out of range".to_string());
    if i64::from(seconds) >= SECONDS_PER_DAY || nanos >= 1_000_000_000 {
        return Err(invalid());
    }
    let total = days
        .checked_mul(SECONDS_PER_DAY)
        .and_then(|s| s.checked_add(i64::from(seconds)))
        .ok_or_else(invalid)?;
    TimeDelta::new(total, nanos).ok_or_else(invalid)
}
