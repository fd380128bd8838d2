//! Encoding half of the codec.

use bytes::{BufMut, BytesMut};
use chrono::Timelike;

use crate::codec::tag::Tag;
use crate::codec::{MAGIC, VERSION};
use crate::error::{CacheError, Result};
use crate::value::{split_duration, Record, RecordSet, TypedValue};

/// Accumulates an encoded payload.
pub(crate) struct Writer {
    buf: BytesMut,
}

impl Writer {
    pub fn new(kind: u8) -> Self {
        let mut buf = BytesMut::with_capacity(256);
        buf.put_slice(&MAGIC);
        buf.put_u8(VERSION);
        buf.put_u8(kind);
        Self { buf }
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    pub fn put_record_set(&mut self, records: &RecordSet) -> Result<()> {
        put_len(&mut self.buf, records.len(), "record set")?;
        for record in records.records() {
            self.put_record(record)?;
        }
        Ok(())
    }

    pub fn put_record(&mut self, record: &Record) -> Result<()> {
        put_len(&mut self.buf, record.len(), "record")?;
        for (name, value) in record.iter() {
            put_len(&mut self.buf, name.len(), "field name")?;
            self.buf.put_slice(name.as_bytes());
            self.put_value(value)?;
        }
        Ok(())
    }

    fn put_value(&mut self, value: &TypedValue) -> Result<()> {
        let payload = value_payload(value)?;
        self.buf.put_u8(Tag::of(value) as u8);
        put_len(&mut self.buf, payload.len(), value.kind())?;
        self.buf.put_slice(&payload);
        Ok(())
    }
}

fn put_len(buf: &mut BytesMut, len: usize, what: &str) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| {
        CacheError::UnsupportedType(format!("{} too large to encode ({} entries/bytes)", what, len))
    })?;
    buf.put_u32_le(len);
    Ok(())
}

fn value_payload(value: &TypedValue) -> Result<BytesMut> {
    let mut out = BytesMut::new();
    match value {
        TypedValue::Null => {}
        TypedValue::Bool(b) => out.put_u8(u8::from(*b)),
        TypedValue::I8(v) => out.put_i8(*v),
        TypedValue::I16(v) => out.put_i16_le(*v),
        TypedValue::I32(v) => out.put_i32_le(*v),
        TypedValue::I64(v) => out.put_i64_le(*v),
        TypedValue::U8(v) => out.put_u8(*v),
        TypedValue::U16(v) => out.put_u16_le(*v),
        TypedValue::U32(v) => out.put_u32_le(*v),
        TypedValue::U64(v) => out.put_u64_le(*v),
        TypedValue::F16(v) => out.put_u16_le(v.to_bits()),
        TypedValue::F32(v) => out.put_u32_le(v.to_bits()),
        TypedValue::F64(v) => out.put_u64_le(v.to_bits()),
        TypedValue::Decimal(d) => out.put_slice(d.to_string().as_bytes()),
        TypedValue::Str(s) => out.put_slice(s.as_bytes()),
        TypedValue::Bytes(b) => out.put_slice(b),
        TypedValue::Timestamp(dt) => {
            let utc = dt.and_utc();
            out.put_i64_le(utc.timestamp());
            out.put_u32_le(utc.timestamp_subsec_nanos());
        }
        TypedValue::TimestampTz(dt) => {
            out.put_i32_le(dt.offset().local_minus_utc());
            out.put_i64_le(dt.timestamp());
            out.put_u32_le(dt.timestamp_subsec_nanos());
        }
        TypedValue::Time(t) => {
            out.put_u32_le(t.num_seconds_from_midnight());
            out.put_u32_le(t.nanosecond());
        }
        TypedValue::TimeTz(zoned) => {
            out.put_i32_le(zoned.offset.local_minus_utc());
            out.put_u32_le(zoned.time.num_seconds_from_midnight());
            out.put_u32_le(zoned.time.nanosecond());
        }
        TypedValue::Duration(delta) => {
            let (days, seconds, nanos) = split_duration(*delta);
            out.put_i64_le(days);
            out.put_u32_le(seconds);
            out.put_u32_le(nanos);
        }
        TypedValue::DurationNs(ns) => out.put_i64_le(*ns),
    }
    Ok(out)
}
