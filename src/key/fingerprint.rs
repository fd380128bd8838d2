//! Canonical text rendering of argument values.
//!
//! `i64`, `f64`, `bool`, strings and null render bare; every other variant
//! renders as `kind(value)` so that equal digits of different widths never
//! collide.

use std::fmt::Write;

use chrono::SecondsFormat;

use crate::value::{split_duration, TypedValue};

pub(crate) fn render(value: &TypedValue) -> String {
    match value {
        TypedValue::Null => "null".to_string(),
        TypedValue::Bool(b) => b.to_string(),
        TypedValue::I64(v) => v.to_string(),
        TypedValue::F64(v) => format!("{:?}", v),
        TypedValue::Str(s) => format!("{:?}", s),
        TypedValue::I8(v) => tagged(value, v),
        TypedValue::I16(v) => tagged(value, v),
        TypedValue::I32(v) => tagged(value, v),
        TypedValue::U8(v) => tagged(value, v),
        TypedValue::U16(v) => tagged(value, v),
        TypedValue::U32(v) => tagged(value, v),
        TypedValue::U64(v) => tagged(value, v),
        TypedValue::F16(v) => tagged(value, format!("{:?}", v.to_f32())),
        TypedValue::F32(v) => tagged(value, format!("{:?}", v)),
        // 3.3 and 3.30 are the same argument
        TypedValue::Decimal(d) => tagged(value, d.normalize()),
        TypedValue::Bytes(bytes) => {
            let mut hex = String::with_capacity(bytes.len() * 2);
            for byte in bytes {
                let _ = write!(hex, "{:02x}", byte);
            }
            tagged(value, hex)
        }
        TypedValue::Timestamp(dt) => tagged(value, dt.format("%Y-%m-%dT%H:%M:%S%.f")),
        TypedValue::TimestampTz(dt) => {
            tagged(value, dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
        }
        TypedValue::Time(t) => tagged(value, t.format("%H:%M:%S%.f")),
        TypedValue::TimeTz(zoned) => tagged(value, zoned),
        TypedValue::Duration(delta) => {
            let (days, seconds, nanos) = split_duration(*delta);
            tagged(value, format!("{}d{}s{}ns", days, seconds, nanos))
        }
        TypedValue::DurationNs(ns) => tagged(value, format!("{}ns", ns)),
    }
}

fn tagged(value: &TypedValue, body: impl std::fmt::Display) -> String {
    format!("{}({})", value.kind(), body)
}
