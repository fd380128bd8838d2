//! Codec Module
//!
//! Binary encoding for records and record sets.
//!
//! # Layout
//! ```text
//! payload  := "MC" version:u8 kind:u8 body
//! body     := record            (kind = 'R')
//!           | count:u32 record* (kind = 'S')
//! record   := count:u32 (name_len:u32 name value)*
//! value    := tag:u8 len:u32 bytes[len]
//! ```
//! Integers are little-endian. Floats are stored as raw bits, decimals as
//! their exact text, zoned timestamps as offset + UTC instant.

mod reader;
mod tag;
mod writer;


use tracing::debug;

use crate::error::{CacheError, Result};
use crate::value::{Payload, Record, RecordSet};

use reader::Reader;
use writer::Writer;

pub use tag::Tag;

// == Format Constants ==
/// Leading bytes of every encoded payload
pub const MAGIC: [u8; 2] = *b"MC";

/// Current format version
pub const VERSION: u8 = 1;

const KIND_RECORD: u8 = b'R';
const KIND_RECORD_SET: u8 = b'S';

// == Encode ==
/// Encodes a single record.
pub fn encode_record(record: &Record) -> Result<Vec<u8>> {
    let mut writer = Writer::new(KIND_RECORD);
    writer.put_record(record)?;
    Ok(writer.finish())
}

/// Encodes a record set.
pub fn encode_record_set(records: &RecordSet) -> Result<Vec<u8>> {
    let mut writer = Writer::new(KIND_RECORD_SET);
    writer.put_record_set(records)?;
    Ok(writer.finish())
}

/// Encodes either payload kind.
pub fn encode(payload: &Payload) -> Result<Vec<u8>> {
    match payload {
        Payload::Record(record) => encode_record(record),
        Payload::Records(records) => encode_record_set(records),
    }
}

// == Decode ==
/// Decodes bytes produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Payload> {
    let mut reader = Reader::new(bytes);

    let magic = [reader.u8("magic")?, reader.u8("magic")?];
    if magic != MAGIC {
        return Err(CacheError::Decode(format!("bad magic {:02x?}", magic)));
    }
    let version = reader.u8("version")?;
    if version != VERSION {
        return Err(CacheError::Decode(format!(
            "unsupported format version {} (expected {})",
            version, VERSION
        )));
    }

    let payload = match reader.u8("payload kind")? {
        KIND_RECORD => Payload::Record(reader.record()?),
        KIND_RECORD_SET => Payload::Records(reader.record_set()?),
        other => {
            return Err(CacheError::Decode(format!("unknown payload kind {:#04x}", other)));
        }
    };
    reader.finish("payload")?;

    debug!(bytes = bytes.len(), "Decoded cache payload");
    Ok(payload)
}

// == Cacheable ==
/// Result types a cache wrapper can store and restore.
pub trait Cacheable: Sized {
    fn encode(&self) -> Result<Vec<u8>>;
    fn decode(bytes: &[u8]) -> Result<Self>;
}

impl Cacheable for Payload {
    fn encode(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        decode(bytes)
    }
}

impl Cacheable for Record {
    fn encode(&self) -> Result<Vec<u8>> {
        encode_record(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        match decode(bytes)? {
            Payload::Record(record) => Ok(record),
            Payload::Records(_) => Err(CacheError::Decode(
                "expected a record, found a record set".to_string(),
            )),
        }
    }
}

impl Cacheable for RecordSet {
    fn encode(&self) -> Result<Vec<u8>> {
        encode_record_set(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        match decode(bytes)? {
            Payload::Records(records) => Ok(records),
            Payload::Record(_) => Err(CacheError::Decode(
                "expected a record set, found a record".to_string(),
            )),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{TypedValue, ZonedTime};
    use chrono::{FixedOffset, NaiveDate, TimeDelta, TimeZone};
    use half::f16;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn sample_record() -> Record {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let dt = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_micro_opt(1, 1, 1, 1)
            .unwrap();

        Record::new()
            .with("bool", true)
            .with("int", 1i64)
            .with("int8", -8i8)
            .with("uint", 5u64)
            .with("half", f16::from_f32(1.5))
            .with("float32", 4.4f32)
            .with("float", 1.1f64)
            .with("decimal", Decimal::from_str("3.30").unwrap())
            .with("str", "STRING")
            .with("bytes", b"BYTES".to_vec())
            .with("datetime", dt)
            .with("datetime_tz", tz.from_local_datetime(&dt).unwrap())
            .with("time", dt.time())
            .with("time_tz", ZonedTime::new(dt.time(), tz))
            .with("timedelta", TimeDelta::days(1))
            .with("timedelta64", TypedValue::DurationNs(1_500))
            .with("None", TypedValue::Null)
    }

    #[test]
    fn test_record_roundtrip() {
        let record = sample_record();
        let bytes = encode_record(&record).unwrap();
        assert_eq!(decode(&bytes).unwrap(), Payload::Record(record));
    }

    #[test]
    fn test_record_set_roundtrip() {
        let records: RecordSet = (0..100).map(|_| sample_record()).collect();
        let bytes = encode_record_set(&records).unwrap();
        assert_eq!(RecordSet::decode(&bytes).unwrap(), records);
    }

    #[test]
    fn test_empty_record_set_roundtrip() {
        let bytes = encode_record_set(&RecordSet::new()).unwrap();
        let decoded = RecordSet::decode(&bytes).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_decimal_keeps_scale() {
        let record = Record::new().with("d", Decimal::from_str("3.30").unwrap());
        let decoded = Record::decode(&encode_record(&record).unwrap()).unwrap();
        match decoded.get("d") {
            Some(TypedValue::Decimal(d)) => {
                assert_eq!(d.to_string(), "3.30");
                assert_eq!(d.scale(), 2);
            }
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_zoned_timestamp_keeps_offset() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let dt = tz.with_ymd_and_hms(2023, 1, 1, 1, 1, 1).unwrap();
        let record = Record::new().with("ts", dt);

        let decoded = Record::decode(&encode_record(&record).unwrap()).unwrap();
        match decoded.get("ts") {
            Some(TypedValue::TimestampTz(restored)) => {
                assert_eq!(*restored, dt);
                assert_eq!(restored.offset().local_minus_utc(), 8 * 3600);
                assert_eq!(restored.to_rfc3339(), "2023-01-01T01:01:01+08:00");
            }
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_float_width_preserved() {
        let record = Record::new()
            .with("h", f16::from_f32(0.5))
            .with("s", 0.5f32)
            .with("d", 0.5f64);
        let decoded = Record::decode(&encode_record(&record).unwrap()).unwrap();
        assert!(matches!(decoded.get("h"), Some(TypedValue::F16(_))));
        assert!(matches!(decoded.get("s"), Some(TypedValue::F32(_))));
        assert!(matches!(decoded.get("d"), Some(TypedValue::F64(_))));
    }

    #[test]
    fn test_kind_mismatch_is_decode_error() {
        let bytes = encode_record(&sample_record()).unwrap();
        assert!(matches!(RecordSet::decode(&bytes), Err(CacheError::Decode(_))));

        let bytes = encode_record_set(&RecordSet::new()).unwrap();
        assert!(matches!(Record::decode(&bytes), Err(CacheError::Decode(_))));
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let bytes = encode_record(&sample_record()).unwrap();
        for cut in [0, 1, 3, 4, 8, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                matches!(decode(&bytes[..cut]), Err(CacheError::Decode(_))),
                "cut at {} should fail",
                cut
            );
        }
    }

    #[test]
    fn test_bad_header_rejected() {
        let mut bytes = encode_record(&sample_record()).unwrap();
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(CacheError::Decode(_))));

        let mut bytes = encode_record(&sample_record()).unwrap();
        bytes[2] = VERSION + 1;
        assert!(matches!(decode(&bytes), Err(CacheError::Decode(_))));

        let mut bytes = encode_record(&sample_record()).unwrap();
        bytes[3] = b'Q';
        assert!(matches!(decode(&bytes), Err(CacheError::Decode(_))));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode_record(&sample_record()).unwrap();
        bytes.push(0);
        assert!(matches!(decode(&bytes), Err(CacheError::Decode(_))));
    }
}
