//! Entry metadata attributes: a typed key/value pair carried in the
//! EntryHeader's variable region.
//!
//! Wire format is a single byte-array value with a discriminator tag
//! (spec.md §3/§9); [`AttributeValue`] is the ergonomic sum-type view over
//! that tag the Design Notes call out as optional but worthwhile.

use crate::error::{ApackError, Result};
use crate::format::constants::*;
use crate::primitives::{check_range, ByteReader, ByteWriter};

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Int64(i64),
    Float64(f64),
    Boolean(bool),
    Bytes(Vec<u8>),
}

impl AttributeValue {
    fn type_tag(&self) -> u8 {
        match self {
            AttributeValue::String(_) => ATTR_TYPE_STRING,
            AttributeValue::Int64(_) => ATTR_TYPE_INT64,
            AttributeValue::Float64(_) => ATTR_TYPE_FLOAT64,
            AttributeValue::Boolean(_) => ATTR_TYPE_BOOLEAN,
            AttributeValue::Bytes(_) => ATTR_TYPE_BYTES,
        }
    }

    fn encode(&self) -> Vec<u8> {
        match self {
            AttributeValue::String(s) => s.as_bytes().to_vec(),
            AttributeValue::Int64(v) => v.to_le_bytes().to_vec(),
            AttributeValue::Float64(v) => v.to_le_bytes().to_vec(),
            AttributeValue::Boolean(v) => vec![if *v { 1 } else { 0 }],
            AttributeValue::Bytes(b) => b.clone(),
        }
    }

    fn decode(value_type: u8, bytes: &[u8]) -> Result<Self> {
        match value_type {
            ATTR_TYPE_STRING => Ok(AttributeValue::String(
                String::from_utf8(bytes.to_vec()).map_err(|e| ApackError::InvalidFormat {
                    offset: 0,
                    expected: b"utf-8",
                    found: e.into_bytes(),
                })?,
            )),
            ATTR_TYPE_INT64 => {
                if bytes.len() != 8 {
                    return Err(ApackError::InvalidFormat {
                        offset: 0,
                        expected: b"8 bytes",
                        found: bytes.to_vec(),
                    });
                }
                let mut arr = [0u8; 8];
                arr.copy_from_slice(bytes);
                Ok(AttributeValue::Int64(i64::from_le_bytes(arr)))
            }
            ATTR_TYPE_FLOAT64 => {
                if bytes.len() != 8 {
                    return Err(ApackError::InvalidFormat {
                        offset: 0,
                        expected: b"8 bytes",
                        found: bytes.to_vec(),
                    });
                }
                let mut arr = [0u8; 8];
                arr.copy_from_slice(bytes);
                Ok(AttributeValue::Float64(f64::from_le_bytes(arr)))
            }
            ATTR_TYPE_BOOLEAN => Ok(AttributeValue::Boolean(bytes.first().copied().unwrap_or(0) != 0)),
            ATTR_TYPE_BYTES => Ok(AttributeValue::Bytes(bytes.to_vec())),
            other => Err(ApackError::Unsupported(format!("attribute value_type {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: AttributeValue) -> Self {
        Self { key: key.into(), value }
    }

    pub fn get_string(&self) -> Result<&str> {
        match &self.value {
            AttributeValue::String(s) => Ok(s),
            _ => Err(ApackError::Unsupported(format!("attribute {} is not a string", self.key))),
        }
    }

    pub fn get_i64(&self) -> Result<i64> {
        match &self.value {
            AttributeValue::Int64(v) => Ok(*v),
            _ => Err(ApackError::Unsupported(format!("attribute {} is not an int64", self.key))),
        }
    }

    pub fn get_f64(&self) -> Result<f64> {
        match &self.value {
            AttributeValue::Float64(v) => Ok(*v),
            _ => Err(ApackError::Unsupported(format!("attribute {} is not a float64", self.key))),
        }
    }

    pub fn get_bool(&self) -> Result<bool> {
        match &self.value {
            AttributeValue::Boolean(v) => Ok(*v),
            _ => Err(ApackError::Unsupported(format!("attribute {} is not a boolean", self.key))),
        }
    }

    pub fn get_bytes(&self) -> Result<&[u8]> {
        match &self.value {
            AttributeValue::Bytes(b) => Ok(b),
            _ => Err(ApackError::Unsupported(format!("attribute {} is not bytes", self.key))),
        }
    }

    pub fn wire_len(&self) -> usize {
        2 + 1 + 1 + 4 + self.key.len() + self.value.encode().len()
    }

    pub fn write(&self, w: &mut ByteWriter) {
        let value_bytes = self.value.encode();
        w.write_u16(self.key.len() as u16);
        w.write_u8(self.value.type_tag());
        w.write_u8(0);
        w.write_i32(value_bytes.len() as i32);
        w.write_bytes(self.key.as_bytes());
        w.write_bytes(&value_bytes);
    }

    pub fn read(r: &mut ByteReader) -> Result<Self> {
        let key_len = r.read_u16()?;
        let value_type = r.read_u8()?;
        let _reserved = r.read_u8()?;
        let value_len = r.read_i32()?;
        check_range("attribute.value_len", value_len as i64, 0, MAX_CHUNK_SIZE)?;
        let key = r.read_utf8(key_len as usize)?;
        let value_bytes = r.read_bytes(value_len as usize)?;
        let value = AttributeValue::decode(value_type, value_bytes)?;
        Ok(Self { key, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_value_kind() {
        let attrs = vec![
            Attribute::new("title", AttributeValue::String("hi".into())),
            Attribute::new("count", AttributeValue::Int64(-42)),
            Attribute::new("ratio", AttributeValue::Float64(1.5)),
            Attribute::new("flag", AttributeValue::Boolean(true)),
            Attribute::new("blob", AttributeValue::Bytes(vec![1, 2, 3])),
        ];
        let mut w = ByteWriter::new();
        for a in &attrs {
            a.write(&mut w);
        }
        let bytes = w.into_vec();
        let mut r = ByteReader::new(&bytes);
        for expected in &attrs {
            let got = Attribute::read(&mut r).unwrap();
            assert_eq!(&got, expected);
        }
    }

    #[test]
    fn typed_accessor_fails_on_kind_mismatch() {
        let attr = Attribute::new("n", AttributeValue::Int64(1));
        assert!(attr.get_string().is_err());
    }
}
