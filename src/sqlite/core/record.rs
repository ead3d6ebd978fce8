//! SQLite record format.
//!
//! A record is a header followed by a body. The header starts with a varint
//! giving the total header size in bytes, followed by one serial-type varint
//! per column. Body bytes follow in column order; serial types 0, 8 and 9
//! contribute no body bytes.
//!
//! Serial types:
//!
//! - 0: NULL
//! - 1-6: big-endian signed integer of 1, 2, 3, 4, 6, 8 bytes
//! - 7: IEEE 754 64-bit float
//! - 8 / 9: the integer constants 0 and 1
//! - 10, 11: reserved, never produced by a conforming writer
//! - N >= 12, even: BLOB of (N-12)/2 bytes
//! - N >= 13, odd: text of (N-13)/2 bytes

use crate::error::{Error, Result};
use crate::sqlite::core::bytes::ByteReader;

/// Serial type of one column inside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialType {
    Null,
    Int8,
    Int16,
    Int24,
    Int32,
    Int48,
    Int64,
    Float64,
    Zero,
    One,
    Blob(usize),
    Text(usize),
}

impl SerialType {
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(Self::Null),
            1 => Ok(Self::Int8),
            2 => Ok(Self::Int16),
            3 => Ok(Self::Int24),
            4 => Ok(Self::Int32),
            5 => Ok(Self::Int48),
            6 => Ok(Self::Int64),
            7 => Ok(Self::Float64),
            8 => Ok(Self::Zero),
            9 => Ok(Self::One),
            10 | 11 => Err(Error::malformed(format!("reserved serial type {code}"))),
            n if n >= 12 && n % 2 == 0 => Ok(Self::Blob(((n - 12) / 2) as usize)),
            n if n >= 13 => Ok(Self::Text(((n - 13) / 2) as usize)),
            n => Err(Error::malformed(format!("unknown serial type {n}"))),
        }
    }

    /// Number of body bytes the value occupies.
    pub fn body_size(&self) -> usize {
        match *self {
            Self::Null | Self::Zero | Self::One => 0,
            Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int24 => 3,
            Self::Int32 => 4,
            Self::Int48 => 6,
            Self::Int64 => 8,
            Self::Float64 => 8,
            Self::Blob(len) | Self::Text(len) => len,
        }
    }
}

/// A decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

/// One row of decoded column values.
pub type Row = Vec<Value>;

/// A fully decoded record: the values and their serial types, in column
/// order.
#[derive(Debug)]
pub struct Record {
    values: Vec<Value>,
    types: Vec<SerialType>,
}

impl Record {
    /// Decodes a record from a reassembled payload buffer.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(payload);

        let start = reader.position();
        let header_size = reader.read_varint()?;
        if header_size < 0 || header_size as usize > payload.len() {
            return Err(Error::malformed(format!(
                "record header size {} exceeds payload of {} bytes",
                header_size,
                payload.len()
            )));
        }

        let mut types = Vec::new();
        while reader.position() - start < header_size as usize {
            let code = reader.read_varint()?;
            types.push(SerialType::from_code(code)?);
        }

        // The serial-type varints must consume exactly the declared header.
        if reader.position() - start != header_size as usize {
            return Err(Error::malformed(
                "record header size disagrees with serial type varints",
            ));
        }

        let mut values = Vec::with_capacity(types.len());
        for &serial_type in &types {
            values.push(Self::read_value(&mut reader, serial_type)?);
        }

        Ok(Self { values, types })
    }

    fn read_value(reader: &mut ByteReader, serial_type: SerialType) -> Result<Value> {
        let value = match serial_type {
            SerialType::Null => Value::Null,
            SerialType::Int8 => Value::Integer(reader.read_int(1)?),
            SerialType::Int16 => Value::Integer(reader.read_int(2)?),
            SerialType::Int24 => Value::Integer(reader.read_int(3)?),
            SerialType::Int32 => Value::Integer(reader.read_int(4)?),
            SerialType::Int48 => Value::Integer(reader.read_int(6)?),
            SerialType::Int64 => Value::Integer(reader.read_int(8)?),
            SerialType::Float64 => Value::Float(reader.read_f64()?),
            SerialType::Zero => Value::Integer(0),
            SerialType::One => Value::Integer(1),
            SerialType::Blob(len) => Value::Blob(reader.read_bytes(len)?.to_vec()),
            SerialType::Text(len) => {
                let bytes = reader.read_bytes(len)?;
                let text = String::from_utf8(bytes.to_vec())
                    .map_err(|_| Error::malformed("text value is not valid UTF-8"))?;
                Value::Text(text)
            }
        };
        Ok(value)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn types(&self) -> &[SerialType] {
        &self.types
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
