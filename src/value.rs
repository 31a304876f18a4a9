// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/value.rs - Field types and decoded values of s3g/x3g commands.
 *  Copyright (C) 2026  Forest Crossman <cyrozap@gmail.com>
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::fmt;

/// A little-endian field of a fixed command layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
}

impl Field {
    /// Size of the field in bytes.
    pub const fn width(self) -> usize {
        match self {
            Field::U8 | Field::I8 => 1,
            Field::U16 | Field::I16 => 2,
            Field::U32 | Field::I32 | Field::F32 => 4,
        }
    }

    /// Decodes one field from the start of `bytes`, which must hold at least
    /// [Field::width] bytes.
    fn decode(self, bytes: &[u8]) -> Value {
        match self {
            Field::U8 => Value::Int(bytes[0].into()),
            Field::I8 => Value::Int((bytes[0] as i8).into()),
            Field::U16 => Value::Int(u16::from_le_bytes([bytes[0], bytes[1]]).into()),
            Field::I16 => Value::Int(i16::from_le_bytes([bytes[0], bytes[1]]).into()),
            Field::U32 => Value::Int(u32::from_le_bytes(le32(bytes)).into()),
            Field::I32 => Value::Int(i32::from_le_bytes(le32(bytes)).into()),
            Field::F32 => Value::Float(f32::from_bits(u32::from_le_bytes(le32(bytes)))),
        }
    }
}

fn le32(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

/// Total width in bytes of a sequence of fields.
pub const fn layout_width(fields: &[Field]) -> usize {
    let mut width = 0;
    let mut i = 0;
    while i < fields.len() {
        width += fields[i].width();
        i += 1;
    }
    width
}

/// Decodes `fields` in order from `bytes`. The caller guarantees that
/// `bytes` is exactly [layout_width] bytes long.
pub fn unmarshal(fields: &[Field], bytes: &[u8]) -> Vec<Value> {
    let mut values = Vec::with_capacity(fields.len());
    let mut pos = 0;
    for field in fields {
        values.push(field.decode(&bytes[pos..]));
        pos += field.width();
    }
    values
}

/// A single decoded value of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f32),
    Str(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// The value as an integer. Floats are truncated, text and raw bytes
    /// count as 0.
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Int(n) => *n,
            Value::Float(f) => *f as i64,
            Value::Str(_) | Value::Bytes(_) => 0,
        }
    }

    pub fn as_float(&self) -> f64 {
        match self {
            Value::Int(n) => *n as f64,
            Value::Float(f) => f64::from(*f),
            Value::Str(_) | Value::Bytes(_) => 0.0,
        }
    }

    pub fn is_nonzero(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bytes(b) => b.iter().any(|&byte| byte != 0),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
            Value::Bytes(bytes) => {
                for (i, byte) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
        }
    }
}

// Inverse of unmarshal, for building test streams
#[cfg(test)]
pub(crate) fn marshal(fields: &[Field], values: &[Value]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(layout_width(fields));
    for (field, value) in fields.iter().zip(values) {
        let n = value.as_int();
        match field {
            Field::U8 => bytes.push(n as u8),
            Field::I8 => bytes.push(n as i8 as u8),
            Field::U16 => bytes.extend((n as u16).to_le_bytes()),
            Field::I16 => bytes.extend((n as i16).to_le_bytes()),
            Field::U32 => bytes.extend((n as u32).to_le_bytes()),
            Field::I32 => bytes.extend((n as i32).to_le_bytes()),
            Field::F32 => match value {
                Value::Float(x) => bytes.extend(x.to_bits().to_le_bytes()),
                _ => bytes.extend((n as f32).to_le_bytes()),
            },
        }
    }
    bytes
}
