//! Photoshop Action Descriptor Parser
//!
//! Parses the binary descriptor format stored in the `desc` section of
//! modern ABR files. Only the structure is decoded; interpreting keys is
//! left to the caller.

use std::io::{Read, Seek};

use indexmap::IndexMap;

use super::cursor::ByteCursor;
use super::error::AbrError;

/// Deepest descriptor nesting accepted before the data is treated as corrupt
const MAX_DEPTH: usize = 32;

/// Descriptor with its class ID and items in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptor {
    pub class_id: String,
    pub items: IndexMap<String, DescriptorValue>,
}

impl Descriptor {
    pub fn get(&self, key: &str) -> Option<&DescriptorValue> {
        self.items.get(key)
    }

    /// String item, if `key` holds text
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.items.get(key) {
            Some(DescriptorValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Numeric item regardless of its storage type
    pub fn get_number(&self, key: &str) -> Option<f64> {
        match self.items.get(key)? {
            DescriptorValue::UnitFloat { value, .. } | DescriptorValue::Double(value) => {
                Some(*value)
            }
            DescriptorValue::Integer(v) => Some(f64::from(*v)),
            DescriptorValue::LargeInteger(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn get_descriptor(&self, key: &str) -> Option<&Descriptor> {
        match self.items.get(key) {
            Some(DescriptorValue::Descriptor(d)) => Some(d),
            _ => None,
        }
    }

    pub fn get_list(&self, key: &str) -> Option<&[DescriptorValue]> {
        match self.items.get(key) {
            Some(DescriptorValue::List(l)) => Some(l),
            _ => None,
        }
    }
}

/// Descriptor value types
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorValue {
    Descriptor(Descriptor),
    List(Vec<DescriptorValue>),
    Double(f64),
    UnitFloat {
        unit: String,
        value: f64,
    },
    UnitFloats {
        unit: String,
        values: Vec<f64>,
    },
    String(String),
    Boolean(bool),
    Integer(i32),
    LargeInteger(i64),
    Enum {
        type_id: String,
        value: String,
    },
    Class {
        name: String,
        class_id: String,
    },
    RawData(Vec<u8>),
    Reference,
}

/// Parse a versioned descriptor, as found at the top of a `desc` section
pub fn parse_descriptor<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
) -> Result<Descriptor, AbrError> {
    let version = cursor.read_u32()?;
    if version != 16 {
        return Err(AbrError::Corrupt(format!(
            "Unknown descriptor version: {}",
            version
        )));
    }
    parse_body(cursor, 0)
}

/// Key or class ID: 4-byte length, or a 4-byte code when the length is 0
fn read_key<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<String, AbrError> {
    let len = cursor.read_u32()?;
    let len = if len == 0 { 4 } else { len as usize };
    let remaining = cursor.len().saturating_sub(cursor.position()?);
    if len as u64 > remaining {
        return Err(AbrError::Corrupt(format!("Key length {} exceeds data", len)));
    }
    let mut key = vec![0u8; len];
    cursor.read_exact(&mut key)?;
    Ok(String::from_utf8_lossy(&key).into_owned())
}

fn read_type<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<String, AbrError> {
    let tag = cursor.read_tag()?;
    Ok(String::from_utf8_lossy(&tag).into_owned())
}

fn read_length_prefixed<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Vec<u8>, AbrError> {
    let len = cursor.read_u32()? as u64;
    let remaining = cursor.len().saturating_sub(cursor.position()?);
    if len > remaining {
        return Err(AbrError::Corrupt(format!("Data length {} exceeds data", len)));
    }
    let mut data = vec![0u8; len as usize];
    cursor.read_exact(&mut data)?;
    Ok(data)
}

/// Name, class ID and items; nested objects carry no version prefix
fn parse_body<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    depth: usize,
) -> Result<Descriptor, AbrError> {
    if depth > MAX_DEPTH {
        return Err(AbrError::Corrupt("Descriptor nesting too deep".into()));
    }

    let _name = cursor.read_unicode_string()?;
    let class_id = read_key(cursor)?;

    let count = cursor.read_u32()?;
    let mut items = IndexMap::new();

    for _ in 0..count {
        let key = read_key(cursor)?;
        let value_type = read_type(cursor)?;
        let value = parse_value(cursor, &value_type, depth)?;
        items.insert(key, value);
    }

    Ok(Descriptor { class_id, items })
}

/// Parse a value based on its type code
fn parse_value<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    value_type: &str,
    depth: usize,
) -> Result<DescriptorValue, AbrError> {
    match value_type {
        "Objc" | "GlbO" => Ok(DescriptorValue::Descriptor(parse_body(cursor, depth + 1)?)),
        "VlLs" => {
            let count = cursor.read_u32()?;
            let mut list = Vec::new();
            for _ in 0..count {
                let item_type = read_type(cursor)?;
                list.push(parse_value(cursor, &item_type, depth + 1)?);
            }
            Ok(DescriptorValue::List(list))
        }
        "doub" | "Doub" => Ok(DescriptorValue::Double(cursor.read_f64()?)),
        "UntF" => {
            // e.g. '#Prc' (percent), '#Pxl' (pixels)
            let unit = read_type(cursor)?;
            let value = cursor.read_f64()?;
            Ok(DescriptorValue::UnitFloat { unit, value })
        }
        "UnFl" => {
            let unit = read_type(cursor)?;
            let count = cursor.read_u32()?;
            let mut values = Vec::new();
            for _ in 0..count {
                values.push(cursor.read_f64()?);
            }
            Ok(DescriptorValue::UnitFloats { unit, values })
        }
        "TEXT" => Ok(DescriptorValue::String(cursor.read_unicode_string()?)),
        "bool" => Ok(DescriptorValue::Boolean(cursor.read_u8()? != 0)),
        "long" => Ok(DescriptorValue::Integer(cursor.read_i32()?)),
        "comp" | "Comp" => {
            let high = cursor.read_u32()? as u64;
            let low = cursor.read_u32()? as u64;
            Ok(DescriptorValue::LargeInteger(((high << 32) | low) as i64))
        }
        "enum" => {
            let type_id = read_key(cursor)?;
            let value = read_key(cursor)?;
            Ok(DescriptorValue::Enum { type_id, value })
        }
        "type" | "GlbC" => {
            let name = cursor.read_unicode_string()?;
            let class_id = read_key(cursor)?;
            Ok(DescriptorValue::Class { name, class_id })
        }
        "obj " => {
            skip_reference(cursor)?;
            Ok(DescriptorValue::Reference)
        }
        "tdta" | "alis" => Ok(DescriptorValue::RawData(read_length_prefixed(cursor)?)),
        _ => Err(AbrError::Corrupt(format!(
            "Unknown descriptor value type: {}",
            value_type
        ))),
    }
}

/// Consume a reference structure without keeping it
fn skip_reference<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<(), AbrError> {
    let count = cursor.read_u32()?;
    for _ in 0..count {
        let ref_type = read_type(cursor)?;
        match ref_type.as_str() {
            "prop" => {
                let _class = cursor.read_unicode_string()?;
                let _class_id = read_key(cursor)?;
                let _key = read_key(cursor)?;
            }
            "Clss" => {
                let _name = cursor.read_unicode_string()?;
                let _class_id = read_key(cursor)?;
            }
            "Enmr" => {
                let _class = cursor.read_unicode_string()?;
                let _class_id = read_key(cursor)?;
                let _type_id = read_key(cursor)?;
                let _value = read_key(cursor)?;
            }
            "rele" => {
                let _class = cursor.read_unicode_string()?;
                let _class_id = read_key(cursor)?;
                let _offset = cursor.read_u32()?;
            }
            "name" => {
                let _class = cursor.read_unicode_string()?;
                let _class_id = read_key(cursor)?;
                let _value = cursor.read_unicode_string()?;
            }
            "Idnt" | "indx" => {
                let _value = cursor.read_u32()?;
            }
            other => {
                return Err(AbrError::Corrupt(format!(
                    "Unknown reference type: {}",
                    other
                )));
            }
        }
    }
    Ok(())
}
