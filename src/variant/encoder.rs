//! Builds Variant binary values from `serde_json` documents.
//!
//! The encoder always emits the most compact layout: integers take the
//! narrowest fitting width, and every offset or id table uses the minimum byte
//! width able to address its contents.

use hashbrown::{HashMap, HashSet};
use serde_json::Value as JsonValue;

use crate::error::VariantError;
use crate::types::variant_type::primitive_id;
use crate::types::BasicType;
use crate::utils::{min_width_for, write_le_uint};
use crate::variant::metadata::SUPPORTED_VERSION;
use crate::variant::owned::VariantValue;

/// Strings shorter than this use the one-byte short-string header.
const MAX_SHORT_STRING_LEN: usize = 63;
/// Containers with more children than this need a 4-byte element count.
const MAX_SMALL_CONTAINER_LEN: usize = 0xFF;

#[derive(Debug, Clone)]
pub struct VariantEncoder {
    sorted_keys: bool,
}

impl Default for VariantEncoder {
    fn default() -> Self {
        Self { sorted_keys: true }
    }
}

impl VariantEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the metadata dictionary is written sorted (and flagged as such)
    /// or in first-seen order.
    pub fn sorted_keys(mut self, sorted: bool) -> Self {
        self.sorted_keys = sorted;
        self
    }

    pub fn encode(&self, document: &JsonValue) -> Result<VariantValue, VariantError> {
        let mut keys = Vec::new();
        collect_keys(document, &mut keys, &mut HashSet::new());
        if self.sorted_keys {
            keys.sort_unstable();
        }

        let dictionary: HashMap<&str, usize> =
            keys.iter().enumerate().map(|(id, key)| (*key, id)).collect();
        let metadata = build_metadata(&keys, self.sorted_keys)?;

        let mut value = Vec::new();
        write_value(document, &dictionary, &mut value)?;
        Ok(VariantValue::new(metadata, value))
    }
}

/// Encodes `document` with the default (sorted dictionary) settings.
pub fn encode_json(document: &JsonValue) -> Result<VariantValue, VariantError> {
    VariantEncoder::default().encode(document)
}

//==================================================================================
// Metadata
//==================================================================================

fn collect_keys<'v>(value: &'v JsonValue, keys: &mut Vec<&'v str>, seen: &mut HashSet<&'v str>) {
    match value {
        JsonValue::Object(map) => {
            for (key, child) in map {
                if seen.insert(key.as_str()) {
                    keys.push(key.as_str());
                }
                collect_keys(child, keys, seen);
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                collect_keys(item, keys, seen);
            }
        }
        _ => {}
    }
}

fn build_metadata(keys: &[&str], sorted: bool) -> Result<Vec<u8>, VariantError> {
    let string_bytes: usize = keys.iter().map(|k| k.len()).sum();
    check_u32("Metadata dictionary", string_bytes.max(keys.len()))?;
    let offset_size = min_width_for(string_bytes.max(keys.len()));

    let mut header = SUPPORTED_VERSION | ((offset_size as u8 - 1) << 6);
    if sorted {
        header |= 0b0001_0000;
    }

    let mut metadata = Vec::with_capacity(1 + (keys.len() + 2) * offset_size + string_bytes);
    metadata.push(header);
    write_le_uint(&mut metadata, keys.len(), offset_size);
    let mut offset = 0;
    write_le_uint(&mut metadata, offset, offset_size);
    for key in keys {
        offset += key.len();
        write_le_uint(&mut metadata, offset, offset_size);
    }
    for key in keys {
        metadata.extend_from_slice(key.as_bytes());
    }
    Ok(metadata)
}

//==================================================================================
// Values
//==================================================================================

fn write_value(
    value: &JsonValue,
    dictionary: &HashMap<&str, usize>,
    out: &mut Vec<u8>,
) -> Result<(), VariantError> {
    match value {
        JsonValue::Null => out.push(primitive_header(primitive_id::NULL)),
        JsonValue::Bool(true) => out.push(primitive_header(primitive_id::TRUE)),
        JsonValue::Bool(false) => out.push(primitive_header(primitive_id::FALSE)),
        JsonValue::Number(number) => match number.as_i64() {
            Some(int) => write_integer(int, out),
            None => {
                let double = number.as_f64().ok_or_else(|| {
                    VariantError::InvalidArgument(format!("Number {} has no f64 form", number))
                })?;
                out.push(primitive_header(primitive_id::DOUBLE));
                out.extend_from_slice(&double.to_le_bytes());
            }
        },
        JsonValue::String(text) => write_string(text, out)?,
        JsonValue::Array(items) => {
            let mut children = Vec::with_capacity(items.len());
            for item in items {
                let mut child = Vec::new();
                write_value(item, dictionary, &mut child)?;
                children.push(child);
            }
            write_container(BasicType::Array, None, &children, out)?;
        }
        JsonValue::Object(map) => {
            let mut fields: Vec<(&str, &JsonValue)> =
                map.iter().map(|(k, v)| (k.as_str(), v)).collect();
            fields.sort_unstable_by(|a, b| a.0.cmp(b.0));

            let mut ids = Vec::with_capacity(fields.len());
            let mut children = Vec::with_capacity(fields.len());
            for (key, child_value) in fields {
                let id = *dictionary.get(key).ok_or_else(|| {
                    VariantError::InternalError(format!("Key '{}' missing from dictionary", key))
                })?;
                let mut child = Vec::new();
                write_value(child_value, dictionary, &mut child)?;
                ids.push(id);
                children.push(child);
            }
            let id_size = min_width_for(dictionary.len().saturating_sub(1));
            write_container(BasicType::Object, Some((ids.as_slice(), id_size)), &children, out)?;
        }
    }
    Ok(())
}

fn primitive_header(id: u8) -> u8 {
    (id << 2) | BasicType::Primitive.tag()
}

fn write_integer(int: i64, out: &mut Vec<u8>) {
    if let Ok(v) = i8::try_from(int) {
        out.push(primitive_header(primitive_id::INT8));
        out.extend_from_slice(&v.to_le_bytes());
    } else if let Ok(v) = i16::try_from(int) {
        out.push(primitive_header(primitive_id::INT16));
        out.extend_from_slice(&v.to_le_bytes());
    } else if let Ok(v) = i32::try_from(int) {
        out.push(primitive_header(primitive_id::INT32));
        out.extend_from_slice(&v.to_le_bytes());
    } else {
        out.push(primitive_header(primitive_id::INT64));
        out.extend_from_slice(&int.to_le_bytes());
    }
}

fn write_string(text: &str, out: &mut Vec<u8>) -> Result<(), VariantError> {
    let len = text.len();
    if len <= MAX_SHORT_STRING_LEN {
        out.push(((len as u8) << 2) | BasicType::ShortString.tag());
    } else {
        check_u32("String", len)?;
        out.push(primitive_header(primitive_id::STRING));
        out.extend_from_slice(&(len as u32).to_le_bytes());
    }
    out.extend_from_slice(text.as_bytes());
    Ok(())
}

/// Writes an object (when `ids` is given) or an array from pre-encoded children.
fn write_container(
    basic_type: BasicType,
    ids: Option<(&[usize], usize)>,
    children: &[Vec<u8>],
    out: &mut Vec<u8>,
) -> Result<(), VariantError> {
    let data_size: usize = children.iter().map(Vec::len).sum();
    check_u32("Container", data_size)?;
    let offset_size = min_width_for(data_size);
    let is_large = children.len() > MAX_SMALL_CONTAINER_LEN;
    let count_size = if is_large { 4 } else { 1 };

    let value_header = match ids {
        Some((_, id_size)) => {
            (offset_size as u8 - 1) | ((id_size as u8 - 1) << 2) | ((is_large as u8) << 4)
        }
        None => (offset_size as u8 - 1) | ((is_large as u8) << 2),
    };
    out.push((value_header << 2) | basic_type.tag());
    write_le_uint(out, children.len(), count_size);

    if let Some((ids, id_size)) = ids {
        for id in ids {
            write_le_uint(out, *id, id_size);
        }
    }

    let mut offset = 0;
    write_le_uint(out, offset, offset_size);
    for child in children {
        offset += child.len();
        write_le_uint(out, offset, offset_size);
    }
    for child in children {
        out.extend_from_slice(child);
    }
    Ok(())
}

fn check_u32(what: &str, size: usize) -> Result<(), VariantError> {
    if size > u32::MAX as usize {
        return Err(VariantError::InvalidArgument(format!(
            "{} of {} bytes exceeds the 4-byte Variant size limit",
            what, size
        )));
    }
    Ok(())
}
