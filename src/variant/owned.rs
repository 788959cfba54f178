//! Defines `VariantValue`, the owned and serializable form of a Variant.
//!
//! This is the form stored in a column cell and produced when a query asks for
//! a pass-through Variant result:
//!
//! ```text
//! [metadata_len: u32 LE][metadata bytes][value bytes]
//! ```

use chrono::FixedOffset;

use crate::error::VariantError;
use crate::variant::json;
use crate::variant::metadata::{VariantMetadata, EMPTY_METADATA};
use crate::variant::value::Variant;

/// Size of the little-endian metadata length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantValue {
    metadata: Vec<u8>,
    value: Vec<u8>,
}

impl VariantValue {
    pub fn new(metadata: Vec<u8>, value: Vec<u8>) -> Self {
        Self { metadata, value }
    }

    /// Copies a view into an owned value. The metadata is carried verbatim.
    pub fn from_variant(variant: &Variant<'_>) -> Self {
        Self {
            metadata: variant.metadata_bytes().to_vec(),
            value: variant.value_bytes().to_vec(),
        }
    }

    /// A Variant null with an empty dictionary.
    pub fn of_null() -> Self {
        Self {
            metadata: Self::empty_metadata(),
            value: vec![0],
        }
    }

    /// The metadata buffer with an empty dictionary.
    pub fn empty_metadata() -> Vec<u8> {
        EMPTY_METADATA.to_vec()
    }

    pub fn metadata(&self) -> &[u8] {
        &self.metadata
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Borrows this value as a decoder view.
    pub fn as_variant(&self) -> Result<Variant<'_>, VariantError> {
        Variant::try_new(&self.metadata, &self.value)
    }

    pub fn to_json(&self, timezone: &FixedOffset) -> Result<String, VariantError> {
        json::variant_to_json(&self.as_variant()?, timezone)
    }

    //------------------------------------------------------------------------------
    // Serialization
    //------------------------------------------------------------------------------

    /// Size of the serialized form: prefix + metadata + value.
    pub fn serialized_size(&self) -> usize {
        LENGTH_PREFIX_SIZE + self.metadata.len() + self.value.len()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.serialized_size());
        self.serialize_into(&mut buffer);
        buffer
    }

    /// Appends the serialized form to `buffer`.
    pub fn serialize_into(&self, buffer: &mut Vec<u8>) {
        serialize_parts(self.metadata(), self.value(), buffer);
    }

    /// Copies a serialized buffer into an owned value.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, VariantError> {
        let (metadata, value) = split_serialized(bytes)?;
        Ok(Self::new(metadata.to_vec(), value.to_vec()))
    }

    /// Zero-copy parse of a serialized buffer into a decoder view.
    pub fn view(bytes: &[u8]) -> Result<Variant<'_>, VariantError> {
        let (metadata, value) = split_serialized(bytes)?;
        Variant::try_new(metadata, value)
    }
}

/// Writes `[metadata_len][metadata][value]` without building an owned value first.
pub fn serialize_parts(metadata: &[u8], value: &[u8], buffer: &mut Vec<u8>) {
    buffer.reserve(LENGTH_PREFIX_SIZE + metadata.len() + value.len());
    buffer.extend_from_slice(&(metadata.len() as u32).to_le_bytes());
    buffer.extend_from_slice(metadata);
    buffer.extend_from_slice(value);
}

/// Splits a serialized buffer into its metadata and value slices.
pub fn split_serialized(bytes: &[u8]) -> Result<(&[u8], &[u8]), VariantError> {
    if bytes.len() < LENGTH_PREFIX_SIZE {
        return Err(VariantError::decode(format!(
            "Serialized variant is too small. Minimum size: {}, got: {}",
            LENGTH_PREFIX_SIZE,
            bytes.len()
        )));
    }
    let (prefix, rest) = bytes.split_at(LENGTH_PREFIX_SIZE);
    let mut len_buf = [0u8; LENGTH_PREFIX_SIZE];
    len_buf.copy_from_slice(prefix);
    let metadata_len = u32::from_le_bytes(len_buf) as usize;

    // SECURITY: The declared metadata length must not exceed the buffer.
    if metadata_len > rest.len() {
        return Err(VariantError::decode(format!(
            "Declared metadata length {} exceeds the {} bytes available",
            metadata_len,
            rest.len()
        )));
    }
    Ok(rest.split_at(metadata_len))
}

/// Computes the exact metadata length encoded at the start of `bytes` from its
/// own header, for buffers where metadata and value are concatenated without a prefix.
pub fn load_metadata_len(bytes: &[u8]) -> Result<usize, VariantError> {
    VariantMetadata::try_new(bytes)?.encoded_size()
}
