//! Zero-copy view over a Variant metadata buffer (the field-name dictionary).
//!
//! Layout:
//! ```text
//! [header:1][dictionary_size:W][offsets:(dictionary_size + 1) * W][string bytes]
//! header = [offset_size_minus_one:2][reserved:1][sorted_strings:1][version:4]
//! ```
//! Only the header and table extents are validated up front; individual keys are
//! checked when they are looked up.

use crate::error::VariantError;
use crate::utils::{checked_span, read_le_uint, slice_checked};

const VERSION_MASK: u8 = 0b0000_1111;
const SORTED_STRINGS_MASK: u8 = 0b0001_0000;
const OFFSET_SIZE_SHIFT: u8 = 6;
/// The only metadata version this decoder understands.
pub const SUPPORTED_VERSION: u8 = 1;

/// Metadata with an empty dictionary, shared by every primitive-only document.
pub const EMPTY_METADATA: [u8; 3] = [SUPPORTED_VERSION, 0x00, 0x00];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantMetadata<'a> {
    bytes: &'a [u8],
    sorted: bool,
    offset_size: usize,
    dictionary_size: usize,
    offsets_start: usize,
    strings_start: usize,
}

impl<'a> VariantMetadata<'a> {
    /// Parses the metadata header and checks that the offset table fits.
    pub fn try_new(bytes: &'a [u8]) -> Result<Self, VariantError> {
        let header = *bytes
            .first()
            .ok_or_else(|| VariantError::decode("Metadata buffer is empty"))?;

        let version = header & VERSION_MASK;
        if version != SUPPORTED_VERSION {
            return Err(VariantError::decode(format!(
                "Unsupported metadata version: expected {}, got {}",
                SUPPORTED_VERSION, version
            )));
        }

        let sorted = header & SORTED_STRINGS_MASK != 0;
        let offset_size = ((header >> OFFSET_SIZE_SHIFT) & 0b11) as usize + 1;
        let dictionary_size = read_le_uint(bytes, 1, offset_size)?;
        let offsets_start = 1 + offset_size;
        let strings_start = checked_span(dictionary_size + 1, offset_size, offsets_start)?;

        // SECURITY: The offset table must lie fully inside the buffer before any key is read.
        if strings_start > bytes.len() {
            return Err(VariantError::decode(format!(
                "Metadata offset table ({} bytes) exceeds buffer of {} bytes",
                strings_start,
                bytes.len()
            )));
        }

        Ok(Self {
            bytes,
            sorted,
            offset_size,
            dictionary_size,
            offsets_start,
            strings_start,
        })
    }

    /// Number of keys in the dictionary.
    pub fn dictionary_size(&self) -> usize {
        self.dictionary_size
    }

    /// Whether the writer declared the dictionary sorted and unique.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// The exact encoded size of this metadata, which may be shorter than the
    /// slice it was parsed from.
    pub fn encoded_size(&self) -> Result<usize, VariantError> {
        let last = self.offset(self.dictionary_size)?;
        let size = self.strings_start.checked_add(last).ok_or_else(|| {
            VariantError::decode("Metadata size overflow")
        })?;
        if size > self.bytes.len() {
            return Err(VariantError::decode(format!(
                "Metadata string region ends at {} beyond buffer of {} bytes",
                size,
                self.bytes.len()
            )));
        }
        Ok(size)
    }

    /// Resolves a key id to its field name.
    pub fn get(&self, id: usize) -> Result<&'a str, VariantError> {
        if id >= self.dictionary_size {
            return Err(VariantError::decode(format!(
                "Key id {} out of range for dictionary of size {}",
                id, self.dictionary_size
            )));
        }
        let start = self.offset(id)?;
        let end = self.offset(id + 1)?;
        if end < start {
            return Err(VariantError::decode(format!(
                "Metadata offsets decrease at key id {}: {} > {}",
                id, start, end
            )));
        }
        let raw = slice_checked(self.bytes, self.strings_start + start, end - start)?;
        std::str::from_utf8(raw)
            .map_err(|e| VariantError::decode(format!("Key id {} is not valid UTF-8: {}", id, e)))
    }

    fn offset(&self, index: usize) -> Result<usize, VariantError> {
        read_le_uint(
            self.bytes,
            self.offsets_start + index * self.offset_size,
            self.offset_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds metadata `{"a", "bc"}` with 1-byte offsets.
    fn two_key_metadata(sorted: bool) -> Vec<u8> {
        let header = SUPPORTED_VERSION | if sorted { SORTED_STRINGS_MASK } else { 0 };
        vec![header, 2, 0, 1, 3, b'a', b'b', b'c']
    }

    #[test]
    fn test_empty_metadata() {
        let metadata = VariantMetadata::try_new(&EMPTY_METADATA).unwrap();
        assert_eq!(metadata.dictionary_size(), 0);
        assert_eq!(metadata.encoded_size().unwrap(), 3);
        assert!(matches!(metadata.get(0), Err(VariantError::Decode(_))));
    }

    #[test]
    fn test_key_lookup() {
        let bytes = two_key_metadata(true);
        let metadata = VariantMetadata::try_new(&bytes).unwrap();
        assert!(metadata.is_sorted());
        assert_eq!(metadata.get(0).unwrap(), "a");
        assert_eq!(metadata.get(1).unwrap(), "bc");
        assert!(matches!(metadata.get(2), Err(VariantError::Decode(_))));
        assert_eq!(metadata.encoded_size().unwrap(), bytes.len());
    }

    #[test]
    fn test_wide_offsets() {
        // offset_size = 2 (selector 0b01).
        let bytes = vec![0b0100_0001, 1, 0, 0, 0, 3, 0, b'k', b'e', b'y'];
        let metadata = VariantMetadata::try_new(&bytes).unwrap();
        assert_eq!(metadata.get(0).unwrap(), "key");
        assert!(!metadata.is_sorted());
    }

    #[test]
    fn test_malformed_metadata_is_rejected() {
        assert!(VariantMetadata::try_new(&[]).is_err());
        // Wrong version.
        assert!(VariantMetadata::try_new(&[0x02, 0, 0]).is_err());
        // Dictionary size claims far more offsets than the buffer holds.
        assert!(VariantMetadata::try_new(&[0x01, 200, 0, 1]).is_err());
        // Offset points past the string region.
        let bytes = vec![0x01, 1, 0, 9, b'a'];
        let metadata = VariantMetadata::try_new(&bytes).unwrap();
        assert!(matches!(metadata.get(0), Err(VariantError::Decode(_))));
        assert!(metadata.encoded_size().is_err());
        // Decreasing offsets.
        let bytes = vec![0x01, 1, 1, 0, b'a'];
        let metadata = VariantMetadata::try_new(&bytes).unwrap();
        assert!(matches!(metadata.get(0), Err(VariantError::Decode(_))));
    }
}
