//! This module provides a set of shared, low-level utility functions used
//! throughout the decoder.
//!
//! Its primary responsibility is bounds-checked access to untrusted byte
//! buffers: every offset and width read from a Variant header passes through
//! here before it is used to slice memory.

use crate::error::VariantError;

//==================================================================================
// 1. Bounds-Checked Slicing
//==================================================================================

/// Returns `bytes[start..start + len]`, or a decode error if the range does not
/// fit inside the buffer (including on arithmetic overflow).
pub fn slice_checked(bytes: &[u8], start: usize, len: usize) -> Result<&[u8], VariantError> {
    let end = start.checked_add(len).ok_or_else(|| {
        VariantError::decode(format!("Range overflow: start {} + len {}", start, len))
    })?;
    bytes.get(start..end).ok_or_else(|| {
        VariantError::decode(format!(
            "Range {}..{} exceeds buffer of {} bytes",
            start,
            end,
            bytes.len()
        ))
    })
}

/// Reads a fixed-size little-endian array starting at `start`.
pub fn read_array<const N: usize>(bytes: &[u8], start: usize) -> Result<[u8; N], VariantError> {
    let slice = slice_checked(bytes, start, N)?;
    let mut buf = [0u8; N];
    buf.copy_from_slice(slice);
    Ok(buf)
}

//==================================================================================
// 2. Variable-Width Integers
//==================================================================================

/// Reads an unsigned little-endian integer of `width` bytes (1 to 4) at `start`.
///
/// Variant headers encode offsets, ids and counts with a per-value width, so
/// this is the single gateway for all of them.
pub fn read_le_uint(bytes: &[u8], start: usize, width: usize) -> Result<usize, VariantError> {
    if !(1..=4).contains(&width) {
        return Err(VariantError::InternalError(format!(
            "Unsupported integer width {}",
            width
        )));
    }
    let slice = slice_checked(bytes, start, width)?;
    let mut buf = [0u8; 4];
    buf[..width].copy_from_slice(slice);
    Ok(u32::from_le_bytes(buf) as usize)
}

/// Returns the smallest width (1 to 4 bytes) able to hold `value`.
pub fn min_width_for(value: usize) -> usize {
    match value {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFF_FFFF => 3,
        _ => 4,
    }
}

/// Appends `value` as a little-endian integer of exactly `width` bytes.
pub fn write_le_uint(buffer: &mut Vec<u8>, value: usize, width: usize) {
    let bytes = (value as u32).to_le_bytes();
    buffer.extend_from_slice(&bytes[..width]);
}

/// Multiplies and adds with overflow reported as a decode error.
pub fn checked_span(count: usize, width: usize, base: usize) -> Result<usize, VariantError> {
    count
        .checked_mul(width)
        .and_then(|n| n.checked_add(base))
        .ok_or_else(|| VariantError::decode(format!("Size overflow: {} x {}", count, width)))
}
