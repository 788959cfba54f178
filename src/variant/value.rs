//! The zero-copy `Variant` view: a metadata dictionary plus one value buffer.
//!
//! A `Variant<'a>` never owns memory. Nested lookups return new views that
//! share the root's metadata verbatim and slice into the parent's value bytes,
//! so a view can never outlive the column batch it was read from.

use crate::error::VariantError;
use crate::types::variant_type::primitive_id;
use crate::types::{BasicType, VariantType};
use crate::utils::{checked_span, read_array, read_le_uint, slice_checked};
use crate::variant::metadata::VariantMetadata;

//==================================================================================
// 1. Supporting Structs
//==================================================================================

/// An exact decimal: `unscaled * 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantDecimal {
    pub unscaled: i128,
    pub scale: u8,
}

/// Decoded header of an object or array value.
#[derive(Debug, Clone, Copy)]
struct ContainerLayout {
    num_elements: usize,
    /// Zero for arrays, which carry no field ids.
    id_size: usize,
    offset_size: usize,
    ids_start: usize,
    offsets_start: usize,
    values_start: usize,
}

impl ContainerLayout {
    fn object(value: &[u8]) -> Result<Self, VariantError> {
        let value_header = value[0] >> 2;
        let offset_size = (value_header & 0b11) as usize + 1;
        let id_size = ((value_header >> 2) & 0b11) as usize + 1;
        let is_large = (value_header >> 4) & 0b1 == 1;
        Self::decode(value, offset_size, id_size, is_large)
    }

    fn array(value: &[u8]) -> Result<Self, VariantError> {
        let value_header = value[0] >> 2;
        let offset_size = (value_header & 0b11) as usize + 1;
        let is_large = (value_header >> 2) & 0b1 == 1;
        Self::decode(value, offset_size, 0, is_large)
    }

    fn decode(
        value: &[u8],
        offset_size: usize,
        id_size: usize,
        is_large: bool,
    ) -> Result<Self, VariantError> {
        let count_size = if is_large { 4 } else { 1 };
        let num_elements = read_le_uint(value, 1, count_size)?;
        let ids_start = 1 + count_size;
        let offsets_start = checked_span(num_elements, id_size, ids_start)?;
        let values_start = checked_span(num_elements + 1, offset_size, offsets_start)?;

        // SECURITY: The id and offset tables must fit before any child is sliced.
        if values_start > value.len() {
            return Err(VariantError::decode(format!(
                "Container header ({} bytes) exceeds value buffer of {} bytes",
                values_start,
                value.len()
            )));
        }

        Ok(Self {
            num_elements,
            id_size,
            offset_size,
            ids_start,
            offsets_start,
            values_start,
        })
    }

    fn field_id(&self, value: &[u8], index: usize) -> Result<usize, VariantError> {
        read_le_uint(value, self.ids_start + index * self.id_size, self.id_size)
    }

    fn offset(&self, value: &[u8], index: usize) -> Result<usize, VariantError> {
        read_le_uint(
            value,
            self.offsets_start + index * self.offset_size,
            self.offset_size,
        )
    }

    /// Total encoded size: header tables plus the children region.
    fn encoded_size(&self, value: &[u8]) -> Result<usize, VariantError> {
        let data_size = self.offset(value, self.num_elements)?;
        self.values_start
            .checked_add(data_size)
            .ok_or_else(|| VariantError::decode("Container size overflow"))
    }

    /// Slices the child region starting at the `index`th offset. The child
    /// view trims itself to its own encoded size.
    fn child<'a>(&self, value: &'a [u8], index: usize) -> Result<&'a [u8], VariantError> {
        let start = self.offset(value, index)?;
        let data_size = self.offset(value, self.num_elements)?;
        if start >= data_size {
            return Err(VariantError::decode(format!(
                "Child offset {} is outside the {}-byte children region",
                start, data_size
            )));
        }
        slice_checked(value, self.values_start + start, data_size - start)
    }
}

//==================================================================================
// 2. The Variant View
//==================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant<'a> {
    metadata: VariantMetadata<'a>,
    value: &'a [u8],
    variant_type: VariantType,
}

impl<'a> Variant<'a> {
    /// Builds a root view from raw metadata and value buffers.
    pub fn try_new(metadata: &'a [u8], value: &'a [u8]) -> Result<Self, VariantError> {
        Self::with_metadata(VariantMetadata::try_new(metadata)?, value)
    }

    /// Builds a view over `value` using an already-parsed metadata dictionary.
    /// Trailing bytes beyond the value's encoded size are excluded from the view.
    pub fn with_metadata(
        metadata: VariantMetadata<'a>,
        value: &'a [u8],
    ) -> Result<Self, VariantError> {
        let size = encoded_value_size(value)?;
        let header = value[0];
        Ok(Self {
            metadata,
            value: &value[..size],
            variant_type: VariantType::from_header(header)?,
        })
    }

    pub fn variant_type(&self) -> VariantType {
        self.variant_type
    }

    pub fn is_null(&self) -> bool {
        self.variant_type == VariantType::Null
    }

    pub fn metadata(&self) -> VariantMetadata<'a> {
        self.metadata
    }

    pub fn metadata_bytes(&self) -> &'a [u8] {
        self.metadata.bytes()
    }

    /// The exact value bytes of this (possibly nested) value.
    pub fn value_bytes(&self) -> &'a [u8] {
        self.value
    }

    fn header(&self) -> u8 {
        self.value[0]
    }

    fn expect_type(&self, expected: VariantType, name: &'static str) -> Result<(), VariantError> {
        if self.variant_type == expected {
            Ok(())
        } else {
            Err(VariantError::TypeMismatch {
                expected: name,
                actual: self.variant_type,
            })
        }
    }

    //------------------------------------------------------------------------------
    // Primitive getters
    //------------------------------------------------------------------------------

    pub fn get_bool(&self) -> Result<bool, VariantError> {
        self.expect_type(VariantType::Boolean, "Boolean")?;
        Ok(self.header() >> 2 == primitive_id::TRUE)
    }

    pub fn get_int8(&self) -> Result<i8, VariantError> {
        self.expect_type(VariantType::Int8, "Int8")?;
        Ok(i8::from_le_bytes(read_array(self.value, 1)?))
    }

    pub fn get_int16(&self) -> Result<i16, VariantError> {
        self.expect_type(VariantType::Int16, "Int16")?;
        Ok(i16::from_le_bytes(read_array(self.value, 1)?))
    }

    pub fn get_int32(&self) -> Result<i32, VariantError> {
        self.expect_type(VariantType::Int32, "Int32")?;
        Ok(i32::from_le_bytes(read_array(self.value, 1)?))
    }

    pub fn get_int64(&self) -> Result<i64, VariantError> {
        self.expect_type(VariantType::Int64, "Int64")?;
        Ok(i64::from_le_bytes(read_array(self.value, 1)?))
    }

    pub fn get_float(&self) -> Result<f32, VariantError> {
        self.expect_type(VariantType::Float, "Float")?;
        Ok(f32::from_le_bytes(read_array(self.value, 1)?))
    }

    pub fn get_double(&self) -> Result<f64, VariantError> {
        self.expect_type(VariantType::Double, "Double")?;
        Ok(f64::from_le_bytes(read_array(self.value, 1)?))
    }

    /// Reads any integer-family value widened to `i64`.
    pub fn get_integer(&self) -> Result<i64, VariantError> {
        match self.variant_type {
            VariantType::Int8 => self.get_int8().map(i64::from),
            VariantType::Int16 => self.get_int16().map(i64::from),
            VariantType::Int32 => self.get_int32().map(i64::from),
            VariantType::Int64 => self.get_int64(),
            actual => Err(VariantError::TypeMismatch {
                expected: "integer",
                actual,
            }),
        }
    }

    /// Reads a string in either the short-string or the long-string form.
    pub fn get_string(&self) -> Result<&'a str, VariantError> {
        self.expect_type(VariantType::String, "String")?;
        let raw = match BasicType::from_header(self.header()) {
            BasicType::ShortString => {
                let len = (self.header() >> 2) as usize;
                slice_checked(self.value, 1, len)?
            }
            _ => self.length_prefixed_payload()?,
        };
        std::str::from_utf8(raw)
            .map_err(|e| VariantError::decode(format!("String value is not valid UTF-8: {}", e)))
    }

    pub fn get_binary(&self) -> Result<&'a [u8], VariantError> {
        self.expect_type(VariantType::Binary, "Binary")?;
        self.length_prefixed_payload()
    }

    pub fn get_decimal(&self) -> Result<VariantDecimal, VariantError> {
        let unscaled = match self.variant_type {
            VariantType::Decimal4 => i128::from(i32::from_le_bytes(read_array(self.value, 2)?)),
            VariantType::Decimal8 => i128::from(i64::from_le_bytes(read_array(self.value, 2)?)),
            VariantType::Decimal16 => i128::from_le_bytes(read_array(self.value, 2)?),
            actual => {
                return Err(VariantError::TypeMismatch {
                    expected: "Decimal",
                    actual,
                })
            }
        };
        let [scale] = read_array(self.value, 1)?;
        Ok(VariantDecimal { unscaled, scale })
    }

    /// Days since the Unix epoch.
    pub fn get_date(&self) -> Result<i32, VariantError> {
        self.expect_type(VariantType::Date, "Date")?;
        Ok(i32::from_le_bytes(read_array(self.value, 1)?))
    }

    /// Microseconds since the Unix epoch, for both the UTC-adjusted and the
    /// timezone-free forms.
    pub fn get_timestamp_micros(&self) -> Result<i64, VariantError> {
        match self.variant_type {
            VariantType::TimestampTz | VariantType::TimestampNtz => {
                Ok(i64::from_le_bytes(read_array(self.value, 1)?))
            }
            actual => Err(VariantError::TypeMismatch {
                expected: "Timestamp",
                actual,
            }),
        }
    }

    pub fn get_timestamp_nanos(&self) -> Result<i64, VariantError> {
        match self.variant_type {
            VariantType::TimestampNanosTz | VariantType::TimestampNanosNtz => {
                Ok(i64::from_le_bytes(read_array(self.value, 1)?))
            }
            actual => Err(VariantError::TypeMismatch {
                expected: "TimestampNanos",
                actual,
            }),
        }
    }

    /// Microseconds since midnight.
    pub fn get_time_micros(&self) -> Result<i64, VariantError> {
        self.expect_type(VariantType::TimeNtz, "TimeNtz")?;
        Ok(i64::from_le_bytes(read_array(self.value, 1)?))
    }

    /// The 16 UUID bytes in big-endian order.
    pub fn get_uuid(&self) -> Result<[u8; 16], VariantError> {
        self.expect_type(VariantType::Uuid, "Uuid")?;
        read_array(self.value, 1)
    }

    fn length_prefixed_payload(&self) -> Result<&'a [u8], VariantError> {
        let len = read_le_uint(self.value, 1, 4)?;
        slice_checked(self.value, 5, len)
    }

    //------------------------------------------------------------------------------
    // Nested access
    //------------------------------------------------------------------------------

    /// Number of fields of an object or elements of an array.
    pub fn num_elements(&self) -> Result<usize, VariantError> {
        Ok(self.container_layout()?.num_elements)
    }

    fn container_layout(&self) -> Result<ContainerLayout, VariantError> {
        match self.variant_type {
            VariantType::Object => ContainerLayout::object(self.value),
            VariantType::Array => ContainerLayout::array(self.value),
            actual => Err(VariantError::TypeMismatch {
                expected: "Object or Array",
                actual,
            }),
        }
    }

    fn child(&self, layout: &ContainerLayout, index: usize) -> Result<Variant<'a>, VariantError> {
        Variant::with_metadata(self.metadata, layout.child(self.value, index)?)
    }

    fn field_name(&self, layout: &ContainerLayout, index: usize) -> Result<&'a str, VariantError> {
        self.metadata.get(layout.field_id(self.value, index)?)
    }

    /// Looks up an object member by name.
    ///
    /// With a sorted dictionary the fields are binary searched by name,
    /// otherwise they are scanned in order. A missing key is `NotFound`.
    pub fn get_object_by_key(&self, key: &str) -> Result<Variant<'a>, VariantError> {
        self.expect_type(VariantType::Object, "Object")?;
        let layout = ContainerLayout::object(self.value)?;

        let found = if self.metadata.is_sorted() {
            let (mut low, mut high) = (0usize, layout.num_elements);
            let mut found = None;
            while low < high {
                let mid = low + (high - low) / 2;
                match self.field_name(&layout, mid)?.cmp(key) {
                    std::cmp::Ordering::Less => low = mid + 1,
                    std::cmp::Ordering::Greater => high = mid,
                    std::cmp::Ordering::Equal => {
                        found = Some(mid);
                        break;
                    }
                }
            }
            found
        } else {
            let mut found = None;
            for index in 0..layout.num_elements {
                if self.field_name(&layout, index)? == key {
                    found = Some(index);
                    break;
                }
            }
            found
        };

        match found {
            Some(index) => self.child(&layout, index),
            None => Err(VariantError::NotFound(format!(
                "Object key '{}' not found in variant",
                key
            ))),
        }
    }

    /// Returns the array element at `index`, or `NotFound` when out of range.
    pub fn get_element_at_index(&self, index: usize) -> Result<Variant<'a>, VariantError> {
        self.expect_type(VariantType::Array, "Array")?;
        let layout = ContainerLayout::array(self.value)?;
        if index >= layout.num_elements {
            return Err(VariantError::NotFound(format!(
                "Array index {} out of bounds for array of {} elements",
                index, layout.num_elements
            )));
        }
        self.child(&layout, index)
    }

    /// Iterates `(name, value)` pairs of an object in stored order.
    pub fn object_fields(&self) -> Result<ObjectFields<'a>, VariantError> {
        self.expect_type(VariantType::Object, "Object")?;
        Ok(ObjectFields {
            parent: *self,
            layout: ContainerLayout::object(self.value)?,
            index: 0,
        })
    }

    /// Iterates the elements of an array in order.
    pub fn array_elements(&self) -> Result<ArrayElements<'a>, VariantError> {
        self.expect_type(VariantType::Array, "Array")?;
        Ok(ArrayElements {
            parent: *self,
            layout: ContainerLayout::array(self.value)?,
            index: 0,
        })
    }
}

//==================================================================================
// 3. Iterators
//==================================================================================

pub struct ObjectFields<'a> {
    parent: Variant<'a>,
    layout: ContainerLayout,
    index: usize,
}

impl<'a> Iterator for ObjectFields<'a> {
    type Item = Result<(&'a str, Variant<'a>), VariantError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.layout.num_elements {
            return None;
        }
        let index = self.index;
        self.index += 1;
        let entry = self
            .parent
            .field_name(&self.layout, index)
            .and_then(|name| Ok((name, self.parent.child(&self.layout, index)?)));
        Some(entry)
    }
}

pub struct ArrayElements<'a> {
    parent: Variant<'a>,
    layout: ContainerLayout,
    index: usize,
}

impl<'a> Iterator for ArrayElements<'a> {
    type Item = Result<Variant<'a>, VariantError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.layout.num_elements {
            return None;
        }
        let index = self.index;
        self.index += 1;
        Some(self.parent.child(&self.layout, index))
    }
}

//==================================================================================
// 4. Size Computation
//==================================================================================

/// Computes the exact number of bytes the value starting at `value[0]`
/// occupies, validating it against the buffer length.
pub fn encoded_value_size(value: &[u8]) -> Result<usize, VariantError> {
    let header = *value
        .first()
        .ok_or_else(|| VariantError::decode("Value buffer is empty"))?;

    let size = match BasicType::from_header(header) {
        BasicType::ShortString => 1 + (header >> 2) as usize,
        BasicType::Object => ContainerLayout::object(value)?.encoded_size(value)?,
        BasicType::Array => ContainerLayout::array(value)?.encoded_size(value)?,
        BasicType::Primitive => {
            use primitive_id::*;
            match header >> 2 {
                NULL | TRUE | FALSE => 1,
                INT8 => 2,
                INT16 => 3,
                INT32 | DATE | FLOAT => 5,
                INT64 | DOUBLE | TIMESTAMP_TZ | TIMESTAMP_NTZ | TIME_NTZ
                | TIMESTAMP_NANOS_TZ | TIMESTAMP_NANOS_NTZ => 9,
                DECIMAL4 => 6,
                DECIMAL8 => 10,
                DECIMAL16 => 18,
                UUID => 17,
                BINARY | STRING => read_le_uint(value, 1, 4)?
                    .checked_add(5)
                    .ok_or_else(|| VariantError::decode("Length prefix overflow"))?,
                other => {
                    return Err(VariantError::decode(format!(
                        "Unknown primitive type id {}",
                        other
                    )))
                }
            }
        }
    };

    if size > value.len() {
        return Err(VariantError::decode(format!(
            "Value declares {} bytes but only {} are available",
            size,
            value.len()
        )));
    }
    Ok(size)
}

//==================================================================================
// 5. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::metadata::EMPTY_METADATA;

    fn primitive(id: u8, payload: &[u8]) -> Vec<u8> {
        let mut value = vec![id << 2];
        value.extend_from_slice(payload);
        value
    }

    /// Metadata with keys ["a", "b"] and the sorted flag as requested.
    fn ab_metadata(sorted: bool) -> Vec<u8> {
        vec![if sorted { 0x11 } else { 0x01 }, 2, 0, 1, 2, b'a', b'b']
    }

    /// `{"a": 1i8, "b": "xy"}` with 1-byte ids and offsets.
    fn ab_object() -> Vec<u8> {
        vec![
            0x02, // object, 1-byte offsets and ids, small
            2,    // num_elements
            0, 1, // field ids
            0, 2, 5, // offsets
            3 << 2, 1, // int8 1
            (2 << 2) | 1, b'x', b'y', // short string "xy"
        ]
    }

    /// `[10i8, 20i8, 30i8]`
    fn int_array() -> Vec<u8> {
        vec![0x03, 3, 0, 2, 4, 6, 3 << 2, 10, 3 << 2, 20, 3 << 2, 30]
    }

    #[test]
    fn test_primitive_getters() {
        let value = primitive(primitive_id::INT16, &1234i16.to_le_bytes());
        let v = Variant::try_new(&EMPTY_METADATA, &value).unwrap();
        assert_eq!(v.variant_type(), VariantType::Int16);
        assert_eq!(v.get_int16().unwrap(), 1234);
        assert_eq!(v.get_integer().unwrap(), 1234);

        let value = primitive(primitive_id::DOUBLE, &1.5f64.to_le_bytes());
        let v = Variant::try_new(&EMPTY_METADATA, &value).unwrap();
        assert_eq!(v.get_double().unwrap(), 1.5);

        let value = primitive(primitive_id::TRUE, &[]);
        assert!(Variant::try_new(&EMPTY_METADATA, &value).unwrap().get_bool().unwrap());
        let value = primitive(primitive_id::FALSE, &[]);
        assert!(!Variant::try_new(&EMPTY_METADATA, &value).unwrap().get_bool().unwrap());
    }

    #[test]
    fn test_getter_type_mismatch() {
        let value = primitive(primitive_id::INT8, &[7]);
        let v = Variant::try_new(&EMPTY_METADATA, &value).unwrap();
        assert!(matches!(
            v.get_int32(),
            Err(VariantError::TypeMismatch { actual: VariantType::Int8, .. })
        ));
        assert!(matches!(v.get_string(), Err(VariantError::TypeMismatch { .. })));
    }

    #[test]
    fn test_decimal_getter_checks_type_before_payload() {
        for value in [vec![0u8], primitive(primitive_id::TRUE, &[]), vec![1u8]] {
            let v = Variant::try_new(&EMPTY_METADATA, &value).unwrap();
            assert!(
                matches!(v.get_decimal(), Err(VariantError::TypeMismatch { expected: "Decimal", .. })),
                "header {:#04x}",
                value[0]
            );
        }
    }

    #[test]
    fn test_short_and_long_strings() {
        let short = vec![(5 << 2) | 1, b'h', b'e', b'l', b'l', b'o'];
        let v = Variant::try_new(&EMPTY_METADATA, &short).unwrap();
        assert_eq!(v.get_string().unwrap(), "hello");

        let text = "x".repeat(100);
        let mut long = primitive(primitive_id::STRING, &(text.len() as u32).to_le_bytes());
        long.extend_from_slice(text.as_bytes());
        let v = Variant::try_new(&EMPTY_METADATA, &long).unwrap();
        assert_eq!(v.get_string().unwrap(), text);
    }

    #[test]
    fn test_decimal_sign_extension() {
        let mut payload = vec![2u8];
        payload.extend_from_slice(&(-12345i32).to_le_bytes());
        let value = primitive(primitive_id::DECIMAL4, &payload);
        let v = Variant::try_new(&EMPTY_METADATA, &value).unwrap();
        assert_eq!(
            v.get_decimal().unwrap(),
            VariantDecimal { unscaled: -12345, scale: 2 }
        );
    }

    #[test]
    fn test_object_lookup_sorted_and_unsorted() {
        let value = ab_object();
        for sorted in [true, false] {
            let metadata = ab_metadata(sorted);
            let v = Variant::try_new(&metadata, &value).unwrap();
            assert_eq!(v.num_elements().unwrap(), 2);
            assert_eq!(v.get_object_by_key("a").unwrap().get_int8().unwrap(), 1);
            assert_eq!(v.get_object_by_key("b").unwrap().get_string().unwrap(), "xy");
            assert!(matches!(v.get_object_by_key("c"), Err(VariantError::NotFound(_))));
        }
    }

    #[test]
    fn test_nested_views_share_metadata_and_are_trimmed() {
        let metadata = ab_metadata(true);
        let value = ab_object();
        let v = Variant::try_new(&metadata, &value).unwrap();
        let child = v.get_object_by_key("a").unwrap();
        assert_eq!(child.metadata_bytes(), metadata.as_slice());
        assert_eq!(child.value_bytes(), &[3 << 2, 1]);
    }

    #[test]
    fn test_array_lookup() {
        let value = int_array();
        let v = Variant::try_new(&EMPTY_METADATA, &value).unwrap();
        assert_eq!(v.get_element_at_index(0).unwrap().get_int8().unwrap(), 10);
        assert_eq!(v.get_element_at_index(2).unwrap().get_int8().unwrap(), 30);
        assert!(matches!(v.get_element_at_index(3), Err(VariantError::NotFound(_))));
        let all: Vec<i8> = v
            .array_elements()
            .unwrap()
            .map(|e| e.unwrap().get_int8().unwrap())
            .collect();
        assert_eq!(all, vec![10, 20, 30]);
    }

    #[test]
    fn test_object_fields_iterator() {
        let metadata = ab_metadata(true);
        let value = ab_object();
        let v = Variant::try_new(&metadata, &value).unwrap();
        let names: Vec<&str> = v.object_fields().unwrap().map(|f| f.unwrap().0).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_truncated_values_are_decode_errors() {
        assert!(matches!(Variant::try_new(&EMPTY_METADATA, &[]), Err(VariantError::Decode(_))));
        let value = primitive(primitive_id::INT64, &[1, 2, 3]);
        assert!(matches!(Variant::try_new(&EMPTY_METADATA, &value), Err(VariantError::Decode(_))));

        // Long string claiming more bytes than present.
        let value = primitive(primitive_id::STRING, &100u32.to_le_bytes());
        assert!(matches!(Variant::try_new(&EMPTY_METADATA, &value), Err(VariantError::Decode(_))));

        // Array whose offset table runs past the buffer.
        let value = vec![0x03, 200, 0, 1];
        assert!(matches!(Variant::try_new(&EMPTY_METADATA, &value), Err(VariantError::Decode(_))));
    }

    #[test]
    fn test_field_id_outside_dictionary_is_decode_error() {
        let value = ab_object();
        let v = Variant::try_new(&EMPTY_METADATA, &value).unwrap();
        assert!(matches!(v.get_object_by_key("a"), Err(VariantError::Decode(_))));
    }
}
