//! Canonical CBOR decoder for record documents.

use crate::error::{CodecError, CodecResult};
use crate::value::{Document, Value};
use std::cmp::Ordering;

/// Decode a single value from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid canonical CBOR, contain
/// constructs outside the record value model, or have trailing bytes.
pub fn from_cbor(bytes: &[u8]) -> CodecResult<Value> {
    let mut decoder = CanonicalDecoder::new(bytes);
    let value = decoder.decode()?;
    if !decoder.is_empty() {
        return Err(CodecError::TrailingBytes(decoder.remaining().len()));
    }
    Ok(value)
}

/// Decode a document (a top-level CBOR map).
///
/// # Errors
///
/// Returns an error if decoding fails or the top-level value is not a map.
pub fn decode_document(bytes: &[u8]) -> CodecResult<Document> {
    match from_cbor(bytes)? {
        Value::Map(map) => Ok(map),
        other => Err(CodecError::invalid_structure(format!(
            "expected map document, found {}",
            other.kind()
        ))),
    }
}

/// A canonical CBOR decoder.
///
/// Validates that input follows canonical CBOR rules and rejects
/// forbidden constructs.
pub struct CanonicalDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

/// Maximum allowed element count for arrays and maps.
const MAX_CONTAINER_ELEMENTS: u64 = 16 * 1024 * 1024;

/// Maximum allowed string length.
const MAX_TEXT_LENGTH: u64 = 64 * 1024 * 1024;

impl<'a> CanonicalDecoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Decode the next value.
    pub fn decode(&mut self) -> CodecResult<Value> {
        let initial_byte = self.read_byte()?;
        let major_type = initial_byte >> 5;
        let additional_info = initial_byte & 0x1f;

        match major_type {
            0 => {
                let n = self.decode_unsigned(additional_info)?;
                i64::try_from(n)
                    .map(Value::Integer)
                    .map_err(|_| CodecError::IntegerOverflow)
            }
            1 => {
                let n = self.decode_unsigned(additional_info)?;
                i64::try_from(n)
                    .map(|n| Value::Integer(-n - 1))
                    .map_err(|_| CodecError::IntegerOverflow)
            }
            2 => Err(CodecError::unsupported_type("byte string")),
            3 => self.decode_text(additional_info).map(Value::Text),
            4 => self.decode_array(additional_info),
            5 => self.decode_map(additional_info).map(Value::Map),
            6 => Err(CodecError::unsupported_type("tagged value")),
            7 => self.decode_simple(additional_info),
            _ => Err(CodecError::invalid_structure("invalid major type")),
        }
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    #[inline]
    fn read_byte(&mut self) -> CodecResult<u8> {
        let byte = *self.data.get(self.pos).ok_or(CodecError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(CodecError::UnexpectedEof)?;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(CodecError::UnexpectedEof)?;
        self.pos = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn decode_unsigned(&mut self, additional_info: u8) -> CodecResult<u64> {
        let non_canonical = || {
            CodecError::invalid_structure("non-canonical: value could be encoded in fewer bytes")
        };
        match additional_info {
            0..=23 => Ok(u64::from(additional_info)),
            24 => {
                let byte = self.read_byte()?;
                if byte < 24 {
                    return Err(non_canonical());
                }
                Ok(u64::from(byte))
            }
            25 => {
                let value = u16::from_be_bytes(self.read_array()?);
                if u8::try_from(value).is_ok() {
                    return Err(non_canonical());
                }
                Ok(u64::from(value))
            }
            26 => {
                let value = u32::from_be_bytes(self.read_array()?);
                if u16::try_from(value).is_ok() {
                    return Err(non_canonical());
                }
                Ok(u64::from(value))
            }
            27 => {
                let value = u64::from_be_bytes(self.read_array()?);
                if u32::try_from(value).is_ok() {
                    return Err(non_canonical());
                }
                Ok(value)
            }
            31 => Err(CodecError::IndefiniteLengthForbidden),
            _ => Err(CodecError::invalid_structure("reserved additional info")),
        }
    }

    fn decode_len(&mut self, additional_info: u8, max: u64) -> CodecResult<usize> {
        let claimed = self.decode_unsigned(additional_info)?;
        if claimed > max {
            return Err(CodecError::SizeLimitExceeded {
                claimed,
                max_allowed: max,
            });
        }
        usize::try_from(claimed).map_err(|_| CodecError::SizeLimitExceeded {
            claimed,
            max_allowed: max,
        })
    }

    fn decode_text(&mut self, additional_info: u8) -> CodecResult<String> {
        let len = self.decode_len(additional_info, MAX_TEXT_LENGTH)?;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| CodecError::InvalidUtf8)
    }

    fn decode_array(&mut self, additional_info: u8) -> CodecResult<Value> {
        let len = self.decode_len(additional_info, MAX_CONTAINER_ELEMENTS)?;
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            items.push(self.decode()?);
        }
        Ok(Value::Array(items))
    }

    fn decode_map(&mut self, additional_info: u8) -> CodecResult<Document> {
        let len = self.decode_len(additional_info, MAX_CONTAINER_ELEMENTS)?;
        let mut map = Document::new();
        let mut prev_key_bytes: Option<&'a [u8]> = None;

        for _ in 0..len {
            let key_start = self.pos;
            let initial_byte = self.read_byte()?;
            if initial_byte >> 5 != 3 {
                return Err(CodecError::invalid_structure("map keys must be text"));
            }
            let key = self.decode_text(initial_byte & 0x1f)?;
            let data = self.data;
            let key_bytes = &data[key_start..self.pos];

            // Keys must be strictly increasing
            if let Some(prev) = prev_key_bytes {
                if compare_cbor_bytes(prev, key_bytes) != Ordering::Less {
                    return Err(CodecError::invalid_structure(
                        "non-canonical: map keys not in sorted order",
                    ));
                }
            }
            prev_key_bytes = Some(key_bytes);

            let value = self.decode()?;
            map.insert(key, value);
        }

        Ok(map)
    }

    fn decode_simple(&mut self, additional_info: u8) -> CodecResult<Value> {
        match additional_info {
            20 => Ok(Value::Bool(false)),
            21 => Ok(Value::Bool(true)),
            // undefined reads back as null
            22 | 23 => Ok(Value::Null),
            25 | 26 => Err(CodecError::NonCanonicalFloat),
            27 => {
                let f = f64::from_be_bytes(self.read_array()?);
                if !f.is_finite() {
                    return Err(CodecError::NonFiniteFloat);
                }
                Ok(Value::Float(f))
            }
            31 => Err(CodecError::invalid_structure("break without indefinite")),
            _ => Err(CodecError::unsupported_type(format!(
                "simple value {additional_info}"
            ))),
        }
    }
}

/// Length-first, then bytewise comparison.
fn compare_cbor_bytes(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode_document, to_canonical_cbor};

    #[test]
    fn decode_record_document() {
        let mut doc = Document::new();
        doc.insert("name".into(), Value::from("Fasting"));
        doc.insert("version".into(), Value::Integer(1_700_000_000_123));
        doc.insert("weight".into(), Value::Float(0.25));
        doc.insert(
            "themes".into(),
            Value::from(vec![Value::from("t1"), Value::Null]),
        );

        let bytes = encode_document(&doc).unwrap();
        assert_eq!(decode_document(&bytes).unwrap(), doc);
    }

    #[test]
    fn reject_non_map_document() {
        let bytes = to_canonical_cbor(&Value::Integer(1)).unwrap();
        assert!(matches!(
            decode_document(&bytes),
            Err(CodecError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn reject_non_canonical_integer() {
        // 5 encoded with a 1-byte argument
        assert!(from_cbor(&[0x18, 0x05]).is_err());
    }

    #[test]
    fn reject_unsorted_map_keys() {
        // {"b": 1, "a": 2}
        let bytes = [0xa2, 0x61, b'b', 0x01, 0x61, b'a', 0x02];
        assert!(matches!(
            from_cbor(&bytes),
            Err(CodecError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn reject_non_text_map_key() {
        // {1: 2}
        assert!(from_cbor(&[0xa1, 0x01, 0x02]).is_err());
    }

    #[test]
    fn reject_truncated_input() {
        assert_eq!(from_cbor(&[0x63, b'a']), Err(CodecError::UnexpectedEof));
        assert_eq!(from_cbor(&[]), Err(CodecError::UnexpectedEof));
    }

    #[test]
    fn reject_trailing_bytes() {
        assert_eq!(from_cbor(&[0xf6, 0xf6]), Err(CodecError::TrailingBytes(1)));
    }

    #[test]
    fn reject_short_floats() {
        // half-precision 1.0
        assert_eq!(
            from_cbor(&[0xf9, 0x3c, 0x00]),
            Err(CodecError::NonCanonicalFloat)
        );
    }

    #[test]
    fn reject_indefinite_length() {
        assert_eq!(
            from_cbor(&[0x9f, 0xff]),
            Err(CodecError::IndefiniteLengthForbidden)
        );
    }

    #[test]
    fn reject_oversized_claim() {
        // array claiming u32::MAX elements
        let bytes = [0x9a, 0xff, 0xff, 0xff, 0xff];
        assert!(matches!(
            from_cbor(&bytes),
            Err(CodecError::SizeLimitExceeded { .. })
        ));
    }
}
