//! BER encoding.
//!
//! Uses a reverse buffer approach: writes from end backwards to avoid
//! needing to pre-calculate lengths.

use super::length::encode_length;
use super::tag;
use crate::oid::Oid;
use bytes::Bytes;

/// Buffer for BER encoding that writes backwards.
///
/// Content is written first, then its length and tag are prepended. Callers
/// encoding a sequence must therefore push its elements last-to-first.
pub struct EncodeBuf {
    buf: Vec<u8>,
}

impl EncodeBuf {
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Prepend bytes that are given in forward order.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().rev());
    }

    /// Prepend a BER length encoding.
    pub fn push_length(&mut self, len: usize) {
        let (bytes, count) = encode_length(len);
        self.buf.extend_from_slice(&bytes[..count]);
    }

    pub fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Encode a constructed type (SEQUENCE, PDU, etc).
    ///
    /// Calls the closure to encode contents, then wraps with length and tag.
    pub fn push_constructed<F>(&mut self, tag: u8, f: F)
    where
        F: FnOnce(&mut Self),
    {
        let start_len = self.len();
        f(self);
        let content_len = self.len() - start_len;
        self.push_length(content_len);
        self.push_tag(tag);
    }

    pub fn push_sequence<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.push_constructed(tag::universal::SEQUENCE, f);
    }

    /// Encode an INTEGER in minimal two's-complement form.
    pub fn push_integer(&mut self, value: i64) {
        let (arr, len) = encode_signed(value);
        self.push_bytes(&arr[8 - len..]);
        self.push_length(len);
        self.push_tag(tag::universal::INTEGER);
    }

    /// Encode an unsigned value (Counter32, Gauge32, TimeTicks, Counter64)
    /// under the given application tag.
    pub fn push_unsigned(&mut self, tag: u8, value: u64) {
        let (arr, len) = encode_unsigned(value);
        self.push_bytes(&arr[9 - len..]);
        self.push_length(len);
        self.push_tag(tag);
    }

    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_tagged_bytes(tag::universal::OCTET_STRING, data);
    }

    /// Primitive value with arbitrary tag and raw content.
    pub fn push_tagged_bytes(&mut self, tag: u8, data: &[u8]) {
        self.push_bytes(data);
        self.push_length(data.len());
        self.push_tag(tag);
    }

    pub fn push_null(&mut self) {
        self.push_empty(tag::universal::NULL);
    }

    /// Zero-length primitive (NULL and the exception values).
    pub fn push_empty(&mut self, tag: u8) {
        self.push_length(0);
        self.push_tag(tag);
    }

    pub fn push_oid(&mut self, oid: &Oid) {
        let ber = oid.to_ber_smallvec();
        self.push_tagged_bytes(tag::universal::OBJECT_IDENTIFIER, &ber);
    }

    /// Finalize and return the encoded bytes in forward order.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }
}

impl Default for EncodeBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal two's-complement encoding; valid bytes are at the END of the array.
#[inline]
fn encode_signed(value: i64) -> ([u8; 8], usize) {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    if value >= 0 {
        while start < 7 && bytes[start] == 0 && bytes[start + 1] & 0x80 == 0 {
            start += 1;
        }
    } else {
        while start < 7 && bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0 {
            start += 1;
        }
    }
    (bytes, 8 - start)
}

/// Unsigned encoding with a leading 0x00 when the top bit would read as a
/// sign; valid bytes are at the END of the array.
#[inline]
fn encode_unsigned(value: u64) -> ([u8; 9], usize) {
    let mut result = [0u8; 9];
    result[1..].copy_from_slice(&value.to_be_bytes());
    if value == 0 {
        return (result, 1);
    }

    let mut start = 1;
    while start < 8 && result[start] == 0 {
        start += 1;
    }
    if result[start] & 0x80 != 0 {
        start -= 1;
    }
    (result, 9 - start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed(value: i64) -> Vec<u8> {
        let (arr, len) = encode_signed(value);
        arr[8 - len..].to_vec()
    }

    fn unsigned(value: u64) -> Vec<u8> {
        let (arr, len) = encode_unsigned(value);
        arr[9 - len..].to_vec()
    }

    #[test]
    fn test_encode_signed() {
        assert_eq!(signed(0), vec![0]);
        assert_eq!(signed(1), vec![1]);
        assert_eq!(signed(127), vec![127]);
        assert_eq!(signed(128), vec![0, 128]);
        assert_eq!(signed(-1), vec![0xFF]);
        assert_eq!(signed(-128), vec![0x80]);
        assert_eq!(signed(-129), vec![0xFF, 0x7F]);
    }

    #[test]
    fn test_encode_unsigned() {
        assert_eq!(unsigned(0), vec![0]);
        assert_eq!(unsigned(127), vec![127]);
        assert_eq!(unsigned(128), vec![0, 128]);
        assert_eq!(unsigned(256), vec![1, 0]);
        assert_eq!(unsigned(u64::from(u32::MAX)), vec![0, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(unsigned(u64::MAX).len(), 9);
    }

    #[test]
    fn test_encode_sequence() {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            // Reverse buffer: push in reverse order for forward output
            buf.push_integer(2);
            buf.push_integer(1);
        });
        let bytes = buf.finish();
        assert_eq!(
            &bytes[..],
            &[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]
        );
    }

    #[test]
    fn test_encode_long_octet_string() {
        let data = vec![0xAAu8; 200];
        let mut buf = EncodeBuf::new();
        buf.push_octet_string(&data);
        let bytes = buf.finish();
        assert_eq!(&bytes[..3], &[0x04, 0x81, 200]);
        assert_eq!(bytes.len(), 203);
    }
}
