//! BER decoding.
//!
//! A [`Decoder`] is a cursor over a `Bytes` buffer. Constructed values hand
//! out child decoders that share the buffer and keep absolute offsets, so
//! error positions always refer to the original message.

use bytes::Bytes;

use super::tag;
use crate::error::{BerErrorKind, Error, Result};
use crate::oid::Oid;

/// Longest length field accepted (4 octets covers any UDP datagram).
const MAX_LENGTH_OCTETS: usize = 4;

/// Cursor over BER-encoded data.
#[derive(Debug, Clone)]
pub struct Decoder {
    data: Bytes,
    pos: usize,
    /// Offset of `data[0]` within the outermost buffer.
    base: usize,
}

impl Decoder {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Absolute offset of the cursor.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn err(&self, kind: BerErrorKind) -> Error {
        Error::malformed(self.offset(), kind)
    }

    /// Look at the next tag without consuming it.
    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn read_byte(&mut self) -> Result<u8> {
        let b = self
            .data
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.err(BerErrorKind::TruncatedData))?;
        self.pos += 1;
        Ok(b)
    }

    fn read_length(&mut self) -> Result<usize> {
        let first = self.read_byte()?;
        if first < 0x80 {
            return Ok(usize::from(first));
        }
        if first == 0x80 {
            return Err(self.err(BerErrorKind::IndefiniteLength));
        }

        let octets = usize::from(first & 0x7F);
        if octets > MAX_LENGTH_OCTETS {
            return Err(self.err(BerErrorKind::LengthTooLong { octets }));
        }
        let mut len = 0usize;
        for _ in 0..octets {
            len = (len << 8) | usize::from(self.read_byte()?);
        }
        Ok(len)
    }

    /// Read one TLV, returning its tag and content.
    pub fn read_any(&mut self) -> Result<(u8, Bytes)> {
        let tag = self.read_byte()?;
        let len = self.read_length()?;
        if len > self.remaining() {
            return Err(self.err(BerErrorKind::TruncatedData));
        }
        let content = self.data.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok((tag, content))
    }

    /// Read one TLV with the expected tag, returning its content.
    pub fn read_tlv(&mut self, expected: u8) -> Result<Bytes> {
        let at = self.offset();
        let (actual, content) = self.read_any()?;
        if actual != expected {
            return Err(Error::malformed(
                at,
                BerErrorKind::UnexpectedTag { expected, actual },
            ));
        }
        Ok(content)
    }

    /// Enter a constructed value with the given tag.
    pub fn read_constructed(&mut self, expected: u8) -> Result<Decoder> {
        let header_start = self.offset();
        let content = self.read_tlv(expected)?;
        let content_start = self.offset() - content.len();
        debug_assert!(content_start >= header_start);
        Ok(Decoder {
            data: content,
            pos: 0,
            base: content_start,
        })
    }

    pub fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Read an INTEGER that must fit in 64 bits.
    pub fn read_integer(&mut self) -> Result<i64> {
        let at = self.offset();
        let content = self.read_tlv(tag::universal::INTEGER)?;
        decode_signed(&content).map_err(|kind| Error::malformed(at, kind))
    }

    /// Read an INTEGER that must fit in 32 bits (versions, ids, statuses).
    pub fn read_i32(&mut self) -> Result<i32> {
        let at = self.offset();
        let v = self.read_integer()?;
        i32::try_from(v).map_err(|_| Error::malformed(at, BerErrorKind::IntegerOverflow))
    }

    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        self.read_tlv(tag::universal::OCTET_STRING)
    }

    pub fn read_oid(&mut self) -> Result<Oid> {
        let at = self.offset();
        let content = self.read_tlv(tag::universal::OBJECT_IDENTIFIER)?;
        Oid::from_ber(&content).map_err(|e| match e {
            Error::MalformedResponse { offset, kind } => Error::malformed(at + offset, kind),
            other => other,
        })
    }
}

/// Decode two's-complement content octets.
pub fn decode_signed(content: &[u8]) -> std::result::Result<i64, BerErrorKind> {
    if content.is_empty() {
        return Err(BerErrorKind::ZeroLengthInteger);
    }
    if content.len() > 8 {
        return Err(BerErrorKind::IntegerOverflow);
    }
    let mut value: i64 = if content[0] & 0x80 != 0 { -1 } else { 0 };
    for &b in content {
        value = (value << 8) | i64::from(b);
    }
    Ok(value)
}

/// Decode unsigned content octets (a leading 0x00 pad is allowed).
pub fn decode_unsigned(content: &[u8]) -> std::result::Result<u64, BerErrorKind> {
    if content.is_empty() {
        return Err(BerErrorKind::ZeroLengthInteger);
    }
    let trimmed = if content.len() > 1 && content[0] == 0 {
        &content[1..]
    } else {
        content
    };
    if trimmed.len() > 8 {
        return Err(BerErrorKind::IntegerOverflow);
    }
    Ok(trimmed.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}
