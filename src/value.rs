//! SNMP value type.

use std::fmt;

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf, decode_signed, decode_unsigned, tag};
use crate::error::{BerErrorKind, Error, Result};
use crate::oid::Oid;

/// A value carried in a variable binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    OctetString(Bytes),
    Null,
    ObjectIdentifier(Oid),
    IpAddress([u8; 4]),
    Counter32(u32),
    /// Gauge32, also known as Unsigned32.
    Gauge32(u32),
    TimeTicks(u32),
    Opaque(Bytes),
    Counter64(u64),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    /// Application type this crate does not model.
    Unknown { tag: u8, data: Bytes },
}

impl Value {
    /// True for the three exception values an agent uses in place of data.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Integer view of numeric values.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(i64::from(*v)),
            Value::Counter64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Raw octets of string-like values.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(b) | Value::Opaque(b) => Some(b),
            Value::Unknown { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Lowercase hex of the raw octets, two digits per octet, no prefix.
    ///
    /// This is the form bitmap columns are decoded from; it does not depend
    /// on whether the octets happen to be printable.
    pub fn to_hex(&self) -> Option<String> {
        self.as_bytes().map(hex_string)
    }

    /// Text form of the value as a management tool would print it.
    ///
    /// Numbers render in decimal, printable octet strings as text and
    /// everything else as `0x`-prefixed hex.
    pub fn to_text(&self) -> String {
        match self {
            Value::OctetString(b) if is_printable(b) => String::from_utf8_lossy(b).into_owned(),
            Value::OctetString(b) | Value::Opaque(b) => format!("0x{}", hex_string(b)),
            _ => self.to_string(),
        }
    }

    /// Prepend the BER encoding of this value.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        match self {
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(data) => buf.push_octet_string(data),
            Value::Null => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_tagged_bytes(tag::application::IP_ADDRESS, addr),
            Value::Counter32(v) => buf.push_unsigned(tag::application::COUNTER32, u64::from(*v)),
            Value::Gauge32(v) => buf.push_unsigned(tag::application::GAUGE32, u64::from(*v)),
            Value::TimeTicks(v) => buf.push_unsigned(tag::application::TIMETICKS, u64::from(*v)),
            Value::Opaque(data) => buf.push_tagged_bytes(tag::application::OPAQUE, data),
            Value::Counter64(v) => buf.push_unsigned(tag::application::COUNTER64, *v),
            Value::NoSuchObject => buf.push_empty(tag::context::NO_SUCH_OBJECT),
            Value::NoSuchInstance => buf.push_empty(tag::context::NO_SUCH_INSTANCE),
            Value::EndOfMibView => buf.push_empty(tag::context::END_OF_MIB_VIEW),
            Value::Unknown { tag, data } => buf.push_tagged_bytes(*tag, data),
        }
    }

    /// Decode one value from the decoder.
    pub fn decode(decoder: &mut Decoder) -> Result<Value> {
        let at = decoder.offset();
        let (tag, content) = decoder.read_any()?;
        let malformed = |kind: BerErrorKind| Error::malformed(at, kind);
        let u32_of = |content: &[u8]| -> Result<u32> {
            let v = decode_unsigned(content).map_err(malformed)?;
            u32::try_from(v).map_err(|_| malformed(BerErrorKind::IntegerOverflow))
        };

        let value = match tag {
            tag::universal::INTEGER => Value::Integer(decode_signed(&content).map_err(malformed)?),
            tag::universal::OCTET_STRING => Value::OctetString(content),
            tag::universal::NULL => {
                if !content.is_empty() {
                    return Err(malformed(BerErrorKind::InvalidNull));
                }
                Value::Null
            }
            tag::universal::OBJECT_IDENTIFIER => Value::ObjectIdentifier(
                Oid::from_ber(&content).map_err(|_| malformed(BerErrorKind::InvalidOidEncoding))?,
            ),
            tag::application::IP_ADDRESS => {
                let addr = <[u8; 4]>::try_from(&content[..]).map_err(|_| {
                    malformed(BerErrorKind::InvalidIpAddressLength {
                        length: content.len(),
                    })
                })?;
                Value::IpAddress(addr)
            }
            tag::application::COUNTER32 => Value::Counter32(u32_of(&content)?),
            tag::application::GAUGE32 => Value::Gauge32(u32_of(&content)?),
            tag::application::TIMETICKS => Value::TimeTicks(u32_of(&content)?),
            tag::application::OPAQUE => Value::Opaque(content),
            tag::application::COUNTER64 => {
                Value::Counter64(decode_unsigned(&content).map_err(malformed)?)
            }
            tag::context::NO_SUCH_OBJECT => Value::NoSuchObject,
            tag::context::NO_SUCH_INSTANCE => Value::NoSuchInstance,
            tag::context::END_OF_MIB_VIEW => Value::EndOfMibView,
            other if tag::tag_class(other) == tag::class::APPLICATION => Value::Unknown {
                tag: other,
                data: content,
            },
            other => {
                return Err(malformed(BerErrorKind::UnexpectedTag {
                    expected: tag::universal::OCTET_STRING,
                    actual: other,
                }));
            }
        };
        Ok(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(b) => {
                if is_printable(b) {
                    write!(f, "{}", String::from_utf8_lossy(b))
                } else {
                    write!(f, "0x{}", hex_string(b))
                }
            }
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress(a) => write!(f, "{}.{}.{}.{}", a[0], a[1], a[2], a[3]),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => write!(f, "{}", v),
            Value::Opaque(b) => write!(f, "0x{}", hex_string(b)),
            Value::Counter64(v) => write!(f, "{}", v),
            Value::NoSuchObject => write!(f, "noSuchObject"),
            Value::NoSuchInstance => write!(f, "noSuchInstance"),
            Value::EndOfMibView => write!(f, "endOfMibView"),
            Value::Unknown { tag, data } => write!(f, "[0x{:02X}] 0x{}", tag, hex_string(data)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

pub(crate) fn hex_string(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(DIGITS[usize::from(b >> 4)] as char);
        out.push(DIGITS[usize::from(b & 0x0F)] as char);
    }
    out
}

/// Printable means valid UTF-8 without control characters, allowing
/// common whitespace. An empty string counts as printable.
pub(crate) fn is_printable(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(s) => s
            .chars()
            .all(|c| !c.is_control() || c == '\n' || c == '\r' || c == '\t'),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_of_printable_octet_string() {
        assert_eq!(Value::from("Gi0/1").to_text(), "Gi0/1");
    }

    #[test]
    fn test_text_of_binary_octet_string_is_hex() {
        let v = Value::OctetString(Bytes::from_static(&[0x80, 0x00, 0x01]));
        assert_eq!(v.to_text(), "0x800001");
    }

    #[test]
    fn test_hex_ignores_printability() {
        // 0x41 is 'A'; a bitmap that happens to be printable must still be hex.
        let v = Value::OctetString(Bytes::from_static(b"A"));
        assert_eq!(v.to_text(), "A");
        assert_eq!(v.to_hex().as_deref(), Some("41"));
    }

    #[test]
    fn test_integer_text() {
        assert_eq!(Value::Integer(6).to_text(), "6");
        assert_eq!(Value::Gauge32(161).to_text(), "161");
        assert_eq!(Value::Integer(6).to_hex(), None);
    }

    fn roundtrip(value: &Value) -> Value {
        let mut buf = EncodeBuf::new();
        value.encode(&mut buf);
        let mut dec = Decoder::new(buf.finish());
        let out = Value::decode(&mut dec).unwrap();
        assert!(dec.is_empty());
        out
    }

    #[test]
    fn test_codec_preserves_bitmap_octets() {
        let bitmap = Value::OctetString(Bytes::from_static(&[0x80, 0x00, 0x00, 0x01]));
        assert_eq!(roundtrip(&bitmap), bitmap);
    }

    #[test]
    fn test_codec_unsigned_high_bit() {
        assert_eq!(
            roundtrip(&Value::Gauge32(u32::MAX)),
            Value::Gauge32(u32::MAX)
        );
        assert_eq!(roundtrip(&Value::EndOfMibView), Value::EndOfMibView);
    }

    #[test]
    fn test_decode_rejects_short_ip_address() {
        let mut dec = Decoder::new(Bytes::from_static(&[0x40, 0x02, 10, 0]));
        assert!(matches!(
            Value::decode(&mut dec),
            Err(Error::MalformedResponse {
                kind: BerErrorKind::InvalidIpAddressLength { length: 2 },
                ..
            })
        ));
    }

    #[test]
    fn test_exceptions() {
        assert!(Value::EndOfMibView.is_exception());
        assert!(Value::NoSuchInstance.is_exception());
        assert!(!Value::Null.is_exception());
    }
}
