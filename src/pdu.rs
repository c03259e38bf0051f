//! SNMPv2c messages.
//!
//! Only the two PDUs a bulk walk needs are modelled: the GETBULK request
//! and the RESPONSE that answers it.

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{BerErrorKind, Error, Result};
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};

/// Version field value for SNMPv2c (RFC 1901).
pub const SNMP_V2C: i32 = 1;

/// GETBULK request PDU (RFC 3416 section 4.2.3).
#[derive(Debug, Clone, PartialEq)]
pub struct GetBulkRequest {
    pub request_id: i32,
    pub non_repeaters: i32,
    pub max_repetitions: i32,
    pub varbinds: Vec<VarBind>,
}

/// RESPONSE PDU.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub request_id: i32,
    pub error_status: i32,
    /// One-based index of the offending binding, zero when not applicable.
    pub error_index: i32,
    pub varbinds: Vec<VarBind>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pdu {
    GetBulk(GetBulkRequest),
    Response(Response),
}

impl Pdu {
    pub fn tag(&self) -> u8 {
        match self {
            Pdu::GetBulk(_) => tag::pdu::GET_BULK_REQUEST,
            Pdu::Response(_) => tag::pdu::RESPONSE,
        }
    }

    pub fn request_id(&self) -> i32 {
        match self {
            Pdu::GetBulk(p) => p.request_id,
            Pdu::Response(p) => p.request_id,
        }
    }

    fn encode(&self, buf: &mut EncodeBuf) {
        // GETBULK reuses the error-status/error-index slots for its two
        // repetition parameters.
        let (request_id, second, third, varbinds) = match self {
            Pdu::GetBulk(p) => (
                p.request_id,
                p.non_repeaters,
                p.max_repetitions,
                &p.varbinds,
            ),
            Pdu::Response(p) => (p.request_id, p.error_status, p.error_index, &p.varbinds),
        };
        buf.push_constructed(self.tag(), |buf| {
            encode_varbind_list(buf, varbinds);
            buf.push_integer(i64::from(third));
            buf.push_integer(i64::from(second));
            buf.push_integer(i64::from(request_id));
        });
    }

    fn decode(decoder: &mut Decoder) -> Result<Self> {
        let at = decoder.offset();
        let pdu_tag = decoder
            .peek_tag()
            .ok_or_else(|| Error::malformed(at, BerErrorKind::TruncatedData))?;
        if pdu_tag != tag::pdu::GET_BULK_REQUEST && pdu_tag != tag::pdu::RESPONSE {
            return Err(Error::malformed(at, BerErrorKind::UnknownPduType(pdu_tag)));
        }

        let mut body = decoder.read_constructed(pdu_tag)?;
        let request_id = body.read_i32()?;
        let second = body.read_i32()?;
        let third = body.read_i32()?;
        let varbinds = decode_varbind_list(&mut body)?;

        Ok(if pdu_tag == tag::pdu::GET_BULK_REQUEST {
            Pdu::GetBulk(GetBulkRequest {
                request_id,
                non_repeaters: second,
                max_repetitions: third,
                varbinds,
            })
        } else {
            Pdu::Response(Response {
                request_id,
                error_status: second,
                error_index: third,
                varbinds,
            })
        })
    }
}

/// A community-based SNMPv2c message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub community: Bytes,
    pub pdu: Pdu,
}

impl Message {
    pub fn new(community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            community: community.into(),
            pdu,
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.community);
            buf.push_integer(i64::from(SNMP_V2C));
        });
        buf.finish()
    }

    pub fn decode(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;
        if !decoder.is_empty() {
            return Err(Error::malformed(
                decoder.offset(),
                BerErrorKind::TrailingData {
                    remaining: decoder.remaining(),
                },
            ));
        }

        let version_at = seq.offset();
        let version = seq.read_i32()?;
        if version != SNMP_V2C {
            return Err(Error::malformed(
                version_at,
                BerErrorKind::UnknownVersion(version),
            ));
        }
        let community = seq.read_octet_string()?;
        let pdu = Pdu::decode(&mut seq)?;
        Ok(Self { community, pdu })
    }
}

/// Pull the request id out of a message without decoding its bindings.
///
/// The shared transport uses this to route datagrams to waiting requests.
pub fn extract_request_id(data: &Bytes) -> Option<i32> {
    let mut decoder = Decoder::new(data.clone());
    let mut seq = decoder.read_sequence().ok()?;
    seq.read_i32().ok()?;
    seq.read_octet_string().ok()?;
    let pdu_tag = seq.peek_tag()?;
    let mut body = seq.read_constructed(pdu_tag).ok()?;
    body.read_i32().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::value::Value;

    fn bulk(request_id: i32) -> Message {
        Message::new(
            Bytes::from_static(b"public"),
            Pdu::GetBulk(GetBulkRequest {
                request_id,
                non_repeaters: 0,
                max_repetitions: 50,
                varbinds: vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 3))],
            }),
        )
    }

    #[test]
    fn test_get_bulk_wire_layout() {
        let bytes = bulk(1).encode();
        // SEQUENCE { INTEGER 1, OCTET STRING "public", GetBulk { ... } }
        assert_eq!(bytes[0], 0x30);
        assert_eq!(&bytes[2..5], &[0x02, 0x01, 0x01]);
        assert_eq!(&bytes[5..13], b"\x04\x06public");
        assert_eq!(bytes[13], tag::pdu::GET_BULK_REQUEST);
        assert_eq!(Message::decode(bytes).unwrap(), bulk(1));
    }

    #[test]
    fn test_response_decodes_error_fields() {
        let msg = Message::new(
            Bytes::from_static(b"public"),
            Pdu::Response(Response {
                request_id: 9,
                error_status: 5,
                error_index: 1,
                varbinds: vec![VarBind::new(oid!(1, 3, 6, 1), Value::Null)],
            }),
        );
        let decoded = Message::decode(msg.encode()).unwrap();
        match decoded.pdu {
            Pdu::Response(r) => {
                assert_eq!(r.request_id, 9);
                assert_eq!(r.error_status, 5);
                assert_eq!(r.error_index, 1);
            }
            other => panic!("unexpected pdu: {other:?}"),
        }
    }

    #[test]
    fn test_extract_request_id() {
        assert_eq!(extract_request_id(&bulk(123456).encode()), Some(123456));
        assert_eq!(extract_request_id(&Bytes::from_static(&[0x30, 0x00])), None);
    }

    #[test]
    fn test_rejects_other_versions() {
        // Same message with version 0 (SNMPv1).
        let mut raw = bulk(1).encode().to_vec();
        raw[4] = 0x00;
        assert!(matches!(
            Message::decode(Bytes::from(raw)),
            Err(Error::MalformedResponse {
                kind: BerErrorKind::UnknownVersion(0),
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut raw = bulk(1).encode().to_vec();
        raw.push(0x00);
        assert!(matches!(
            Message::decode(Bytes::from(raw)),
            Err(Error::MalformedResponse {
                kind: BerErrorKind::TrailingData { remaining: 1 },
                ..
            })
        ));
    }
}
