//! Tags used by SNMPv2c messages.
//!
//! Single-octet tags only (X.690 8.1.2): class in bits 7-6, constructed in
//! bit 5, number in bits 4-0.

/// Tag classes (bits 7-6).
pub mod class {
    pub const APPLICATION: u8 = 0x40;
    pub const CONTEXT_SPECIFIC: u8 = 0x80;
}

pub const CONSTRUCTED: u8 = 0x20;

pub mod universal {
    pub const INTEGER: u8 = 0x02;
    pub const OCTET_STRING: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;
    pub const SEQUENCE: u8 = 0x30;
}

/// SMIv2 application types.
pub mod application {
    pub const IP_ADDRESS: u8 = 0x40;
    pub const COUNTER32: u8 = 0x41;
    /// Also Unsigned32.
    pub const GAUGE32: u8 = 0x42;
    pub const TIMETICKS: u8 = 0x43;
    pub const OPAQUE: u8 = 0x44;
    pub const COUNTER64: u8 = 0x46;
}

/// Exception values in a response varbind.
pub mod context {
    pub const NO_SUCH_OBJECT: u8 = 0x80;
    pub const NO_SUCH_INSTANCE: u8 = 0x81;
    pub const END_OF_MIB_VIEW: u8 = 0x82;
}

/// The two PDUs a walker exchanges.
pub mod pdu {
    use super::CONSTRUCTED;
    use super::class::CONTEXT_SPECIFIC;

    /// 0xA2
    pub const RESPONSE: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x02;
    /// 0xA5
    pub const GET_BULK_REQUEST: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x05;
}

#[inline]
pub const fn tag_class(tag: u8) -> u8 {
    tag & 0xC0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdu_tags() {
        assert_eq!(pdu::RESPONSE, 0xA2);
        assert_eq!(pdu::GET_BULK_REQUEST, 0xA5);
        assert_eq!(tag_class(application::COUNTER64), class::APPLICATION);
        assert_eq!(tag_class(context::END_OF_MIB_VIEW), class::CONTEXT_SPECIFIC);
    }
}
