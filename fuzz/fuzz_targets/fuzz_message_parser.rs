#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use dot1q_discovery::pdu::{Message, extract_request_id};

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    // Routing must never disagree with a full decode.
    let routed = extract_request_id(&bytes);
    if let Ok(message) = Message::decode(bytes) {
        assert_eq!(routed, Some(message.pdu.request_id()));
    }
});
