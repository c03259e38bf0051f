#![no_main]

use libfuzzer_sys::fuzz_target;

use dot1q_discovery::oid::Oid;
use dot1q_discovery::topology::{decode_bitmap, encode_bitmap};

fuzz_target!(|data: &[u8]| {
    let _ = Oid::from_ber(data);

    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(oid) = Oid::parse(s) {
        assert_eq!(Oid::parse(&oid.to_string()).ok(), Some(oid));
    }
    if let Ok(bits) = decode_bitmap(s) {
        assert_eq!(decode_bitmap(&encode_bitmap(&bits)).ok(), Some(bits));
    }
});
