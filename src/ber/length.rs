//! BER length encoding (X.690 8.1.3).

/// Encode a definite length.
///
/// Returns the octets in reverse order, ready to be pushed onto an
/// [`EncodeBuf`](super::EncodeBuf), together with the number of valid octets.
pub fn encode_length(len: usize) -> ([u8; 9], usize) {
    let mut out = [0u8; 9];
    if len < 0x80 {
        out[0] = len as u8;
        return (out, 1);
    }

    let mut n = 0;
    let mut v = len;
    while v > 0 {
        out[n] = (v & 0xFF) as u8;
        n += 1;
        v >>= 8;
    }
    out[n] = 0x80 | n as u8;
    (out, n + 1)
}
