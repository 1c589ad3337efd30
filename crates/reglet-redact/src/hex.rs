//! Minimal hex encoding, hand-rolled to avoid pulling in the `hex` crate for
//! a handful of bytes — the same tradeoff a fixed-length signature
//! verification makes for its own HMAC digests.

pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_known_bytes() {
        assert_eq!(encode(&[0x00, 0xff, 0x10]), "00ff10");
    }

    #[test]
    fn empty_input_encodes_empty() {
        assert_eq!(encode(&[]), "");
    }
}
