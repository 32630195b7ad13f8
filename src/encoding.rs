/// Longest output of the integer encodings: eight value bytes plus the length byte.
pub const MAX_ENCODED_LEN: usize = 9;

/// Encoded is a short, stack-allocated integer encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Encoded {
    bytes: [u8; MAX_ENCODED_LEN],
    len: usize,
}

impl Encoded {
    /// as_bytes returns the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl AsRef<[u8]> for Encoded {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

// minimal big-endian representation of x; zero has no bytes but the buffer stays zeroed.
fn trimmed_be(x: u64) -> ([u8; 8], usize) {
    let n = 8 - x.leading_zeros() as usize / 8;
    let mut out = [0u8; 8];
    out[..n].copy_from_slice(&x.to_be_bytes()[8 - n..]);
    (out, n)
}

/// length_encode is the KangarooTwelve encoding: the minimal big-endian bytes of `x`
/// followed by their count. `length_encode(0)` is the single byte `00`.
pub fn length_encode(x: u64) -> Encoded {
    let (be, n) = trimmed_be(x);
    let mut bytes = [0u8; MAX_ENCODED_LEN];
    bytes[..n].copy_from_slice(&be[..n]);
    bytes[n] = n as u8;
    Encoded { bytes, len: n + 1 }
}

/// left_encode is the SP 800-185 encoding: the byte count first, then the big-endian
/// bytes of `x`, using at least one value byte.
pub fn left_encode(x: u64) -> Encoded {
    let (be, n) = trimmed_be(x);
    let n = n.max(1);
    let mut bytes = [0u8; MAX_ENCODED_LEN];
    bytes[0] = n as u8;
    bytes[1..=n].copy_from_slice(&be[..n]);
    Encoded { bytes, len: n + 1 }
}

/// right_encode is the SP 800-185 encoding: the big-endian bytes of `x`, using at least
/// one value byte, then the byte count.
pub fn right_encode(x: u64) -> Encoded {
    let (be, n) = trimmed_be(x);
    let n = n.max(1);
    let mut bytes = [0u8; MAX_ENCODED_LEN];
    bytes[..n].copy_from_slice(&be[..n]);
    bytes[n] = n as u8;
    Encoded { bytes, len: n + 1 }
}

/// encode_string is `left_encode(bit length) || s`.
pub fn encode_string(s: &[u8]) -> Vec<u8> {
    let mut out = left_encode(s.len() as u64 * 8).as_bytes().to_vec();
    out.extend_from_slice(s);
    out
}

/// bytepad prefixes `left_encode(w)` to `x` and zero-pads the result to a multiple of `w`.
pub fn bytepad(x: &[u8], w: usize) -> Vec<u8> {
    assert!(w > 0, "bytepad width must be positive");

    let mut out = left_encode(w as u64).as_bytes().to_vec();
    out.extend_from_slice(x);
    let padded = (out.len() + w - 1) / w * w;
    out.resize(padded, 0);
    out
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn length_encoding() {
        assert_eq!(length_encode(0).as_bytes(), &[0x00]);
        assert_eq!(length_encode(12).as_bytes(), &[0x0c, 0x01]);
        assert_eq!(length_encode(65538).as_bytes(), &[0x01, 0x00, 0x02, 0x03]);
        assert_eq!(length_encode(255).as_bytes(), &[0xff, 0x01]);
        assert_eq!(length_encode(256).as_bytes(), &[0x01, 0x00, 0x02]);
        assert_eq!(
            length_encode(u64::MAX).as_bytes(),
            &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x08]
        );
    }

    #[test]
    fn left_and_right_encoding() {
        assert_eq!(left_encode(0).as_bytes(), &[0x01, 0x00]);
        assert_eq!(right_encode(0).as_bytes(), &[0x00, 0x01]);
        assert_eq!(left_encode(168).as_bytes(), &[0x01, 0xa8]);
        assert_eq!(right_encode(256).as_bytes(), &[0x01, 0x00, 0x02]);
        assert_eq!(left_encode(8192).as_bytes(), &[0x02, 0x20, 0x00]);
    }

    #[test]
    fn encoded_string() {
        assert_eq!(
            encode_string(b"ParallelHash"),
            [&[0x01u8, 0x60][..], &b"ParallelHash"[..]].concat()
        );
        assert_eq!(encode_string(b""), vec![0x01, 0x00]);
    }

    #[test]
    fn bytepad_pads_to_width() {
        let padded = bytepad(&encode_string(b"ParallelHash"), 168);
        assert_eq!(padded.len(), 168);
        assert_eq!(&padded[..4], &[0x01, 0xa8, 0x01, 0x60]);
        assert!(padded[16..].iter().all(|&b| b == 0));

        // an exact fit is not extended by another block
        let exact = bytepad(&[0xaa; 6], 8);
        assert_eq!(exact, vec![0x01, 0x08, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa]);
    }
}
