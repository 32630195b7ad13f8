use crate::engine::Engine;
use crate::tree::{TreeHasher, Variant, KANGAROO_TRAILER};

/// Size in bytes of a KangarooTwelve / MarsupilamiFourteen chunk.
pub const CHUNK_SIZE: usize = 8192;

// The trailer is `FF FF` for both widths; it is only ever absorbed in tree mode.
fn new(variant: Variant, customization: &[u8]) -> TreeHasher {
    TreeHasher::new(
        variant,
        CHUNK_SIZE,
        customization.to_vec(),
        KANGAROO_TRAILER.to_vec(),
        None,
    )
}

/// k12 returns a KangarooTwelve hasher bound to `customization` (may be empty).
pub fn k12(customization: &[u8]) -> TreeHasher {
    new(Variant::KangarooTwelve, customization)
}

/// m14 returns a MarsupilamiFourteen hasher bound to `customization` (may be empty).
pub fn m14(customization: &[u8]) -> TreeHasher {
    new(Variant::MarsupilamiFourteen, customization)
}

/// k12_hash computes KangarooTwelve of `input` into `out`.
pub fn k12_hash(input: &[u8], customization: &[u8], out: &mut [u8]) {
    let mut h = k12(customization);
    h.ingest(input);
    h.finalize_and_squeeze(out);
}

/// m14_hash computes MarsupilamiFourteen of `input` into `out`.
pub fn m14_hash(input: &[u8], customization: &[u8], out: &mut [u8]) {
    let mut h = m14(customization);
    h.ingest(input);
    h.finalize_and_squeeze(out);
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::chunk::ChunkContext;
    use crate::encoding::length_encode;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    // single-shot sponge over a materialized message
    fn sponge(variant: Variant, input: &[u8], suffix: u8, out_len: usize) -> Vec<u8> {
        let mut c = ChunkContext::new(variant.permutation(), variant.rate());
        c.ingest(input);
        let mut out = vec![0; out_len];
        c.into_squeeze(suffix).read(&mut out);
        out
    }

    // the tree definition applied to the whole message at once
    fn reference(variant: Variant, m: &[u8], c: &[u8], out_len: usize) -> Vec<u8> {
        let mut s = m.to_vec();
        s.extend_from_slice(c);
        s.extend_from_slice(length_encode(c.len() as u64).as_bytes());

        if s.len() <= CHUNK_SIZE {
            return sponge(variant, &s, 0x07, out_len);
        }

        let chunks: Vec<&[u8]> = s.chunks(CHUNK_SIZE).collect();
        let mut node = chunks[0].to_vec();
        node.extend_from_slice(&[0x03, 0, 0, 0, 0, 0, 0, 0]);
        for chunk in &chunks[1..] {
            node.extend(sponge(variant, chunk, 0x0b, variant.chaining_value_len()));
        }
        node.extend_from_slice(length_encode(chunks.len() as u64 - 1).as_bytes());
        node.extend_from_slice(&[0xff, 0xff]);
        sponge(variant, &node, 0x06, out_len)
    }

    #[test]
    fn k12_empty() {
        let mut out = [0; 32];
        k12_hash(b"", b"", &mut out);
        assert_eq!(
            hex::encode(out),
            "1ac2d450fc3b4205d19da7bfca1b37513c0803577ac7167f06fe2ce1f0ef39e5"
        );
    }

    #[test]
    fn streaming_matches_reference_definition() {
        let lengths = [
            0,
            1,
            167,
            168,
            8190,
            8191,
            8192,
            8193,
            2 * 8192 - 1,
            2 * 8192,
            2 * 8192 + 1,
            3 * 8192 + 4000,
            22 * 8192 + 17,
        ];
        for variant in [Variant::KangarooTwelve, Variant::MarsupilamiFourteen] {
            for custom in [&b""[..], &b"customization"[..], &pattern(8200)[..]] {
                for &len in &lengths {
                    let m = pattern(len);
                    let mut h = new(variant, custom);
                    h.ingest(&m);
                    let mut out = vec![0; 200];
                    h.finalize_and_squeeze(&mut out);
                    assert_eq!(
                        out,
                        reference(variant, &m, custom, 200),
                        "{:?} len {} custom {}",
                        variant,
                        len,
                        custom.len()
                    );
                }
            }
        }
    }

    #[test]
    fn m14_differs_from_k12() {
        let mut a = [0; 32];
        let mut b = [0; 32];
        k12_hash(b"abc", b"", &mut a);
        m14_hash(b"abc", b"", &mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn customization_separates_outputs() {
        let mut a = [0; 64];
        let mut b = [0; 64];
        m14_hash(b"abc", b"", &mut a);
        m14_hash(b"abc", b"x", &mut b);
        assert_ne!(a, b);
    }
}
