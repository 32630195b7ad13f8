use byteorder::{ByteOrder, LittleEndian};

/// Number of 64-bit lanes in a Keccak-p[1600] state.
pub const LANES: usize = 25;

/// Width of a Keccak-p[1600] state in bytes.
pub const STATE_BYTES: usize = LANES * 8;

/// State is the fixed-size lane array mutated by [`KeccakP1600::permute`].
pub type State = [u64; LANES];

/// KeccakP1600 is the Keccak-p[1600, n] permutation with a fixed round count.
///
/// The round count selects the last `rounds` rounds of Keccak-f[1600], as
/// FIPS 202 defines Keccak-p. 24 rounds is Keccak-f itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeccakP1600 {
    rounds: usize,
}

impl KeccakP1600 {
    /// new returns the permutation with the given number of rounds.
    pub const fn new(rounds: usize) -> Self {
        if rounds == 0 || rounds > 24 {
            panic!("Keccak-p[1600] supports 1 to 24 rounds");
        }
        Self { rounds }
    }

    /// rounds returns the number of rounds applied per call.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// permute applies the permutation in place.
    #[inline]
    pub fn permute(&self, state: &mut State) {
        keccak::p1600(state, self.rounds);
    }
}

/// xor_block XORs a lane-aligned block of input into the leading lanes of the state.
/// `block.len()` must be a multiple of 8.
#[inline]
pub fn xor_block(state: &mut State, block: &[u8]) {
    xor_lanes(state, block);
}

#[inline]
fn xor_lanes(lanes: &mut [u64], block: &[u8]) {
    debug_assert_eq!(block.len() % 8, 0, "block is not lane aligned");
    block
        .chunks_exact(8)
        .zip(lanes.iter_mut())
        .for_each(|(b, lane)| *lane ^= LittleEndian::read_u64(b));
}

/// xor_bytes XORs `bytes` into the state starting at byte `offset`.
pub fn xor_bytes(state: &mut State, offset: usize, bytes: &[u8]) {
    debug_assert!(offset + bytes.len() <= STATE_BYTES);

    let mut pos = offset;
    let mut rest = bytes;

    // leading bytes up to the next lane boundary
    while pos % 8 != 0 && !rest.is_empty() {
        state[pos / 8] ^= (rest[0] as u64) << (8 * (pos % 8));
        pos += 1;
        rest = &rest[1..];
    }

    let whole = rest.len() / 8 * 8;
    xor_lanes(&mut state[pos / 8..], &rest[..whole]);
    pos += whole;
    rest = &rest[whole..];

    for &b in rest {
        state[pos / 8] ^= (b as u64) << (8 * (pos % 8));
        pos += 1;
    }
}

/// extract_bytes copies `out.len()` bytes of the state, starting at byte `offset`, into `out`.
pub fn extract_bytes(state: &State, offset: usize, out: &mut [u8]) {
    debug_assert!(offset + out.len() <= STATE_BYTES);

    out.iter_mut()
        .enumerate()
        .for_each(|(i, o)| *o = (state[(offset + i) / 8] >> (8 * ((offset + i) % 8))) as u8);
}

/// extract_lanes serializes the first `out.len() / 8` lanes of the state.
#[inline]
pub fn extract_lanes(state: &State, out: &mut [u8]) {
    debug_assert_eq!(out.len() % 8, 0);
    out.chunks_exact_mut(8)
        .zip(state.iter())
        .for_each(|(o, lane)| LittleEndian::write_u64(o, *lane));
}
