use crate::permutation::{
    extract_lanes, xor_block, xor_bytes, KeccakP1600, State, LANES, STATE_BYTES,
};
use crate::squeeze::SqueezeContext;

/// Widest chaining value any variant produces, in bytes (8 lanes).
pub const MAX_CHAINING_VALUE_LEN: usize = 64;

/// Padding terminator XORed into the last byte of the rate.
const PAD_TERMINATOR: u8 = 0x80;

/// ChainingValue is the short output of a finished leaf chunk.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ChainingValue {
    bytes: [u8; MAX_CHAINING_VALUE_LEN],
    len: usize,
}

impl ChainingValue {
    fn from_state(state: &State, len: usize) -> Self {
        assert!(
            len % 8 == 0 && len <= MAX_CHAINING_VALUE_LEN,
            "unsupported chaining value size {}",
            len
        );
        let mut bytes = [0u8; MAX_CHAINING_VALUE_LEN];
        extract_lanes(state, &mut bytes[..len]);
        Self { bytes, len }
    }

    /// as_bytes returns the chaining value as little-endian serialized lanes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// len returns the size of the chaining value in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// is_empty is always false for chaining values built by this crate.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for ChainingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChainingValue({})", hex::encode(self.as_bytes()))
    }
}

/// ChunkContext absorbs the bytes of one leaf chunk into its own sponge state.
///
/// Bytes are buffered until a whole rate-sized block is available; full blocks
/// coming straight from the caller are absorbed without being copied. Any split
/// of the same byte string across `ingest` calls leaves the context in the same
/// state.
#[derive(Clone)]
pub struct ChunkContext {
    permutation: KeccakP1600,
    rate: usize,
    state: State,
    buffer: [u8; STATE_BYTES],
    position: usize, // bytes buffered but not yet absorbed
    blocks_absorbed: u64, // full blocks permuted into the state
}

impl ChunkContext {
    /// new returns an empty chunk absorbing `rate` bytes per permutation call.
    pub fn new(permutation: KeccakP1600, rate: usize) -> Self {
        assert!(
            rate > 0 && rate % 8 == 0 && rate < STATE_BYTES,
            "invalid sponge rate {}",
            rate
        );
        Self {
            permutation,
            rate,
            state: [0; LANES],
            buffer: [0; STATE_BYTES],
            position: 0,
            blocks_absorbed: 0,
        }
    }

    /// rate returns the number of bytes absorbed per permutation call.
    pub fn rate(&self) -> usize {
        self.rate
    }

    /// position returns the number of bytes waiting in the block buffer.
    pub fn position(&self) -> usize {
        self.position
    }

    /// absorbed_any_block reports whether at least one full block went through the permutation.
    pub fn absorbed_any_block(&self) -> bool {
        self.blocks_absorbed > 0
    }

    /// blocks_absorbed returns the number of full blocks absorbed so far.
    pub fn blocks_absorbed(&self) -> u64 {
        self.blocks_absorbed
    }

    /// ingest absorbs `input` into the chunk.
    pub fn ingest(&mut self, mut input: &[u8]) {
        let rate = self.rate;

        if self.position > 0 {
            // continue with the existing buffer
            let take = (rate - self.position).min(input.len());
            self.buffer[self.position..self.position + take].copy_from_slice(&input[..take]);
            self.position += take;
            input = &input[take..];

            if self.position == rate {
                absorb_block(self.permutation, &mut self.state, &self.buffer[..rate]);
                self.blocks_absorbed += 1;
                self.position = 0;
            }
        }

        // whole blocks straight from the input
        let mut blocks = input.chunks_exact(rate);
        for block in &mut blocks {
            absorb_block(self.permutation, &mut self.state, block);
            self.blocks_absorbed += 1;
        }

        let rest = blocks.remainder();
        if !rest.is_empty() {
            self.buffer[..rest.len()].copy_from_slice(rest);
            self.position = rest.len();
        }
    }

    // pad XORs the last block (buffered bytes, suffix, zeros, terminator) into the state.
    fn pad(&mut self, suffix: u8) {
        let rate = self.rate;
        let mut last = [0u8; STATE_BYTES];
        last[..self.position].copy_from_slice(&self.buffer[..self.position]);
        if self.position == rate - 1 {
            last[self.position] = suffix | PAD_TERMINATOR;
        } else {
            last[self.position] = suffix;
            last[rate - 1] = PAD_TERMINATOR;
        }
        xor_block(&mut self.state, &last[..rate]);
        self.position = 0;
    }

    /// finish pads the chunk with `suffix` and returns the first `cv_len` bytes of the
    /// permuted state as the chunk's chaining value.
    pub fn finish(mut self, suffix: u8, cv_len: usize) -> ChainingValue {
        self.pad(suffix);
        self.permutation.permute(&mut self.state);
        ChainingValue::from_state(&self.state, cv_len)
    }

    /// into_squeeze pads the chunk with `suffix` and hands the state over for output.
    /// This is the single-chunk path: the chunk itself is the final node.
    pub fn into_squeeze(mut self, suffix: u8) -> SqueezeContext {
        self.pad(suffix);
        SqueezeContext::new(self.permutation, self.rate, self.state)
    }

    /// into_parts XORs the buffered bytes into the state without padding and returns
    /// the permutation, rate, state and the byte position the next absorption starts at.
    pub(crate) fn into_parts(mut self) -> (KeccakP1600, usize, State, usize) {
        let position = self.position;
        xor_bytes(&mut self.state, 0, &self.buffer[..position]);
        (self.permutation, self.rate, self.state, position)
    }

    /// hash_whole_chunk hashes a complete chunk read directly from `chunk` and returns
    /// its chaining value. The result is identical to ingesting `chunk` into a fresh
    /// context and calling [`ChunkContext::finish`], but no byte is ever buffered.
    pub fn hash_whole_chunk(
        permutation: KeccakP1600,
        rate: usize,
        chunk: &[u8],
        suffix: u8,
        cv_len: usize,
    ) -> ChainingValue {
        let mut state = [0u64; LANES];

        let mut blocks = chunk.chunks_exact(rate);
        for block in &mut blocks {
            absorb_block(permutation, &mut state, block);
        }

        // the final block: tail, suffix and terminator XORed in place
        let tail = blocks.remainder();
        xor_bytes(&mut state, 0, tail);
        xor_bytes(&mut state, tail.len(), &[suffix]);
        xor_bytes(&mut state, rate - 1, &[PAD_TERMINATOR]);
        permutation.permute(&mut state);

        ChainingValue::from_state(&state, cv_len)
    }
}

impl std::fmt::Debug for ChunkContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkContext")
            .field("rate", &self.rate)
            .field("position", &self.position)
            .field("blocks_absorbed", &self.blocks_absorbed)
            .finish_non_exhaustive()
    }
}

#[inline]
fn absorb_block(permutation: KeccakP1600, state: &mut State, block: &[u8]) {
    xor_block(state, block);
    permutation.permute(state);
}
