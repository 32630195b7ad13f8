use std::cmp::Ordering;

use tracing::trace;

use crate::chunk::{ChainingValue, ChunkContext};
use crate::encoding::Encoded;
use crate::permutation::{xor_bytes, KeccakP1600, State, LANES, STATE_BYTES};
use crate::squeeze::SqueezeContext;

/// Padding terminator XORed into the last byte of the rate.
const PAD_TERMINATOR: u8 = 0x80;

/// RootContext is the final node of the tree. It absorbs the chaining value of
/// every leaf in order, then seals itself into a [`SqueezeContext`].
///
/// `position` is the byte offset inside the rate where the next absorption starts.
/// A full rate is permuted immediately, so `position < rate` always holds.
#[derive(Clone)]
pub struct RootContext {
    permutation: KeccakP1600,
    rate: usize,
    state: State,
    position: usize,
    chunk_count: u64,
}

impl RootContext {
    /// new returns an empty root.
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
            position: 0,
            chunk_count: 0,
        }
    }

    /// star turns the first chunk into the root: the chunk's state is taken over as is
    /// and the tree-mode `indicator` is absorbed right after its data.
    ///
    /// Consuming the chunk makes this a one-time transition.
    pub fn star(first_chunk: ChunkContext, indicator: &[u8]) -> Self {
        let (permutation, rate, state, position) = first_chunk.into_parts();
        let mut root = Self {
            permutation,
            rate,
            state,
            position,
            chunk_count: 0,
        };
        root.absorb(indicator);
        trace!(position = root.position, "tree mode engaged");
        root
    }

    /// position returns the byte offset of the next absorption inside the rate.
    pub fn position(&self) -> usize {
        self.position
    }

    /// chunk_count returns the number of chaining values absorbed so far.
    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    /// rate returns the number of bytes absorbed per permutation call.
    pub fn rate(&self) -> usize {
        self.rate
    }

    /// absorb XORs arbitrary bytes into the root, permuting every time the rate fills.
    pub fn absorb(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            let take = (self.rate - self.position).min(bytes.len());
            xor_bytes(&mut self.state, self.position, &bytes[..take]);
            self.position += take;
            bytes = &bytes[take..];

            if self.position == self.rate {
                self.permutation.permute(&mut self.state);
                self.position = 0;
            }
        }
    }

    /// chain absorbs one leaf's chaining value at the current position.
    pub fn chain(&mut self, cv: &ChainingValue) {
        let bytes = cv.as_bytes();
        let room = self.rate - self.position;
        assert!(
            bytes.len() <= self.rate,
            "chaining value of {} bytes exceeds the rate",
            bytes.len()
        );

        match bytes.len().cmp(&room) {
            // fits before the rate boundary
            Ordering::Less => {
                xor_bytes(&mut self.state, self.position, bytes);
                self.position += bytes.len();
            }
            // ends exactly on the boundary
            Ordering::Equal => {
                xor_bytes(&mut self.state, self.position, bytes);
                self.permutation.permute(&mut self.state);
                self.position = 0;
            }
            // straddles the boundary: the overflow lands after the permutation
            Ordering::Greater => {
                let (head, tail) = bytes.split_at(room);
                xor_bytes(&mut self.state, self.position, head);
                self.permutation.permute(&mut self.state);
                xor_bytes(&mut self.state, 0, tail);
                self.position = tail.len();
            }
        }

        self.chunk_count += 1;
    }

    /// finalize absorbs the encoded chunk count and the trailer, pads with `suffix`
    /// and returns the squeeze context. The root cannot absorb anything afterwards.
    pub fn finalize(
        mut self,
        encode_count: fn(u64) -> Encoded,
        trailer: &[u8],
        suffix: u8,
    ) -> SqueezeContext {
        let count = encode_count(self.chunk_count);
        self.absorb(count.as_bytes());
        self.absorb(trailer);

        xor_bytes(&mut self.state, self.position, &[suffix]);
        xor_bytes(&mut self.state, self.rate - 1, &[PAD_TERMINATOR]);

        trace!(chunk_count = self.chunk_count, "root finalized");
        SqueezeContext::new(self.permutation, self.rate, self.state)
    }
}

impl std::fmt::Debug for RootContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootContext")
            .field("rate", &self.rate)
            .field("position", &self.position)
            .field("chunk_count", &self.chunk_count)
            .finish_non_exhaustive()
    }
}
