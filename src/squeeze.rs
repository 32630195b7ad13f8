use crate::permutation::{extract_lanes, KeccakP1600, State, STATE_BYTES};

/// SqueezeContext produces the output stream of a finalized, padded sponge state.
///
/// Every output block is preceded by one permutation call, including the first.
/// Reads can be split arbitrarily; the concatenation of all reads is the same stream.
/// The stream cannot be rewound.
#[derive(Clone)]
pub struct SqueezeContext {
    permutation: KeccakP1600,
    rate: usize,
    state: State,
    buffer: [u8; STATE_BYTES],
    buffer_position: usize, // next unread byte of buffer; rate when drained
    blocks_squeezed: u64,
}

impl SqueezeContext {
    /// new takes ownership of a padded state that has not been permuted yet.
    pub fn new(permutation: KeccakP1600, rate: usize, state: State) -> Self {
        Self {
            permutation,
            rate,
            state,
            buffer: [0; STATE_BYTES],
            buffer_position: rate,
            blocks_squeezed: 0,
        }
    }

    /// blocks_squeezed returns the number of permutation calls made so far.
    pub fn blocks_squeezed(&self) -> u64 {
        self.blocks_squeezed
    }

    /// read fills `dest` with the next `dest.len()` bytes of output.
    pub fn read(&mut self, dest: &mut [u8]) {
        let rate = self.rate;
        let mut written = 0;

        while written < dest.len() {
            if self.buffer_position == rate {
                self.permutation.permute(&mut self.state);
                extract_lanes(&self.state, &mut self.buffer[..rate]);
                self.buffer_position = 0;
                self.blocks_squeezed += 1;
            }

            let take = (rate - self.buffer_position).min(dest.len() - written);
            dest[written..written + take].copy_from_slice(
                &self.buffer[self.buffer_position..self.buffer_position + take],
            );
            self.buffer_position += take;
            written += take;
        }
    }
}

impl std::fmt::Debug for SqueezeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqueezeContext")
            .field("rate", &self.rate)
            .field("blocks_squeezed", &self.blocks_squeezed)
            .finish_non_exhaustive()
    }
}
