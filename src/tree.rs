use std::mem;

use tracing::trace;

use crate::chunk::ChunkContext;
use crate::encoding::{length_encode, right_encode, Encoded};
use crate::engine::{output_window, Engine};
use crate::permutation::KeccakP1600;
use crate::root::RootContext;
use crate::squeeze::SqueezeContext;

/// Tree-mode indicator absorbed after the first chunk of a KangarooTwelve tree.
const TREE_INDICATOR: [u8; 8] = [0x03, 0, 0, 0, 0, 0, 0, 0];

/// Constant trailer closing a KangarooTwelve final node.
pub(crate) const KANGAROO_TRAILER: [u8; 2] = [0xff, 0xff];

/// Variant holds the constants of each sponge-based tree hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// KangarooTwelve: 12 rounds, 168-byte rate, 32-byte chaining values.
    KangarooTwelve,
    /// MarsupilamiFourteen: 14 rounds, 136-byte rate, 64-byte chaining values.
    MarsupilamiFourteen,
    /// ParallelHash128: SHAKE128 leaves under a cSHAKE128 root.
    ParallelHash128,
    /// ParallelHash256: SHAKE256 leaves under a cSHAKE256 root.
    ParallelHash256,
}

impl Variant {
    /// permutation returns the Keccak-p[1600] instance used by leaves and root.
    pub fn permutation(self) -> KeccakP1600 {
        match self {
            Variant::KangarooTwelve => KeccakP1600::new(12),
            Variant::MarsupilamiFourteen => KeccakP1600::new(14),
            Variant::ParallelHash128 | Variant::ParallelHash256 => KeccakP1600::new(24),
        }
    }

    /// rate returns the sponge rate in bytes.
    pub fn rate(self) -> usize {
        match self {
            Variant::KangarooTwelve | Variant::ParallelHash128 => 168,
            Variant::MarsupilamiFourteen | Variant::ParallelHash256 => 136,
        }
    }

    /// chaining_value_len returns the size of a leaf's chaining value in bytes.
    pub fn chaining_value_len(self) -> usize {
        match self {
            Variant::KangarooTwelve | Variant::ParallelHash128 => 32,
            Variant::MarsupilamiFourteen | Variant::ParallelHash256 => 64,
        }
    }

    // the first chunk doubles as the final node until a second chunk shows up
    fn first_chunk_is_root(self) -> bool {
        matches!(self, Variant::KangarooTwelve | Variant::MarsupilamiFourteen)
    }

    fn leaf_suffix(self) -> u8 {
        if self.first_chunk_is_root() {
            0x0b
        } else {
            0x1f
        }
    }

    fn root_suffix(self) -> u8 {
        if self.first_chunk_is_root() {
            0x06
        } else {
            0x04
        }
    }

    fn single_chunk_suffix(self) -> u8 {
        0x07
    }

    fn encode_count(self) -> fn(u64) -> Encoded {
        if self.first_chunk_is_root() {
            length_encode
        } else {
            right_encode
        }
    }
}

// Accumulator is the input side of the front-end.
#[derive(Clone)]
struct Accumulator {
    variant: Variant,
    chunk_size: usize,
    current: ChunkContext,
    root: Option<RootContext>,
    chunk_position: usize, // bytes in the current chunk, 0..=chunk_size
    chunks_closed: u64,
}

impl Accumulator {
    fn new(variant: Variant, chunk_size: usize, root: Option<RootContext>) -> Self {
        Self {
            variant,
            chunk_size,
            current: ChunkContext::new(variant.permutation(), variant.rate()),
            root,
            chunk_position: 0,
            chunks_closed: 0,
        }
    }

    fn ingest(&mut self, mut input: &[u8]) {
        while !input.is_empty() {
            // more input exists, so a full chunk can no longer be the last one
            if self.chunk_position == self.chunk_size {
                self.close_chunk();
            }

            if self.chunk_position == 0 && self.root.is_some() && input.len() > self.chunk_size {
                let (whole, rest) = input.split_at(self.chunk_size);
                self.chain_whole_chunk(whole);
                input = rest;
                continue;
            }

            let take = (self.chunk_size - self.chunk_position).min(input.len());
            self.current.ingest(&input[..take]);
            self.chunk_position += take;
            input = &input[take..];
        }
    }

    fn fresh_chunk(&self) -> ChunkContext {
        ChunkContext::new(self.variant.permutation(), self.variant.rate())
    }

    fn close_chunk(&mut self) {
        let fresh = self.fresh_chunk();
        let closed = mem::replace(&mut self.current, fresh);
        match self.root.as_mut() {
            Some(root) => {
                let cv = closed.finish(self.variant.leaf_suffix(), self.variant.chaining_value_len());
                root.chain(&cv);
            }
            None => self.root = Some(RootContext::star(closed, &TREE_INDICATOR)),
        }
        self.chunk_position = 0;
        self.chunks_closed += 1;
    }

    fn chain_whole_chunk(&mut self, chunk: &[u8]) {
        let v = self.variant;
        let cv = ChunkContext::hash_whole_chunk(
            v.permutation(),
            v.rate(),
            chunk,
            v.leaf_suffix(),
            v.chaining_value_len(),
        );
        if let Some(root) = self.root.as_mut() {
            root.chain(&cv);
            self.chunks_closed += 1;
        }
    }

    fn finish(self, trailer: &[u8]) -> SqueezeContext {
        let v = self.variant;
        match self.root {
            // the input never left the first chunk
            None => self.current.into_squeeze(v.single_chunk_suffix()),
            Some(mut root) => {
                if self.chunk_position > 0 {
                    let cv = self.current.finish(v.leaf_suffix(), v.chaining_value_len());
                    root.chain(&cv);
                }
                root.finalize(v.encode_count(), trailer, v.root_suffix())
            }
        }
    }

    fn chunk_count(&self) -> u64 {
        self.chunks_closed + (self.chunk_position > 0) as u64
    }
}

#[derive(Clone)]
enum Phase {
    Accumulating(Box<Accumulator>),
    Squeezing(Box<SqueezeContext>),
    // only observable if a panic interrupted a transition
    Poisoned,
}

/// TreeHasher is the streaming front-end of the sponge-based tree hashes
/// (KangarooTwelve, MarsupilamiFourteen and ParallelHash).
///
/// Input is cut into fixed-size chunks. A chunk is closed only when input beyond
/// it arrives, so a chunk that exactly ends the input is finalized by
/// [`Engine::start_digesting`], which can then still choose the single-chunk
/// encoding. Use the constructors in [`crate::kangaroo`] and [`crate::parallel`].
#[derive(Clone)]
pub struct TreeHasher {
    variant: Variant,
    chunk_size: usize,
    customization: Vec<u8>,
    trailer: Vec<u8>,
    initial_root: Option<RootContext>,
    phase: Phase,
    chunk_count: u64,
    tree_mode: bool,
}

impl TreeHasher {
    /// new assembles a hasher. For ParallelHash, `initial_root` carries the precomputed
    /// root prefix; for KangarooTwelve it is `None` and the first chunk becomes the root.
    pub(crate) fn new(
        variant: Variant,
        chunk_size: usize,
        customization: Vec<u8>,
        trailer: Vec<u8>,
        initial_root: Option<RootContext>,
    ) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");
        debug_assert_eq!(variant.first_chunk_is_root(), initial_root.is_none());

        let phase = Phase::Accumulating(Box::new(Accumulator::new(
            variant,
            chunk_size,
            initial_root.clone(),
        )));
        Self {
            variant,
            chunk_size,
            customization,
            trailer,
            initial_root,
            phase,
            chunk_count: 0,
            tree_mode: false,
        }
    }

    /// variant returns the algorithm this hasher computes.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// chunk_size returns the leaf size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// customization returns the customization string given at construction.
    pub fn customization(&self) -> &[u8] {
        &self.customization
    }

    /// chunk_count returns the number of chunks opened so far, counting a partially
    /// filled current chunk. After `start_digesting` it is the total chunk count.
    pub fn chunk_count(&self) -> u64 {
        match &self.phase {
            Phase::Accumulating(acc) => acc.chunk_count(),
            _ => self.chunk_count,
        }
    }

    /// tree_mode reports whether the root accumulator is in use: always for ParallelHash,
    /// and for KangarooTwelve once input crosses the first chunk boundary.
    pub fn tree_mode(&self) -> bool {
        match &self.phase {
            Phase::Accumulating(acc) => acc.root.is_some(),
            _ => self.tree_mode,
        }
    }

    /// is_squeezing reports whether `start_digesting` has been called.
    pub fn is_squeezing(&self) -> bool {
        matches!(self.phase, Phase::Squeezing(_))
    }

    /// reset discards all input and output state, keeping the configuration.
    pub fn reset(&mut self) {
        self.phase = Phase::Accumulating(Box::new(Accumulator::new(
            self.variant,
            self.chunk_size,
            self.initial_root.clone(),
        )));
        self.chunk_count = 0;
        self.tree_mode = false;
    }

    /// into_squeeze seals the hasher if needed and returns its output stream.
    pub(crate) fn into_squeeze(mut self) -> SqueezeContext {
        if !self.is_squeezing() {
            self.start_digesting();
        }
        match mem::replace(&mut self.phase, Phase::Poisoned) {
            Phase::Squeezing(squeeze) => *squeeze,
            _ => unreachable!("start_digesting always leaves the hasher squeezing"),
        }
    }
}

impl Engine for TreeHasher {
    fn ingest(&mut self, bytes: &[u8]) {
        match &mut self.phase {
            Phase::Accumulating(acc) => acc.ingest(bytes),
            Phase::Squeezing(_) => panic!("ingest called after start_digesting"),
            Phase::Poisoned => panic!("hasher used after a panic during finalization"),
        }
    }

    fn start_digesting(&mut self) {
        let mut acc = match mem::replace(&mut self.phase, Phase::Poisoned) {
            Phase::Accumulating(acc) => acc,
            Phase::Squeezing(_) => panic!("start_digesting called twice"),
            Phase::Poisoned => panic!("hasher used after a panic during finalization"),
        };

        if acc.variant.first_chunk_is_root() {
            // S = M || C || length_encode(|C|)
            acc.ingest(&self.customization);
            acc.ingest(length_encode(self.customization.len() as u64).as_bytes());
        }

        self.chunk_count = acc.chunk_count();
        self.tree_mode = acc.root.is_some();
        trace!(
            variant = ?self.variant,
            chunk_count = self.chunk_count,
            tree_mode = self.tree_mode,
            "start digesting"
        );

        self.phase = Phase::Squeezing(Box::new(acc.finish(&self.trailer)));
    }

    fn continue_digesting(&mut self, dest: &mut [u8], offset: usize, length: usize) {
        let window = output_window(dest, offset, length);
        match &mut self.phase {
            Phase::Squeezing(squeeze) => squeeze.read(window),
            Phase::Accumulating(_) => panic!("continue_digesting called before start_digesting"),
            Phase::Poisoned => panic!("hasher used after a panic during finalization"),
        }
    }
}

impl std::fmt::Debug for TreeHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeHasher")
            .field("variant", &self.variant)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_count", &self.chunk_count())
            .field("tree_mode", &self.tree_mode())
            .field("squeezing", &self.is_squeezing())
            .finish()
    }
}
