//! BLAKE3, the chunk-chaining relative of the sponge trees.
//!
//! Leaves are 1024-byte chunks compressed 64 bytes at a time; their 32-byte
//! chaining values are merged into a left-balanced binary tree through a stack,
//! and the root node is squeezed by incrementing its output block counter.

use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

use crate::engine::{output_window, Engine};

/// Default digest size in bytes.
pub const OUT_LEN: usize = 32;

/// Key size in bytes for keyed hashing.
pub const KEY_LEN: usize = 32;

/// Compression block size in bytes.
pub const BLOCK_LEN: usize = 64;

/// Chunk size in bytes.
pub const CHUNK_LEN: usize = 1024;

const IV: [u32; 8] = [
    0x6A09E667, 0xBB67AE85, 0x3C6EF372, 0xA54FF53A, 0x510E527F, 0x9B05688C, 0x1F83D9AB, 0x5BE0CD19,
];

const MSG_PERMUTATION: [usize; 16] = [2, 6, 3, 10, 7, 0, 4, 13, 1, 11, 12, 5, 9, 14, 15, 8];

// domain separation flags
const CHUNK_START: u32 = 1 << 0;
const CHUNK_END: u32 = 1 << 1;
const PARENT: u32 = 1 << 2;
const ROOT: u32 = 1 << 3;
const KEYED_HASH: u32 = 1 << 4;
const DERIVE_KEY_CONTEXT: u32 = 1 << 5;
const DERIVE_KEY_MATERIAL: u32 = 1 << 6;

// 2^54 chunks exceed any u64 input length
const MAX_DEPTH: usize = 54;

#[inline(always)]
fn g(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize, mx: u32, my: u32) {
    state[a] = state[a].wrapping_add(state[b]).wrapping_add(mx);
    state[d] = (state[d] ^ state[a]).rotate_right(16);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_right(12);
    state[a] = state[a].wrapping_add(state[b]).wrapping_add(my);
    state[d] = (state[d] ^ state[a]).rotate_right(8);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_right(7);
}

#[inline(always)]
fn round(state: &mut [u32; 16], m: &[u32; 16]) {
    // columns
    g(state, 0, 4, 8, 12, m[0], m[1]);
    g(state, 1, 5, 9, 13, m[2], m[3]);
    g(state, 2, 6, 10, 14, m[4], m[5]);
    g(state, 3, 7, 11, 15, m[6], m[7]);
    // diagonals
    g(state, 0, 5, 10, 15, m[8], m[9]);
    g(state, 1, 6, 11, 12, m[10], m[11]);
    g(state, 2, 7, 8, 13, m[12], m[13]);
    g(state, 3, 4, 9, 14, m[14], m[15]);
}

fn permute_message(m: &mut [u32; 16]) {
    let original = *m;
    m.iter_mut()
        .zip(MSG_PERMUTATION.iter())
        .for_each(|(w, &i)| *w = original[i]);
}

/// compress is the BLAKE3 compression function over a 16-word state.
pub fn compress(
    chaining_value: &[u32; 8],
    block_words: &[u32; 16],
    counter: u64,
    block_len: u32,
    flags: u32,
) -> [u32; 16] {
    let mut state = [
        chaining_value[0],
        chaining_value[1],
        chaining_value[2],
        chaining_value[3],
        chaining_value[4],
        chaining_value[5],
        chaining_value[6],
        chaining_value[7],
        IV[0],
        IV[1],
        IV[2],
        IV[3],
        counter as u32,
        (counter >> 32) as u32,
        block_len,
        flags,
    ];
    let mut block = *block_words;

    round(&mut state, &block);
    for _ in 1..7 {
        permute_message(&mut block);
        round(&mut state, &block);
    }

    for i in 0..8 {
        state[i] ^= state[i + 8];
        state[i + 8] ^= chaining_value[i];
    }
    state
}

fn first_8_words(words: [u32; 16]) -> [u32; 8] {
    let mut out = [0; 8];
    out.copy_from_slice(&words[..8]);
    out
}

fn words_from_block(block: &[u8]) -> [u32; 16] {
    let mut words = [0u32; 16];
    LittleEndian::read_u32_into(block, &mut words);
    words
}

fn words_from_key(key: &[u8; KEY_LEN]) -> [u32; 8] {
    let mut words = [0u32; 8];
    LittleEndian::read_u32_into(key, &mut words);
    words
}

// Output is a node whose last compression has not been performed yet: it can become
// a chaining value or, with the ROOT flag, the output stream.
#[derive(Clone, Copy)]
struct Output {
    input_chaining_value: [u32; 8],
    block_words: [u32; 16],
    counter: u64,
    block_len: u32,
    flags: u32,
}

impl Output {
    fn chaining_value(&self) -> [u32; 8] {
        first_8_words(compress(
            &self.input_chaining_value,
            &self.block_words,
            self.counter,
            self.block_len,
            self.flags,
        ))
    }

    fn root_block(&self, output_block_counter: u64) -> [u8; 2 * OUT_LEN] {
        let words = compress(
            &self.input_chaining_value,
            &self.block_words,
            output_block_counter,
            self.block_len,
            self.flags | ROOT,
        );
        let mut out = [0u8; 2 * OUT_LEN];
        LittleEndian::write_u32_into(&words, &mut out);
        out
    }
}

fn parent_output(left: &[u32; 8], right: &[u32; 8], key: &[u32; 8], flags: u32) -> Output {
    let mut block_words = [0u32; 16];
    block_words[..8].copy_from_slice(left);
    block_words[8..].copy_from_slice(right);
    Output {
        input_chaining_value: *key,
        block_words,
        counter: 0,
        block_len: BLOCK_LEN as u32,
        flags: PARENT | flags,
    }
}

/// ChunkState is the BLAKE3 leaf absorber for one 1024-byte chunk.
///
/// The last block is always kept in the buffer, even when full, because only the
/// caller knows whether it is the chunk's final block.
#[derive(Clone)]
struct ChunkState {
    chaining_value: [u32; 8],
    chunk_counter: u64,
    block: [u8; BLOCK_LEN],
    block_len: usize,
    blocks_compressed: u8,
    flags: u32,
}

impl ChunkState {
    fn new(key: &[u32; 8], chunk_counter: u64, flags: u32) -> Self {
        Self {
            chaining_value: *key,
            chunk_counter,
            block: [0; BLOCK_LEN],
            block_len: 0,
            blocks_compressed: 0,
            flags,
        }
    }

    fn len(&self) -> usize {
        BLOCK_LEN * self.blocks_compressed as usize + self.block_len
    }

    // CHUNK_START marks the first block of a chunk only
    fn start_flag(&self) -> u32 {
        if self.blocks_compressed == 0 {
            CHUNK_START
        } else {
            0
        }
    }

    fn update(&mut self, mut input: &[u8]) {
        while !input.is_empty() {
            if self.block_len == BLOCK_LEN {
                let block_words = words_from_block(&self.block);
                self.chaining_value = first_8_words(compress(
                    &self.chaining_value,
                    &block_words,
                    self.chunk_counter,
                    BLOCK_LEN as u32,
                    self.flags | self.start_flag(),
                ));
                self.blocks_compressed += 1;
                self.block = [0; BLOCK_LEN];
                self.block_len = 0;
            }

            let take = (BLOCK_LEN - self.block_len).min(input.len());
            self.block[self.block_len..self.block_len + take].copy_from_slice(&input[..take]);
            self.block_len += take;
            input = &input[take..];
        }
    }

    fn output(&self) -> Output {
        Output {
            input_chaining_value: self.chaining_value,
            block_words: words_from_block(&self.block),
            counter: self.chunk_counter,
            block_len: self.block_len as u32,
            flags: self.flags | self.start_flag() | CHUNK_END,
        }
    }
}

// hash_whole_chunk compresses a full chunk straight from the input, never buffering.
fn hash_whole_chunk(chunk: &[u8], key: &[u32; 8], chunk_counter: u64, flags: u32) -> [u32; 8] {
    debug_assert_eq!(chunk.len(), CHUNK_LEN);

    let mut cv = *key;
    let last = CHUNK_LEN / BLOCK_LEN - 1;
    for (i, block) in chunk.chunks_exact(BLOCK_LEN).enumerate() {
        let mut block_flags = flags;
        if i == 0 {
            block_flags |= CHUNK_START;
        }
        if i == last {
            block_flags |= CHUNK_END;
        }
        cv = first_8_words(compress(
            &cv,
            &words_from_block(block),
            chunk_counter,
            BLOCK_LEN as u32,
            block_flags,
        ));
    }
    cv
}

// CvStack is the root accumulator: one pending chaining value per tree level.
#[derive(Clone)]
struct CvStack {
    stack: [[u32; 8]; MAX_DEPTH],
    len: usize,
}

impl CvStack {
    fn new() -> Self {
        Self {
            stack: [[0; 8]; MAX_DEPTH],
            len: 0,
        }
    }

    fn push(&mut self, cv: [u32; 8]) {
        assert!(self.len < MAX_DEPTH, "chaining value stack overflow");
        self.stack[self.len] = cv;
        self.len += 1;
    }

    fn pop(&mut self) -> [u32; 8] {
        self.len -= 1;
        self.stack[self.len]
    }

    // Merges every completed subtree: the number of merges is the number of trailing
    // zero bits of the total chunk count.
    fn add_chunk(&mut self, mut cv: [u32; 8], mut total_chunks: u64, key: &[u32; 8], flags: u32) {
        while total_chunks & 1 == 0 {
            cv = parent_output(&self.pop(), &cv, key, flags).chaining_value();
            total_chunks >>= 1;
        }
        self.push(cv);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Hash,
    KeyedHash,
    DeriveKey,
}

#[derive(Clone)]
enum Phase {
    Accumulating,
    Squeezing(Blake3Reader),
}

/// Blake3Hasher is the streaming BLAKE3 front-end.
#[derive(Clone)]
pub struct Blake3Hasher {
    key: [u32; 8],
    flags: u32,
    mode: Mode,
    chunk: ChunkState,
    cv_stack: CvStack,
    phase: Phase,
}

impl Blake3Hasher {
    fn with_key_words(key: [u32; 8], flags: u32, mode: Mode) -> Self {
        Self {
            key,
            flags,
            mode,
            chunk: ChunkState::new(&key, 0, flags),
            cv_stack: CvStack::new(),
            phase: Phase::Accumulating,
        }
    }

    /// chunk_count returns the number of chunks opened so far.
    pub fn chunk_count(&self) -> u64 {
        self.chunk.chunk_counter + (self.chunk.len() > 0) as u64
    }

    /// reset discards all input, keeping the key and mode.
    pub fn reset(&mut self) {
        *self = Self::with_key_words(self.key, self.flags, self.mode);
    }

    /// finalize returns the default 32-byte digest without consuming the hasher.
    pub fn finalize(&self) -> [u8; OUT_LEN] {
        let mut out = [0; OUT_LEN];
        self.root_reader().read(&mut out);
        out
    }

    fn close_chunk(&mut self) {
        let cv = self.chunk.output().chaining_value();
        let total_chunks = self.chunk.chunk_counter + 1;
        self.cv_stack.add_chunk(cv, total_chunks, &self.key, self.flags);
        self.chunk = ChunkState::new(&self.key, total_chunks, self.flags);
    }

    // the pending chunk or, merged up through the stack, the root parent node
    fn root_reader(&self) -> Blake3Reader {
        let mut output = self.chunk.output();
        let mut stack = self.cv_stack.clone();
        while stack.len > 0 {
            output = parent_output(&stack.pop(), &output.chaining_value(), &self.key, self.flags);
        }
        Blake3Reader::new(output)
    }

    fn seal(&self) -> Blake3Reader {
        trace!(
            mode = ?self.mode,
            chunk_count = self.chunk_count(),
            "start digesting"
        );
        self.root_reader()
    }

    pub(crate) fn into_reader(self) -> Blake3Reader {
        if let Phase::Squeezing(reader) = self.phase {
            return reader;
        }
        self.seal()
    }
}

impl Default for Blake3Hasher {
    fn default() -> Self {
        new()
    }
}

impl Engine for Blake3Hasher {
    fn ingest(&mut self, mut input: &[u8]) {
        if let Phase::Squeezing(_) = self.phase {
            panic!("ingest called after start_digesting");
        }

        while !input.is_empty() {
            // more input exists, so a full chunk can no longer be the root
            if self.chunk.len() == CHUNK_LEN {
                self.close_chunk();
            }

            if self.chunk.len() == 0 && input.len() > CHUNK_LEN {
                let (whole, rest) = input.split_at(CHUNK_LEN);
                let counter = self.chunk.chunk_counter;
                let cv = hash_whole_chunk(whole, &self.key, counter, self.flags);
                self.cv_stack.add_chunk(cv, counter + 1, &self.key, self.flags);
                self.chunk = ChunkState::new(&self.key, counter + 1, self.flags);
                input = rest;
                continue;
            }

            let take = (CHUNK_LEN - self.chunk.len()).min(input.len());
            self.chunk.update(&input[..take]);
            input = &input[take..];
        }
    }

    fn start_digesting(&mut self) {
        if let Phase::Squeezing(_) = self.phase {
            panic!("start_digesting called twice");
        }
        self.phase = Phase::Squeezing(self.seal());
    }

    fn continue_digesting(&mut self, dest: &mut [u8], offset: usize, length: usize) {
        let window = output_window(dest, offset, length);
        match &mut self.phase {
            Phase::Squeezing(reader) => reader.read(window),
            Phase::Accumulating => panic!("continue_digesting called before start_digesting"),
        }
    }
}

impl std::fmt::Debug for Blake3Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blake3Hasher")
            .field("mode", &self.mode)
            .field("chunk_count", &self.chunk_count())
            .finish_non_exhaustive()
    }
}

/// Blake3Reader streams the output of a finalized BLAKE3 root node.
#[derive(Clone)]
pub struct Blake3Reader {
    output: Output,
    block_counter: u64,
    buffer: [u8; 2 * OUT_LEN],
    buffer_position: usize,
}

impl Blake3Reader {
    fn new(output: Output) -> Self {
        Self {
            output,
            block_counter: 0,
            buffer: [0; 2 * OUT_LEN],
            buffer_position: 2 * OUT_LEN,
        }
    }

    /// read fills `dest` with the next output bytes.
    pub fn read(&mut self, dest: &mut [u8]) {
        let mut written = 0;
        while written < dest.len() {
            if self.buffer_position == self.buffer.len() {
                self.buffer = self.output.root_block(self.block_counter);
                self.block_counter += 1;
                self.buffer_position = 0;
            }
            let take = (self.buffer.len() - self.buffer_position).min(dest.len() - written);
            dest[written..written + take]
                .copy_from_slice(&self.buffer[self.buffer_position..self.buffer_position + take]);
            self.buffer_position += take;
            written += take;
        }
    }
}

impl std::fmt::Debug for Blake3Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blake3Reader")
            .field("block_counter", &self.block_counter)
            .finish_non_exhaustive()
    }
}

/// new returns a hasher in the default hash mode.
pub fn new() -> Blake3Hasher {
    Blake3Hasher::with_key_words(IV, 0, Mode::Hash)
}

/// new_keyed returns a hasher in keyed mode.
pub fn new_keyed(key: &[u8; KEY_LEN]) -> Blake3Hasher {
    Blake3Hasher::with_key_words(words_from_key(key), KEYED_HASH, Mode::KeyedHash)
}

/// new_derive_key returns a hasher deriving key material under `context`.
/// The context should be a hardcoded, globally unique, application-specific string.
pub fn new_derive_key(context: &str) -> Blake3Hasher {
    let mut context_hasher = Blake3Hasher::with_key_words(IV, DERIVE_KEY_CONTEXT, Mode::DeriveKey);
    context_hasher.ingest(context.as_bytes());
    let context_key = context_hasher.finalize();
    Blake3Hasher::with_key_words(
        words_from_key(&context_key),
        DERIVE_KEY_MATERIAL,
        Mode::DeriveKey,
    )
}

/// hash returns the 32-byte BLAKE3 digest of `input`.
pub fn hash(input: &[u8]) -> [u8; OUT_LEN] {
    let mut h = new();
    h.ingest(input);
    h.finalize()
}

/// keyed_hash returns the 32-byte keyed BLAKE3 digest of `input`.
pub fn keyed_hash(key: &[u8; KEY_LEN], input: &[u8]) -> [u8; OUT_LEN] {
    let mut h = new_keyed(key);
    h.ingest(input);
    h.finalize()
}

/// derive_key derives 32 bytes of key material from `key_material` under `context`.
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; OUT_LEN] {
    let mut h = new_derive_key(context);
    h.ingest(key_material);
    h.finalize()
}

#[cfg(test)]
pub mod test {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const KEY: &[u8; KEY_LEN] = b"whats the Elvish word for friend";
    const CONTEXT: &str = "treehash 2026-10-19 blake3 test context";

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    const LENGTHS: &[usize] = &[
        0,
        1,
        63,
        64,
        65,
        1023,
        1024,
        1025,
        2048,
        2049,
        3072,
        3073,
        4096,
        4097,
        5120,
        8192,
        8193,
        16384,
        31744,
        102400,
    ];

    #[test]
    fn empty_input() {
        assert_eq!(
            hex::encode(hash(b"")),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn matches_reference_crate() {
        for &len in LENGTHS {
            let input = pattern(len);

            assert_eq!(hash(&input), *::blake3::hash(&input).as_bytes(), "hash len {}", len);
            assert_eq!(
                keyed_hash(KEY, &input),
                *::blake3::keyed_hash(KEY, &input).as_bytes(),
                "keyed len {}",
                len
            );
            assert_eq!(
                derive_key(CONTEXT, &input),
                ::blake3::derive_key(CONTEXT, &input),
                "derive_key len {}",
                len
            );
        }
    }

    #[test]
    fn extended_output_matches_reference_crate() {
        for &len in &[0, 1025, 4097] {
            let input = pattern(len);
            let mut expected = vec![0; 1000];
            let mut reference = ::blake3::Hasher::new();
            reference.update(&input);
            reference.finalize_xof().fill(&mut expected);

            let mut h = new();
            h.ingest(&input);
            h.start_digesting();
            let mut out = vec![0; 1000];
            let mut offset = 0;
            for step in [1, 63, 64, 65, 7, 300] {
                h.continue_digesting(&mut out, offset, step);
                offset += step;
            }
            h.continue_digesting(&mut out, offset, 1000 - offset);
            assert_eq!(out, expected, "len {}", len);
        }
    }

    #[test]
    fn call_splitting_invariance() {
        let mut rng = StdRng::seed_from_u64(3);
        let input = pattern(20 * CHUNK_LEN + 100);
        let expected = hash(&input);

        for _ in 0..8 {
            let mut h = new();
            let mut rest = &input[..];
            while !rest.is_empty() {
                let n = rng.gen_range(1..=rest.len().min(3000));
                h.ingest(&rest[..n]);
                rest = &rest[n..];
            }
            assert_eq!(h.finalize(), expected);
        }
    }

    #[test]
    fn whole_chunk_fast_path_matches_chunk_state() {
        let chunk = pattern(CHUNK_LEN);
        for counter in [0, 1, 5] {
            let mut state = ChunkState::new(&IV, counter, 0);
            state.update(&chunk);
            assert_eq!(
                hash_whole_chunk(&chunk, &IV, counter, 0),
                state.output().chaining_value(),
                "counter {}",
                counter
            );
        }
    }

    #[test]
    fn chunk_counting() {
        for (len, chunks) in [(0, 0), (1023, 1), (1024, 1), (1025, 2), (4096, 4)] {
            let mut h = new();
            h.ingest(&pattern(len));
            assert_eq!(h.chunk_count(), chunks, "len {}", len);
        }
    }

    #[test]
    fn reset_keeps_the_key() {
        let mut h = new_keyed(KEY);
        h.ingest(b"discarded");
        h.reset();
        h.ingest(b"kept");
        assert_eq!(h.finalize(), keyed_hash(KEY, b"kept"));
    }

    #[test]
    #[should_panic(expected = "ingest called after start_digesting")]
    fn ingest_after_start_panics() {
        let mut h = new();
        h.start_digesting();
        h.ingest(b"late");
    }
}
