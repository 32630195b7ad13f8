use anyhow::{ensure, Context, Result};

use crate::encoding::{bytepad, encode_string, left_encode, right_encode};
use crate::root::RootContext;
use crate::tree::{TreeHasher, Variant};

/// cSHAKE function name of ParallelHash.
pub const FUNCTION_NAME: &[u8] = b"ParallelHash";

// bytepad(encode_string(N) || encode_string(S), rate) must fit one block:
// left_encode(rate) + encode_string(N) + a 3-byte left_encode(|S| * 8) take 19 bytes.
const PREFIX_OVERHEAD: usize = 19;

/// Output selects between the fixed-length and the extendable-output variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Output {
    /// ParallelHash with the output length, in bits, bound into the hash.
    Fixed(u64),
    /// ParallelHashXOF: arbitrary output, `right_encode(0)` in place of the length.
    Xof,
}

/// max_customization_len returns the longest customization string the variant accepts.
pub fn max_customization_len(variant: Variant) -> usize {
    variant.rate() - PREFIX_OVERHEAD
}

/// new returns a ParallelHash hasher. `block_size` is the leaf size B in bytes.
pub fn new(
    variant: Variant,
    customization: &[u8],
    block_size: u64,
    output: Output,
) -> Result<TreeHasher> {
    ensure!(
        matches!(variant, Variant::ParallelHash128 | Variant::ParallelHash256),
        "{:?} is not a ParallelHash variant",
        variant
    );
    ensure!(block_size > 0, "block size must be positive");
    let chunk_size = usize::try_from(block_size)
        .with_context(|| format!("block size {} does not fit in memory", block_size))?;

    let max = max_customization_len(variant);
    ensure!(
        customization.len() <= max,
        "customization is {} bytes, at most {} are supported",
        customization.len(),
        max
    );

    let output_bits = match output {
        Output::Fixed(bits) => {
            ensure!(
                bits > 0 && bits % 8 == 0,
                "output length must be a positive number of bytes, got {} bits",
                bits
            );
            bits
        }
        Output::Xof => 0,
    };

    let rate = variant.rate();
    let mut prefix = encode_string(FUNCTION_NAME);
    prefix.extend_from_slice(&encode_string(customization));
    let block = bytepad(&prefix, rate);
    debug_assert_eq!(block.len(), rate);

    let mut root = RootContext::new(variant.permutation(), rate);
    root.absorb(&block);
    root.absorb(left_encode(block_size).as_bytes());

    Ok(TreeHasher::new(
        variant,
        chunk_size,
        customization.to_vec(),
        right_encode(output_bits).as_bytes().to_vec(),
        Some(root),
    ))
}

/// parallel_hash128 returns a ParallelHash128 hasher producing `output_bits` bits.
pub fn parallel_hash128(customization: &[u8], block_size: u64, output_bits: u64) -> Result<TreeHasher> {
    new(
        Variant::ParallelHash128,
        customization,
        block_size,
        Output::Fixed(output_bits),
    )
}

/// parallel_hash256 returns a ParallelHash256 hasher producing `output_bits` bits.
pub fn parallel_hash256(customization: &[u8], block_size: u64, output_bits: u64) -> Result<TreeHasher> {
    new(
        Variant::ParallelHash256,
        customization,
        block_size,
        Output::Fixed(output_bits),
    )
}

/// parallel_hash_xof128 returns a ParallelHashXOF128 hasher.
pub fn parallel_hash_xof128(customization: &[u8], block_size: u64) -> Result<TreeHasher> {
    new(Variant::ParallelHash128, customization, block_size, Output::Xof)
}

/// parallel_hash_xof256 returns a ParallelHashXOF256 hasher.
pub fn parallel_hash_xof256(customization: &[u8], block_size: u64) -> Result<TreeHasher> {
    new(Variant::ParallelHash256, customization, block_size, Output::Xof)
}
