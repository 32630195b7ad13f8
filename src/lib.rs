#![warn(missing_docs)]
//! Streaming tree hashes: KangarooTwelve, MarsupilamiFourteen, ParallelHash and BLAKE3.
//!
//! Every hasher accepts input in arbitrarily sized pieces and produces output of any
//! length, byte-identical to hashing the concatenated input in one call. The sponge
//! based trees share one engine built on the Keccak-p[1600] permutation; BLAKE3 uses
//! its own compression function behind the same [`Engine`] contract.
//!
//! The hashers also implement the RustCrypto [`digest`] traits
//! ([`digest::Update`], [`digest::ExtendableOutput`], [`digest::Reset`]).
//!
//! # Example
//! ```
//! use treehash::{kangaroo, parallel, Engine};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!   let mut h = kangaroo::k12(b"");
//!   h.ingest(b"hello ");
//!   h.ingest(b"world");
//!   let mut output = [0u8; 32];
//!   h.finalize_and_squeeze(&mut output);
//!   println!("K12: {}", hex::encode(output));
//!
//!   let mut h = parallel::parallel_hash128(b"my app", 8192, 256)?;
//!   h.ingest(b"hello world");
//!   h.finalize_and_squeeze(&mut output);
//!   println!("ParallelHash128: {}", hex::encode(output));
//!
//!   Ok(())
//! }
//! ```
//!
//! [`digest`]: https://docs.rs/digest

/// `permutation` wraps Keccak-p[1600] with a configurable round count.
pub mod permutation;
/// `encoding` holds the integer and string encodings of RFC 9861 and SP 800-185.
pub mod encoding;
/// `chunk` absorbs a single leaf and produces its chaining value.
pub mod chunk;
/// `squeeze` streams sponge output.
pub mod squeeze;
/// `root` accumulates chaining values into the final node.
pub mod root;
/// `engine` defines the streaming contract.
pub mod engine;
/// `tree` drives chunks and root for the sponge-based variants.
pub mod tree;
/// `kangaroo` builds KangarooTwelve and MarsupilamiFourteen hashers.
pub mod kangaroo;
/// `parallel` builds ParallelHash hashers.
pub mod parallel;
/// `blake3` is the chunk-chaining BLAKE3 hash.
pub mod blake3;
/// `xof` adapts the hashers to the `digest` traits.
pub mod xof;

pub use crate::blake3::{Blake3Hasher, Blake3Reader};
pub use crate::engine::Engine;
pub use crate::tree::{TreeHasher, Variant};
pub use crate::xof::TreeReader;
