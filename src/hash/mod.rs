//! BLAKE3 hashing engine
//!
//! Layered leaves first: [`compress`] is the 7-round compression function,
//! [`chunk`] threads a chaining value through the blocks of one chunk,
//! [`tree`] merges chunk chaining values into parents, [`hasher`] buffers
//! streaming input and [`xof`] turns the root into output of any length.
//! [`file`] drives the hasher from files and standard input.

pub mod chunk;
pub mod compress;
mod digest;
pub mod file;
pub mod hasher;
pub mod tree;
pub mod xof;

pub use compress::{Compressed, CompressionInput, Flags, IV};
pub use digest::Digest;
pub use file::{hash_file, hash_files_parallel, hash_input, hash_reader, hash_stdin, HashResult};
pub use hasher::Hasher;
pub use xof::{OutputReader, RootNode};

use crate::error::{B3Error, Result};

/// Bytes per message block
pub const BLOCK_LEN: usize = 64;
/// Bytes per chunk (16 blocks)
pub const CHUNK_LEN: usize = 1024;
/// Default digest length in bytes
pub const OUT_LEN: usize = 32;
/// Bytes produced per root output compression
pub const OUTPUT_BLOCK_LEN: usize = 2 * OUT_LEN;

/// Hash `input` in one call, producing `out_len` bytes
///
/// ```
/// let digest = b3stream::hash(b"", 32);
/// assert_eq!(
///     digest.to_hex(),
///     "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
/// );
/// ```
pub fn hash(input: &[u8], out_len: usize) -> Digest {
    let mut hasher = Hasher::new();
    hasher.update(input);
    hasher.finalize(out_len)
}

/// One-shot hash with a signed length; negative lengths are rejected
pub fn hash_checked(input: &[u8], requested: i64) -> Result<Digest> {
    let out_len = usize::try_from(requested).map_err(|_| B3Error::InvalidOutputLength(requested))?;
    Ok(hash(input, out_len))
}

/// One-shot hash that compresses chunks and output blocks on the rayon pool
pub fn hash_parallel(input: &[u8], out_len: usize) -> Digest {
    let mut hasher = Hasher::new();
    hasher.update_parallel(input);
    Digest::from(hasher.finalize_xof().root().expand_parallel(out_len))
}
