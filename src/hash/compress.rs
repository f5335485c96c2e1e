//! The BLAKE3 compression function
//!
//! Every node of the hash tree, whether a chunk block, a parent or an output
//! block of the root, is produced by one call to [`compress`]. The function is
//! pure: all scratch state lives in call-local arrays.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use super::BLOCK_LEN;

/// Initialization vector, also the key in unkeyed mode
pub const IV: [u32; 8] = [
    0x6A09_E667,
    0xBB67_AE85,
    0x3C6E_F372,
    0xA54F_F53A,
    0x510E_527F,
    0x9B05_688C,
    0x1F83_D9AB,
    0x5BE0_CD19,
];

/// Message word permutation applied between rounds: `new[i] = old[P[i]]`
pub const MSG_PERMUTATION: [usize; 16] = [2, 6, 3, 10, 7, 0, 4, 13, 1, 11, 12, 5, 9, 14, 15, 8];

const ROUNDS: usize = 7;

/// Domain separation flags carried in state word 15
///
/// Flags combine freely, e.g. a one-block input is compressed with
/// `CHUNK_START | CHUNK_END | ROOT`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u32);

impl Flags {
    /// First block of a chunk
    pub const CHUNK_START: Flags = Flags(1 << 0);
    /// Last block of a chunk
    pub const CHUNK_END: Flags = Flags(1 << 1);
    /// Parent node combining two child chaining values
    pub const PARENT: Flags = Flags(1 << 2);
    /// Root of the tree, the only node whose output is extendable
    pub const ROOT: Flags = Flags(1 << 3);

    const NAMES: [(Flags, &'static str); 4] = [
        (Self::CHUNK_START, "CHUNK_START"),
        (Self::CHUNK_END, "CHUNK_END"),
        (Self::PARENT, "PARENT"),
        (Self::ROOT, "ROOT"),
    ];

    /// No flags set
    pub const fn empty() -> Self {
        Flags(0)
    }

    /// Raw bit pattern as it enters the state
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every flag in `other` is also set in `self`
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flag is set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(empty)");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Output of one compression
///
/// Only the first eight words (the new chaining value) survive truncation.
/// The feed-forward half is kept for root nodes, where it feeds the XOF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compressed {
    /// Chaining value only
    Truncated([u32; 8]),
    /// Chaining value followed by the feed-forward half
    Full([u32; 16]),
}

impl Compressed {
    /// The new chaining value (words 0..8)
    pub fn chaining_value(&self) -> [u32; 8] {
        match self {
            Self::Truncated(cv) => *cv,
            Self::Full(words) => first_half(words),
        }
    }

    /// All output words, 8 or 16 of them
    pub fn words(&self) -> &[u32] {
        match self {
            Self::Truncated(cv) => &cv[..],
            Self::Full(words) => &words[..],
        }
    }

    /// The untruncated output, if it was kept
    pub fn wide(&self) -> Option<&[u32; 16]> {
        match self {
            Self::Truncated(_) => None,
            Self::Full(words) => Some(words),
        }
    }
}

/// Everything one compression consumes
///
/// Root nodes keep their input around so the output stage can replay it with
/// a different counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionInput {
    /// Chaining value going in (the key for first blocks and parents)
    pub cv: [u32; 8],
    /// 64-byte message block as little-endian words, zero padded
    pub block: [u32; 16],
    /// Chunk index for leaves, output block index for the root, 0 for parents
    pub counter: u64,
    /// Number of real bytes in `block`
    pub block_len: u32,
    /// Domain separation flags
    pub flags: Flags,
}

impl CompressionInput {
    /// Run the compression, keeping the feed-forward half unless `truncate`
    pub fn compress(&self, truncate: bool) -> Compressed {
        compress(&self.cv, &self.block, self.counter, self.block_len, self.flags, truncate)
    }

    /// Compress and keep only the chaining value
    pub fn output_cv(&self) -> [u32; 8] {
        self.compress(true).chaining_value()
    }

    /// Replay this input with `counter` substituted, keeping all 16 words
    pub fn wide_output(&self, counter: u64) -> [u32; 16] {
        let state = permuted_rounds(&self.cv, &self.block, counter, self.block_len, self.flags);
        finish_wide(&state, &self.cv)
    }
}

/// Compress one block
///
/// `counter` is split across state words 12 (low half) and 13 (high half).
pub fn compress(
    cv: &[u32; 8],
    block: &[u32; 16],
    counter: u64,
    block_len: u32,
    flags: Flags,
    truncate: bool,
) -> Compressed {
    debug_assert!(block_len as usize <= BLOCK_LEN);
    let state = permuted_rounds(cv, block, counter, block_len, flags);
    if truncate {
        let mut out = [0u32; 8];
        for (i, word) in out.iter_mut().enumerate() {
            *word = state[i] ^ state[i + 8];
        }
        Compressed::Truncated(out)
    } else {
        Compressed::Full(finish_wide(&state, cv))
    }
}

fn finish_wide(state: &[u32; 16], cv: &[u32; 8]) -> [u32; 16] {
    let mut out = [0u32; 16];
    for i in 0..8 {
        out[i] = state[i] ^ state[i + 8];
        out[i + 8] = state[i + 8] ^ cv[i];
    }
    out
}

fn permuted_rounds(
    cv: &[u32; 8],
    block: &[u32; 16],
    counter: u64,
    block_len: u32,
    flags: Flags,
) -> [u32; 16] {
    let mut state = [
        cv[0],
        cv[1],
        cv[2],
        cv[3],
        cv[4],
        cv[5],
        cv[6],
        cv[7],
        IV[0],
        IV[1],
        IV[2],
        IV[3],
        counter as u32,
        (counter >> 32) as u32,
        block_len,
        flags.bits(),
    ];
    let mut m = *block;

    let tracing = tracing::enabled!(tracing::Level::TRACE);
    if tracing {
        tracing::trace!(
            h = %HexWords(cv),
            m = %HexWords(block),
            t = counter,
            b = block_len,
            d = ?flags,
            "compress"
        );
    }

    for r in 0..ROUNDS {
        if r != 0 {
            permute(&mut m);
        }
        round(&mut state, &m);
        if tracing {
            tracing::trace!(round = r, v = %HexWords(&state), "after round");
        }
    }

    state
}

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
    // Columns
    g(state, 0, 4, 8, 12, m[0], m[1]);
    g(state, 1, 5, 9, 13, m[2], m[3]);
    g(state, 2, 6, 10, 14, m[4], m[5]);
    g(state, 3, 7, 11, 15, m[6], m[7]);
    // Diagonals
    g(state, 0, 5, 10, 15, m[8], m[9]);
    g(state, 1, 6, 11, 12, m[10], m[11]);
    g(state, 2, 7, 8, 13, m[12], m[13]);
    g(state, 3, 4, 9, 14, m[14], m[15]);
}

#[inline(always)]
fn permute(m: &mut [u32; 16]) {
    let mut permuted = [0u32; 16];
    for (slot, &src) in permuted.iter_mut().zip(MSG_PERMUTATION.iter()) {
        *slot = m[src];
    }
    *m = permuted;
}

fn first_half(words: &[u32; 16]) -> [u32; 8] {
    let mut cv = [0u32; 8];
    cv.copy_from_slice(&words[..8]);
    cv
}

/// Read up to 64 bytes as 16 little-endian words, zero padding the rest
pub fn block_words(bytes: &[u8]) -> [u32; 16] {
    debug_assert!(bytes.len() <= BLOCK_LEN);
    let mut padded = [0u8; BLOCK_LEN];
    padded[..bytes.len()].copy_from_slice(bytes);
    let mut words = [0u32; 16];
    for (word, le) in words.iter_mut().zip(padded.chunks_exact(4)) {
        *word = u32::from_le_bytes([le[0], le[1], le[2], le[3]]);
    }
    words
}

/// Serialize words little-endian into `out`, which must be `4 * words.len()` long
pub fn write_le_words(words: &[u32], out: &mut [u8]) {
    debug_assert_eq!(out.len(), words.len() * 4);
    for (word, dst) in words.iter().zip(out.chunks_exact_mut(4)) {
        dst.copy_from_slice(&word.to_le_bytes());
    }
}

/// Space separated 8-digit hex words, used for trace output
pub struct HexWords<'a>(pub &'a [u32]);

impl fmt::Display for HexWords<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:08x}", word)?;
        }
        Ok(())
    }
}
