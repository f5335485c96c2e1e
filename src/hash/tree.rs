//! Incremental Merkle tree over chunk chaining values
//!
//! Only the roots of complete subtrees are kept. After `n` chunks the stack
//! holds one entry per set bit of `n`, largest subtree at the bottom.

use super::compress::{CompressionInput, Flags};
use super::BLOCK_LEN;

/// Deepest possible stack: 2^54 chunks of 1 KiB is 2^64 bytes
pub const MAX_DEPTH: usize = 54;

/// Input of a parent node over two child chaining values
///
/// Parents always use counter 0 and a full 64-byte block.
pub fn parent_input(key: &[u32; 8], left: &[u32; 8], right: &[u32; 8], flags: Flags) -> CompressionInput {
    let mut block = [0u32; 16];
    block[..8].copy_from_slice(left);
    block[8..].copy_from_slice(right);
    CompressionInput {
        cv: *key,
        block,
        counter: 0,
        block_len: BLOCK_LEN as u32,
        flags: Flags::PARENT | flags,
    }
}

/// Stack of completed but unmerged subtree chaining values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CvStack {
    entries: Vec<[u32; 8]>,
}

impl CvStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(MAX_DEPTH),
        }
    }

    /// Number of pending subtrees
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no chunk has been folded in
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold in the chaining value of chunk number `total_chunks` (1-based)
    ///
    /// Each trailing zero bit of `total_chunks` marks a subtree that just
    /// became complete, so merging follows binary carry propagation.
    pub fn merge(&mut self, key: &[u32; 8], cv: [u32; 8], mut total_chunks: u64) {
        debug_assert!(total_chunks > 0);
        self.entries.push(cv);
        while total_chunks & 1 == 0 && self.entries.len() >= 2 {
            let n = self.entries.len();
            let parent = parent_input(key, &self.entries[n - 2], &self.entries[n - 1], Flags::empty())
                .output_cv();
            self.entries.truncate(n - 2);
            self.entries.push(parent);
            total_chunks >>= 1;
            tracing::trace!(depth = self.entries.len(), "merged parent");
        }
        debug_assert!(self.entries.len() <= MAX_DEPTH);
    }

    /// Remove the most recently pushed subtree
    pub fn pop(&mut self) -> Option<[u32; 8]> {
        self.entries.pop()
    }

    /// Drain the stack into the root node above `tail_cv`
    ///
    /// `left` is the top subtree, already popped by the caller; a tree root
    /// always has one. Each remaining subtree becomes the left child of a
    /// parent whose right child is everything to its right. The last parent
    /// carries `ROOT` and is returned uncompressed so its output can be
    /// extended.
    pub fn fold_into_root(&mut self, key: &[u32; 8], left: [u32; 8], tail_cv: [u32; 8]) -> CompressionInput {
        let mut left = left;
        let mut right = tail_cv;
        while let Some(next) = self.entries.pop() {
            right = parent_input(key, &left, &right, Flags::empty()).output_cv();
            left = next;
        }
        parent_input(key, &left, &right, Flags::ROOT)
    }
}
