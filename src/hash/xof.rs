//! Finalization and extendable output
//!
//! The root node's compression input is kept verbatim. Output block `k` is
//! that input compressed untruncated with the counter set to `k`, so the
//! digest can be extended to any length.

use rayon::prelude::*;
use std::io;

use super::chunk::{process_chunk, ChunkOutput};
use super::compress::{write_le_words, CompressionInput, Flags};
use super::tree::CvStack;
use super::OUTPUT_BLOCK_LEN;

/// The root of a finalized tree
#[derive(Debug, Clone)]
pub struct RootNode {
    input: CompressionInput,
    first_block: [u32; 16],
}

impl RootNode {
    /// Compute the root output for `input`
    ///
    /// The stored input has its counter reset to 0; output block `k` replays
    /// it with counter `k`.
    pub fn new(mut input: CompressionInput) -> Self {
        debug_assert!(input.flags.contains(Flags::ROOT));
        input.counter = 0;
        let first_block = input.wide_output(0);
        Self { input, first_block }
    }

    fn from_chunk(chunk: ChunkOutput) -> Self {
        match chunk.output.wide() {
            Some(words) => Self {
                input: chunk.last_block,
                first_block: *words,
            },
            None => Self::new(chunk.last_block),
        }
    }

    /// The root compression input, replayed for every output block
    pub fn input(&self) -> &CompressionInput {
        &self.input
    }

    /// Output block `counter` as 16 words
    ///
    /// Block 0 is the already computed root output.
    pub fn block_words(&self, counter: u64) -> [u32; 16] {
        if counter == 0 {
            self.first_block
        } else {
            self.input.wide_output(counter)
        }
    }

    /// Output block `counter` as 64 bytes
    pub fn block_bytes(&self, counter: u64) -> [u8; OUTPUT_BLOCK_LEN] {
        let mut out = [0u8; OUTPUT_BLOCK_LEN];
        write_le_words(&self.block_words(counter), &mut out);
        out
    }

    /// The first `len` bytes of the output stream
    pub fn expand(&self, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        for (counter, dst) in out.chunks_mut(OUTPUT_BLOCK_LEN).enumerate() {
            let block = self.block_bytes(counter as u64);
            dst.copy_from_slice(&block[..dst.len()]);
        }
        out
    }

    /// Like [`RootNode::expand`], computing output blocks on the rayon pool
    pub fn expand_parallel(&self, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        out.par_chunks_mut(OUTPUT_BLOCK_LEN)
            .enumerate()
            .for_each(|(counter, dst)| {
                let block = self.block_bytes(counter as u64);
                dst.copy_from_slice(&block[..dst.len()]);
            });
        out
    }
}

/// Choose the root node from a hasher's terminal state
///
/// * nothing was ever appended: a single empty block with
///   `CHUNK_START | CHUNK_END | ROOT`
/// * exactly one chunk: that chunk hashed as root
/// * otherwise: the tail chunk hashed as a leaf, then the stack drained into
///   parents, the last one being the root
pub(crate) fn finalize_root(key: &[u32; 8], pending: &[u8], chunk_counter: u64, stack: &mut CvStack) -> RootNode {
    let Some(top) = stack.pop() else {
        debug_assert_eq!(chunk_counter, 0);
        if pending.is_empty() {
            tracing::debug!("finalizing empty input");
            return RootNode::new(CompressionInput {
                cv: *key,
                block: [0; 16],
                counter: 0,
                block_len: 0,
                flags: Flags::CHUNK_START | Flags::CHUNK_END | Flags::ROOT,
            });
        }
        tracing::debug!(len = pending.len(), "finalizing single chunk");
        return RootNode::from_chunk(process_chunk(pending, key, chunk_counter, true, false));
    };

    tracing::debug!(chunks = chunk_counter + 1, depth = stack.len() + 1, "finalizing tree");
    let tail = process_chunk(pending, key, chunk_counter, false, true);
    RootNode::new(stack.fold_into_root(key, top, tail.chaining_value()))
}

/// Reader over the unbounded output stream of a root node
#[derive(Debug, Clone)]
pub struct OutputReader {
    root: RootNode,
    position: u64,
}

impl OutputReader {
    /// Start reading at byte 0
    pub fn new(root: RootNode) -> Self {
        Self { root, position: 0 }
    }

    /// The root this reader expands
    pub fn root(&self) -> &RootNode {
        &self.root
    }

    /// Fill `buf` with the next bytes of the stream
    ///
    /// The stream is 2^64 bytes long; reading past its end wraps around to
    /// offset 0.
    pub fn fill(&mut self, mut buf: &mut [u8]) {
        while !buf.is_empty() {
            let block = self.root.block_bytes(self.position / OUTPUT_BLOCK_LEN as u64);
            let offset = (self.position % OUTPUT_BLOCK_LEN as u64) as usize;
            let take = (OUTPUT_BLOCK_LEN - offset).min(buf.len());
            buf[..take].copy_from_slice(&block[offset..offset + take]);
            self.position = self.position.wrapping_add(take as u64);
            buf = &mut buf[take..];
        }
    }

    /// Current byte offset in the stream
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Seek to byte offset `position`
    pub fn set_position(&mut self, position: u64) {
        self.position = position;
    }
}

impl io::Read for OutputReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.fill(buf);
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::compress::IV;
    use std::io::Read;

    fn reference_xof(input: &[u8], len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        blake3::Hasher::new().update(input).finalize_xof().fill(&mut out);
        out
    }

    fn empty_root() -> RootNode {
        finalize_root(&IV, &[], 0, &mut CvStack::new())
    }

    #[test]
    fn test_empty_root_input() {
        let root = empty_root();
        assert_eq!(root.input().block_len, 0);
        assert_eq!(root.input().counter, 0);
        assert_eq!(
            root.input().flags,
            Flags::CHUNK_START | Flags::CHUNK_END | Flags::ROOT
        );
        assert_eq!(root.expand(200), reference_xof(b"", 200));
    }

    #[test]
    fn test_expand_lengths() {
        let root = empty_root();
        assert!(root.expand(0).is_empty());
        for len in [1, 31, 32, 63, 64, 65, 131, 500] {
            assert_eq!(root.expand(len), reference_xof(b"", len), "len {}", len);
        }
    }

    #[test]
    fn test_expand_parallel_matches_sequential() {
        let root = finalize_root(&IV, b"parallel output", 0, &mut CvStack::new());
        for len in [0, 1, 64, 1000, 4099] {
            assert_eq!(root.expand_parallel(len), root.expand(len));
        }
    }

    #[test]
    fn test_single_chunk_root_keeps_last_block() {
        let input: Vec<u8> = (0..300).map(|i| i as u8).collect();
        let root = finalize_root(&IV, &input, 0, &mut CvStack::new());
        assert_eq!(root.input().flags, Flags::CHUNK_END | Flags::ROOT);
        assert_eq!(root.input().block_len, 300 - 256);
        assert_eq!(root.expand(150), reference_xof(&input, 150));
    }

    #[test]
    fn test_reader_fill_in_pieces() {
        let expected = reference_xof(b"abc", 300);
        let root = finalize_root(&IV, b"abc", 0, &mut CvStack::new());
        let mut reader = OutputReader::new(root);
        let mut out = vec![0u8; 300];
        let (a, rest) = out.split_at_mut(7);
        reader.fill(a);
        let (b, c) = rest.split_at_mut(100);
        reader.fill(b);
        reader.read_exact(c).unwrap();
        assert_eq!(out, expected);
        assert_eq!(reader.position(), 300);
    }

    #[test]
    fn test_reader_seek() {
        let expected = reference_xof(b"seek", 256);
        let mut reader = OutputReader::new(finalize_root(&IV, b"seek", 0, &mut CvStack::new()));
        reader.set_position(100);
        let mut out = [0u8; 100];
        reader.fill(&mut out);
        assert_eq!(&out[..], &expected[100..200]);
    }

    #[test]
    fn test_root_new_ignores_input_counter() {
        let mut input = *finalize_root(&IV, b"x", 0, &mut CvStack::new()).input();
        input.counter = 5;
        let root = RootNode::new(input);
        assert_eq!(root.input().counter, 0);
        assert_eq!(root.block_words(0), input.wide_output(0));
        assert_eq!(root.block_words(1), input.wide_output(1));
        assert_eq!(root.expand(100), reference_xof(b"x", 100));
    }

    #[test]
    fn test_reader_wraps_at_end_of_stream() {
        let root = finalize_root(&IV, b"end", 0, &mut CvStack::new());
        let mut reader = OutputReader::new(root.clone());
        reader.set_position(u64::MAX - 9);
        let mut out = [0u8; 64];
        reader.fill(&mut out);
        assert_eq!(reader.position(), 54);

        let last = root.block_bytes(u64::MAX / OUTPUT_BLOCK_LEN as u64);
        assert_eq!(&out[..10], &last[54..]);
        assert_eq!(&out[10..], &root.expand(54)[..]);
    }
}
