//! Leaf level: one chunk of up to 1024 bytes, hashed block by block

use super::compress::{block_words, Compressed, CompressionInput, Flags};
use super::{BLOCK_LEN, CHUNK_LEN};

/// Result of hashing one chunk
#[derive(Debug, Clone, Copy)]
pub struct ChunkOutput {
    /// Output of the last block, untruncated when the chunk was hashed as root
    pub output: Compressed,
    /// Exact input of the last block compression
    pub last_block: CompressionInput,
}

impl ChunkOutput {
    /// The chunk's chaining value
    pub fn chaining_value(&self) -> [u32; 8] {
        self.output.chaining_value()
    }
}

/// Hash one chunk
///
/// The chaining value starts at `key` and is threaded through every block.
/// The first block carries `CHUNK_START`, the last carries `CHUNK_END` and,
/// for the sole chunk of an input, `ROOT`. All blocks but the last are
/// truncated; the last one keeps its feed-forward half unless `final_truncate`.
pub fn process_chunk(
    bytes: &[u8],
    key: &[u32; 8],
    counter: u64,
    is_root: bool,
    final_truncate: bool,
) -> ChunkOutput {
    debug_assert!(bytes.len() <= CHUNK_LEN);

    let last_start = bytes.len().saturating_sub(1) / BLOCK_LEN * BLOCK_LEN;
    let (body, last) = bytes.split_at(last_start);

    let mut cv = *key;
    for (i, block) in body.chunks_exact(BLOCK_LEN).enumerate() {
        let flags = if i == 0 { Flags::CHUNK_START } else { Flags::empty() };
        cv = CompressionInput {
            cv,
            block: block_words(block),
            counter,
            block_len: BLOCK_LEN as u32,
            flags,
        }
        .output_cv();
    }

    let mut flags = Flags::CHUNK_END;
    if body.is_empty() {
        flags |= Flags::CHUNK_START;
    }
    if is_root {
        flags |= Flags::ROOT;
    }
    let last_block = CompressionInput {
        cv,
        block: block_words(last),
        counter,
        block_len: last.len() as u32,
        flags,
    };

    tracing::trace!(counter, len = bytes.len(), ?flags, "chunk");

    ChunkOutput {
        output: last_block.compress(final_truncate),
        last_block,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::compress::{write_le_words, IV};

    fn test_input(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn root_digest(output: &Compressed) -> Vec<u8> {
        let mut out = vec![0u8; 32];
        write_le_words(&output.chaining_value(), &mut out);
        out
    }

    #[test]
    fn test_single_chunk_root_matches_reference() {
        for len in [1, 2, 63, 64, 65, 127, 128, 129, 1023, 1024] {
            let input = test_input(len);
            let chunk = process_chunk(&input, &IV, 0, true, false);
            assert_eq!(
                root_digest(&chunk.output),
                blake3::hash(&input).as_bytes().to_vec(),
                "len {}",
                len
            );
            assert!(chunk.output.wide().is_some());
        }
    }

    #[test]
    fn test_last_block_flags() {
        let one_block = process_chunk(&test_input(10), &IV, 0, true, false);
        assert_eq!(
            one_block.last_block.flags,
            Flags::CHUNK_START | Flags::CHUNK_END | Flags::ROOT
        );
        assert_eq!(one_block.last_block.cv, IV);

        let multi_block = process_chunk(&test_input(100), &IV, 0, true, false);
        assert_eq!(multi_block.last_block.flags, Flags::CHUNK_END | Flags::ROOT);
        assert_ne!(multi_block.last_block.cv, IV);

        let leaf = process_chunk(&test_input(CHUNK_LEN), &IV, 7, false, true);
        assert_eq!(leaf.last_block.flags, Flags::CHUNK_END);
        assert_eq!(leaf.last_block.counter, 7);
        assert!(leaf.output.wide().is_none());
    }

    #[test]
    fn test_last_block_len() {
        assert_eq!(process_chunk(&test_input(64), &IV, 0, false, true).last_block.block_len, 64);
        assert_eq!(process_chunk(&test_input(65), &IV, 0, false, true).last_block.block_len, 1);
        assert_eq!(process_chunk(&test_input(1024), &IV, 0, false, true).last_block.block_len, 64);
        assert_eq!(process_chunk(&test_input(1000), &IV, 0, false, true).last_block.block_len, 40);
    }

    #[test]
    fn test_counter_changes_leaf_cv() {
        let input = test_input(CHUNK_LEN);
        let a = process_chunk(&input, &IV, 0, false, true).chaining_value();
        let b = process_chunk(&input, &IV, 1, false, true).chaining_value();
        assert_ne!(a, b);
    }

    #[test]
    fn test_root_flag_changes_cv() {
        let input = test_input(200);
        let root = process_chunk(&input, &IV, 0, true, true).chaining_value();
        let leaf = process_chunk(&input, &IV, 0, false, true).chaining_value();
        assert_ne!(root, leaf);
    }
}
