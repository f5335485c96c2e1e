//! Streaming hasher state

use rayon::prelude::*;

use super::chunk::process_chunk;
use super::compress::IV;
use super::tree::CvStack;
use super::xof::{finalize_root, OutputReader};
use super::{Digest, CHUNK_LEN, OUT_LEN};
use crate::error::{B3Error, Result};

/// Incremental BLAKE3 hasher
///
/// Bytes are buffered until a full chunk is known not to be the last one.
/// Finalizing consumes the hasher; clone it first to keep appending.
///
/// ```
/// use b3stream::Hasher;
///
/// let mut hasher = Hasher::new();
/// hasher.update(b"hello ");
/// hasher.update(b"world");
/// assert_eq!(hasher.finalize(32), b3stream::hash(b"hello world", 32));
/// ```
#[derive(Clone)]
pub struct Hasher {
    key: [u32; 8],
    buf: [u8; CHUNK_LEN],
    buf_len: usize,
    chunk_counter: u64,
    cv_stack: CvStack,
}

impl Hasher {
    /// Create an empty hasher
    pub fn new() -> Self {
        Self {
            key: IV,
            buf: [0; CHUNK_LEN],
            buf_len: 0,
            chunk_counter: 0,
            cv_stack: CvStack::new(),
        }
    }

    /// Append input bytes
    pub fn update(&mut self, mut input: &[u8]) -> &mut Self {
        // Whole chunks straight from the input, always leaving at least one byte behind
        if self.buf_len == 0 {
            while input.len() > CHUNK_LEN {
                let (chunk, rest) = input.split_at(CHUNK_LEN);
                let cv = process_chunk(chunk, &self.key, self.chunk_counter, false, true).chaining_value();
                self.push_chunk_cv(cv);
                input = rest;
            }
        }

        while !input.is_empty() {
            if self.buf_len == CHUNK_LEN {
                // More input follows, so the buffered chunk cannot be the root
                self.flush_chunk();
            }
            let take = (CHUNK_LEN - self.buf_len).min(input.len());
            self.buf[self.buf_len..self.buf_len + take].copy_from_slice(&input[..take]);
            self.buf_len += take;
            input = &input[take..];
        }
        self
    }

    /// Append input bytes, compressing complete chunks on the rayon pool
    ///
    /// Chunk compressions run concurrently; their chaining values are still
    /// merged in chunk order. The digest is identical to [`Hasher::update`].
    pub fn update_parallel(&mut self, mut input: &[u8]) -> &mut Self {
        if self.buf_len > 0 {
            let take = (CHUNK_LEN - self.buf_len).min(input.len());
            self.update(&input[..take]);
            input = &input[take..];
        }
        if input.is_empty() {
            return self;
        }
        if self.buf_len == CHUNK_LEN {
            self.flush_chunk();
        }

        let full = (input.len() - 1) / CHUNK_LEN * CHUNK_LEN;
        let (body, tail) = input.split_at(full);
        let key = self.key;
        let base = self.chunk_counter;
        let cvs: Vec<[u32; 8]> = body
            .par_chunks_exact(CHUNK_LEN)
            .enumerate()
            .map(|(i, chunk)| process_chunk(chunk, &key, base + i as u64, false, true).chaining_value())
            .collect();
        tracing::debug!(chunks = cvs.len(), "compressed chunks in parallel");
        for cv in cvs {
            self.push_chunk_cv(cv);
        }

        self.update(tail)
    }

    fn flush_chunk(&mut self) {
        let cv = process_chunk(&self.buf[..self.buf_len], &self.key, self.chunk_counter, false, true)
            .chaining_value();
        self.push_chunk_cv(cv);
        self.buf_len = 0;
    }

    fn push_chunk_cv(&mut self, cv: [u32; 8]) {
        self.chunk_counter += 1;
        self.cv_stack.merge(&self.key, cv, self.chunk_counter);
    }

    /// Number of input bytes appended so far
    pub fn count(&self) -> u64 {
        self.chunk_counter * CHUNK_LEN as u64 + self.buf_len as u64
    }

    /// Number of pending subtrees on the chaining value stack
    pub fn stack_depth(&self) -> usize {
        self.cv_stack.len()
    }

    /// Return to the empty state
    pub fn reset(&mut self) -> &mut Self {
        self.buf_len = 0;
        self.chunk_counter = 0;
        self.cv_stack = CvStack::new();
        self
    }

    /// Finalize into an output stream of unbounded length
    pub fn finalize_xof(mut self) -> OutputReader {
        let root = finalize_root(
            &self.key,
            &self.buf[..self.buf_len],
            self.chunk_counter,
            &mut self.cv_stack,
        );
        OutputReader::new(root)
    }

    /// Finalize into a digest of `out_len` bytes
    pub fn finalize(self, out_len: usize) -> Digest {
        Digest::from(self.finalize_xof().root().expand(out_len))
    }

    /// Finalize into the default 32-byte digest
    pub fn finalize_default(self) -> Digest {
        self.finalize(OUT_LEN)
    }

    /// Finalize with a signed length, rejecting negative values
    pub fn finalize_checked(self, requested: i64) -> Result<Digest> {
        let out_len = usize::try_from(requested).map_err(|_| B3Error::InvalidOutputLength(requested))?;
        Ok(self.finalize(out_len))
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hasher")
            .field("count", &self.count())
            .field("chunk_counter", &self.chunk_counter)
            .field("stack_depth", &self.cv_stack.len())
            .finish()
    }
}

impl std::io::Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
