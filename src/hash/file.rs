//! Hashing files and standard input
//!
//! Streams input through [`Hasher`] with a configurable read buffer. Large
//! regular files are memory-mapped and hashed on the rayon pool instead.

use memmap2::Mmap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use super::{Digest, Hasher};
use crate::config::{HashConfig, InputSource, MMAP_THRESHOLD};
use crate::error::{B3Error, IoResultExt, Result};

/// Digest of one input, as reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashResult {
    /// File name, or `-` for standard input
    pub name: String,
    /// Digest of the input
    pub hash: Digest,
    /// Input size in bytes
    pub size: u64,
}

impl HashResult {
    /// Create a new hash result
    pub fn new(name: impl Into<String>, hash: Digest, size: u64) -> Self {
        Self {
            name: name.into(),
            hash,
            size,
        }
    }

    /// `<hex>  <name>`
    pub fn bsd_line(&self) -> String {
        format!("{}  {}", self.hash, self.name)
    }
}

impl std::fmt::Display for HashResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

/// Stream `reader` to the end, returning the digest and the bytes consumed
pub fn hash_reader<R: Read>(mut reader: R, out_len: usize, buffer_size: usize) -> io::Result<(Digest, u64)> {
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; buffer_size.max(1)];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    let size = hasher.count();
    Ok((hasher.finalize(out_len), size))
}

/// Hash a file
pub fn hash_file(path: &Path, config: &HashConfig) -> Result<HashResult> {
    let file = File::open(path).with_path(path)?;
    let metadata = file.metadata().with_path(path)?;
    let name = path.display().to_string();
    let out_len = config.output_len.get();

    if config.mmap && metadata.is_file() && metadata.len() >= MMAP_THRESHOLD {
        if let Some(map) = try_mmap(&file, path) {
            tracing::debug!(path = %name, size = map.len(), "hashing memory-mapped file");
            let mut hasher = Hasher::new();
            hasher.update_parallel(&map);
            let size = hasher.count();
            return Ok(HashResult::new(name, hasher.finalize(out_len), size));
        }
    }

    tracing::debug!(path = %name, buffer = config.buffer_size, "hashing streamed file");
    let reader = BufReader::with_capacity(config.buffer_size, file);
    let (digest, size) = hash_reader(reader, out_len, config.buffer_size).with_path(path)?;
    Ok(HashResult::new(name, digest, size))
}

fn try_mmap(file: &File, path: &Path) -> Option<Mmap> {
    // SAFETY: the map is read-only and only lives for one hash_file call.
    // Concurrent truncation by another process is not guarded against.
    match unsafe { Mmap::map(file) } {
        Ok(map) => Some(map),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "mmap failed, falling back to reads");
            None
        }
    }
}

/// Hash standard input
pub fn hash_stdin(config: &HashConfig) -> Result<HashResult> {
    let stdin = io::stdin();
    let (digest, size) = hash_reader(stdin.lock(), config.output_len.get(), config.buffer_size)
        .map_err(|e| B3Error::io("-", e))?;
    Ok(HashResult::new("-", digest, size))
}

/// Hash one configured input
pub fn hash_input(input: &InputSource, config: &HashConfig) -> Result<HashResult> {
    match input {
        InputSource::Stdin => hash_stdin(config),
        InputSource::File(path) => hash_file(path, config),
    }
}

/// Hash multiple files in parallel, results in input order
pub fn hash_files_parallel(paths: &[&Path], config: &HashConfig) -> Vec<Result<HashResult>> {
    paths
        .par_iter()
        .map(|path| hash_file(path, config))
        .collect()
}
