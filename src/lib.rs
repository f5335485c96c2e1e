//! # b3stream - Streaming BLAKE3
//!
//! A BLAKE3 implementation built around an incremental hasher: input is
//! appended in pieces of any size, chunk chaining values are merged into a
//! Merkle tree as soon as subtrees complete, and the finalized root can be
//! expanded into output of any length.
//!
//! ## Quick Start
//!
//! ```
//! use b3stream::Hasher;
//!
//! // One-shot
//! let digest = b3stream::hash(b"hello world", 32);
//!
//! // Streaming
//! let mut hasher = Hasher::new();
//! hasher.update(b"hello ");
//! hasher.update(b"world");
//! assert_eq!(hasher.finalize(32), digest);
//! ```
//!
//! ## Extendable Output
//!
//! ```
//! use b3stream::Hasher;
//!
//! let mut hasher = Hasher::new();
//! hasher.update(b"seed");
//! let mut reader = hasher.finalize_xof();
//!
//! let mut first = [0u8; 100];
//! let mut second = [0u8; 100];
//! reader.fill(&mut first);
//! reader.fill(&mut second);
//! assert_eq!(&first[..32], b3stream::hash(b"seed", 32).as_bytes());
//! ```
//!
//! ## Files
//!
//! ```no_run
//! use b3stream::config::HashConfig;
//! use b3stream::hash::hash_file;
//! use std::path::Path;
//!
//! let result = hash_file(Path::new("/data/file.bin"), &HashConfig::default()).unwrap();
//! println!("{}", result.bsd_line());
//! ```
//!
//! Set `RUST_LOG=b3stream::hash::compress=trace` to log every compression's
//! input and per-round state.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod hash;

// Re-export commonly used types
pub use config::{HashConfig, OutputFormat, OutputLength};
pub use error::{B3Error, Result};
pub use hash::{hash, hash_checked, hash_parallel, Digest, Hasher, OutputReader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```
    //! use b3stream::prelude::*;
    //! ```

    pub use crate::config::{HashConfig, InputSource, OutputFormat, OutputLength};
    pub use crate::error::{B3Error, Result};
    pub use crate::hash::{hash, hash_file, hash_parallel, Digest, HashResult, Hasher, OutputReader};
}
