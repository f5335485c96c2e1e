//! Configuration settings for b3stream
//!
//! Defines the CLI arguments, the validated hashing configuration and the
//! helpers used to build one from the other.

use clap::{ArgAction, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{B3Error, Result};
use crate::hash::OUT_LEN;

/// Files at least this large are memory-mapped and hashed on the thread pool
pub const MMAP_THRESHOLD: u64 = 16 * 1024;

/// b3stream - BLAKE3 digests of files and standard input
#[derive(Parser, Debug, Clone)]
#[command(name = "b3stream")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Print BLAKE3 digests of files or standard input")]
#[command(long_about = r#"
b3stream computes BLAKE3 digests of any length.

With no FILE, or when FILE is -, standard input is read.

Examples:
  b3stream file.bin                 # 32-byte digest, "<hex>  file.bin"
  b3stream -l 64 a.bin b.bin        # 64-byte extended output
  cat file.bin | b3stream           # standard input
  RUST_LOG=b3stream::hash::compress=trace b3stream small.txt   # dump compression state
"#)]
pub struct CliArgs {
    /// Files to hash ("-" for standard input)
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Output length in bytes
    #[arg(short = 'l', long, default_value_t = OUT_LEN as i64, allow_negative_numbers = true, value_name = "LEN")]
    pub length: i64,

    /// Output format
    #[arg(long, value_enum, default_value = "bsd", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Omit file names (same as --format hex)
    #[arg(long)]
    pub no_names: bool,

    /// Read buffer size for streamed input (e.g., 64K, 1M)
    #[arg(short = 'b', long, default_value = "1M", value_name = "SIZE")]
    pub buffer_size: String,

    /// Never memory-map input files
    #[arg(long)]
    pub no_mmap: bool,

    /// Number of worker threads (0 = auto-detect)
    #[arg(short = 't', long, default_value = "0", value_name = "NUM")]
    pub threads: usize,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

/// How digests are printed
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `<hex>  <name>`, one line per input
    #[default]
    Bsd,
    /// Digest only
    Hex,
    /// JSON array of reports
    Json,
}

/// Validated, non-negative digest length in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct OutputLength(usize);

impl OutputLength {
    /// Length in bytes
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for OutputLength {
    fn default() -> Self {
        Self(OUT_LEN)
    }
}

impl TryFrom<i64> for OutputLength {
    type Error = B3Error;

    fn try_from(requested: i64) -> Result<Self> {
        usize::try_from(requested)
            .map(Self)
            .map_err(|_| B3Error::InvalidOutputLength(requested))
    }
}

impl From<OutputLength> for i64 {
    fn from(len: OutputLength) -> i64 {
        len.0 as i64
    }
}

/// Input to hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    /// Standard input
    Stdin,
    /// A named file
    File(PathBuf),
}

impl InputSource {
    /// Name used in reports; `-` for standard input
    pub fn display_name(&self) -> String {
        match self {
            Self::Stdin => "-".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Complete hashing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashConfig {
    /// Inputs in the order they are reported
    pub inputs: Vec<InputSource>,
    /// Digest length
    pub output_len: OutputLength,
    /// Output format
    pub format: OutputFormat,
    /// Read buffer size for streamed input
    pub buffer_size: usize,
    /// Memory-map large regular files
    pub mmap: bool,
    /// Worker threads (0 = auto)
    pub threads: usize,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            inputs: vec![InputSource::Stdin],
            output_len: OutputLength::default(),
            format: OutputFormat::Bsd,
            buffer_size: 1024 * 1024,
            mmap: true,
            threads: 0,
        }
    }
}

impl HashConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let mut config = Self::default();

        if !args.files.is_empty() {
            config.inputs = args
                .files
                .iter()
                .map(|path| {
                    if path.as_os_str() == "-" {
                        InputSource::Stdin
                    } else {
                        InputSource::File(path.clone())
                    }
                })
                .collect();
        }

        config.output_len = OutputLength::try_from(args.length)?;
        config.format = if args.no_names && args.format == OutputFormat::Bsd {
            OutputFormat::Hex
        } else {
            args.format
        };

        let buffer_size = parse_size(&args.buffer_size)
            .map_err(|e| B3Error::config(format!("Invalid buffer size: {}", e)))?;
        if buffer_size == 0 {
            return Err(B3Error::config("Buffer size must be greater than zero"));
        }
        config.buffer_size = usize::try_from(buffer_size)
            .map_err(|_| B3Error::config(format!("Buffer size too large: {}", buffer_size)))?;

        config.mmap = !args.no_mmap;
        config.threads = args.threads;

        Ok(config)
    }
}

/// Parse size string (e.g., "1G", "100M", "64K")
pub fn parse_size(size: &str) -> std::result::Result<u64, String> {
    let size = size.trim().to_uppercase();

    if size.is_empty() {
        return Err("Empty size string".to_string());
    }

    let (num_str, multiplier) = if size.ends_with("TB") || size.ends_with('T') {
        let num = size.trim_end_matches(|c| c == 'T' || c == 'B');
        (num, 1024u64 * 1024 * 1024 * 1024)
    } else if size.ends_with("GB") || size.ends_with('G') {
        let num = size.trim_end_matches(|c| c == 'G' || c == 'B');
        (num, 1024u64 * 1024 * 1024)
    } else if size.ends_with("MB") || size.ends_with('M') {
        let num = size.trim_end_matches(|c| c == 'M' || c == 'B');
        (num, 1024u64 * 1024)
    } else if size.ends_with("KB") || size.ends_with('K') {
        let num = size.trim_end_matches(|c| c == 'K' || c == 'B');
        (num, 1024u64)
    } else if size.ends_with('B') {
        let num = size.trim_end_matches('B');
        (num, 1u64)
    } else {
        (size.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    if num < 0.0 {
        return Err(format!("Negative size: {}", num_str));
    }

    Ok((num * multiplier as f64) as u64)
}
