//! Official test-vector input lengths, checked against the reference crate
//!
//! Inputs repeat the 251-byte pattern 0, 1, ..., 250. Each case checks a
//! 131-byte extended output (not a multiple of 4, so partial words are
//! exercised) and its 32-byte prefix.

use b3stream::{hash, hash_parallel, Hasher};

const BLOCK_LEN: usize = 64;
const CHUNK_LEN: usize = 1024;
const OUTPUT_LEN: usize = 2 * BLOCK_LEN + 3;

const TEST_CASES: &[usize] = &[
    0,
    1,
    2,
    3,
    4,
    5,
    6,
    7,
    8,
    BLOCK_LEN - 1,
    BLOCK_LEN,
    BLOCK_LEN + 1,
    2 * BLOCK_LEN - 1,
    2 * BLOCK_LEN,
    2 * BLOCK_LEN + 1,
    CHUNK_LEN - 1,
    CHUNK_LEN,
    CHUNK_LEN + 1,
    2 * CHUNK_LEN,
    2 * CHUNK_LEN + 1,
    3 * CHUNK_LEN,
    3 * CHUNK_LEN + 1,
    4 * CHUNK_LEN,
    4 * CHUNK_LEN + 1,
    5 * CHUNK_LEN,
    5 * CHUNK_LEN + 1,
    6 * CHUNK_LEN,
    6 * CHUNK_LEN + 1,
    7 * CHUNK_LEN,
    7 * CHUNK_LEN + 1,
    8 * CHUNK_LEN,
    8 * CHUNK_LEN + 1,
    16 * CHUNK_LEN,
    31 * CHUNK_LEN,
    100 * CHUNK_LEN,
];

fn paint_test_input(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn reference_xof(input: &[u8], len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    blake3::Hasher::new().update(input).finalize_xof().fill(&mut out);
    out
}

#[test]
fn empty_input_published_digest() {
    assert_eq!(
        hash(b"", 32).to_hex(),
        "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
    );
}

#[test]
fn all_at_once() {
    for &len in TEST_CASES {
        let input = paint_test_input(len);
        let expected = reference_xof(&input, OUTPUT_LEN);

        assert_eq!(hash(&input, OUTPUT_LEN).as_bytes(), &expected[..], "len {}", len);
        assert_eq!(hash(&input, 32).as_bytes(), &expected[..32], "len {}", len);
    }
}

#[test]
fn one_byte_at_a_time() {
    for &len in TEST_CASES {
        let input = paint_test_input(len);
        let mut hasher = Hasher::new();
        for (i, b) in input.iter().enumerate() {
            hasher.update(std::slice::from_ref(b));
            assert_eq!(hasher.count(), i as u64 + 1);
        }
        assert_eq!(
            hasher.finalize(OUTPUT_LEN).as_bytes(),
            &reference_xof(&input, OUTPUT_LEN)[..],
            "len {}",
            len
        );
    }
}

#[test]
fn parallel_paths() {
    for &len in TEST_CASES {
        let input = paint_test_input(len);
        assert_eq!(
            hash_parallel(&input, OUTPUT_LEN).as_bytes(),
            &reference_xof(&input, OUTPUT_LEN)[..],
            "len {}",
            len
        );
    }
}

#[test]
fn xof_reader_in_odd_pieces() {
    for &len in TEST_CASES {
        let input = paint_test_input(len);
        let expected = reference_xof(&input, OUTPUT_LEN);

        let mut hasher = Hasher::new();
        hasher.update(&input);
        let mut reader = hasher.finalize_xof();
        let mut out = vec![0u8; OUTPUT_LEN];
        for piece in out.chunks_mut(13) {
            reader.fill(piece);
        }
        assert_eq!(out, expected, "len {}", len);
    }
}
