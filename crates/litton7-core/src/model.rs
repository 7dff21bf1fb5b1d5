//! Model file integrity checks.

use blake3::Hasher;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// BLAKE3 digest of a file's contents as lowercase hex.
///
/// Streams the file, so multi-hundred-megabyte models are never held in memory.
pub fn content_hash(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Hasher::new();

    let mut buffer = [0u8; 65536];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Check `path` against an expected hex digest (case-insensitive).
pub fn verify_checksum(path: &Path, expected: &str) -> std::io::Result<bool> {
    let actual = content_hash(path)?;
    Ok(actual.eq_ignore_ascii_case(expected.trim()))
}
