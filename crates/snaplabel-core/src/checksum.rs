//! BLAKE3 checksums for pinning model files.

use blake3::Hasher as Blake3Hasher;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Streaming BLAKE3 hex digest of a file.
pub fn file_hash(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Blake3Hasher::new();

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

/// Outcome of comparing a file against its pinned digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Match,
    Mismatch { actual: String },
}

/// Compare `path` against `expected` (case-insensitive hex).
pub fn verify(path: &Path, expected: &str) -> std::io::Result<Verification> {
    let actual = file_hash(path)?;
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(Verification::Match)
    } else {
        Ok(Verification::Mismatch { actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_matches_in_memory_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"hello snaplabel").unwrap();

        let expected = blake3::hash(b"hello snaplabel").to_hex().to_string();
        assert_eq!(file_hash(&path).unwrap(), expected);
        assert_eq!(
            verify(&path, &expected.to_uppercase()).unwrap(),
            Verification::Match
        );
    }

    #[test]
    fn test_verify_mismatch_reports_actual() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"abc").unwrap();

        let result = verify(&path, &"0".repeat(64)).unwrap();
        assert!(matches!(result, Verification::Mismatch { ref actual } if actual.len() == 64));
    }

    #[test]
    fn test_missing_file() {
        assert!(file_hash(Path::new("/nonexistent/model.onnx")).is_err());
    }
}
