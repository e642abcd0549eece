//! Streaming MD5 file hashing.
//!
//! MD5 is used because the signature database and the reputation service
//! both address files by their 128-bit MD5 digest. Files are streamed in
//! fixed-size blocks so memory use stays constant regardless of file size.

use crate::core::error::ScanError;
use crate::core::types::FileDigest;

use md5::{Digest, Md5};
use std::io::Read;
use std::path::Path;

/// Default read block size (128 KiB).
pub const DEFAULT_BLOCK_SIZE: usize = 128 * 1024;

/// Computes content digests for files.
///
/// The hasher holds no mutable state, so a single instance can be shared
/// by every scan worker.
///
/// # Examples
///
/// ```rust
/// use hashguard::core::FileHasher;
///
/// let hasher = FileHasher::new();
/// let digest = hasher.digest_bytes(b"");
/// assert_eq!(digest.as_str(), "d41d8cd98f00b204e9800998ecf8427e");
/// ```
#[derive(Debug, Clone)]
pub struct FileHasher {
    block_size: usize,
}

impl Default for FileHasher {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl FileHasher {
    /// Creates a new `FileHasher` reading 128 KiB blocks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the read block size. Zero is clamped to one byte.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Computes the digest of an in-memory buffer.
    pub fn digest_bytes(&self, data: &[u8]) -> FileDigest {
        let mut hasher = Md5::new();
        hasher.update(data);
        FileDigest::from_hex_unchecked(format!("{:x}", hasher.finalize()))
    }

    /// Computes the digest of a file on disk.
    ///
    /// A missing file maps to [`ScanError::FileNotFound`], an unreadable one
    /// to [`ScanError::PermissionDenied`]; any other failure, including the
    /// file vanishing mid-read, is returned as [`ScanError::Io`].
    pub fn digest_file(&self, path: &Path) -> Result<FileDigest, ScanError> {
        let mut file =
            std::fs::File::open(path).map_err(|e| ScanError::from_open(path, e))?;
        self.digest_reader(&mut file)
    }

    /// Streams a reader through the digest in fixed-size blocks.
    pub fn digest_reader<R: Read>(&self, reader: &mut R) -> Result<FileDigest, ScanError> {
        let mut hasher = Md5::new();
        let mut buffer = vec![0u8; self.block_size];
        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ScanError::Io(e)),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(FileDigest::from_hex_unchecked(format!(
            "{:x}",
            hasher.finalize()
        )))
    }

    /// Computes the digest of a file on tokio's blocking pool.
    pub async fn digest_file_async(&self, path: &Path) -> Result<FileDigest, ScanError> {
        let hasher = self.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || hasher.digest_file(&path))
            .await
            .map_err(|e| ScanError::internal(format!("hashing task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

    #[test]
    fn test_digest_empty_input() {
        let hasher = FileHasher::new();
        assert_eq!(hasher.digest_bytes(b"").as_str(), EMPTY_MD5);
    }

    #[test]
    fn test_digest_known_value() {
        let hasher = FileHasher::new();
        assert_eq!(
            hasher.digest_bytes(b"hello world").as_str(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[test]
    fn test_digest_deterministic() {
        let hasher = FileHasher::new();
        let data = b"test data for hashing";
        assert_eq!(hasher.digest_bytes(data), hasher.digest_bytes(data));
        assert_ne!(hasher.digest_bytes(b"data1"), hasher.digest_bytes(b"data2"));
    }

    #[test]
    fn test_small_blocks_match_single_pass() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let whole = FileHasher::new().digest_bytes(&data);
        let streamed = FileHasher::new()
            .with_block_size(7)
            .digest_reader(&mut data.as_slice())
            .unwrap();
        assert_eq!(whole, streamed);
    }

    #[test]
    fn test_digest_file_matches_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"file contents").unwrap();
        file.flush().unwrap();

        let hasher = FileHasher::new();
        let from_file = hasher.digest_file(file.path()).unwrap();
        assert_eq!(from_file, hasher.digest_bytes(b"file contents"));
    }

    #[test]
    fn test_digest_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let digest = FileHasher::new().digest_file(file.path()).unwrap();
        assert_eq!(digest.as_str(), EMPTY_MD5);
    }

    #[test]
    fn test_digest_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileHasher::new().digest_file(&dir.path().join("missing.bin"));
        assert!(matches!(result, Err(ScanError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn test_digest_file_async() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"async").unwrap();
        file.flush().unwrap();

        let hasher = FileHasher::new();
        let digest = hasher.digest_file_async(file.path()).await.unwrap();
        assert_eq!(digest, hasher.digest_bytes(b"async"));
    }
}
