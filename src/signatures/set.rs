//! Signature set loading and membership.

use crate::core::types::{is_digest_hex, FileDigest};

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// MD5 of the standard EICAR anti-malware test file.
pub const EICAR_MD5: &str = "44d88612fea8a8f36de82e1278abb02f";

/// An immutable set of known-malicious digests.
///
/// Loading never fails: a missing source yields an empty set, and callers
/// decide whether an empty set is fatal for their scan.
///
/// # Examples
///
/// ```rust
/// use hashguard::signatures::SignatureSet;
///
/// let text = "# comment\n44d88612fea8a8f36de82e1278abb02f\nnot-a-hash\n";
/// let set = SignatureSet::parse(text.as_bytes());
/// assert_eq!(set.len(), 1);
/// assert_eq!(set.rejected(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SignatureSet {
    digests: HashSet<String>,
    rejected: usize,
    source: Option<PathBuf>,
}

impl SignatureSet {
    /// Builds a set from digests, dropping malformed entries.
    pub fn from_digests<I, S>(digests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for digest in digests {
            let digest = digest.as_ref();
            if is_digest_hex(digest) {
                set.digests.insert(digest.to_string());
            } else {
                set.rejected += 1;
            }
        }
        set
    }

    /// Loads signatures from a file.
    ///
    /// A missing or unreadable file is logged at error level and produces
    /// an empty set.
    pub fn load(source: impl AsRef<Path>) -> Self {
        let source = source.as_ref();
        let file = match std::fs::File::open(source) {
            Ok(file) => file,
            Err(e) => {
                tracing::error!(
                    source = %source.display(),
                    error = %e,
                    "Signature source could not be opened"
                );
                return Self {
                    source: Some(source.to_path_buf()),
                    ..Self::default()
                };
            }
        };

        let mut set = Self::parse(file);
        set.source = Some(source.to_path_buf());
        set
    }

    /// Parses signatures from any reader.
    pub fn parse<R: Read>(reader: R) -> Self {
        let mut set = Self::default();

        for (index, line) in BufReader::new(reader).lines().enumerate() {
            let line_number = index + 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!(line = line_number, error = %e, "Signature source read failed");
                    break;
                }
            };

            let candidate = line.trim();
            if candidate.is_empty() || candidate.starts_with('#') {
                continue;
            }

            if is_digest_hex(candidate) {
                set.digests.insert(candidate.to_string());
            } else {
                set.rejected += 1;
                tracing::warn!(line = line_number, value = %candidate, "Invalid signature skipped");
            }
        }

        if set.digests.is_empty() {
            tracing::error!("No valid signature found in source");
        } else if !set.digests.contains(EICAR_MD5) {
            tracing::warn!("EICAR test signature missing from signature set");
        }

        tracing::info!(
            loaded = set.digests.len(),
            rejected = set.rejected,
            "Signature set loaded"
        );

        set
    }

    /// Returns `true` if the digest is a known signature.
    pub fn contains(&self, digest: &FileDigest) -> bool {
        self.digests.contains(digest.as_str())
    }

    /// Returns `true` if the raw hex string is a known signature.
    pub fn contains_hex(&self, hex: &str) -> bool {
        self.digests.contains(hex)
    }

    /// Number of valid signatures.
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Returns `true` if no valid signature was loaded.
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    /// Number of lines or entries rejected as malformed.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// The file this set was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Iterates over the signatures in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.digests.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_keeps_only_valid_lines() {
        let text = "\
# header comment
44d88612fea8a8f36de82e1278abb02f

5eb63bbbe01eeed093cb22bb8f5acdc3
   d41d8cd98f00b204e9800998ecf8427e
44D88612FEA8A8F36DE82E1278ABB02F
44d88612fea8a8f36de82e1278abb02
44d88612fea8a8f36de82e1278abb02fa
zzd88612fea8a8f36de82e1278abb02f
  # indented comment
";
        let set = SignatureSet::parse(text.as_bytes());

        let mut loaded: Vec<_> = set.iter().collect();
        loaded.sort_unstable();
        assert_eq!(
            loaded,
            vec![
                "44d88612fea8a8f36de82e1278abb02f",
                "5eb63bbbe01eeed093cb22bb8f5acdc3",
                "d41d8cd98f00b204e9800998ecf8427e",
            ]
        );
        assert_eq!(set.rejected(), 4);
    }

    #[test]
    fn test_duplicates_collapse() {
        let text = format!("{EICAR_MD5}\n{EICAR_MD5}\n");
        let set = SignatureSet::parse(text.as_bytes());
        assert_eq!(set.len(), 1);
        assert!(set.contains_hex(EICAR_MD5));
    }

    #[test]
    fn test_load_missing_source_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Hashes.txt");
        let set = SignatureSet::load(&path);
        assert!(set.is_empty());
        assert_eq!(set.source(), Some(path.as_path()));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# signatures").unwrap();
        writeln!(file, "{EICAR_MD5}").unwrap();
        file.flush().unwrap();

        let set = SignatureSet::load(file.path());
        assert_eq!(set.len(), 1);
        let digest = FileDigest::parse(EICAR_MD5).unwrap();
        assert!(set.contains(&digest));
    }

    #[test]
    fn test_from_digests_validates() {
        let set = SignatureSet::from_digests([EICAR_MD5, "nope"]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.rejected(), 1);
    }
}
