//! # Identifiers
//!
//! Parsing, deduplication and shape validation of the identifier list, plus
//! the sources it can be read from. Shape validation happens before any
//! network call; malformed entries are reported individually by the
//! dispatcher and never occupy a concurrency slot.

use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::SourceError;

const COMMENT_MARKER: char = '#';

/// An identifier that passed the shape check
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fixed-shape rule: exactly `length` ASCII digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierRules {
    pub length: usize,
}

impl IdentifierRules {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    /// Validate a raw entry, trimming surrounding whitespace first
    pub fn validate(&self, raw: &str) -> Option<Identifier> {
        let candidate = raw.trim();
        let well_formed = candidate.len() == self.length
            && candidate.bytes().all(|b| b.is_ascii_digit());
        well_formed.then(|| Identifier(candidate.to_string()))
    }
}

impl Default for IdentifierRules {
    fn default() -> Self {
        Self::new(crate::constants::defaults::IDENTIFIER_LENGTH)
    }
}

/// Parse a line-oriented identifier list
///
/// Blank lines and `#` comments are skipped; duplicates collapse to their
/// first occurrence. Entries are trimmed but not validated.
pub fn parse_identifier_list(text: &str) -> Vec<String> {
    dedupe_preserving_order(
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
            .map(str::to_string),
    )
}

/// Drop repeated entries, keeping first-seen order
pub fn dedupe_preserving_order<I>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}

/// Where the identifier list comes from. Read once per dispatch run.
#[async_trait]
pub trait IdentifierSource: Send + Sync {
    async fn load(&self) -> Result<Vec<String>, SourceError>;

    /// Human-readable origin for notifications
    fn describe(&self) -> String;
}

/// Line-oriented text file
#[derive(Debug, Clone)]
pub struct FileIdentifierSource {
    path: PathBuf,
}

impl FileIdentifierSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl IdentifierSource for FileIdentifierSource {
    async fn load(&self) -> Result<Vec<String>, SourceError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(SourceError::Io(e)),
        };

        let identifiers = parse_identifier_list(&text);
        debug!(
            path = %self.path.display(),
            count = identifiers.len(),
            "Loaded identifier list"
        );
        Ok(identifiers)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fixed in-memory list
#[derive(Debug, Clone, Default)]
pub struct StaticIdentifierSource {
    entries: Vec<String>,
}

impl StaticIdentifierSource {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl IdentifierSource for StaticIdentifierSource {
    async fn load(&self) -> Result<Vec<String>, SourceError> {
        Ok(dedupe_preserving_order(self.entries.iter().cloned()))
    }

    fn describe(&self) -> String {
        "in-memory list".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    #[test]
    fn test_validate_accepts_fixed_length_digits() {
        let rules = IdentifierRules::new(11);
        assert_eq!(
            rules.validate(" 12345678901 ").map(|id| id.to_string()),
            Some("12345678901".to_string())
        );
    }

    #[test]
    fn test_validate_rejects_malformed() {
        let rules = IdentifierRules::new(11);
        assert!(rules.validate("abc").is_none());
        assert!(rules.validate("1234567890").is_none());
        assert!(rules.validate("123456789012").is_none());
        assert!(rules.validate("1234567890a").is_none());
        assert!(rules.validate("").is_none());
    }

    #[test]
    fn test_parse_skips_blank_and_comments_and_dedupes() {
        let text = "# header\n12345678901\n\n  22345678901  \n12345678901\n# trailing\nabc\n";
        assert_eq!(
            parse_identifier_list(text),
            vec!["12345678901", "22345678901", "abc"]
        );
    }

    #[tokio::test]
    async fn test_file_source_reads_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "12345678901\n12345678901\n98765432109").unwrap();

        let source = FileIdentifierSource::new(file.path());
        let ids = source.load().await.unwrap();
        assert_eq!(ids, vec!["12345678901", "98765432109"]);
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileIdentifierSource::new(dir.path().join("absent.txt"));
        assert!(matches!(
            source.load().await,
            Err(SourceError::NotFound(_))
        ));
    }

    proptest! {
        #[test]
        fn digits_of_configured_length_always_validate(id in "[0-9]{11}") {
            prop_assert!(IdentifierRules::new(11).validate(&id).is_some());
        }

        #[test]
        fn entries_with_non_digits_never_validate(id in "[0-9]{0,5}[a-zA-Z][0-9]{0,5}") {
            prop_assert!(IdentifierRules::new(11).validate(&id).is_none());
        }

        #[test]
        fn dedupe_keeps_each_entry_once_in_first_seen_order(
            entries in proptest::collection::vec("[0-9]{2}", 0..40)
        ) {
            let deduped = dedupe_preserving_order(entries.clone());
            let unique: HashSet<_> = deduped.iter().collect();
            prop_assert_eq!(unique.len(), deduped.len());

            let mut expected = Vec::new();
            for entry in &entries {
                if !expected.contains(entry) {
                    expected.push(entry.clone());
                }
            }
            prop_assert_eq!(deduped, expected);
        }
    }
}
