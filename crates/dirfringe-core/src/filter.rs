/// Structural exclusion by regular expression.
///
/// All configured patterns are folded into one alternation and anchored at
/// the start of the candidate. The candidate is the **full path string** of a
/// directory, not its last segment, so a pattern meant to exclude by folder
/// name must cover the leading path too (e.g. `.*/node_modules$`).
use crate::error::ConfigError;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Compiled pattern set. An empty set matches nothing.
#[derive(Debug, Clone, Default)]
pub struct ExclusionMatcher {
    regex: Option<Regex>,
}

impl ExclusionMatcher {
    /// A matcher that never excludes anything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile `patterns` into a single prefix-anchored matcher.
    ///
    /// Blank patterns are ignored. Any invalid pattern fails the whole set.
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parts: Vec<String> = patterns
            .into_iter()
            .filter(|p| !p.as_ref().is_empty())
            .map(|p| format!("(?:{})", p.as_ref()))
            .collect();

        if parts.is_empty() {
            return Ok(Self::empty());
        }

        let combined = format!("^(?:{})", parts.join("|"));
        Ok(Self {
            regex: Some(Regex::new(&combined)?),
        })
    }

    /// Load patterns from a file: one expression per line.
    ///
    /// Blank lines are skipped. Every other line is a pattern, including
    /// one that starts with `#`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(text.lines().map(|line| line.trim_end_matches('\r')))
    }

    /// `true` if any pattern matches `candidate` from its first character.
    pub fn matches(&self, candidate: &Path) -> bool {
        match &self.regex {
            Some(re) => re.is_match(&candidate.to_string_lossy()),
            None => false,
        }
    }

    /// `true` if no patterns were configured.
    pub fn is_empty(&self) -> bool {
        self.regex.is_none()
    }
}
