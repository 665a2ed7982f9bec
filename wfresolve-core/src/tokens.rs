//! Acceptance tokens.
//!
//! Callers describe which destination states they consider satisfactory with
//! a comma-separated list of single characters, e.g. `"y, i"`. Whitespace
//! around each token is ignored and only the first character of a token is
//! significant. Comparison is plain, case-sensitive character equality.

use crate::error::CoreError;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A non-empty set of acceptable validity tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptTokens(BTreeSet<char>);

impl AcceptTokens {
    /// Builds a token set from characters. At least one is required.
    pub fn new(tokens: impl IntoIterator<Item = char>) -> Result<Self, CoreError> {
        let set: BTreeSet<char> = tokens.into_iter().collect();
        if set.is_empty() {
            return Err(CoreError::EmptyAcceptTokens);
        }
        Ok(Self(set))
    }

    /// Parses a comma-separated token list.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Self::new(
            s.split(',')
                .map(str::trim)
                .filter_map(|token| token.chars().next()),
        )
    }

    pub fn contains(&self, token: char) -> bool {
        self.0.contains(&token)
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for AcceptTokens {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AcceptTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for c in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}", c)?;
            first = false;
        }
        Ok(())
    }
}
