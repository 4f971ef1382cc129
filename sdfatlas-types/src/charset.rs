use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Printable ASCII, used when no charset is configured.
pub const DEFAULT_CHARSET: &str = " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";

/// Ordered set of distinct, non-control characters to render.
///
/// Duplicates keep their first position and control characters (newline,
/// carriage return, tab and the rest of the Cc category) are dropped on
/// construction, so a `Charset` always upholds both invariants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Charset {
    chars: Vec<char>,
}

impl Charset {
    pub fn new(chars: impl IntoIterator<Item = char>) -> Self {
        let mut seen = HashSet::new();
        let chars = chars
            .into_iter()
            .filter(|ch| !ch.is_control())
            .filter(|ch| seen.insert(*ch))
            .collect();
        Self { chars }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }
}

impl From<&str> for Charset {
    fn from(value: &str) -> Self {
        Self::new(value.chars())
    }
}

impl From<String> for Charset {
    fn from(value: String) -> Self {
        Self::new(value.chars())
    }
}

impl From<Charset> for String {
    fn from(value: Charset) -> Self {
        value.chars.into_iter().collect()
    }
}

impl std::fmt::Display for Charset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for ch in &self.chars {
            write!(f, "{ch}")?;
        }
        Ok(())
    }
}
