//! Parameter sets: per-job environment variable overrides.

use serde::{Deserialize, Serialize};

/// Reserved variable name that overrides the positional suffix in the
/// computed output filename. It stays set in the job environment.
pub const OUTPUT_SUFFIX_KEY: &str = "JUPYTER_OUTPUT_SUFFIX";

/// One line's worth of `KEY=VALUE` environment overrides for a single job.
///
/// Insertion order is preserved; assigning an existing key replaces its
/// value in place. Two sets with identical contents are still distinct
/// jobs when they come from different lines of a parameter file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet {
    entries: Vec<(String, String)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set `key` to `value`, keeping the key's original position if it
    /// was already present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The output-filename suffix requested by this set, if any.
    pub fn output_suffix(&self) -> Option<&str> {
        self.get(OUTPUT_SUFFIX_KEY)
    }
}

impl FromIterator<(String, String)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

impl std::fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (k, v) in self.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{k}={v}")?;
            first = false;
        }
        Ok(())
    }
}
