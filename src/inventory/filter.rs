//! Name-based exclusion rules

use crate::inventory::InventoryError;
use regex::RegexSet;

/// Decides which entry names are left out of the backup
#[derive(Debug, Clone)]
pub struct ExcludeFilter {
    patterns: RegexSet,
    skip_hidden: bool,
}

impl Default for ExcludeFilter {
    fn default() -> Self {
        Self {
            patterns: RegexSet::empty(),
            skip_hidden: true,
        }
    }
}

impl ExcludeFilter {
    pub fn new<I, S>(patterns: I, skip_hidden: bool) -> Result<Self, InventoryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = RegexSet::new(patterns)
            .map_err(|e| InventoryError::InvalidPattern(e.to_string()))?;
        Ok(Self {
            patterns,
            skip_hidden,
        })
    }

    /// True when the name matches any pattern, or is hidden and hidden names are skipped
    pub fn is_excluded(&self, name: &str) -> bool {
        (self.skip_hidden && name.starts_with('.')) || self.patterns.is_match(name)
    }

    /// First pattern matching the name, for logging
    pub fn matching_pattern(&self, name: &str) -> Option<&str> {
        self.patterns
            .matches(name)
            .iter()
            .next()
            .map(|i| self.patterns.patterns()[i].as_str())
    }
}
