//! Output rules and the publish descriptor
//!
//! Output rules are glob patterns naming the paths the hosting CI system may
//! collect. Publish entries map collected paths to named, grouped entries for
//! an external distribution system. Neither performs any I/O here.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single publish record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishEntry {
    /// Grouping key for the distribution system
    pub series: String,

    /// Name under which the output is published
    pub name: String,

    /// Staged path the entry is published from
    pub from_output: String,
}

/// A compiled output-rule glob
///
/// `*` matches within a single path segment, `?` matches one non-separator
/// character and `**` crosses segments. The whole path must match.
#[derive(Debug, Clone)]
pub struct OutputRule {
    regex: Regex,
}

impl OutputRule {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&glob_to_regex(pattern))?;
        Ok(Self { regex })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => out.push_str("[^/]"),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out.push('$');
    out
}

/// The publish descriptor attached to a job
#[derive(Debug, Clone, Default)]
pub struct PublishDescriptor {
    pub entries: Vec<PublishEntry>,
}

impl PublishDescriptor {
    pub fn new(entries: Vec<PublishEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries grouped by series, in series name order
    pub fn by_series(&self) -> BTreeMap<&str, Vec<&PublishEntry>> {
        let mut groups: BTreeMap<&str, Vec<&PublishEntry>> = BTreeMap::new();
        for entry in &self.entries {
            groups.entry(entry.series.as_str()).or_default().push(entry);
        }
        groups
    }

    /// Check every entry against the output rules and the set of paths the
    /// job will actually produce.
    pub fn validate(&self, rules: &[OutputRule], produced: &[String]) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();

        for entry in &self.entries {
            if entry.series.trim().is_empty() || entry.name.trim().is_empty() {
                return Err(format!(
                    "publish entry for '{}' must have a non-empty series and name",
                    entry.from_output
                ));
            }

            if !seen.insert((&entry.series, &entry.name)) {
                return Err(format!(
                    "duplicate publish name '{}' in series '{}'",
                    entry.name, entry.series
                ));
            }

            if !rules.iter().any(|r| r.matches(&entry.from_output)) {
                return Err(format!(
                    "publish entry '{}' references '{}', which no output rule covers",
                    entry.name, entry.from_output
                ));
            }

            if !produced.iter().any(|p| p == &entry.from_output) {
                return Err(format!(
                    "publish entry '{}' references '{}', which this job never produces",
                    entry.name, entry.from_output
                ));
            }
        }

        Ok(())
    }
}
