//! Include/exclude path-glob layering

use serde::Serialize;

/// Include and exclude globs for one layer, or the resolved result.
///
/// Lists are trimmed, blank entries dropped and duplicates collapsed with
/// the first occurrence kept.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PathScope {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl PathScope {
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            include: dedup_patterns(include),
            exclude: dedup_patterns(exclude),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Layer `higher` on top of this scope.
    ///
    /// A non-empty list in `higher` replaces the corresponding list here
    /// wholesale; lists are never unioned across layers.
    pub fn merge(&mut self, higher: &PathScope) {
        if !higher.include.is_empty() {
            self.include = higher.include.clone();
        }
        if !higher.exclude.is_empty() {
            self.exclude = higher.exclude.clone();
        }
    }
}

fn dedup_patterns<I>(patterns: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for pattern in patterns {
        let pattern = pattern.as_ref().trim();
        if pattern.is_empty() || out.iter().any(|p| p == pattern) {
            continue;
        }
        out.push(pattern.to_string());
    }
    out
}
