use std::collections::BTreeMap;

/// Sparse map from question index to the user's submitted answer.
///
/// Unanswered questions have no entry. Writes are last-wins; nothing is
/// checked against the canonical answer until scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    entries: BTreeMap<usize, String>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or replaces) the answer at `index`.
    pub fn record(&mut self, index: usize, value: impl Into<String>) {
        self.entries.insert(index, value.into());
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(&index).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.entries.iter().map(|(i, v)| (*i, v.as_str()))
    }
}
