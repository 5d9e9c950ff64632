/// The set of reaction emojis that count as upvotes for ranking.
///
/// Emoji identifiers are matched exactly against the stored reaction emoji:
/// the literal character for unicode emoji, the name for custom guild emoji.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpvotePolicy {
    emojis: Vec<String>,
}

pub const DEFAULT_UPVOTE_EMOJIS: &[&str] = &["⬆️", "👍", "upvote"];

impl Default for UpvotePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_UPVOTE_EMOJIS.iter().copied())
    }
}

impl UpvotePolicy {
    pub fn new<I, S>(emojis: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut emojis: Vec<String> = emojis
            .into_iter()
            .map(Into::into)
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        emojis.sort();
        emojis.dedup();
        Self { emojis }
    }

    #[cfg(test)]
    pub fn is_upvote(&self, emoji: &str) -> bool {
        self.emojis.iter().any(|e| e == emoji)
    }

    pub fn is_empty(&self) -> bool {
        self.emojis.is_empty()
    }

    pub fn emojis(&self) -> &[String] {
        &self.emojis
    }

    /// `?, ?, ?` placeholder list matching `emojis()` for an SQL `IN (...)` clause
    pub(crate) fn placeholders(&self) -> String {
        vec!["?"; self.emojis.len()].join(", ")
    }
}
