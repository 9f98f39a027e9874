//! Table configuration.

use std::time::Duration;

/// Delay before a suggestion list closes after its cell loses focus.
pub const DEFAULT_SUGGESTION_CLOSE_DELAY: Duration = Duration::from_millis(200);

/// Per-table configuration.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// How long a suggestion list stays open after blur, so a pointer pick
    /// in the list can still land.
    pub suggestion_close_delay: Duration,

    /// Maximum number of suggestions shown at once.
    pub max_suggestions: usize,

    /// Text shown in place of the rows when the parent supplies a malformed
    /// row list.
    pub diagnostic_text: String,

    /// Move focus to the next row after a successful keyboard commit.
    pub advance_on_commit: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            suggestion_close_delay: DEFAULT_SUGGESTION_CLOSE_DELAY,
            max_suggestions: 8,
            diagnostic_text: "Unable to display rows".to_string(),
            advance_on_commit: true,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the suggestion close delay.
    pub fn suggestion_close_delay(mut self, delay: Duration) -> Self {
        self.suggestion_close_delay = delay;
        self
    }

    /// Set the suggestion limit.
    pub fn max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    /// Set the diagnostic text for malformed rows.
    pub fn diagnostic_text(mut self, text: impl Into<String>) -> Self {
        self.diagnostic_text = text.into();
        self
    }

    /// Keep focus on the committed row instead of advancing.
    pub fn stay_on_commit(mut self) -> Self {
        self.advance_on_commit = false;
        self
    }
}
