use crate::history;
use crate::lexer;

/// Prompt shown before every line when none is configured.
pub const DEFAULT_PROMPT: &str = "sh> ";

/// Knobs that shape one interpreter session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Text printed before reading each line, and again when an interrupt redraws it.
    pub prompt: String,
    /// How many submitted lines the `history` built-in remembers.
    pub history_capacity: usize,
    /// Words beyond this count are dropped from a statement.
    pub max_tokens: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            history_capacity: history::DEFAULT_CAPACITY,
            max_tokens: lexer::DEFAULT_MAX_TOKENS,
        }
    }
}
