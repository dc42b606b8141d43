//! Splitting of a statement into words.
//!
//! Words are maximal runs of characters other than space and tab. There is no quoting,
//! escaping or comment syntax: every other character, operators included, is part of
//! whatever word it touches, so `a|b` is one word while `a | b` is three.

use log::{trace, warn};

/// Words kept per statement when no limit is configured.
pub const DEFAULT_MAX_TOKENS: usize = 100;

fn is_separator(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

/// Split `line` into owned words, keeping at most `max_tokens` of them.
///
/// Words past the limit are dropped. This is a policy, not an error: the caller still
/// gets the first `max_tokens` words and the truncation is only logged.
pub fn tokenize(line: &str, max_tokens: usize) -> Vec<String> {
    let mut words = line.split(is_separator).filter(|word| !word.is_empty());
    let tokens: Vec<String> = words.by_ref().take(max_tokens).map(str::to_owned).collect();

    let dropped = words.count();
    if dropped > 0 {
        warn!("dropped {} word(s) past the limit of {}", dropped, max_tokens);
    }
    trace!("tokens = {:?}", tokens);
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_lines_have_no_tokens() {
        assert!(tokenize("", DEFAULT_MAX_TOKENS).is_empty());
        assert!(tokenize("   \t  \t", DEFAULT_MAX_TOKENS).is_empty());
    }

    #[test]
    fn splits_on_runs_of_spaces_and_tabs() {
        assert_eq!(
            tokenize("  ls\t-l   \t/tmp  ", DEFAULT_MAX_TOKENS),
            vec!["ls", "-l", "/tmp"]
        );
    }

    #[test]
    fn command_with_k_args_has_k_plus_one_tokens() {
        let tokens = tokenize("grep -n foo a.txt b.txt", DEFAULT_MAX_TOKENS);
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0], "grep");
    }

    #[test]
    fn operators_are_words_only_when_spaced() {
        assert_eq!(tokenize("a|b", DEFAULT_MAX_TOKENS), vec!["a|b"]);
        assert_eq!(tokenize("a | b", DEFAULT_MAX_TOKENS), vec!["a", "|", "b"]);
    }

    #[test]
    fn no_quote_handling() {
        assert_eq!(
            tokenize("echo \"hello world\"", DEFAULT_MAX_TOKENS),
            vec!["echo", "\"hello", "world\""]
        );
    }

    #[test]
    fn words_past_the_limit_are_dropped() {
        let line = (0..150).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let tokens = tokenize(&line, DEFAULT_MAX_TOKENS);
        assert_eq!(tokens.len(), DEFAULT_MAX_TOKENS);
        assert_eq!(tokens.last().map(String::as_str), Some("99"));
    }
}
