//! Command handlers for the docrag CLI.

pub mod ask;
pub mod chat;
pub mod index;
pub mod search;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use index::IndexCommand;
pub use search::SearchCommand;

/// First `max_chars` characters of `text` on one line.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    text.chars()
        .take(max_chars)
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_flattens_and_truncates() {
        assert_eq!(preview("line one\nline two", 100), "line one line two");
        assert_eq!(preview("abcdef", 3), "abc");
        assert_eq!(preview("", 3), "");
    }
}
