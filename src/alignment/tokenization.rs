use crate::types::Token;

/// Splits on whitespace and normalizes each word for comparison.
///
/// Words made only of punctuation (a lone dash, an ellipsis) carry no lexical
/// content and are dropped, so every produced token has a non-empty `text`.
pub fn tokenize_text(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for word in text.split_whitespace() {
        let normalized = normalize_word(word);
        if normalized.is_empty() {
            continue;
        }
        tokens.push(Token {
            text: normalized,
            original: word.to_string(),
            index: tokens.len(),
        });
    }

    debug_assert!(
        tokens.iter().enumerate().all(|(i, t)| t.index == i),
        "token index contract violated"
    );
    tokens
}

/// Lowercases and strips leading/trailing punctuation. Inner punctuation
/// (`uh-huh`, `don't`) is kept.
pub fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Joins the `original` field of tokens with single spaces.
pub(crate) fn join_original(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| token.original.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn join_text(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| token.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn empty_and_whitespace_input_produce_no_tokens() {
        assert!(tokenize_text("").is_empty());
        assert!(tokenize_text("   \t\n ").is_empty());
    }

    #[test]
    fn lowercases_and_strips_edge_punctuation() {
        let tokens = tokenize_text("The QUICK, brown fox!");
        assert_eq!(texts(&tokens), ["the", "quick", "brown", "fox"]);
        assert_eq!(tokens[1].original, "QUICK,");
        assert_eq!(tokens[3].original, "fox!");
    }

    #[test]
    fn inner_punctuation_is_kept() {
        let tokens = tokenize_text("Uh-huh, don't \"stop\"");
        assert_eq!(texts(&tokens), ["uh-huh", "don't", "stop"]);
    }

    #[test]
    fn punctuation_only_words_are_dropped_and_indices_stay_dense() {
        let tokens = tokenize_text("well -- I ... think");
        assert_eq!(texts(&tokens), ["well", "i", "think"]);
        let indices: Vec<usize> = tokens.iter().map(|t| t.index).collect();
        assert_eq!(indices, [0, 1, 2]);
    }

    #[test]
    fn splits_on_any_whitespace_run() {
        let tokens = tokenize_text("a\tb\n\nc   d");
        assert_eq!(texts(&tokens), ["a", "b", "c", "d"]);
    }

    #[test]
    fn is_deterministic() {
        let text = "Once upon a time, there was a Reader.";
        assert_eq!(tokenize_text(text), tokenize_text(text));
    }

    #[test]
    fn non_ascii_letters_are_lowercased() {
        let tokens = tokenize_text("Élan ÜBER");
        assert_eq!(texts(&tokens), ["élan", "über"]);
    }

    #[test]
    fn joins_use_single_spaces() {
        let tokens = tokenize_text("Hello,   World");
        assert_eq!(join_original(&tokens), "Hello, World");
        assert_eq!(join_text(&tokens), "hello world");
    }
}
