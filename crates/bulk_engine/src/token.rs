//! Splits raw submitted text into command tokens and classifies them.
//!
//! Tokenization is pure and per-call: each `submit` is split on whitespace
//! independently, so a token arriving half in one call and half in the next
//! is read as two tokens.

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TokenKind {
    OpenBlock,
    CloseBlock,
    Data,
}

/// Block markers are detected by substring containment, not exact match:
/// any token embedding `{` opens a block and any token embedding `}` closes
/// one. `{` is checked first, so a token carrying both counts as an open.
pub fn classify(token: &str) -> TokenKind {
    if token.contains('{') {
        TokenKind::OpenBlock
    } else if token.contains('}') {
        TokenKind::CloseBlock
    } else {
        TokenKind::Data
    }
}

pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_any_whitespace() {
        let toks: Vec<&str> = tokenize("  a\tb \n c ").collect();
        assert_eq!(toks, vec!["a", "b", "c"]);
    }

    #[test]
    fn tokenize_of_blank_text_is_empty() {
        assert_eq!(tokenize("   \n\t ").count(), 0);
        assert_eq!(tokenize("").count(), 0);
    }

    #[test]
    fn classify_uses_substring_containment() {
        assert_eq!(classify("{"), TokenKind::OpenBlock);
        assert_eq!(classify("a{b"), TokenKind::OpenBlock);
        assert_eq!(classify("}"), TokenKind::CloseBlock);
        assert_eq!(classify("x}y"), TokenKind::CloseBlock);
        assert_eq!(classify("cmd1"), TokenKind::Data);
    }

    #[test]
    fn open_wins_when_both_markers_present() {
        assert_eq!(classify("{}"), TokenKind::OpenBlock);
        assert_eq!(classify("}{"), TokenKind::OpenBlock);
    }
}
