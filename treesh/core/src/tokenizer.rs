//! Splits raw input lines into typed tokens.
//!
//! [`scan`] is the strict view: every chunk of the line comes back, including the ones no
//! grammar slot can accept. [`tokenize`] is the permissive view used for argument
//! extraction: it keeps recognized tokens and silently drops the rest.

use std::ops::Range;

use crate::lexicon::{self, TokenKind};

/// Shape of a chunk before a grammar slot interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lexeme {
    /// Bare word; may be a keyword, an admin word, or neither.
    Word,
    /// `/`-prefixed path.
    Path,
    /// Quoted string, quotes included.
    Quoted,
    /// Chunk glued to its predecessor without separating whitespace.
    Unrecognized,
}

/// One scanned chunk of an input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Chunk shape.
    pub lexeme: Lexeme,
    /// Raw text, quotes kept.
    pub text: String,
    /// Byte range within the line.
    pub span: Range<usize>,
}

impl Token {
    /// Whether this token can fill a slot of `kind`.
    #[must_use]
    pub fn is_kind(&self, kind: TokenKind) -> bool {
        match (self.lexeme, kind) {
            (Lexeme::Word, TokenKind::Command | TokenKind::AdminWord) => kind.matches(&self.text),
            (Lexeme::Path, TokenKind::Path) | (Lexeme::Quoted, TokenKind::QuotedString) => true,
            _ => false,
        }
    }

    /// Whether any token kind accepts this chunk.
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        match self.lexeme {
            Lexeme::Path | Lexeme::Quoted => true,
            Lexeme::Word => lexicon::is_keyword(&self.text) || lexicon::is_admin_word(&self.text),
            Lexeme::Unrecognized => false,
        }
    }

    /// Raw token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

fn classify(text: &str) -> Lexeme {
    if TokenKind::QuotedString.matches(text) {
        Lexeme::Quoted
    } else if TokenKind::Path.matches(text) {
        Lexeme::Path
    } else {
        Lexeme::Word
    }
}

/// Every chunk of `line`, left to right.
#[must_use]
pub fn scan(line: &str) -> Vec<Token> {
    let mut previous_end = None;
    lexicon::chunk_pattern()
        .find_iter(line)
        .map(|chunk| {
            let glued = previous_end == Some(chunk.start());
            previous_end = Some(chunk.end());
            Token {
                lexeme: if glued {
                    Lexeme::Unrecognized
                } else {
                    classify(chunk.as_str())
                },
                text: chunk.as_str().to_owned(),
                span: chunk.range(),
            }
        })
        .collect()
}

/// Recognized tokens of `line`; unmatched chunks are dropped. Blank lines yield nothing.
#[must_use]
pub fn tokenize(line: &str) -> Vec<Token> {
    scan(line)
        .into_iter()
        .filter(Token::is_recognized)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::as_str).collect()
    }

    #[test]
    fn keeps_quotes_and_inner_whitespace() {
        let tokens = tokenize(r#"set /test '{"k": "v"}'"#);
        assert_eq!(texts(&tokens), vec!["set", "/test", r#"'{"k": "v"}'"#]);
        assert_eq!(tokens[2].lexeme, Lexeme::Quoted);
    }

    #[test]
    fn table_examples_yield_keyword_and_arguments() {
        let cases = [
            ("ls /test", 1),
            ("get /test", 1),
            ("create /test/node", 1),
            ("set /test 'some value'", 2),
            ("set /test", 1),
            ("delete /test", 1),
            ("rmr /test", 1),
            ("stat /test", 1),
            ("raw srvr", 1),
            ("help", 0),
            ("help ls", 1),
            ("toggle_write", 0),
            ("quit", 0),
            ("edit /test", 1),
        ];
        for (line, arguments) in cases {
            let tokens = tokenize(line);
            assert_eq!(tokens.len(), arguments + 1, "{line}");
            assert!(tokens[0].is_kind(TokenKind::Command), "{line}");
        }
    }

    #[test]
    fn blank_lines_are_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t ").is_empty());
    }

    #[test]
    fn permissive_view_drops_unknown_words() {
        let tokens = tokenize("ls bad /ok");
        assert_eq!(texts(&tokens), vec!["ls", "/ok"]);
        assert_eq!(scan("ls bad /ok").len(), 3);
    }

    #[test]
    fn glued_chunks_are_unrecognized() {
        let tokens = scan("set /a 'x''y'");
        assert_eq!(tokens[2].lexeme, Lexeme::Quoted);
        assert_eq!(tokens[3].lexeme, Lexeme::Unrecognized);
        assert_eq!(tokens[3].span, 10..13);
    }

    #[test]
    fn words_are_read_in_context() {
        let tokens = scan("raw stat");
        assert!(tokens[1].is_kind(TokenKind::Command));
        assert!(tokens[1].is_kind(TokenKind::AdminWord));
        assert!(!tokens[1].is_kind(TokenKind::Path));
        assert!(!scan("raw srvr")[1].is_kind(TokenKind::Command));
    }

    #[test]
    fn unterminated_quote_is_a_plain_word() {
        let tokens = scan("set /a 'oops");
        assert_eq!(tokens[2].lexeme, Lexeme::Word);
        assert!(!tokens[2].is_recognized());
    }
}
