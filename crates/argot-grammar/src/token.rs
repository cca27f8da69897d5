//! Tokenizer.
//!
//! Splits a raw line into tokens and classifies each one lexically. Nothing
//! here looks at the grammar: whether a named candidate really is an option is
//! decided by the matcher.
//!
//! Rules for raw lines:
//! - Whitespace separates tokens; a run of it counts once. Newlines and
//!   carriage returns are whitespace too.
//! - `"..."` and `'...'` group text, including whitespace, into one token. The
//!   quotes are removed. Inside a quoted run a doubled quote is a literal
//!   quote (`'it''s'` is `it's`). An unterminated quote runs to the end.
//! - Quoting may start mid-token: `--name="a b"` yields `--name=a b`.
//! - A token containing any quoted run is a [`TokenKind::Literal`].
//! - The end-of-options marker (`--` by default) is dropped and every token
//!   after it is a literal.
//! - A token starting with a configured prefix, with text after the prefix,
//!   is [`TokenKind::Named`]. Everything else is [`TokenKind::Bare`].
//!
//! Malformed input never fails; it degrades to bare tokens.

use crate::alias;
use crate::config::ParserConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Starts with a recognized prefix (`--output`, `-v`, `/help`).
    Named,
    /// Plain text. May still match an unprefixed alias.
    Bare,
    /// Quoted or after the end-of-options marker: always a value.
    Literal,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Whether the matcher may compare this token against aliases.
    pub fn can_be_alias(&self) -> bool {
        self.kind != TokenKind::Literal
    }
}

struct Word {
    text: String,
    quoted: bool,
}

/// Tokenize a raw command line.
pub fn tokenize(line: &str, config: &ParserConfig) -> Vec<Token> {
    let tokens = classify(split_line(line), config);
    tracing::trace!(count = tokens.len(), "tokenized line");
    tokens
}

/// Tokenize arguments that were already split (e.g. `std::env::args`).
///
/// No quote processing happens: each element is one token.
pub fn tokenize_args<S: AsRef<str>>(args: &[S], config: &ParserConfig) -> Vec<Token> {
    let words = args.iter().map(|a| Word {
        text: a.as_ref().to_string(),
        quoted: false,
    });
    let tokens = classify(words, config);
    tracing::trace!(count = tokens.len(), "tokenized argument list");
    tokens
}

fn split_line(line: &str) -> Vec<Word> {
    let mut words = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut text = String::new();
        let mut quoted = false;
        while let Some(&c) = chars.peek() {
            match c {
                _ if c.is_whitespace() => break,
                '"' | '\'' => {
                    quoted = true;
                    chars.next();
                    while let Some(inner) = chars.next() {
                        if inner != c {
                            text.push(inner);
                        } else if chars.peek() == Some(&c) {
                            // Doubled quote.
                            chars.next();
                            text.push(c);
                        } else {
                            break;
                        }
                    }
                }
                _ => {
                    text.push(c);
                    chars.next();
                }
            }
        }
        words.push(Word { text, quoted });
    }

    words
}

fn classify(words: impl IntoIterator<Item = Word>, config: &ParserConfig) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal_rest = false;

    for word in words {
        if literal_rest || word.quoted {
            tokens.push(Token::new(TokenKind::Literal, word.text));
            continue;
        }
        if config.is_end_of_options(&word.text) {
            literal_rest = true;
            continue;
        }
        let kind = if alias::is_prefixed(&word.text, &config.prefixes) {
            TokenKind::Named
        } else {
            TokenKind::Bare
        };
        tokens.push(Token::new(kind, word.text));
    }

    tokens
}
