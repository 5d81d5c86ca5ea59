//! Tokenizer for the OpenStep property list dialect used by `project.pbxproj`
//!
//! Every token carries the byte range it occupies in the source so that edits
//! can be spliced back into the original text. Comments and whitespace are
//! skipped but never discarded from the source.

use std::ops::Range;

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Equals,
    Semicolon,
    Comma,
    /// Bare or quoted string
    String { quoted: bool },
    /// `<hex bytes>`
    Data,
}

/// A token and its location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

/// Lexing failure at a byte offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub offset: usize,
    pub message: String,
}

impl LexError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Streaming tokenizer over a pbxproj source
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer at the start of `source`
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    /// The source being tokenized
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Current byte offset
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Next token, or `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_trivia()?;
        let start = self.pos;
        let Some(&byte) = self.bytes.get(start) else {
            return Ok(None);
        };

        let kind = match byte {
            b'{' => self.single(TokenKind::OpenBrace),
            b'}' => self.single(TokenKind::CloseBrace),
            b'(' => self.single(TokenKind::OpenParen),
            b')' => self.single(TokenKind::CloseParen),
            b'=' => self.single(TokenKind::Equals),
            b';' => self.single(TokenKind::Semicolon),
            b',' => self.single(TokenKind::Comma),
            b'"' | b'\'' => {
                self.quoted(byte)?;
                TokenKind::String { quoted: true }
            }
            b'<' => {
                self.data()?;
                TokenKind::Data
            }
            b if is_unquoted_byte(b) => {
                while self.bytes.get(self.pos).is_some_and(|&b| is_unquoted_byte(b)) {
                    self.pos += 1;
                }
                TokenKind::String { quoted: false }
            }
            other => {
                return Err(LexError::new(
                    start,
                    format!("unexpected character '{}'", other as char),
                ))
            }
        };

        Ok(Some(Token {
            kind,
            span: start..self.pos,
        }))
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.bytes.get(self.pos) {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') if self.bytes.get(self.pos + 1) == Some(&b'*') => {
                    let start = self.pos;
                    let end = self.source[self.pos + 2..]
                        .find("*/")
                        .ok_or_else(|| LexError::new(start, "unterminated comment"))?;
                    self.pos += 2 + end + 2;
                }
                Some(b'/') if self.bytes.get(self.pos + 1) == Some(&b'/') => {
                    while self.bytes.get(self.pos).is_some_and(|&b| b != b'\n') {
                        self.pos += 1;
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn quoted(&mut self, quote: u8) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.bytes.get(self.pos) {
                None => return Err(LexError::new(start, "unterminated string")),
                Some(b'\\') => self.pos += 2,
                Some(&b) if b == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn data(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let end = self.source[start..]
            .find('>')
            .ok_or_else(|| LexError::new(start, "unterminated data block"))?;
        self.pos = start + end + 1;
        Ok(())
    }
}

/// Bytes allowed in an unquoted string
pub fn is_unquoted_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'/' | b':' | b'.' | b'-' | b'+')
}

/// Decode the text of a string token
pub fn unquote(raw: &str) -> String {
    if raw.len() < 2 || !matches!(raw.as_bytes()[0], b'"' | b'\'') {
        return raw.to_string();
    }
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Encode a value as a pbxproj string, quoting when needed
pub fn quote(value: &str, force: bool) -> String {
    let needs_quotes = force
        || value.is_empty()
        || !value.bytes().all(|b| {
            b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'/' | b':' | b'.')
        });
    if !needs_quotes {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
