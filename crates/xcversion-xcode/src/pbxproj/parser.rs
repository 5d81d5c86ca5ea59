//! Recursive descent parser producing a span-annotated value tree

use std::ops::Range;

use super::lexer::{unquote, LexError, Lexer, Token, TokenKind};

/// A string leaf and where it sits in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    /// Decoded text
    pub text: String,
    /// Byte range of the token, quotes included
    pub span: Range<usize>,
    /// Whether the source spelled it with quotes
    pub quoted: bool,
}

/// `key = value;` inside a dictionary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Scalar,
    pub value: Value,
    /// From the first byte of the key through the terminating `;`
    pub span: Range<usize>,
}

/// A `{ ... }` dictionary, entries in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dict {
    pub entries: Vec<Entry>,
    /// From `{` through `}`
    pub span: Range<usize>,
}

impl Dict {
    /// Value of the first entry named `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entry(key).map(|e| &e.value)
    }

    /// First entry named `key`
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key.text == key)
    }

    /// String value of `key`
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Dictionary value of `key`
    pub fn get_dict(&self, key: &str) -> Option<&Dict> {
        self.get(key).and_then(Value::as_dict)
    }

    /// Array value of `key`
    pub fn get_array(&self, key: &str) -> Option<&[Value]> {
        self.get(key).and_then(Value::as_array)
    }
}

/// A parsed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Dict(Dict),
    Array { items: Vec<Value>, span: Range<usize> },
    Scalar(Scalar),
    Data(Range<usize>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(&s.text),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Byte range of the whole value
    pub fn span(&self) -> Range<usize> {
        match self {
            Self::Dict(d) => d.span.clone(),
            Self::Array { span, .. } => span.clone(),
            Self::Scalar(s) => s.span.clone(),
            Self::Data(span) => span.clone(),
        }
    }
}

/// Parse failure at a byte offset
pub type ParseError = LexError;

/// Parse a complete pbxproj source; the top level must be a dictionary
pub fn parse(source: &str) -> Result<Dict, ParseError> {
    let mut parser = Parser {
        lexer: Lexer::new(source),
        peeked: None,
    };
    let first = parser.expect_any("a dictionary")?;
    if first.kind != TokenKind::OpenBrace {
        return Err(error_at(&first, "top level value must be a dictionary"));
    }
    let root = parser.dict(first.span.start)?;
    if let Some(extra) = parser.next()? {
        return Err(error_at(&extra, "unexpected content after the root dictionary"));
    }
    Ok(root)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> Result<Option<Token>, ParseError> {
        match self.peeked.take() {
            Some(token) => Ok(Some(token)),
            None => self.lexer.next_token(),
        }
    }

    fn peek(&mut self) -> Result<Option<&Token>, ParseError> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next_token()?;
        }
        Ok(self.peeked.as_ref())
    }

    fn expect_any(&mut self, what: &str) -> Result<Token, ParseError> {
        self.next()?.ok_or_else(|| ParseError {
            offset: self.lexer.offset(),
            message: format!("unexpected end of input, expected {}", what),
        })
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        let token = self.expect_any(what)?;
        if token.kind != kind {
            return Err(error_at(&token, format!("expected {}", what)));
        }
        Ok(token)
    }

    fn scalar(&self, token: &Token) -> Option<Scalar> {
        match token.kind {
            TokenKind::String { quoted } => {
                let raw = &self.lexer.source()[token.span.clone()];
                Some(Scalar {
                    text: unquote(raw),
                    span: token.span.clone(),
                    quoted,
                })
            }
            _ => None,
        }
    }

    fn value(&mut self, token: Token) -> Result<Value, ParseError> {
        match token.kind {
            TokenKind::OpenBrace => Ok(Value::Dict(self.dict(token.span.start)?)),
            TokenKind::OpenParen => self.array(token.span.start),
            TokenKind::Data => Ok(Value::Data(token.span)),
            TokenKind::String { .. } => match self.scalar(&token) {
                Some(scalar) => Ok(Value::Scalar(scalar)),
                None => Err(error_at(&token, "expected a value")),
            },
            _ => Err(error_at(&token, "expected a value")),
        }
    }

    fn dict(&mut self, start: usize) -> Result<Dict, ParseError> {
        let mut entries = Vec::new();
        loop {
            let token = self.expect_any("a key or '}'")?;
            if token.kind == TokenKind::CloseBrace {
                return Ok(Dict {
                    entries,
                    span: start..token.span.end,
                });
            }
            let key = self
                .scalar(&token)
                .ok_or_else(|| error_at(&token, "expected a key or '}'"))?;
            self.expect(TokenKind::Equals, "'='")?;
            let value_token = self.expect_any("a value")?;
            let value = self.value(value_token)?;
            let end = self.expect(TokenKind::Semicolon, "';'")?;
            entries.push(Entry {
                span: key.span.start..end.span.end,
                key,
                value,
            });
        }
    }

    fn array(&mut self, start: usize) -> Result<Value, ParseError> {
        let mut items = Vec::new();
        loop {
            let token = self.expect_any("a value or ')'")?;
            if token.kind == TokenKind::CloseParen {
                return Ok(Value::Array {
                    items,
                    span: start..token.span.end,
                });
            }
            items.push(self.value(token)?);

            let separator = self.peek()?.map(|t| t.kind);
            match separator {
                Some(TokenKind::Comma) => {
                    self.next()?;
                }
                Some(TokenKind::CloseParen) => {}
                _ => {
                    let token = self.expect_any("',' or ')'")?;
                    return Err(error_at(&token, "expected ',' or ')'"));
                }
            }
        }
    }
}

fn error_at(token: &Token, message: impl Into<String>) -> ParseError {
    ParseError {
        offset: token.span.start,
        message: message.into(),
    }
}
