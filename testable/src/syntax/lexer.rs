//! Lexer for the Swift declaration subset understood by the front end.
//!
//! Tokens come from logos. String literals (multi-line, raw and interpolated
//! forms) are scanned by hand in a callback because an interpolation segment
//! may itself contain string literals.

use std::fmt;

use logos::{FilterResult, Logos};

use super::error::{ParseError, ParseErrorKind};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[token("/*", lex_block_comment)]
    BlockComment,

    #[token("\"", lex_string)]
    #[regex(r##"#+""##, lex_string)]
    Str,

    #[regex(r"[\p{L}_$][\p{L}\p{N}_$]*", |lex| lex.slice().to_owned())]
    #[regex(r"`[^`\r\n]+`", |lex| lex.slice().to_owned())]
    Ident(String),

    #[regex(r"@[\p{L}_][\p{L}\p{N}_]*", |lex| lex.slice()[1..].to_owned())]
    Attribute(String),

    #[regex(r"#[\p{L}_][\p{L}\p{N}_]*", |lex| lex.slice()[1..].to_owned())]
    Pound(String),

    #[regex(r"[0-9][0-9a-zA-Z_]*")]
    Number,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token("=")]
    Equal,

    #[token("->")]
    Arrow,

    #[token("...")]
    Ellipsis,

    #[token(".")]
    Dot,

    #[regex(r"[/+\-*%<>!&|^~?\\]", |lex| lex.slice().chars().next())]
    Op(char),
}

/// Swift blocks comments nest.
fn lex_block_comment(lex: &mut logos::Lexer<RawToken>) -> FilterResult<(), ()> {
    let bytes = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut i = 0;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'*') => {
                depth += 1;
                i += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    lex.bump(i);
                    return FilterResult::Skip;
                }
            }
            _ => i += 1,
        }
    }
    lex.bump(bytes.len());
    FilterResult::Error(())
}

fn lex_string(lex: &mut logos::Lexer<RawToken>) -> bool {
    let hashes = lex.slice().len() - 1;
    match string_body_len(lex.remainder(), hashes) {
        Some(len) => {
            lex.bump(len);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

/// Length of a string literal after its opening quote, closing delimiter
/// included. `hashes` is the raw-string delimiter count.
fn string_body_len(rest: &str, hashes: usize) -> Option<usize> {
    let bytes = rest.as_bytes();
    let multiline = bytes.starts_with(b"\"\"");
    let quotes = if multiline { 3 } else { 1 };
    let mut i = if multiline { 2 } else { 0 };

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if has_hashes(&bytes[i + 1..], hashes) => {
                let after = i + 1 + hashes;
                if bytes.get(after) == Some(&b'(') {
                    i = after + 1 + interpolation_len(&rest[after + 1..])?;
                } else {
                    i = after + 1;
                }
            }
            b'"' if closes(&bytes[i..], quotes, hashes) => return Some(i + quotes + hashes),
            b'\n' if !multiline => return None,
            _ => i += 1,
        }
    }
    None
}

fn interpolation_len(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut depth = 1usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            b'"' => {
                i += 1 + string_body_len(&rest[i + 1..], 0)?;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn has_hashes(bytes: &[u8], count: usize) -> bool {
    bytes.len() >= count && bytes[..count].iter().all(|b| *b == b'#')
}

fn closes(bytes: &[u8], quotes: usize, hashes: usize) -> bool {
    bytes.len() >= quotes + hashes
        && bytes[..quotes].iter().all(|b| *b == b'"')
        && has_hashes(&bytes[quotes..], hashes)
}

/// A lexed token. Keywords are not distinguished from identifiers: Swift has
/// many contextual keywords, so the parser compares identifier text instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Ident(String),
    Attribute(String),
    Pound(String),
    Number,
    Str,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Equal,
    Arrow,
    Ellipsis,
    Dot,
    Op(char),
    Eof,
}

impl Token {
    pub fn is_ident(&self, text: &str) -> bool {
        matches!(self, Token::Ident(name) if name == text)
    }

    pub fn ident(&self) -> Option<&str> {
        match self {
            Token::Ident(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "'{name}'"),
            Token::Attribute(name) => write!(f, "'@{name}'"),
            Token::Pound(name) => write!(f, "'#{name}'"),
            Token::Number => f.write_str("number literal"),
            Token::Str => f.write_str("string literal"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::Comma => f.write_str("','"),
            Token::Colon => f.write_str("':'"),
            Token::Semicolon => f.write_str("';'"),
            Token::Equal => f.write_str("'='"),
            Token::Arrow => f.write_str("'->'"),
            Token::Ellipsis => f.write_str("'...'"),
            Token::Dot => f.write_str("'.'"),
            Token::Op(c) => write!(f, "'{c}'"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// Byte range plus the 1-based line and column of its first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

/// Tokenize `source`, ending the stream with [`Token::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>, ParseError> {
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();
    let mut line = 1u32;
    let mut column = 1u32;
    let mut last_end = 0;

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        advance_position(&source[last_end..range.start], &mut line, &mut column);
        let span = Span {
            start: range.start,
            end: range.end,
            line,
            column,
        };

        let token = match result {
            Ok(raw) => convert(raw),
            Err(()) => return Err(lex_error(lexer.slice(), span)),
        };
        tokens.push((token, span));

        advance_position(&source[range.start..range.end], &mut line, &mut column);
        last_end = range.end;
    }

    advance_position(&source[last_end..], &mut line, &mut column);
    tokens.push((
        Token::Eof,
        Span {
            start: source.len(),
            end: source.len(),
            line,
            column,
        },
    ));
    Ok(tokens)
}

fn advance_position(text: &str, line: &mut u32, column: &mut u32) {
    for c in text.chars() {
        if c == '\n' {
            *line += 1;
            *column = 1;
        } else {
            *column += 1;
        }
    }
}

fn lex_error(slice: &str, span: Span) -> ParseError {
    let kind = if slice.starts_with("/*") {
        ParseErrorKind::UnterminatedComment
    } else if slice.starts_with('"') || slice.starts_with("#\"") || slice.starts_with("##") {
        ParseErrorKind::UnterminatedString
    } else {
        ParseErrorKind::UnexpectedCharacter(slice.chars().next().unwrap_or('\0'))
    };
    ParseError::new(kind, span.line, span.column)
}

fn convert(raw: RawToken) -> Token {
    match raw {
        RawToken::Str => Token::Str,
        RawToken::Ident(name) => Token::Ident(name),
        RawToken::Attribute(name) => Token::Attribute(name),
        RawToken::Pound(name) => Token::Pound(name),
        RawToken::Number => Token::Number,
        RawToken::LParen => Token::LParen,
        RawToken::RParen => Token::RParen,
        RawToken::LBrace => Token::LBrace,
        RawToken::RBrace => Token::RBrace,
        RawToken::LBracket => Token::LBracket,
        RawToken::RBracket => Token::RBracket,
        RawToken::Comma => Token::Comma,
        RawToken::Colon => Token::Colon,
        RawToken::Semicolon => Token::Semicolon,
        RawToken::Equal => Token::Equal,
        RawToken::Arrow => Token::Arrow,
        RawToken::Ellipsis => Token::Ellipsis,
        RawToken::Dot => Token::Dot,
        RawToken::Op(c) => Token::Op(c),
        // Comments are skipped by their callbacks and never surface.
        RawToken::LineComment | RawToken::BlockComment => Token::Eof,
    }
}
