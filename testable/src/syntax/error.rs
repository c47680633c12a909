use thiserror::Error;

/// Failure raised while lexing or parsing Swift source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: u32,
    pub column: u32,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: u32, column: u32) -> Self {
        Self { kind, line, column }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated block comment")]
    UnterminatedComment,

    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("unexpected end of input while parsing {context}")]
    UnexpectedEof { context: String },

    #[error("'{close}' does not match '{open}' opened on line {line}")]
    MismatchedDelimiter { open: char, close: char, line: u32 },
}
