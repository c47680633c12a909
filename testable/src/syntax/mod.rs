//! Swift front end: just enough of the language to recover type
//! declarations and their member signatures.

mod error;
mod lexer;
mod parser;

pub use error::{ParseError, ParseErrorKind};
pub use lexer::{Span, Token, tokenize};
pub use parser::{SourceFile, parse_source};
