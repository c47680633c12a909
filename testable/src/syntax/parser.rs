//! Declaration-level recursive descent parser.
//!
//! Only declarations are modelled. Expressions, statements and function
//! bodies are skipped by bracket balancing plus declaration-start detection,
//! which is enough to recover every member of a type without a full Swift
//! grammar.

use super::error::{ParseError, ParseErrorKind};
use super::lexer::{Span, Token, tokenize};
use crate::model::{
    Attribute, DeclKind, Effects, Function, Member, Modifier, Parameter, Position, Property, TypeDeclaration,
    UnsupportedKind, UnsupportedMember,
};

const MODIFIERS: &[&str] = &[
    "private",
    "fileprivate",
    "internal",
    "public",
    "open",
    "package",
    "static",
    "class",
    "final",
    "override",
    "lazy",
    "weak",
    "unowned",
    "mutating",
    "nonmutating",
    "nonisolated",
    "dynamic",
    "required",
    "convenience",
    "optional",
    "indirect",
    "prefix",
    "postfix",
    "infix",
    "distributed",
    "consuming",
    "borrowing",
    "__consuming",
];

const DECL_KEYWORDS: &[&str] = &[
    "var",
    "let",
    "func",
    "init",
    "deinit",
    "subscript",
    "typealias",
    "associatedtype",
    "struct",
    "class",
    "enum",
    "protocol",
    "extension",
    "actor",
    "case",
    "import",
    "operator",
    "precedencegroup",
    "macro",
];

/// Pound directives that may only appear in declaration position.
const DECL_POUNDS: &[&str] = &["if", "elseif", "else", "endif", "warning", "error", "sourceLocation"];

const ACCESSORS: &[&str] = &[
    "get",
    "set",
    "willSet",
    "didSet",
    "_read",
    "_modify",
    "unsafeAddress",
    "unsafeMutableAddress",
    "init",
];

const ACCESSOR_MODIFIERS: &[&str] = &["mutating", "nonmutating", "__consuming", "borrowing", "consuming"];

const TYPE_SPECIFIERS: &[&str] = &[
    "inout",
    "some",
    "any",
    "borrowing",
    "consuming",
    "__owned",
    "__shared",
    "sending",
    "isolated",
];

/// Capitalised attributes that are not property wrappers.
const BUILTIN_ATTRIBUTES: &[&str] = &[
    "MainActor",
    "IBOutlet",
    "IBInspectable",
    "GKInspectable",
    "NSManaged",
    "NSCopying",
    "IBAction",
    "IBSegueAction",
    "Sendable",
];

/// Every type declaration found in a source file, outer types before the
/// types nested in them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFile {
    pub declarations: Vec<TypeDeclaration>,
}

impl SourceFile {
    /// Declarations carrying `@<attribute>`.
    pub fn annotated<'a>(&'a self, attribute: &'a str) -> impl Iterator<Item = &'a TypeDeclaration> + 'a {
        self.declarations
            .iter()
            .filter(move |decl| decl.attribute(attribute).is_some())
    }

    pub fn find(&self, name: &str) -> Option<&TypeDeclaration> {
        self.declarations.iter().find(|decl| decl.name == name)
    }
}

/// Parse a Swift source file into its type declarations.
pub fn parse_source(source: &str) -> Result<SourceFile, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        last_end: 0,
        declarations: Vec::new(),
    };
    parser.parse_top_level()?;
    Ok(SourceFile {
        declarations: parser.declarations,
    })
}

#[derive(Debug, Default)]
struct AccessorBlock {
    settable: bool,
    effectful: bool,
}

struct Binding {
    name: String,
    ty: Option<String>,
    has_initializer: bool,
    accessors: Option<AccessorBlock>,
    position: Position,
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(Token, Span)>,
    pos: usize,
    last_end: usize,
    declarations: Vec<TypeDeclaration>,
}

impl<'src> Parser<'src> {
    // ------------------------------------------------------------------
    // Token management
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index].0
    }

    fn span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].1
    }

    fn position(&self) -> Position {
        let span = self.span();
        Position::new(span.line, span.column)
    }

    fn advance(&mut self) -> Token {
        let (token, span) = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if token != Token::Eof {
            self.pos += 1;
            self.last_end = span.end;
        }
        token
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    /// Whether the current token starts right where the previous one ended.
    fn is_adjacent(&self) -> bool {
        self.span().start == self.last_end
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let span = self.span();
        let kind = if self.at_eof() {
            ParseErrorKind::UnexpectedEof {
                context: expected.to_owned(),
            }
        } else {
            ParseErrorKind::UnexpectedToken {
                expected: expected.to_owned(),
                found: self.peek().to_string(),
            }
        };
        ParseError::new(kind, span.line, span.column)
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<(), ParseError> {
        if *self.peek() == token {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<String, ParseError> {
        match self.peek() {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn text_since(&self, start: usize) -> String {
        self.source[start..self.last_end.max(start)].trim().to_owned()
    }

    // ------------------------------------------------------------------
    // Skipping
    // ------------------------------------------------------------------

    /// Skip a bracketed group starting at the current opener.
    fn skip_group(&mut self) -> Result<(), ParseError> {
        let mut stack: Vec<(char, u32)> = Vec::new();
        loop {
            let span = self.span();
            match self.peek() {
                Token::LParen => stack.push(('(', span.line)),
                Token::LBracket => stack.push(('[', span.line)),
                Token::LBrace => stack.push(('{', span.line)),
                Token::RParen | Token::RBracket | Token::RBrace => {
                    let close = match self.peek() {
                        Token::RParen => ')',
                        Token::RBracket => ']',
                        _ => '}',
                    };
                    let Some((open, line)) = stack.pop() else {
                        return Err(self.unexpected("an opening delimiter"));
                    };
                    if !delimiters_match(open, close) {
                        return Err(ParseError::new(
                            ParseErrorKind::MismatchedDelimiter { open, close, line },
                            span.line,
                            span.column,
                        ));
                    }
                }
                Token::Eof => return Err(self.unexpected("a bracketed group")),
                _ => {}
            }
            self.advance();
            if stack.is_empty() {
                return Ok(());
            }
        }
    }

    /// Skip a generic clause starting at the current `<`.
    fn skip_angle_group(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                Token::Op('<') => {
                    depth += 1;
                    self.advance();
                }
                Token::Op('>') => {
                    depth = depth.saturating_sub(1);
                    self.advance();
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Token::LParen | Token::LBracket => self.skip_group()?,
                Token::LBrace | Token::RBrace | Token::Semicolon | Token::Eof => {
                    return Err(self.unexpected("'>' closing the generic clause"));
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip tokens until the next declaration starts or the enclosing block
    /// closes. Nested groups are skipped whole.
    fn skip_until_decl_start(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Token::Eof | Token::RBrace => return Ok(()),
                Token::Semicolon => {
                    self.advance();
                    return Ok(());
                }
                Token::LParen | Token::LBracket | Token::LBrace => self.skip_group()?,
                Token::RParen | Token::RBracket => return Err(self.unexpected("a declaration")),
                _ if self.at_decl_start() => return Ok(()),
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip an initializer expression after `=`.
    fn skip_initializer(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        loop {
            match self.peek() {
                Token::Eof | Token::RBrace | Token::Semicolon | Token::Comma => break,
                Token::LBrace if self.observer_block_ahead() => break,
                Token::LParen | Token::LBracket | Token::LBrace => self.skip_group()?,
                Token::RParen | Token::RBracket => return Err(self.unexpected("an expression")),
                _ if self.pos > start && self.at_decl_start() => break,
                _ => {
                    self.advance();
                }
            }
        }
        if self.pos == start {
            return Err(self.unexpected("an initial value"));
        }
        Ok(())
    }

    /// Skip a default argument value up to the next `,` or `)`.
    fn skip_default_value(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        loop {
            match self.peek() {
                Token::Comma | Token::RParen => break,
                Token::LParen | Token::LBracket | Token::LBrace => self.skip_group()?,
                Token::Eof | Token::RBracket | Token::RBrace => return Err(self.unexpected("',' or ')'")),
                _ => {
                    self.advance();
                }
            }
        }
        if self.pos == start {
            return Err(self.unexpected("a default value"));
        }
        Ok(())
    }

    fn skip_rest_of_line(&mut self, line: u32) -> Result<(), ParseError> {
        while !self.at_eof() && self.span().line == line {
            match self.peek() {
                Token::LParen | Token::LBracket => self.skip_group()?,
                _ => {
                    self.advance();
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lookahead predicates
    // ------------------------------------------------------------------

    fn at_decl_start(&self) -> bool {
        if self.pos > 0 && self.tokens[self.pos - 1].0 == Token::Dot {
            return false;
        }
        match self.peek() {
            Token::Attribute(_) => true,
            Token::Pound(name) => DECL_POUNDS.contains(&name.as_str()),
            Token::Ident(word) if DECL_KEYWORDS.contains(&word.as_str()) => true,
            Token::Ident(word) if MODIFIERS.contains(&word.as_str()) => {
                let end = self.modifier_run_end(self.pos);
                matches!(&self.tokens[end].0, Token::Ident(word) if DECL_KEYWORDS.contains(&word.as_str()))
            }
            _ => false,
        }
    }

    /// Index of the first token after a run of modifiers starting at `index`.
    fn modifier_run_end(&self, mut index: usize) -> usize {
        let last = self.tokens.len() - 1;
        while index < last {
            match &self.tokens[index].0 {
                Token::Ident(word) if MODIFIERS.contains(&word.as_str()) => {
                    index += 1;
                    if self.tokens[index].0 == Token::LParen
                        && matches!(self.tokens.get(index + 1), Some((Token::Ident(_), _)))
                        && matches!(self.tokens.get(index + 2), Some((Token::RParen, _)))
                    {
                        index += 3;
                    }
                }
                _ => break,
            }
        }
        index.min(last)
    }

    /// `{ willSet ... }` or `{ didSet ... }` after an initializer.
    fn observer_block_ahead(&self) -> bool {
        *self.peek() == Token::LBrace && (self.peek_at(1).is_ident("willSet") || self.peek_at(1).is_ident("didSet"))
    }

    /// Whether the `{` at the current position opens explicit accessors
    /// rather than an implicit getter body.
    fn explicit_accessors_ahead(&self) -> bool {
        let mut offset = 1;
        loop {
            match self.peek_at(offset) {
                Token::Attribute(_) => offset += 1,
                Token::Ident(word) if ACCESSOR_MODIFIERS.contains(&word.as_str()) => offset += 1,
                _ => break,
            }
        }
        let Token::Ident(accessor) = self.peek_at(offset) else {
            return false;
        };
        if !ACCESSORS.contains(&accessor.as_str()) {
            return false;
        }
        match self.peek_at(offset + 1) {
            Token::LBrace | Token::RBrace | Token::Attribute(_) => true,
            Token::LParen => matches!(accessor.as_str(), "set" | "willSet" | "didSet" | "init"),
            Token::Ident(next) => {
                ACCESSORS.contains(&next.as_str())
                    || ACCESSOR_MODIFIERS.contains(&next.as_str())
                    || matches!(next.as_str(), "async" | "throws")
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Top level
    // ------------------------------------------------------------------

    fn parse_top_level(&mut self) -> Result<(), ParseError> {
        while !self.at_eof() {
            match self.peek().clone() {
                Token::Semicolon => {
                    self.advance();
                }
                Token::RBrace => return Err(self.unexpected("a declaration or statement")),
                Token::Pound(name) => {
                    let line = self.span().line;
                    self.advance();
                    if matches!(name.as_str(), "if" | "elseif") {
                        self.skip_rest_of_line(line)?;
                    } else if *self.peek() == Token::LParen && self.is_adjacent() {
                        self.skip_group()?;
                    }
                }
                _ => {
                    let position = self.position();
                    let attributes = self.parse_attributes()?;
                    let modifiers = self.parse_modifiers();
                    let is_type = matches!(self.peek(), Token::Ident(word) if DeclKind::from_keyword(word).is_some());
                    if is_type {
                        self.parse_type_decl(attributes, modifiers, None, position)?;
                    } else {
                        // Statements and non-type declarations are of no interest.
                        self.advance();
                        self.skip_until_decl_start()?;
                    }
                }
            }
        }
        Ok(())
    }

    fn parse_attributes(&mut self) -> Result<Vec<Attribute>, ParseError> {
        let mut attributes = Vec::new();
        while let Token::Attribute(name) = self.peek().clone() {
            let position = self.position();
            self.advance();
            let arguments = if *self.peek() == Token::LParen && self.is_adjacent() {
                let start = self.span().start;
                self.skip_group()?;
                Some(self.text_since(start))
            } else {
                None
            };
            attributes.push(Attribute {
                name,
                arguments,
                position,
            });
        }
        Ok(attributes)
    }

    fn parse_modifiers(&mut self) -> Vec<Modifier> {
        let mut modifiers = Vec::new();
        while let Token::Ident(word) = self.peek().clone() {
            if !MODIFIERS.contains(&word.as_str()) {
                break;
            }
            // `class` is a modifier only when another modifier or a
            // declaration keyword follows; otherwise it declares a type.
            if word == "class" {
                let next_is_keyword = matches!(self.peek_at(1), Token::Ident(next)
                    if DECL_KEYWORDS.contains(&next.as_str()) || MODIFIERS.contains(&next.as_str()));
                if !next_is_keyword {
                    break;
                }
            }
            self.advance();
            let detail = match (self.peek(), self.peek_at(1), self.peek_at(2)) {
                (Token::LParen, Token::Ident(detail), Token::RParen) => Some(detail.clone()),
                _ => None,
            };
            match detail {
                Some(detail) => {
                    self.advance();
                    self.advance();
                    self.advance();
                    modifiers.push(Modifier::with_detail(word, detail));
                }
                None => modifiers.push(Modifier::new(word)),
            }
        }
        modifiers
    }

    // ------------------------------------------------------------------
    // Type declarations
    // ------------------------------------------------------------------

    /// Parse a type declaration and record it (and any nested types).
    /// Returns the declared name as written.
    fn parse_type_decl(
        &mut self,
        attributes: Vec<Attribute>,
        modifiers: Vec<Modifier>,
        scope: Option<&str>,
        position: Position,
    ) -> Result<String, ParseError> {
        let keyword = self.expect_ident("a type declaration")?;
        let kind = DeclKind::from_keyword(&keyword).ok_or_else(|| self.unexpected("a type declaration"))?;
        let index = self.declarations.len();

        let declared_name = if kind == DeclKind::Extension {
            self.parse_type()?
        } else {
            let name = self.expect_ident("a type name")?;
            if *self.peek() == Token::Op('<') {
                self.skip_angle_group()?;
            }
            name
        };
        let name = match scope {
            Some(outer) => format!("{outer}.{declared_name}"),
            None => declared_name.clone(),
        };

        // Inheritance clause and generic requirements.
        loop {
            match self.peek() {
                Token::LBrace => break,
                Token::LParen | Token::LBracket => self.skip_group()?,
                Token::Eof | Token::RBrace | Token::Semicolon => {
                    return Err(self.unexpected(&format!("'{{' opening the body of '{name}'")));
                }
                _ => {
                    self.advance();
                }
            }
        }

        let members = self.parse_member_block(&name)?;
        self.declarations.insert(
            index,
            TypeDeclaration {
                name,
                kind,
                attributes,
                modifiers,
                members,
                position,
            },
        );
        Ok(declared_name)
    }

    fn parse_member_block(&mut self, scope: &str) -> Result<Vec<Member>, ParseError> {
        self.expect(Token::LBrace, "'{'")?;
        let mut members = Vec::new();
        loop {
            match self.peek() {
                Token::RBrace => {
                    self.advance();
                    return Ok(members);
                }
                Token::Semicolon => {
                    self.advance();
                }
                Token::Pound(name) if name == "if" => members.push(self.parse_conditional_block(scope)?),
                Token::Pound(name) if matches!(name.as_str(), "elseif" | "else" | "endif") => {
                    return Err(self.unexpected("a member declaration"));
                }
                Token::Eof => return Err(self.unexpected(&format!("'}}' closing the body of '{scope}'"))),
                _ => members.extend(self.parse_declaration(scope)?),
            }
        }
    }

    /// Parse every clause of an `#if` block. Clause members are parsed so
    /// that malformed text is still rejected, then folded into one
    /// unsupported member.
    fn parse_conditional_block(&mut self, scope: &str) -> Result<Member, ParseError> {
        let position = self.position();
        loop {
            let line = self.span().line;
            let Token::Pound(directive) = self.advance() else {
                return Err(self.unexpected("'#if'"));
            };
            if matches!(directive.as_str(), "if" | "elseif") {
                self.skip_rest_of_line(line)?;
            }
            loop {
                match self.peek() {
                    Token::Pound(name) if matches!(name.as_str(), "elseif" | "else") => break,
                    Token::Pound(name) if name == "endif" => {
                        self.advance();
                        return Ok(Member::Unsupported(UnsupportedMember::new(
                            UnsupportedKind::ConditionalBlock,
                            None,
                            Vec::new(),
                            position,
                        )));
                    }
                    Token::Pound(name) if name == "if" => {
                        self.parse_conditional_block(scope)?;
                    }
                    Token::Semicolon => {
                        self.advance();
                    }
                    Token::RBrace | Token::Eof => return Err(self.unexpected("'#endif'")),
                    _ => {
                        self.parse_declaration(scope)?;
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Member declarations
    // ------------------------------------------------------------------

    fn parse_declaration(&mut self, scope: &str) -> Result<Vec<Member>, ParseError> {
        let position = self.position();
        let attributes = self.parse_attributes()?;

        if let Token::Pound(name) = self.peek().clone() {
            self.advance();
            if *self.peek() == Token::LParen && self.is_adjacent() {
                self.skip_group()?;
            }
            if matches!(name.as_str(), "warning" | "error" | "sourceLocation") {
                return Ok(Vec::new());
            }
            return Ok(vec![unsupported(UnsupportedKind::MacroExpansion, Some(name), Vec::new(), position)]);
        }

        let modifiers = self.parse_modifiers();
        let keyword = match self.peek() {
            Token::Ident(word) => word.clone(),
            _ => return Err(self.unexpected("a member declaration")),
        };

        match keyword.as_str() {
            "var" | "let" => self.parse_variable(&attributes, modifiers, position),
            "func" => Ok(vec![self.parse_function(modifiers, position)?]),
            word if DeclKind::from_keyword(word).is_some() => {
                let name = self.parse_type_decl(attributes, modifiers.clone(), Some(scope), position)?;
                Ok(vec![unsupported(UnsupportedKind::NestedType, Some(name), modifiers, position)])
            }
            "init" | "deinit" | "subscript" | "case" | "import" | "operator" | "precedencegroup" | "macro" => {
                let kind = match keyword.as_str() {
                    "init" => UnsupportedKind::Initializer,
                    "deinit" => UnsupportedKind::Deinitializer,
                    "subscript" => UnsupportedKind::Subscript,
                    "case" => UnsupportedKind::EnumCase,
                    _ => UnsupportedKind::Other,
                };
                self.advance();
                let name = match (kind, self.peek()) {
                    (UnsupportedKind::EnumCase, Token::Ident(name)) => Some(name.clone()),
                    _ => None,
                };
                self.skip_until_decl_start()?;
                Ok(vec![unsupported(kind, name, modifiers, position)])
            }
            "typealias" | "associatedtype" => {
                let kind = if keyword == "typealias" {
                    UnsupportedKind::TypeAlias
                } else {
                    UnsupportedKind::AssociatedType
                };
                self.advance();
                let name = self.expect_ident("a type name")?;
                self.skip_until_decl_start()?;
                Ok(vec![unsupported(kind, Some(name), modifiers, position)])
            }
            _ => Err(self.unexpected("a member declaration")),
        }
    }

    fn parse_variable(
        &mut self,
        attributes: &[Attribute],
        modifiers: Vec<Modifier>,
        position: Position,
    ) -> Result<Vec<Member>, ParseError> {
        let is_var = self.expect_ident("'var' or 'let'")? == "var";

        if attributes.iter().any(is_property_wrapper) {
            let name = self.peek().ident().map(str::to_owned);
            self.skip_until_decl_start()?;
            return Ok(vec![unsupported(UnsupportedKind::PropertyWrapper, name, modifiers, position)]);
        }

        let mut bindings: Vec<Binding> = Vec::new();
        loop {
            let binding_position = if bindings.is_empty() { position } else { self.position() };
            let name = match self.peek() {
                Token::Ident(name) => name.clone(),
                Token::LParen => {
                    self.skip_until_decl_start()?;
                    let mut members = into_members(bindings, is_var, &modifiers);
                    members.push(unsupported(
                        UnsupportedKind::DestructuringPattern,
                        None,
                        modifiers,
                        binding_position,
                    ));
                    return Ok(members);
                }
                _ => return Err(self.unexpected("a property name")),
            };
            self.advance();

            let ty = if *self.peek() == Token::Colon {
                self.advance();
                Some(self.parse_type()?)
            } else {
                None
            };

            let has_initializer = *self.peek() == Token::Equal;
            if has_initializer {
                self.advance();
                self.skip_initializer()?;
            }

            let accessors = if *self.peek() == Token::LBrace {
                Some(self.parse_accessor_block()?)
            } else {
                None
            };

            bindings.push(Binding {
                name,
                ty,
                has_initializer,
                accessors,
                position: binding_position,
            });

            if *self.peek() == Token::Comma {
                self.advance();
            } else {
                break;
            }
        }

        // `var a, b: Int` declares both bindings as `Int`.
        for index in (0..bindings.len().saturating_sub(1)).rev() {
            let binding = &bindings[index];
            if binding.ty.is_none() && !binding.has_initializer && binding.accessors.is_none() {
                bindings[index].ty = bindings[index + 1].ty.clone();
            }
        }

        Ok(into_members(bindings, is_var, &modifiers))
    }

    fn parse_accessor_block(&mut self) -> Result<AccessorBlock, ParseError> {
        if !self.explicit_accessors_ahead() {
            self.skip_group()?;
            return Ok(AccessorBlock::default());
        }

        self.expect(Token::LBrace, "'{'")?;
        let mut block = AccessorBlock::default();
        loop {
            match self.peek().clone() {
                Token::RBrace => {
                    self.advance();
                    return Ok(block);
                }
                Token::Attribute(_) => {
                    self.parse_attributes()?;
                }
                Token::Ident(word) if ACCESSOR_MODIFIERS.contains(&word.as_str()) => {
                    self.advance();
                }
                Token::Ident(accessor) if ACCESSORS.contains(&accessor.as_str()) => {
                    self.advance();
                    if matches!(
                        accessor.as_str(),
                        "set" | "_modify" | "unsafeMutableAddress" | "init" | "willSet" | "didSet"
                    ) {
                        block.settable = true;
                    }
                    if *self.peek() == Token::LParen {
                        self.skip_group()?;
                    }
                    while let Token::Ident(effect) = self.peek().clone() {
                        if effect != "async" && effect != "throws" {
                            break;
                        }
                        block.effectful = true;
                        self.advance();
                        if effect == "throws" && *self.peek() == Token::LParen && self.is_adjacent() {
                            self.skip_group()?;
                        }
                    }
                    if *self.peek() == Token::LBrace {
                        self.skip_group()?;
                    }
                }
                _ => return Err(self.unexpected("an accessor")),
            }
        }
    }

    fn parse_function(&mut self, modifiers: Vec<Modifier>, position: Position) -> Result<Member, ParseError> {
        self.expect_ident("'func'")?;

        let name = match self.peek() {
            Token::Ident(name) => name.clone(),
            _ => {
                self.skip_until_decl_start()?;
                return Ok(unsupported(UnsupportedKind::OperatorFunction, None, modifiers, position));
            }
        };
        self.advance();

        let is_generic = *self.peek() == Token::Op('<');
        if is_generic {
            self.skip_angle_group()?;
        }

        let parameters = self.parse_parameters()?;
        let effects = self.parse_effects()?;

        let return_type = if *self.peek() == Token::Arrow {
            self.advance();
            Some(self.parse_type()?)
        } else {
            None
        };

        if self.peek().is_ident("where") {
            loop {
                match self.peek() {
                    Token::LBrace | Token::RBrace | Token::Eof => break,
                    Token::LParen | Token::LBracket => self.skip_group()?,
                    _ if self.at_decl_start() => break,
                    _ => {
                        self.advance();
                    }
                }
            }
        }

        if *self.peek() == Token::LBrace {
            self.skip_group()?;
        }

        if is_generic {
            return Ok(unsupported(UnsupportedKind::GenericFunction, Some(name), modifiers, position));
        }
        if parameters.iter().any(|param| param.ty.ends_with("...")) {
            return Ok(unsupported(UnsupportedKind::VariadicFunction, Some(name), modifiers, position));
        }

        Ok(Member::Function(Function {
            name,
            parameters,
            return_type,
            effects,
            modifiers,
            position,
        }))
    }

    fn parse_parameters(&mut self) -> Result<Vec<Parameter>, ParseError> {
        self.expect(Token::LParen, "'(' starting the parameter list")?;
        let mut parameters = Vec::new();
        if *self.peek() == Token::RParen {
            self.advance();
            return Ok(parameters);
        }

        loop {
            self.parse_attributes()?;
            let label = self.expect_ident("a parameter name")?;
            let name = match self.peek() {
                Token::Ident(name) => {
                    let name = name.clone();
                    self.advance();
                    Some(name)
                }
                _ => None,
            };
            self.expect(Token::Colon, "':' before the parameter type")?;
            let ty = self.parse_type()?;
            if *self.peek() == Token::Equal {
                self.advance();
                self.skip_default_value()?;
            }
            parameters.push(Parameter { label, name, ty });

            match self.peek() {
                Token::Comma => {
                    self.advance();
                }
                Token::RParen => {
                    self.advance();
                    return Ok(parameters);
                }
                _ => return Err(self.unexpected("',' or ')'")),
            }
        }
    }

    fn parse_effects(&mut self) -> Result<Effects, ParseError> {
        let mut effects = Effects::default();
        while let Token::Ident(word) = self.peek().clone() {
            match word.as_str() {
                "async" | "reasync" => {
                    self.advance();
                    effects.is_async = true;
                }
                "throws" | "rethrows" => {
                    let start = self.span().start;
                    self.advance();
                    if *self.peek() == Token::LParen && self.is_adjacent() {
                        self.skip_group()?;
                    }
                    effects.throws = Some(self.text_since(start));
                }
                _ => break,
            }
        }
        Ok(effects)
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// Parse a type and return its source text.
    fn parse_type(&mut self) -> Result<String, ParseError> {
        let start = self.span().start;
        self.parse_type_inner()?;
        Ok(self.text_since(start))
    }

    fn parse_type_inner(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Token::Attribute(_) => {
                    self.advance();
                    if *self.peek() == Token::LParen && self.is_adjacent() {
                        self.skip_group()?;
                    }
                }
                Token::Ident(word)
                    if TYPE_SPECIFIERS.contains(&word.as_str())
                        && matches!(
                            self.peek_at(1),
                            Token::Ident(_) | Token::LParen | Token::LBracket | Token::Attribute(_)
                        ) =>
                {
                    self.advance();
                }
                _ => break,
            }
        }

        self.parse_postfix_type()?;
        while *self.peek() == Token::Op('&') {
            self.advance();
            self.parse_postfix_type()?;
        }

        // Function type: effects, then `->` and the result type.
        let mut has_effects = false;
        while let Token::Ident(word) = self.peek().clone() {
            if word != "async" && word != "throws" {
                break;
            }
            has_effects = true;
            self.advance();
            if word == "throws" && *self.peek() == Token::LParen && self.is_adjacent() {
                self.skip_group()?;
            }
        }
        if *self.peek() == Token::Arrow {
            self.advance();
            self.parse_type_inner()?;
        } else if has_effects {
            return Err(self.unexpected("'->' in a function type"));
        }
        Ok(())
    }

    fn parse_postfix_type(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            Token::LParen | Token::LBracket => self.skip_group()?,
            Token::Ident(_) => {
                self.advance();
                if *self.peek() == Token::Op('<') && self.is_adjacent() {
                    self.skip_angle_group()?;
                }
            }
            _ => return Err(self.unexpected("a type")),
        }

        loop {
            match self.peek() {
                Token::Op('?') | Token::Op('!') if self.is_adjacent() => {
                    self.advance();
                }
                Token::Dot if matches!(self.peek_at(1), Token::Ident(_)) => {
                    self.advance();
                    self.advance();
                    if *self.peek() == Token::Op('<') && self.is_adjacent() {
                        self.skip_angle_group()?;
                    }
                }
                Token::Ellipsis => {
                    self.advance();
                }
                _ => return Ok(()),
            }
        }
    }
}

fn delimiters_match(open: char, close: char) -> bool {
    matches!((open, close), ('(', ')') | ('[', ']') | ('{', '}'))
}

fn is_property_wrapper(attribute: &Attribute) -> bool {
    attribute.name.starts_with(|c: char| c.is_uppercase()) && !BUILTIN_ATTRIBUTES.contains(&attribute.name.as_str())
}

fn unsupported(kind: UnsupportedKind, name: Option<String>, modifiers: Vec<Modifier>, position: Position) -> Member {
    Member::Unsupported(UnsupportedMember::new(kind, name, modifiers, position))
}

fn into_members(bindings: Vec<Binding>, is_var: bool, modifiers: &[Modifier]) -> Vec<Member> {
    bindings
        .into_iter()
        .map(|binding| {
            let effectful = binding.accessors.as_ref().is_some_and(|block| block.effectful);
            if effectful {
                return unsupported(
                    UnsupportedKind::EffectfulProperty,
                    Some(binding.name),
                    modifiers.to_vec(),
                    binding.position,
                );
            }
            let has_setter = is_var && binding.accessors.as_ref().is_none_or(|block| block.settable);
            Member::Property(Property {
                name: binding.name,
                ty: binding.ty,
                has_setter,
                modifiers: modifiers.to_vec(),
                position: binding.position,
            })
        })
        .collect()
}
