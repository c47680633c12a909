//! Declaration model shared by the front end, the scanner and the synthesizers.
//!
//! The engine never looks at tokens: everything it needs about a type is
//! captured here, with type text kept verbatim from the source.

use std::fmt;

use serde::Serialize;

/// 1-based source position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Class,
    Struct,
    Enum,
    Actor,
    Protocol,
    Extension,
}

impl DeclKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "class" => Some(Self::Class),
            "struct" => Some(Self::Struct),
            "enum" => Some(Self::Enum),
            "actor" => Some(Self::Actor),
            "protocol" => Some(Self::Protocol),
            "extension" => Some(Self::Extension),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Actor => "actor",
            Self::Protocol => "protocol",
            Self::Extension => "extension",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// An `@Name(arguments)` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub arguments: Option<String>,
    pub position: Position,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: None,
            position: Position::default(),
        }
    }
}

/// A declaration modifier such as `private`, `static` or `private(set)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Modifier {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Modifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: None,
        }
    }

    pub fn with_detail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: Some(detail.into()),
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}({detail})", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A nominal type declaration and its ordered members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDeclaration {
    /// Dotted name, qualified by enclosing types (`Outer.Inner`).
    pub name: String,
    pub kind: DeclKind,
    pub attributes: Vec<Attribute>,
    pub modifiers: Vec<Modifier>,
    pub members: Vec<Member>,
    pub position: Position,
}

impl TypeDeclaration {
    pub fn new(name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            kind,
            attributes: Vec::new(),
            modifiers: Vec::new(),
            members: Vec::new(),
            position: Position::default(),
        }
    }

    pub fn with_member(mut self, member: impl Into<Member>) -> Self {
        self.members.push(member.into());
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum Member {
    Property(Property),
    Function(Function),
    Unsupported(UnsupportedMember),
}

impl Member {
    pub fn name(&self) -> Option<&str> {
        match self {
            Member::Property(property) => Some(&property.name),
            Member::Function(function) => Some(&function.name),
            Member::Unsupported(member) => member.name.as_deref(),
        }
    }

    pub fn modifiers(&self) -> &[Modifier] {
        match self {
            Member::Property(property) => &property.modifiers,
            Member::Function(function) => &function.modifiers,
            Member::Unsupported(member) => &member.modifiers,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Member::Property(property) => property.position,
            Member::Function(function) => function.position,
            Member::Unsupported(member) => member.position,
        }
    }

    /// Short description used in diagnostics and reports.
    pub fn describe(&self) -> String {
        match self {
            Member::Property(property) => format!("property '{}'", property.name),
            Member::Function(function) => format!("function '{}'", function.name),
            Member::Unsupported(member) => match &member.name {
                Some(name) => format!("{} '{name}'", member.kind),
                None => member.kind.to_string(),
            },
        }
    }
}

impl From<Property> for Member {
    fn from(property: Property) -> Self {
        Member::Property(property)
    }
}

impl From<Function> for Member {
    fn from(function: Function) -> Self {
        Member::Function(function)
    }
}

impl From<UnsupportedMember> for Member {
    fn from(member: UnsupportedMember) -> Self {
        Member::Unsupported(member)
    }
}

/// A `var`/`let` binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub name: String,
    /// Type annotation text; `None` when the type is only inferred.
    pub ty: Option<String>,
    /// Mutable stored variable, or a `set` accessor was written.
    pub has_setter: bool,
    pub modifiers: Vec<Modifier>,
    pub position: Position,
}

impl Property {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty.into()),
            has_setter: false,
            modifiers: Vec::new(),
            position: Position::default(),
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            ty: None,
            ..Self::new(name, "")
        }
    }

    pub fn settable(mut self) -> Self {
        self.has_setter = true;
        self
    }

    pub fn with_modifiers<I, S>(mut self, modifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modifiers = modifiers.into_iter().map(Modifier::new).collect();
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

/// A `func` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Function {
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// Return clause text; `None` when the declaration has no `->`.
    pub return_type: Option<String>,
    pub effects: Effects,
    pub modifiers: Vec<Modifier>,
    pub position: Position,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: None,
            effects: Effects::default(),
            modifiers: Vec::new(),
            position: Position::default(),
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn returning(mut self, ty: impl Into<String>) -> Self {
        self.return_type = Some(ty.into());
        self
    }

    pub fn with_effects(mut self, effects: Effects) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_modifiers<I, S>(mut self, modifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modifiers = modifiers.into_iter().map(Modifier::new).collect();
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Declared `mutating`, so callable only on a mutable value.
    pub fn is_mutating(&self) -> bool {
        self.modifiers.iter().any(|modifier| modifier.name == "mutating")
    }
}

/// `async` and `throws`/`rethrows` specifiers of a function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Effects {
    pub is_async: bool,
    /// Throws clause as written: `throws`, `rethrows` or `throws(SomeError)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throws: Option<String>,
}

impl Effects {
    pub fn is_empty(&self) -> bool {
        !self.is_async && self.throws.is_none()
    }
}

pub const WILDCARD_LABEL: &str = "_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    /// Argument label; [`WILDCARD_LABEL`] when callers pass no label.
    pub label: String,
    /// Second name, when one is written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub ty: String,
}

impl Parameter {
    pub fn new(label: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            name: None,
            ty: ty.into(),
        }
    }

    pub fn named(label: impl Into<String>, name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            name: Some(name.into()),
            ty: ty.into(),
        }
    }

    /// Name used inside the function body.
    pub fn internal_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.label)
    }

    pub fn is_unlabeled(&self) -> bool {
        self.label == WILDCARD_LABEL
    }

    pub fn is_inout(&self) -> bool {
        self.ty.split_whitespace().next() == Some("inout")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedKind {
    Initializer,
    Deinitializer,
    Subscript,
    NestedType,
    TypeAlias,
    AssociatedType,
    EnumCase,
    ConditionalBlock,
    MacroExpansion,
    OperatorFunction,
    GenericFunction,
    VariadicFunction,
    PropertyWrapper,
    EffectfulProperty,
    DestructuringPattern,
    Other,
}

impl fmt::Display for UnsupportedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Initializer => "initializer",
            Self::Deinitializer => "deinitializer",
            Self::Subscript => "subscript",
            Self::NestedType => "nested type",
            Self::TypeAlias => "type alias",
            Self::AssociatedType => "associated type",
            Self::EnumCase => "enum case",
            Self::ConditionalBlock => "conditional compilation block",
            Self::MacroExpansion => "macro expansion",
            Self::OperatorFunction => "operator function",
            Self::GenericFunction => "generic function",
            Self::VariadicFunction => "variadic function",
            Self::PropertyWrapper => "wrapped property",
            Self::EffectfulProperty => "effectful property",
            Self::DestructuringPattern => "destructuring binding",
            Self::Other => "declaration",
        };
        f.write_str(text)
    }
}

/// A member the synthesizers cannot forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsupportedMember {
    pub kind: UnsupportedKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub modifiers: Vec<Modifier>,
    pub position: Position,
}

impl UnsupportedMember {
    pub fn new(kind: UnsupportedKind, name: Option<String>, modifiers: Vec<Modifier>, position: Position) -> Self {
        Self {
            kind,
            name,
            modifiers,
            position,
        }
    }
}
