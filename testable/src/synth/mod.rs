//! Forwarding-member synthesis.
//!
//! Fragments are emitted at nesting depth zero, one member after another
//! separated by newlines. The assembler re-indents them into place.

mod function;
mod property;

use serde::{Deserialize, Serialize};

pub use function::{render_function, synthesize_functions};
pub use property::{render_property, synthesize_properties};

/// Receiver of instance members inside the proxy.
pub const INSTANCE_RECEIVER: &str = "target";

pub const DEFAULT_PLACEHOLDER_TYPE: &str = "Any";

/// The expression a forwarding member reads from or calls through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// The proxied instance.
    Instance,
    /// The owning type, for static members.
    Type(&'a str),
}

impl Target<'_> {
    pub fn receiver(&self) -> &str {
        match self {
            Target::Instance => INSTANCE_RECEIVER,
            Target::Type(name) => name,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Target::Type(_))
    }

    /// Declaration prefix for the forwarding member.
    fn keyword_prefix(&self) -> &'static str {
        if self.is_static() { "static " } else { "" }
    }
}

/// How wildcard-labelled arguments are written in forwarding calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentLabels {
    /// `f(value)`.
    #[default]
    Omit,
    /// `f(_: value)`.
    Wildcard,
}

/// Indentation unit of generated code, in spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indent {
    width: usize,
}

impl Indent {
    pub const DEFAULT_WIDTH: usize = 4;

    pub fn new(width: usize) -> Self {
        Self { width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn at(&self, depth: usize) -> String {
        " ".repeat(self.width * depth)
    }
}

impl Default for Indent {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WIDTH)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthOptions {
    pub indent: Indent,
    pub argument_labels: ArgumentLabels,
    /// Type written for properties declared without an annotation.
    pub placeholder_type: String,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            indent: Indent::default(),
            argument_labels: ArgumentLabels::default(),
            placeholder_type: DEFAULT_PLACEHOLDER_TYPE.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_receiver() {
        assert_eq!(Target::Instance.receiver(), "target");
        assert_eq!(Target::Type("MyClass").receiver(), "MyClass");
        assert!(Target::Type("MyClass").is_static());
    }

    #[test]
    fn test_indent_at_depth() {
        assert_eq!(Indent::default().at(2), "        ");
        assert_eq!(Indent::new(2).at(1), "  ");
        assert_eq!(Indent::new(3).at(0), "");
    }
}
