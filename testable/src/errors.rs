use thiserror::Error;

use crate::diagnostics::Diagnostic;
use crate::model::{DeclKind, Position};

/// Fatal failure of a single expansion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionError {
    /// The annotation is attached to a declaration that cannot carry it.
    #[error("@Testable can only be applied to a class, struct or enum, not to {kind} '{name}'")]
    UnsupportedDeclaration { kind: DeclKind, name: String },

    /// A property has no type annotation and placeholders are disabled.
    #[error("property '{property}' needs an explicit type annotation")]
    MissingTypeAnnotation { property: String, position: Position },

    /// A forwarded member would clash with a member of the proxy itself.
    #[error("{member} '{name}' clashes with a member of the generated {proxy} type")]
    ReservedName {
        member: &'static str,
        name: String,
        proxy: &'static str,
        position: Position,
    },

    /// The generated text did not parse back as the expected declaration.
    #[error("generated extension for '{type_name}' is malformed: {reason}")]
    Assembly { type_name: String, reason: String },
}

impl ExpansionError {
    /// Diagnostic for this error, placed at its own position when it has
    /// one and at `fallback` otherwise.
    pub fn to_diagnostic(&self, fallback: Position) -> Diagnostic {
        let position = match self {
            ExpansionError::MissingTypeAnnotation { position, .. } | ExpansionError::ReservedName { position, .. } => {
                *position
            }
            _ => fallback,
        };
        Diagnostic::error(self.to_string(), position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    #[test]
    fn test_missing_type_points_at_property() {
        let error = ExpansionError::MissingTypeAnnotation {
            property: "cache".to_owned(),
            position: Position::new(4, 5),
        };
        let diagnostic = error.to_diagnostic(Position::new(1, 1));
        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.position, Position::new(4, 5));
        assert_eq!(diagnostic.message, "property 'cache' needs an explicit type annotation");
    }

    #[test]
    fn test_reserved_name_points_at_member() {
        let error = ExpansionError::ReservedName {
            member: "property",
            name: "target".to_owned(),
            proxy: "TestHooks",
            position: Position::new(3, 5),
        };
        let diagnostic = error.to_diagnostic(Position::new(1, 1));
        assert_eq!(diagnostic.position, Position::new(3, 5));
        assert_eq!(
            diagnostic.message,
            "property 'target' clashes with a member of the generated TestHooks type"
        );
    }

    #[test]
    fn test_other_errors_use_annotation_site() {
        let error = ExpansionError::UnsupportedDeclaration {
            kind: DeclKind::Protocol,
            name: "Service".to_owned(),
        };
        let diagnostic = error.to_diagnostic(Position::new(2, 1));
        assert_eq!(diagnostic.position, Position::new(2, 1));
        assert!(diagnostic.message.contains("protocol 'Service'"));
    }
}
