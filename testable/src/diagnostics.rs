use std::fmt;

use serde::Serialize;

use crate::model::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// A message attached to a source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub position: Position,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>, position: Position) -> Self {
        Self {
            severity,
            message: message.into(),
            position,
        }
    }

    pub fn note(message: impl Into<String>, position: Position) -> Self {
        Self::new(Severity::Note, message, position)
    }

    pub fn warning(message: impl Into<String>, position: Position) -> Self {
        Self::new(Severity::Warning, message, position)
    }

    pub fn error(message: impl Into<String>, position: Position) -> Self {
        Self::new(Severity::Error, message, position)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.position, self.severity, self.message)
    }
}
