//! The `@Testable` expansion: scan, synthesize, assemble.

use serde::{Deserialize, Serialize};

use crate::assembler::{AssemblyOptions, DEFAULT_BUILD_FLAG, Fragments, PROXY_TYPE, assemble, check_reserved_names};
use crate::diagnostics::Diagnostic;
use crate::errors::ExpansionError;
use crate::model::{Attribute, DeclKind, Position, TypeDeclaration};
use crate::scanner::{ModifierMatching, ScanRules, SkipReason, scan};
use crate::synth::{ArgumentLabels, DEFAULT_PLACEHOLDER_TYPE, Indent, SynthOptions};
use crate::syntax::{ParseError, parse_source};

/// Receives diagnostics produced while expanding.
pub trait ExpansionContext {
    fn diagnose(&mut self, diagnostic: Diagnostic);
}

/// Context that keeps every diagnostic in order.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

impl ExpansionContext for DiagnosticCollector {
    fn diagnose(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// One generated extension declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionDecl {
    pub extended_type: String,
    pub source: String,
}

/// Treatment of properties declared without a type annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingType {
    /// Forward with the placeholder type.
    #[default]
    Placeholder,
    /// Fail the expansion.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionOptions {
    pub modifier_matching: ModifierMatching,
    pub qualifying_modifiers: Vec<String>,
    pub static_modifiers: Vec<String>,
    pub argument_labels: ArgumentLabels,
    pub missing_type: MissingType,
    pub placeholder_type: String,
    pub build_flag: String,
    pub indent_width: usize,
    pub warn_unsupported: bool,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        let rules = ScanRules::default();
        Self {
            modifier_matching: rules.matching,
            qualifying_modifiers: rules.qualifying,
            static_modifiers: rules.statics,
            argument_labels: ArgumentLabels::Omit,
            missing_type: MissingType::Placeholder,
            placeholder_type: DEFAULT_PLACEHOLDER_TYPE.to_owned(),
            build_flag: DEFAULT_BUILD_FLAG.to_owned(),
            indent_width: Indent::DEFAULT_WIDTH,
            warn_unsupported: true,
        }
    }
}

impl ExpansionOptions {
    /// Substring modifier matching and literal `_:` argument labels, the
    /// output of the first `@Testable` releases.
    pub fn compatible() -> Self {
        let rules = ScanRules::substring();
        Self {
            modifier_matching: rules.matching,
            qualifying_modifiers: rules.qualifying,
            static_modifiers: rules.statics,
            argument_labels: ArgumentLabels::Wildcard,
            ..Self::default()
        }
    }

    pub fn scan_rules(&self) -> ScanRules {
        ScanRules {
            matching: self.modifier_matching,
            qualifying: self.qualifying_modifiers.clone(),
            statics: self.static_modifiers.clone(),
        }
    }

    pub fn synth_options(&self) -> SynthOptions {
        SynthOptions {
            indent: Indent::new(self.indent_width),
            argument_labels: self.argument_labels,
            placeholder_type: self.placeholder_type.clone(),
        }
    }

    pub fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions {
            build_flag: self.build_flag.clone(),
            indent: Indent::new(self.indent_width),
        }
    }
}

/// Outcome of expanding one annotated type found in a source file.
#[derive(Debug, Clone)]
pub struct TypeExpansion {
    pub type_name: String,
    /// Position of the `@Testable` attribute.
    pub position: Position,
    pub result: Result<ExtensionDecl, ExpansionError>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TypeExpansion {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn extension(&self) -> Option<&ExtensionDecl> {
        self.result.as_ref().ok()
    }
}

/// The `@Testable` generator.
#[derive(Debug, Clone, Default)]
pub struct TestableMacro {
    options: ExpansionOptions,
}

impl TestableMacro {
    pub const ATTRIBUTE: &'static str = "Testable";

    pub fn new(options: ExpansionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExpansionOptions {
        &self.options
    }

    /// Expand `declaration`, annotated by `node`, into one extension of
    /// `type_name`. Requested conformances are ignored. Every diagnostic,
    /// including the one for a returned error, goes to `context`.
    pub fn expansion(
        &self,
        node: &Attribute,
        declaration: &TypeDeclaration,
        type_name: &str,
        conformances: &[String],
        context: &mut dyn ExpansionContext,
    ) -> Result<Vec<ExtensionDecl>, ExpansionError> {
        if !conformances.is_empty() {
            log::debug!("ignoring requested conformances {conformances:?} for {type_name}");
        }
        self.expand_one(node, declaration, type_name, context)
            .map(|extension| vec![extension])
    }

    fn expand_one(
        &self,
        node: &Attribute,
        declaration: &TypeDeclaration,
        type_name: &str,
        context: &mut dyn ExpansionContext,
    ) -> Result<ExtensionDecl, ExpansionError> {
        match self.expand_members(node, declaration, type_name, context) {
            Ok(source) => Ok(ExtensionDecl {
                extended_type: type_name.to_owned(),
                source,
            }),
            Err(err) => {
                context.diagnose(err.to_diagnostic(node.position));
                Err(err)
            }
        }
    }

    fn expand_members(
        &self,
        node: &Attribute,
        declaration: &TypeDeclaration,
        type_name: &str,
        context: &mut dyn ExpansionContext,
    ) -> Result<String, ExpansionError> {
        if matches!(
            declaration.kind,
            DeclKind::Protocol | DeclKind::Extension | DeclKind::Actor
        ) {
            return Err(ExpansionError::UnsupportedDeclaration {
                kind: declaration.kind,
                name: declaration.name.clone(),
            });
        }
        if let Some(arguments) = &node.arguments {
            context.diagnose(Diagnostic::warning(
                format!("@{} takes no arguments; ignoring {arguments}", Self::ATTRIBUTE),
                node.position,
            ));
        }

        let outcome = scan(&declaration.members, &self.options.scan_rules());
        if self.options.warn_unsupported {
            for skipped in &outcome.skipped {
                let diagnostic = match skipped.reason {
                    SkipReason::Unsupported(_) => Diagnostic::warning(
                        format!("{} cannot be forwarded and is left out of {PROXY_TYPE}", skipped.description),
                        skipped.position,
                    ),
                    SkipReason::NotQualifying => Diagnostic::note(
                        format!("{} has no qualifying modifier and is skipped", skipped.description),
                        skipped.position,
                    ),
                };
                context.diagnose(diagnostic);
            }
        }

        let classification = outcome.classification;
        if self.options.missing_type == MissingType::Reject {
            let untyped = classification
                .instance_properties
                .iter()
                .chain(&classification.static_properties)
                .find(|property| property.ty.is_none());
            if let Some(property) = untyped {
                return Err(ExpansionError::MissingTypeAnnotation {
                    property: property.name.clone(),
                    position: property.position,
                });
            }
        }

        check_reserved_names(&classification)?;

        log::debug!(
            "{type_name}: {} instance properties, {} instance functions, {} static properties, {} static functions, {} skipped",
            classification.instance_properties.len(),
            classification.instance_functions.len(),
            classification.static_properties.len(),
            classification.static_functions.len(),
            outcome.skipped.len(),
        );

        let fragments = Fragments::synthesize(&classification, type_name, &self.options.synth_options());
        assemble(type_name, &fragments, &self.options.assembly_options())
    }

    /// Expand one declaration found by the front end.
    pub fn expand_declaration(&self, declaration: &TypeDeclaration) -> TypeExpansion {
        let node = declaration
            .attribute(Self::ATTRIBUTE)
            .cloned()
            .unwrap_or_else(|| Attribute::new(Self::ATTRIBUTE));
        let mut collector = DiagnosticCollector::new();
        let result = self.expand_one(&node, declaration, &declaration.name, &mut collector);
        TypeExpansion {
            type_name: declaration.name.clone(),
            position: node.position,
            result,
            diagnostics: collector.into_diagnostics(),
        }
    }

    /// Expand every `@Testable` type in `source`, in source order.
    pub fn expand_source(&self, source: &str) -> Result<Vec<TypeExpansion>, ParseError> {
        let file = parse_source(source)?;
        Ok(file
            .annotated(Self::ATTRIBUTE)
            .map(|declaration| self.expand_declaration(declaration))
            .collect())
    }
}
