//! Test-hook generation for Swift types.
//!
//! A type annotated with `@Testable` gets a debug-only extension exposing a
//! `testHooks` proxy whose members forward to the type's private members.
//! The pipeline runs in four steps over the declaration model: the scanner
//! classifies members, the property and function synthesizers render
//! forwarding members, and the assembler wraps them in the gated extension.
//!
//! ```
//! use testable::{ExpansionOptions, TestableMacro};
//!
//! let source = "@Testable\nclass Counter {\n    private var count: Int = 0\n}\n";
//! let expansions = TestableMacro::new(ExpansionOptions::default())
//!     .expand_source(source)
//!     .unwrap();
//! let extension = expansions[0].extension().unwrap();
//! assert!(extension.source.contains("var count: Int {"));
//! ```

pub mod assembler;
pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod errors;
pub mod expansion;
pub mod model;
pub mod scanner;
pub mod source_updater;
pub mod synth;
pub mod syntax;

pub use assembler::{AssemblyOptions, ENTRY_POINT, Fragments, PROXY_TYPE, RESERVED_NAMES, assemble};
pub use config::{CONFIG_FILE, ConfigError, TestableConfig};
pub use diagnostics::{Diagnostic, Severity};
pub use discovery::{DiscoveredFile, discover_sources};
pub use errors::ExpansionError;
pub use expansion::{
    DiagnosticCollector, ExpansionContext, ExpansionOptions, ExtensionDecl, MissingType, TestableMacro, TypeExpansion,
};
pub use model::{
    Attribute, DeclKind, Effects, Function, Member, Modifier, Parameter, Position, Property, TypeDeclaration,
    UnsupportedKind, UnsupportedMember,
};
pub use scanner::{Classification, ModifierMatching, ScanOutcome, ScanRules, SkipReason, Skipped, classify, scan};
pub use source_updater::{FileReport, UpdateError, WriteOutcome, update_file, update_source};
pub use synth::{ArgumentLabels, SynthOptions, Target};
pub use syntax::{ParseError, SourceFile, parse_source};
