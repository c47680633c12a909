use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use testable::{Diagnostic, TypeExpansion};

use crate::context::ProjectContext;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Preview Generated Code",
        commands: &[
            "testable expand Sources/App/Wallet.swift                 # Print every generated extension",
            "testable expand Sources/App/Wallet.swift --type Wallet   # Only the extension for Wallet",
        ],
    },
    ExampleGroup {
        title: "Scripting",
        commands: &["testable --output json expand Sources/App/Wallet.swift   # Extensions and diagnostics as JSON"],
    },
];

#[derive(Args)]
pub struct ExpandArgs {
    /// Swift source file to expand
    pub file: PathBuf,

    /// Only expand the type with this name (`Outer.Inner` for nested types)
    #[arg(long = "type", value_name = "NAME")]
    pub type_name: Option<String>,
}

#[derive(Serialize)]
struct ExpandedType<'a> {
    type_name: &'a str,
    extension: Option<&'a str>,
    error: Option<String>,
    diagnostics: &'a [Diagnostic],
}

impl<'a> From<&'a TypeExpansion> for ExpandedType<'a> {
    fn from(expansion: &'a TypeExpansion) -> Self {
        Self {
            type_name: &expansion.type_name,
            extension: expansion.extension().map(|extension| extension.source.as_str()),
            error: expansion.result.as_ref().err().map(ToString::to_string),
            diagnostics: &expansion.diagnostics,
        }
    }
}

pub fn handle_expand(args: ExpandArgs, ctx: &ProjectContext, output: &OutputManager) -> Result<()> {
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let file = ctx.display_path(&args.file);

    let expansions: Vec<TypeExpansion> = ctx
        .generator()
        .expand_source(&source)
        .with_context(|| format!("Failed to parse {file}"))?
        .into_iter()
        .filter(|expansion| args.type_name.as_ref().is_none_or(|name| *name == expansion.type_name))
        .collect();

    if expansions.is_empty() {
        match &args.type_name {
            Some(name) => anyhow::bail!("No @Testable type named '{name}' in {file}"),
            None => {
                output.warning(&format!("No @Testable types found in {file}"));
                return Ok(());
            }
        }
    }

    for expansion in &expansions {
        for diagnostic in &expansion.diagnostics {
            output.diagnostic(&file, diagnostic);
        }
    }

    if output.is_json() {
        let expanded: Vec<ExpandedType> = expansions.iter().map(ExpandedType::from).collect();
        output.json(&expanded)?;
    } else {
        let mut first = true;
        for extension in expansions.iter().filter_map(TypeExpansion::extension) {
            if !first {
                println!();
            }
            println!("{}", extension.source);
            first = false;
        }
    }

    let failed = expansions.iter().filter(|expansion| !expansion.is_ok()).count();
    if failed > 0 {
        anyhow::bail!("{failed} type(s) in {file} could not be expanded");
    }
    Ok(())
}
