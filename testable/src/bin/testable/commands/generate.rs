use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use testable::{Diagnostic, FileReport, WriteOutcome, discover_sources, update_file};

use crate::context::ProjectContext;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Generate Test Hooks",
        commands: &[
            "testable generate                      # Update generated regions under the current directory",
            "testable generate Sources/App Tests    # Only files under the given paths",
        ],
    },
    ExampleGroup {
        title: "Continuous Integration",
        commands: &[
            "testable generate --check              # Fail when any generated region is out of date",
            "testable --output json generate --check",
        ],
    },
];

#[derive(Args)]
pub struct GenerateArgs {
    /// Files or directories to process
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Report out-of-date files without writing them
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Serialize)]
struct FileSummary {
    file: String,
    outcome: Option<WriteOutcome>,
    types: Vec<String>,
    removed: Vec<String>,
    diagnostics: Vec<Diagnostic>,
    error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct GenerateSummary {
    files: Vec<FileSummary>,
    updated: usize,
    stale: usize,
    failed: usize,
}

pub fn handle_generate(args: GenerateArgs, ctx: &ProjectContext, output: &OutputManager) -> Result<()> {
    let summary = run(&args, ctx, output)?;

    if output.is_json() {
        output.json(&summary)?;
    } else if summary.files.is_empty() {
        output.warning("No @Testable types found");
    } else if args.check {
        if summary.stale == 0 && summary.failed == 0 {
            output.success(&format!("{} file(s) up to date", summary.files.len()));
        }
    } else {
        output.info(&format!(
            "{} file(s) checked, {} updated",
            summary.files.len(),
            summary.updated
        ));
    }

    if summary.failed > 0 {
        anyhow::bail!("{} file(s) could not be generated", summary.failed);
    }
    if args.check && summary.stale > 0 {
        output.info("Run 'testable generate' to update them.");
        anyhow::bail!("{} file(s) have out-of-date test hooks", summary.stale);
    }
    Ok(())
}

fn run(args: &GenerateArgs, ctx: &ProjectContext, output: &OutputManager) -> Result<GenerateSummary> {
    let exclude = ctx.config.exclude_patterns()?;
    let generator = ctx.generator();
    let mut summary = GenerateSummary::default();

    for root in &args.paths {
        let root = ctx.working_dir.join(root);
        for file in discover_sources(&root, &exclude)? {
            let display = ctx.display_path(&file.path);
            let file_summary = match update_file(&file.path, &generator, args.check) {
                Ok(report) => {
                    report_file(&display, &report, output);
                    match report.outcome {
                        WriteOutcome::Updated => summary.updated += 1,
                        WriteOutcome::Stale => summary.stale += 1,
                        WriteOutcome::Unchanged => {}
                    }
                    if report.has_errors() {
                        summary.failed += 1;
                    }
                    FileSummary {
                        file: display,
                        outcome: Some(report.outcome),
                        types: report
                            .expansions
                            .iter()
                            .filter(|expansion| expansion.is_ok())
                            .map(|expansion| expansion.type_name.clone())
                            .collect(),
                        removed: report.removed,
                        diagnostics: report
                            .expansions
                            .into_iter()
                            .flat_map(|expansion| expansion.diagnostics)
                            .collect(),
                        error: None,
                    }
                }
                Err(err) => {
                    output.error(&format!("{display}: {err}"));
                    summary.failed += 1;
                    FileSummary {
                        file: display,
                        outcome: None,
                        types: Vec::new(),
                        removed: Vec::new(),
                        diagnostics: Vec::new(),
                        error: Some(err.to_string()),
                    }
                }
            };
            summary.files.push(file_summary);
        }
    }
    Ok(summary)
}

fn report_file(display: &str, report: &FileReport, output: &OutputManager) {
    for diagnostic in report.expansions.iter().flat_map(|expansion| &expansion.diagnostics) {
        output.diagnostic(display, diagnostic);
    }
    if output.is_json() {
        return;
    }

    let types: Vec<&str> = report
        .expansions
        .iter()
        .filter(|expansion| expansion.is_ok())
        .map(|expansion| expansion.type_name.as_str())
        .collect();
    match report.outcome {
        WriteOutcome::Updated => output.success(&format!("Updated {display} ({})", types.join(", "))),
        WriteOutcome::Stale => output.warning(&format!("{display} is out of date")),
        WriteOutcome::Unchanged => output.verbose(&format!("{display} unchanged")),
    }
    for type_name in &report.removed {
        output.bullet(&format!("removed region for {type_name}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{GlobalOptions, OutputFormat};

    fn quiet() -> OutputManager {
        OutputManager::new(GlobalOptions {
            quiet: true,
            output_format: OutputFormat::Compact,
            ..Default::default()
        })
    }

    #[test]
    fn test_generate_then_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Counter.swift");
        std::fs::write(&path, "@Testable\nclass Counter {\n    private var count: Int = 0\n}\n").unwrap();
        let ctx = ProjectContext::find_from(dir.path(), None).unwrap();

        let check = GenerateArgs {
            paths: vec![PathBuf::from(".")],
            check: true,
        };
        let summary = run(&check, &ctx, &quiet()).unwrap();
        assert_eq!(summary.stale, 1);
        assert!(handle_generate(check, &ctx, &quiet()).is_err());

        let write = GenerateArgs {
            paths: vec![PathBuf::from(".")],
            check: false,
        };
        let summary = run(&write, &ctx, &quiet()).unwrap();
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.files[0].types, vec!["Counter".to_owned()]);
        assert!(std::fs::read_to_string(&path).unwrap().contains("// testable:begin Counter"));

        let check = GenerateArgs {
            paths: vec![PathBuf::from(".")],
            check: true,
        };
        assert!(handle_generate(check, &ctx, &quiet()).is_ok());
    }

    #[test]
    fn test_parse_failure_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Broken.swift"), "@Testable\nclass Broken {\n").unwrap();
        let ctx = ProjectContext::find_from(dir.path(), None).unwrap();
        let args = GenerateArgs {
            paths: vec![PathBuf::from(".")],
            check: false,
        };
        let summary = run(&args, &ctx, &quiet()).unwrap();
        assert_eq!(summary.failed, 1);
        assert!(summary.files[0].error.is_some());
    }
}
