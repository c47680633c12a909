use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Table};
use serde::Serialize;

use testable::{SkipReason, Skipped, TestableMacro, discover_sources, parse_source, scan};

use crate::context::ProjectContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, add_table_header, themed_table};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Classification Report",
        commands: &[
            "testable report                   # Summarize every @Testable type under the current directory",
            "testable report Sources/App       # Only types under Sources/App",
            "testable -v report                # Also list skipped members",
        ],
    },
    ExampleGroup {
        title: "Scripting",
        commands: &["testable --output json report   # Full classification as JSON"],
    },
];

#[derive(Args)]
pub struct ReportArgs {
    /// Files or directories to scan
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct TypeReport {
    pub file: String,
    pub type_name: String,
    pub instance_properties: Vec<String>,
    pub instance_functions: Vec<String>,
    pub static_properties: Vec<String>,
    pub static_functions: Vec<String>,
    pub skipped: Vec<Skipped>,
}

#[derive(Debug, Default, Serialize)]
pub struct ClassificationReport {
    pub types: Vec<TypeReport>,
    /// Files that failed to parse, with the reason.
    pub failures: Vec<(String, String)>,
}

impl ClassificationReport {
    fn forwarded(&self) -> usize {
        self.types
            .iter()
            .map(|report| {
                report.instance_properties.len()
                    + report.instance_functions.len()
                    + report.static_properties.len()
                    + report.static_functions.len()
            })
            .sum()
    }
}

impl TableDisplay for ClassificationReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options);
        add_table_header(
            &mut table,
            options,
            &["File", "Type", "Properties", "Functions", "Static Properties", "Static Functions", "Skipped"],
        );
        for report in &self.types {
            table.add_row(vec![
                Cell::new(&report.file),
                Cell::new(&report.type_name),
                Cell::new(report.instance_properties.len()),
                Cell::new(report.instance_functions.len()),
                Cell::new(report.static_properties.len()),
                Cell::new(report.static_functions.len()),
                Cell::new(report.skipped.len()),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.types
            .iter()
            .map(|report| {
                format!(
                    "{}:{} props={} funcs={} static_props={} static_funcs={} skipped={}",
                    report.file,
                    report.type_name,
                    report.instance_properties.len(),
                    report.instance_functions.len(),
                    report.static_properties.len(),
                    report.static_functions.len(),
                    report.skipped.len(),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn handle_report(args: ReportArgs, ctx: &ProjectContext, output: &OutputManager) -> Result<()> {
    let report = build_report(&args.paths, ctx)?;

    if report.types.is_empty() && report.failures.is_empty() {
        output.warning("No @Testable types found");
        return Ok(());
    }

    for (file, reason) in &report.failures {
        output.warning(&format!("Failed to parse {file}: {reason}"));
    }

    output.display(&report)?;

    if !output.is_json() {
        for type_report in &report.types {
            for skipped in &type_report.skipped {
                output.verbose(&format!(
                    "{}:{}: {} skipped ({})",
                    type_report.file,
                    skipped.position,
                    skipped.description,
                    skip_reason(skipped.reason),
                ));
            }
        }
        output.info(&format!(
            "{} type(s), {} forwarded member(s)",
            report.types.len(),
            report.forwarded()
        ));
    }
    Ok(())
}

fn build_report(paths: &[PathBuf], ctx: &ProjectContext) -> Result<ClassificationReport> {
    let exclude = ctx.config.exclude_patterns()?;
    let rules = ctx.config.expansion.scan_rules();
    let mut report = ClassificationReport::default();

    for root in paths {
        let root = ctx.working_dir.join(root);
        for file in discover_sources(&root, &exclude)? {
            let display = ctx.display_path(&file.path);
            let source = std::fs::read_to_string(&file.path)
                .with_context(|| format!("Failed to read {display}"))?;
            let parsed = match parse_source(&source) {
                Ok(parsed) => parsed,
                Err(err) => {
                    report.failures.push((display, err.to_string()));
                    continue;
                }
            };

            for declaration in parsed.annotated(TestableMacro::ATTRIBUTE) {
                let outcome = scan(&declaration.members, &rules);
                let classification = outcome.classification;
                report.types.push(TypeReport {
                    file: display.clone(),
                    type_name: declaration.name.clone(),
                    instance_properties: names(&classification.instance_properties, |p| &p.name),
                    instance_functions: names(&classification.instance_functions, |f| &f.name),
                    static_properties: names(&classification.static_properties, |p| &p.name),
                    static_functions: names(&classification.static_functions, |f| &f.name),
                    skipped: outcome.skipped,
                });
            }
        }
    }
    Ok(report)
}

fn skip_reason(reason: SkipReason) -> String {
    match reason {
        SkipReason::NotQualifying => "no qualifying modifier".to_owned(),
        SkipReason::Unsupported(kind) => format!("unsupported {kind}"),
    }
}

fn names<T>(items: &[&T], name: impl Fn(&T) -> &String) -> Vec<String> {
    items.iter().map(|item| name(item).clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_members() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Wallet.swift"),
            "@Testable\nstruct Wallet {\n    private var balance: Int = 0\n    private static func reset() {}\n    var owner: String = \"\"\n}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("Broken.swift"), "@Testable\nclass Broken {\n").unwrap();

        let ctx = ProjectContext::find_from(dir.path(), None).unwrap();
        let report = build_report(&[PathBuf::from(".")], &ctx).unwrap();

        assert_eq!(report.types.len(), 1);
        let wallet = &report.types[0];
        assert_eq!(wallet.type_name, "Wallet");
        assert_eq!(wallet.instance_properties, vec!["balance".to_owned()]);
        assert_eq!(wallet.static_functions, vec!["reset".to_owned()]);
        assert_eq!(wallet.skipped.len(), 1);
        assert_eq!(report.forwarded(), 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.to_compact().contains("Wallet.swift:Wallet props=1"));
    }
}
