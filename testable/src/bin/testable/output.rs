use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color as TableColor, Table};
use serde::Serialize;

use testable::{Diagnostic, Severity};

use crate::theme::{ICONS, THEME};

/// Output format options for CLI commands
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for scripting
    Json,
    /// Compact single-line output
    Compact,
}

/// Global CLI options that affect output and behavior
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// Trait for data that can be displayed as a table
pub trait TableDisplay {
    fn to_table(&self, options: &GlobalOptions) -> Table;
    fn to_compact(&self) -> String;
}

/// Output manager handles formatting and display
pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    pub fn is_json(&self) -> bool {
        self.options.output_format == OutputFormat::Json
    }

    /// Display data according to the configured output format
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }

        match self.options.output_format {
            OutputFormat::Json => self.json(data)?,
            OutputFormat::Table => {
                let table = data.to_table(&self.options);
                println!("{table}");
            }
            OutputFormat::Compact => {
                println!("{}", data.to_compact());
            }
        }
        Ok(())
    }

    /// Print data as pretty JSON regardless of the output format
    pub fn json<T: Serialize>(&self, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        println!("{json}");
        Ok(())
    }

    /// Display a success message with color and icon
    pub fn success(&self, message: &str) {
        self.line(ICONS.success, message, THEME.success);
    }

    /// Display an error message with color and icon
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.styled(ICONS.error, message, THEME.error));
    }

    /// Display a warning message
    pub fn warning(&self, message: &str) {
        self.line(ICONS.warning, message, THEME.warning);
    }

    /// Display info message with color and icon
    pub fn info(&self, message: &str) {
        self.line(ICONS.info, message, THEME.info);
    }

    /// Display verbose information (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.options.verbose && !self.options.quiet {
            eprintln!("{}", self.styled(ICONS.arrow, message, THEME.muted));
        }
    }

    /// Display a heading
    pub fn heading(&self, text: &str) {
        if !self.options.quiet {
            let output = if self.options.no_color {
                format!("\n{text}\n{}", "=".repeat(text.len()))
            } else {
                format!("\n{}", text.color(THEME.primary).bold())
            };
            println!("{output}");
        }
    }

    /// Display a key-value pair
    pub fn key_value(&self, key: &str, value: &str) {
        if !self.options.quiet {
            let output = if self.options.no_color {
                format!("{key}: {value}")
            } else {
                format!("{}: {}", key.color(THEME.key).bold(), value.color(THEME.value))
            };
            println!("{output}");
        }
    }

    /// Display a bullet list item
    pub fn bullet(&self, text: &str) {
        if !self.options.quiet {
            let output = if self.options.no_color {
                format!("  {} {text}", ICONS.bullet)
            } else {
                format!("  {} {text}", ICONS.bullet.color(THEME.muted))
            };
            println!("{output}");
        }
    }

    /// Report a diagnostic on stderr as `file:line:column: severity: message`.
    ///
    /// Notes are shown only in verbose mode; errors are never suppressed.
    pub fn diagnostic(&self, file: &str, diagnostic: &Diagnostic) {
        let (icon, color) = match diagnostic.severity {
            Severity::Error => (ICONS.error, THEME.error),
            Severity::Warning => {
                if self.options.quiet {
                    return;
                }
                (ICONS.warning, THEME.warning)
            }
            Severity::Note => {
                if !self.options.verbose || self.options.quiet {
                    return;
                }
                (ICONS.note, THEME.muted)
            }
        };
        eprintln!("{}", self.styled(icon, &format!("{file}:{diagnostic}"), color));
    }

    fn line(&self, icon: &str, message: &str, color: colored::Color) {
        if !self.options.quiet {
            println!("{}", self.styled(icon, message, color));
        }
    }

    fn styled(&self, icon: &str, message: &str, color: colored::Color) -> String {
        if self.options.no_color {
            format!("{icon} {message}")
        } else {
            format!("{} {}", icon.color(color), message.color(color))
        }
    }
}

/// Table with the preset matching the color settings
pub fn themed_table(options: &GlobalOptions) -> Table {
    let mut table = Table::new();
    if options.no_color {
        table.load_preset(comfy_table::presets::ASCII_FULL);
    } else {
        table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
    }
    table
}

/// Add themed header to table
pub fn add_table_header(table: &mut Table, options: &GlobalOptions, headers: &[&str]) {
    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| {
            let cell = Cell::new(h).add_attribute(Attribute::Bold);
            if options.no_color { cell } else { cell.fg(TableColor::Cyan) }
        })
        .collect();
    table.set_header(header_cells);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    impl TableDisplay for TestData {
        fn to_table(&self, options: &GlobalOptions) -> Table {
            let mut table = themed_table(options);
            add_table_header(&mut table, options, &["Name", "Value"]);
            table.add_row(vec![Cell::new(&self.name), Cell::new(self.value.to_string())]);
            table
        }

        fn to_compact(&self) -> String {
            format!("{}={}", self.name, self.value)
        }
    }

    fn data() -> TestData {
        TestData {
            name: "test".to_string(),
            value: 42,
        }
    }

    #[test]
    fn test_output_manager_json() {
        let options = GlobalOptions {
            output_format: OutputFormat::Json,
            ..Default::default()
        };
        let manager = OutputManager::new(options);
        assert!(manager.is_json());
        assert!(manager.display(&data()).is_ok());
    }

    #[test]
    fn test_output_manager_quiet() {
        let options = GlobalOptions {
            quiet: true,
            ..Default::default()
        };
        let manager = OutputManager::new(options);
        assert!(manager.display(&data()).is_ok());
    }

    #[test]
    fn test_table_rendering_without_color() {
        let options = GlobalOptions {
            no_color: true,
            ..Default::default()
        };
        let rendered = data().to_table(&options).to_string();
        assert!(rendered.contains("Name"));
        assert!(rendered.contains("42"));
    }
}
