mod commands;
mod context;
mod examples;
mod output;
mod theme;

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{
    ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Color as ClapColor, RgbColor, Style},
    },
};
use colored::{Color as ThemeColor, Colorize, control::ShouldColorize};

use commands::{
    expand::{ExpandArgs, handle_expand},
    generate::{GenerateArgs, handle_generate},
    init::{InitArgs, handle_init},
    report::{ReportArgs, handle_report},
};
use context::ProjectContext;
use examples::{ExampleGroup, command_examples};
use output::{GlobalOptions, OutputFormat, OutputManager};
use theme::{ICONS, THEME};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("TESTABLE_CONFIG", "Configuration file used when --config is not given"),
    ("RUST_LOG", "Log filter for internal diagnostics (e.g. testable=debug)"),
    ("NO_COLOR", "Disable colored output"),
];

#[derive(Parser)]
#[command(name = "testable")]
#[command(version)]
#[command(
    about = "Test-hook generator for @Testable Swift types",
    long_about = r#"Generates debug-only test hooks for Swift types annotated with @Testable:

• Private members are forwarded through a `testHooks` proxy
• Generated code lives next to the type, between marker comments
• Everything is wrapped in `#if DEBUG`, so release builds are unaffected

Commands:
  expand    Print the extension generated for a file
  report    Show how members of @Testable types are classified
  generate  Update generated regions in place
  init      Write a testable.toml with the default settings
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file to use instead of the closest testable.toml
    #[arg(long, value_name = "PATH", env = "TESTABLE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn parse_with_styles() -> Self {
        let matches = build_cli_command()
            .styles(help_styles())
            .try_get_matches()
            .and_then(|matches| Cli::from_arg_matches(&matches));
        matches.unwrap_or_else(|err| err.exit())
    }
}

fn build_cli_command() -> Command {
    let use_color = detect_color_support();
    let appendix = render_top_level_appendix(use_color);
    let mut command = Cli::command().after_long_help(appendix);
    command = command.color(if use_color { ColorChoice::Auto } else { ColorChoice::Never });
    attach_command_examples(&mut command, use_color);
    command
}

fn attach_command_examples(command: &mut Command, use_color: bool) {
    for example in command_examples() {
        if let Some(subcommand) = command.find_subcommand_mut(example.name) {
            let help_text = render_examples(example.groups, use_color);
            *subcommand = subcommand.clone().after_long_help(help_text);
        }
    }
}

fn render_examples(groups: &[ExampleGroup], use_color: bool) -> String {
    let theme = &THEME;
    let mut buffer = String::new();

    let heading = stylize("Examples:", theme.highlight, true, use_color);
    let _ = writeln!(buffer, "{heading}");

    for (index, group) in groups.iter().enumerate() {
        let title = stylize(group.title, theme.primary, true, use_color);
        let _ = writeln!(buffer, "  {title}");

        for command in group.commands {
            let arrow = stylize(ICONS.arrow, theme.secondary, false, use_color);
            let command_text = stylize(command, theme.secondary, false, use_color);
            let _ = writeln!(buffer, "    {arrow} {command_text}");
        }

        if index + 1 < groups.len() {
            buffer.push('\n');
        }
    }

    buffer
}

fn render_top_level_appendix(use_color: bool) -> String {
    let theme = &THEME;
    let mut buffer = String::new();

    let env_heading = stylize("Environment Variables:", theme.highlight, true, use_color);
    let _ = writeln!(buffer, "{env_heading}");
    for (key, description) in ENVIRONMENT_VARIABLES {
        let key_text = stylize(key, theme.key, true, use_color);
        let value_text = stylize(description, theme.value, false, use_color);
        let _ = writeln!(buffer, "  {key_text}  {value_text}");
    }

    buffer.push('\n');

    let tip_heading = stylize("Tip:", theme.highlight, true, use_color);
    let tip_text = stylize(
        "Use 'testable <command> --help' to view examples for each command.",
        theme.secondary,
        false,
        use_color,
    );
    let _ = writeln!(buffer, "{tip_heading} {tip_text}");

    buffer
}

fn stylize(text: &str, color: ThemeColor, bold: bool, use_color: bool) -> String {
    if !use_color {
        return text.to_string();
    }
    let styled = text.color(color);
    if bold { styled.bold().to_string() } else { styled.to_string() }
}

fn detect_color_support() -> bool {
    ShouldColorize::from_env().should_colorize()
}

fn help_styles() -> Styles {
    let theme = &THEME;
    Styles::styled()
        .usage(style_from_color(theme.primary).bold())
        .header(style_from_color(theme.highlight).bold())
        .literal(style_from_color(theme.secondary))
        .placeholder(style_from_color(theme.muted))
        .valid(style_from_color(theme.success))
        .invalid(style_from_color(theme.warning))
        .error(style_from_color(theme.error).bold())
}

fn style_from_color(color: ThemeColor) -> Style {
    Style::new().fg_color(Some(color_to_clap_color(color)))
}

fn color_to_clap_color(color: ThemeColor) -> ClapColor {
    match color {
        ThemeColor::Black => ClapColor::Ansi(AnsiColor::Black),
        ThemeColor::Red => ClapColor::Ansi(AnsiColor::Red),
        ThemeColor::Green => ClapColor::Ansi(AnsiColor::Green),
        ThemeColor::Yellow => ClapColor::Ansi(AnsiColor::Yellow),
        ThemeColor::Blue => ClapColor::Ansi(AnsiColor::Blue),
        ThemeColor::Magenta => ClapColor::Ansi(AnsiColor::Magenta),
        ThemeColor::Cyan => ClapColor::Ansi(AnsiColor::Cyan),
        ThemeColor::White => ClapColor::Ansi(AnsiColor::White),
        ThemeColor::BrightBlack => ClapColor::Ansi(AnsiColor::BrightBlack),
        ThemeColor::BrightRed => ClapColor::Ansi(AnsiColor::BrightRed),
        ThemeColor::BrightGreen => ClapColor::Ansi(AnsiColor::BrightGreen),
        ThemeColor::BrightYellow => ClapColor::Ansi(AnsiColor::BrightYellow),
        ThemeColor::BrightBlue => ClapColor::Ansi(AnsiColor::BrightBlue),
        ThemeColor::BrightMagenta => ClapColor::Ansi(AnsiColor::BrightMagenta),
        ThemeColor::BrightCyan => ClapColor::Ansi(AnsiColor::BrightCyan),
        ThemeColor::BrightWhite => ClapColor::Ansi(AnsiColor::BrightWhite),
        ThemeColor::TrueColor { r, g, b } => ClapColor::Rgb(RgbColor(r, g, b)),
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the test-hook extensions generated for a Swift file
    Expand(ExpandArgs),

    /// Show how the members of @Testable types are classified
    Report(ReportArgs),

    /// Update generated test-hook regions in Swift sources
    Generate(GenerateArgs),

    /// Create a testable.toml in the current directory
    Init(InitArgs),
}

fn main() {
    env_logger::init();

    let cli = Cli::parse_with_styles();
    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(err) = execute(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<()> {
    let global_options = GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    };
    let output = OutputManager::new(global_options);

    let ctx = ProjectContext::find(cli.config.as_deref())?;
    match &ctx.config_path {
        Some(path) => output.verbose(&format!("Using configuration {}", ctx.display_path(path))),
        None => output.verbose("No testable.toml found, using defaults"),
    }

    match cli.command {
        Commands::Expand(args) => handle_expand(args, &ctx, &output),
        Commands::Report(args) => handle_report(args, &ctx, &output),
        Commands::Generate(args) => handle_generate(args, &ctx, &output),
        Commands::Init(args) => handle_init(args, &ctx, &output),
    }
}
