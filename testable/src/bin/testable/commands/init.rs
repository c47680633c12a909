use anyhow::{Context, Result};
use clap::Args;

use testable::{CONFIG_FILE, config::DEFAULT_CONFIG};

use crate::context::ProjectContext;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Project Setup",
    commands: &[
        "testable init            # Write testable.toml with the default settings",
        "testable init --force    # Overwrite an existing testable.toml",
    ],
}];

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

pub fn handle_init(args: InitArgs, ctx: &ProjectContext, output: &OutputManager) -> Result<()> {
    output.heading("Initializing testable");

    let path = ctx.working_dir.join(CONFIG_FILE);
    if path.exists() && !args.force {
        output.warning(&format!("{CONFIG_FILE} already exists"));
        output.info("Use --force to overwrite it.");
        return Ok(());
    }

    std::fs::write(&path, DEFAULT_CONFIG).with_context(|| format!("Failed to write {}", path.display()))?;
    output.success(&format!("Created {CONFIG_FILE}"));
    output.key_value("Location", &path.display().to_string());
    output.info("Annotate types with @Testable, then run 'testable generate'.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::GlobalOptions;
    use testable::TestableConfig;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ProjectContext::find_from(dir.path(), None).unwrap();
        let output = OutputManager::new(GlobalOptions {
            quiet: true,
            ..Default::default()
        });

        handle_init(InitArgs { force: false }, &ctx, &output).unwrap();
        let path = dir.path().join(CONFIG_FILE);
        assert!(TestableConfig::load(&path).is_ok());

        std::fs::write(&path, "# custom\n").unwrap();
        handle_init(InitArgs { force: false }, &ctx, &output).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# custom\n");

        handle_init(InitArgs { force: true }, &ctx, &output).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }
}
