use crate::commands::{expand, generate, init, report};

#[derive(Clone, Copy)]
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

#[derive(Clone, Copy)]
pub struct CommandExample {
    pub name: &'static str,
    pub groups: &'static [ExampleGroup],
}

pub fn command_examples() -> &'static [CommandExample] {
    &[
        CommandExample {
            name: "expand",
            groups: expand::EXAMPLES,
        },
        CommandExample {
            name: "report",
            groups: report::EXAMPLES,
        },
        CommandExample {
            name: "generate",
            groups: generate::EXAMPLES,
        },
        CommandExample {
            name: "init",
            groups: init::EXAMPLES,
        },
    ]
}
