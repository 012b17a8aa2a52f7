//! Argument-vector construction for the external tool.

use crate::model::Step;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;

/// A program plus its arguments, handed to the OS without a shell in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl ToolCommand {
    fn new(program: &str, step: Step) -> Self {
        Self {
            program: program.to_string(),
            args: vec![step.as_subcommand().into()],
        }
    }

    fn flag(mut self, name: &str, value: impl Into<OsString>) -> Self {
        self.args.push(name.into());
        self.args.push(value.into());
        self
    }

    /// `<tool> train --method <method> --data <data> --output <out_dir>`
    pub fn train(tool: &str, method: &str, data: &Path, out_dir: &Path) -> Self {
        Self::new(tool, Step::Train)
            .flag("--method", method)
            .flag("--data", data)
            .flag("--output", out_dir)
    }

    /// `<tool> render --checkpoint <checkpoint> --trajectory <trajectory>`
    pub fn render(tool: &str, checkpoint: &Path, trajectory: &Path) -> Self {
        Self::new(tool, Step::Render)
            .flag("--checkpoint", checkpoint)
            .flag("--trajectory", trajectory)
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '\'') {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}
