use crate::env::Environment;
use anyhow::Result;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells.
pub type ExitCode = i32;

pub const EXIT_SUCCESS: ExitCode = 0;
pub const EXIT_FAILURE: ExitCode = 1;
/// Status of a line rejected before anything ran.
pub const EXIT_SYNTAX_ERROR: ExitCode = 2;
/// The program was found but could not be executed.
pub const EXIT_NOT_EXECUTABLE: ExitCode = 126;
pub const EXIT_NOT_FOUND: ExitCode = 127;

/// Kind of redirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// `<`: standard input is read from the file.
    Input,
    /// `>`: standard output is written to the file, truncating it first.
    Output,
    /// `>>`: standard output is appended to the file.
    Append,
}

impl RedirectKind {
    /// Recognize a redirection operator token.
    pub fn from_operator(token: &str) -> Option<Self> {
        match token {
            "<" => Some(RedirectKind::Input),
            ">" => Some(RedirectKind::Output),
            ">>" => Some(RedirectKind::Append),
            _ => None,
        }
    }

    pub fn is_input(self) -> bool {
        self == RedirectKind::Input
    }
}

/// One `<`, `>` or `>>` operator together with its file operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectionSpec {
    pub kind: RedirectKind,
    pub target: String,
}

/// One invocable unit: program name, its arguments, and the redirections that were
/// extracted from the original token list, in the order they appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    pub argv: Vec<String>,
    pub redirects: Vec<RedirectionSpec>,
}

impl ParsedCommand {
    /// The program or built-in name, if the command has any words left.
    pub fn name(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }
}

/// Object-safe trait for a command that runs inside the interpreter process.
pub trait ExecutableCommand {
    /// Executes the command, writing its output to `stdout`.
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}
