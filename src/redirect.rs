//! File redirections: `< file`, `> file` and `>> file`.
//!
//! Resolution happens in two steps. [`parse_redirections`] is pure and separates the
//! operator/file pairs from the program's own arguments. [`open_redirections`] then
//! opens the files and yields the handles a spawned program should use as its standard
//! input and output. The interpreter's own streams are never touched; handles are
//! handed to the child at spawn time.

use crate::command::{ParsedCommand, RedirectKind, RedirectionSpec};
use crate::env::Environment;
use anyhow::{Context, Result};
use log::debug;
use std::fs::{File, OpenOptions};

/// Permission bits for files created by `>` and `>>`, before the umask.
pub const CREATE_MODE: u32 = 0o644;

/// Split redirection operators and their file operands out of `tokens`.
///
/// The remaining words keep their relative order. An operator that is the last word
/// has nothing to apply to and is dropped without a trace.
pub fn parse_redirections(tokens: Vec<String>) -> ParsedCommand {
    let mut command = ParsedCommand::default();
    let mut tokens = tokens.into_iter();

    while let Some(token) = tokens.next() {
        match RedirectKind::from_operator(&token) {
            Some(kind) => match tokens.next() {
                Some(target) => command.redirects.push(RedirectionSpec { kind, target }),
                None => debug!("`{}` without a file name ignored", token),
            },
            None => command.argv.push(token),
        }
    }

    command
}

/// Files to bind to a program's standard streams. `None` keeps the default binding.
#[derive(Debug, Default)]
pub struct StreamBindings {
    pub stdin: Option<File>,
    pub stdout: Option<File>,
}

/// Open every redirection target in order.
///
/// A later redirection of the same direction replaces the earlier handle, but the earlier
/// file has still been opened, so `> a > b` creates (and truncates) both. A target that
/// cannot be opened is reported on stderr and skipped; the bindings established so far
/// are kept.
pub fn open_redirections(redirects: &[RedirectionSpec], env: &Environment) -> StreamBindings {
    let mut bindings = StreamBindings::default();

    for redirect in redirects {
        match open_target(redirect, env) {
            Ok(file) if redirect.kind.is_input() => bindings.stdin = Some(file),
            Ok(file) => bindings.stdout = Some(file),
            Err(e) => eprintln!("minish: {:#}", e),
        }
    }

    bindings
}

fn open_target(redirect: &RedirectionSpec, env: &Environment) -> Result<File> {
    let path = env.resolve(&redirect.target);
    let mut options = OpenOptions::new();
    match redirect.kind {
        RedirectKind::Input => {
            options.read(true);
        }
        RedirectKind::Output => {
            options.write(true).create(true).truncate(true);
        }
        RedirectKind::Append => {
            options.append(true).create(true);
        }
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(CREATE_MODE);
    }

    debug!("opening {:?} for {:?}", path, redirect.kind);
    options
        .open(&path)
        .with_context(|| format!("cannot open {}", redirect.target))
}
