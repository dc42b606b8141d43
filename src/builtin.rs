use crate::command::{CommandFactory, EXIT_FAILURE, EXIT_SUCCESS, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::{Context, Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Names the command answers to, e.g. `["cd"]`.
    fn names() -> &'static [&'static str];

    /// Executes the command, writing any output to `stdout`.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        match T::execute(*self, stdout, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                eprintln!("minish: {:#}", e);
                Ok(EXIT_FAILURE)
            }
        }
    }
}

/// Usage text or a usage error produced by `argh` instead of a command.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        if self.is_error {
            eprintln!("{}", usage_error(&self.output));
            Ok(EXIT_FAILURE)
        } else {
            writeln!(stdout, "{}", self.output.trim_end())?;
            Ok(EXIT_SUCCESS)
        }
    }
}

fn usage_error(output: &str) -> String {
    format!("minish: {}", output.trim_end())
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if T::names().contains(&name) {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// With no target, or with `~`, changes to the directory named by HOME.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn names() -> &'static [&'static str] {
        &["cd"]
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = match self.target.as_deref() {
            None | Some("") | Some("~") => env.home_dir().ok_or_else(|| anyhow!("cd: HOME not set"))?,
            Some(t) => PathBuf::from(t),
        };

        let new_dir = env.resolve(target);
        let canonical =
            fs::canonicalize(&new_dir).with_context(|| format!("cd: {}", new_dir.display()))?;
        if !canonical.is_dir() {
            return Err(anyhow!("cd: {}: not a directory", new_dir.display()));
        }

        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(EXIT_SUCCESS)
    }
}

#[derive(FromArgs)]
/// Print the lines entered in this session, oldest first.
pub struct History {}

impl BuiltinCommand for History {
    fn names() -> &'static [&'static str] {
        &["history"]
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        for entry in env.history.render_all() {
            writeln!(stdout, "{}: {}", entry.index, entry.text)?;
        }
        Ok(EXIT_SUCCESS)
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; the shell always exits with status 0.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn names() -> &'static [&'static str] {
        &["exit", "quit"]
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run<T: BuiltinCommand + 'static>(
        name: &str,
        args: &[&str],
        env: &mut Environment,
    ) -> (ExitCode, String) {
        let cmd = Factory::<T>::default()
            .try_create(name, args)
            .expect("factory should recognize its own name");
        let mut out = Vec::new();
        let code = cmd.execute(&mut out, env).unwrap();
        (code, String::from_utf8(out).expect("utf8"))
    }

    #[test]
    fn factory_ignores_other_names() {
        assert!(Factory::<Cd>::default().try_create("ls", &[]).is_none());
        assert!(Factory::<Exit>::default().try_create("exit", &[]).is_some());
        assert!(Factory::<Exit>::default().try_create("quit", &[]).is_some());
    }

    #[test]
    fn history_lists_numbered_entries() {
        let mut env = Environment::new(100);
        env.history.append("ls -l");
        env.history.append("history");

        let (code, out) = run::<History>("history", &[], &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, "1: ls -l\n2: history\n");
    }

    #[test]
    fn history_rejects_arguments() {
        let mut env = Environment::new(100);
        let (code, out) = run::<History>("history", &["extra"], &mut env);
        assert_eq!(code, EXIT_FAILURE);
        assert!(out.is_empty());
    }

    #[test]
    fn usage_errors_carry_the_shell_prefix() {
        let err = match History::from_args(&["history"], &["extra"]) {
            Ok(_) => panic!("history takes no arguments"),
            Err(e) => e,
        };
        assert!(err.status.is_err());
        let message = usage_error(&err.output);
        assert!(message.starts_with("minish: "));
        assert!(message.contains("extra"));
        assert!(!message.ends_with('\n'));
    }

    #[test]
    fn exit_and_quit_set_the_exit_flag() {
        for name in ["exit", "quit"] {
            let mut env = Environment::new(10);
            let (code, _) = run::<Exit>(name, &[], &mut env);
            assert_eq!(code, 0);
            assert!(env.should_exit);
        }
    }

    // All directory changes live in one test: the process working directory is shared
    // by every test thread. Only directories that outlive the test are visited.
    #[test]
    #[cfg(unix)]
    fn cd_moves_home_to_paths_and_reports_failures() {
        let cwd_before = env::current_dir().expect("cwd");
        let home = fs::canonicalize(env::temp_dir()).expect("temp dir");
        let mut env = Environment::new(10);
        env.set_var("HOME", home.to_string_lossy());

        let (code, _) = run::<Cd>("cd", &["/"], &mut env);
        assert_eq!(code, 0);
        assert_eq!(env.current_dir, PathBuf::from("/"));

        let (code, _) = run::<Cd>("cd", &[], &mut env);
        assert_eq!(code, 0);
        assert_eq!(env.current_dir, home);

        run::<Cd>("cd", &["/"], &mut env);
        let (code, _) = run::<Cd>("cd", &["~"], &mut env);
        assert_eq!(code, 0);
        assert_eq!(env.current_dir, home);

        let (code, _) = run::<Cd>("cd", &["/nonexistent-dir-4711"], &mut env);
        assert_eq!(code, EXIT_FAILURE);
        assert_eq!(env.current_dir, home);

        let (code, _) = run::<Cd>("cd", &["/bin/sh"], &mut env);
        assert_eq!(code, EXIT_FAILURE);
        assert_eq!(env.current_dir, home);

        env::set_current_dir(&cwd_before).ok();
    }
}
