use crate::command::{EXIT_FAILURE, EXIT_NOT_EXECUTABLE, EXIT_NOT_FOUND, ExitCode, ParsedCommand};
use crate::env::Environment;
use crate::redirect::open_redirections;
use log::debug;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus, Stdio};

/// A program that is not a builtin, resolved to the file that will be executed.
#[derive(Debug)]
pub(crate) struct ExternalCommand {
    /// The name as typed; becomes `argv[0]` of the new process.
    name: String,
    path: PathBuf,
    args: Vec<String>,
}

impl ExternalCommand {
    /// Resolve `argv[0]` the way [`find_command_path`] does, with relative paths taken
    /// from the interpreter's working directory. Returns `None` for an empty `argv` or
    /// an unknown program.
    pub(crate) fn resolve(argv: &[String], env: &Environment) -> Option<Self> {
        let (name, args) = argv.split_first()?;
        let search_paths = env.get_var("PATH").unwrap_or_default();
        let typed = Path::new(name);
        let candidate = if typed.components().count() > 1 {
            Cow::Owned(env.resolve(typed))
        } else {
            Cow::Borrowed(typed)
        };
        let path = find_command_path(OsStr::new(&search_paths), &candidate)?.into_owned();
        Some(Self {
            name: name.clone(),
            path,
            args: args.to_vec(),
        })
    }

    pub(crate) fn spawn(&self, stdin: Stdio, stdout: Stdio, env: &Environment) -> io::Result<Child> {
        debug!("spawning {:?} as {} {:?}", self.path, self.name, self.args);
        let mut cmd = std::process::Command::new(&self.path);
        cmd.args(&self.args)
            .stdin(stdin)
            .stdout(stdout)
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.arg0(&self.name);
        }
        cmd.spawn()
    }
}

/// Start `argv` with the given standard streams.
///
/// Failures are reported on stderr here; the error value is the status the failed
/// command should count as.
pub(crate) fn launch(
    argv: &[String],
    stdin: Stdio,
    stdout: Stdio,
    env: &Environment,
) -> Result<Child, ExitCode> {
    let name = argv.first().map(String::as_str).unwrap_or_default();
    let Some(command) = ExternalCommand::resolve(argv, env) else {
        eprintln!("minish: command not found: {}", name);
        return Err(EXIT_NOT_FOUND);
    };
    command.spawn(stdin, stdout, env).map_err(|e| {
        eprintln!("minish: {}: {}", name, e);
        match e.kind() {
            io::ErrorKind::NotFound => EXIT_NOT_FOUND,
            io::ErrorKind::PermissionDenied => EXIT_NOT_EXECUTABLE,
            _ => EXIT_FAILURE,
        }
    })
}

/// Block until `child` terminates and translate its status.
pub(crate) fn wait_for(child: &mut Child) -> ExitCode {
    match child.wait() {
        Ok(exit_status) => match exit_status.code() {
            Some(x) => x,
            None => terminated_by_signal(exit_status),
        },
        Err(e) => {
            eprintln!("minish: wait for process {}: {}", child.id(), e);
            EXIT_FAILURE
        }
    }
}

/// Run a single, pipe-free command: bind its redirections, spawn it and wait.
pub(crate) fn run_external(command: &ParsedCommand, env: &Environment) -> ExitCode {
    let bindings = open_redirections(&command.redirects, env);
    let stdin = bindings.stdin.map(Stdio::from).unwrap_or_else(Stdio::inherit);
    let stdout = bindings.stdout.map(Stdio::from).unwrap_or_else(Stdio::inherit);

    let status = match launch(&command.argv, stdin, stdout, env) {
        Ok(mut child) => wait_for(&mut child),
        Err(code) => code,
    };
    debug!("{:?} exited with {}", command.name(), status);
    status
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it names a file.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it names a file.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first executable file found.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

/// The first executable match wins. When a name only exists as non-executable files,
/// the first of them is returned so that the spawn reports the permission error.
fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    let mut first_file = None;
    for dir in std::env::split_paths(search_paths).filter(|dir| !dir.as_os_str().is_empty()) {
        let path = dir.join(cmd);
        if find_by_path(&path).is_none() {
            continue;
        }
        if is_executable(&path) {
            return Some(path);
        }
        first_file.get_or_insert(path);
    }
    first_file
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.is_file() { Some(path) } else { None }
}
