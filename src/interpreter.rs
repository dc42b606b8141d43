use crate::command::{
    CommandFactory, EXIT_FAILURE, EXIT_SUCCESS, EXIT_SYNTAX_ERROR, ExecutableCommand, ExitCode,
    ParsedCommand,
};
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::external::run_external;
use crate::lexer::tokenize;
use crate::parser::{SequenceStep, parse_sequence};
use crate::pipeline::{PIPE_OPERATOR, run_pipeline};
use crate::redirect::open_redirections;
use log::debug;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the builtins defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal shell-like interpreter for built-in and external commands.
///
/// The interpreter owns an [`Environment`] (working directory, variables, history) and
/// a list of [`CommandFactory`] objects that are asked, in order, whether they know a
/// command name. Names no factory claims are run as programs found on `PATH`.
///
/// Example
/// ```no_run
/// use minish::Interpreter;
/// let mut sh = Interpreter::default();
/// let code = sh.execute_line("true && echo hello | tr a-z A-Z");
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    env: Environment,
    config: ShellConfig,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of builtin factories.
    pub fn new(config: ShellConfig, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(config.history_capacity),
            config,
            commands,
        }
    }

    /// Create an interpreter with the default builtins: `cd`, `history`, `exit` and `quit`.
    pub fn with_config(config: ShellConfig) -> Self {
        use crate::builtin::*;
        Self::new(
            config,
            vec![
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<History>::default()),
                Box::new(Factory::<Exit>::default()),
            ],
        )
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Whether `exit` or `quit` has run.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Record `line` in the history and run it to completion.
    ///
    /// Returns the status of the last command that ran. Failures are reported on stderr
    /// and reflected in the status; none of them ends the session.
    pub fn execute_line(&mut self, line: &str) -> ExitCode {
        self.execute_line_with_output(line, &mut io::stdout())
    }

    fn execute_line_with_output(&mut self, line: &str, out: &mut dyn Write) -> ExitCode {
        // Blank and whitespace-only lines are neither recorded nor run.
        if line.trim().is_empty() {
            return EXIT_SUCCESS;
        }
        self.env.history.append(line);

        match parse_sequence(line) {
            Ok(steps) => self.run_sequence(&steps, out),
            Err(e) => {
                eprintln!("minish: {}", e);
                EXIT_SYNTAX_ERROR
            }
        }
    }

    /// Run clauses one after another. A `&&` clause runs only while its chain is intact;
    /// a new statement starts a new chain.
    fn run_sequence(&mut self, steps: &[SequenceStep], out: &mut dyn Write) -> ExitCode {
        let mut status = EXIT_SUCCESS;
        let mut chain_ok = true;

        for step in steps {
            if self.env.should_exit {
                debug!("exit requested, dropping the rest of the line");
                break;
            }
            match step {
                SequenceStep::AndThen(text) if !chain_ok => {
                    debug!("skipping `{}` after a failure", text);
                }
                _ => {
                    status = self.run_clause(step.text(), out);
                    chain_ok = status == EXIT_SUCCESS;
                }
            }
        }

        status
    }

    fn run_clause(&mut self, text: &str, out: &mut dyn Write) -> ExitCode {
        let tokens = tokenize(text, self.config.max_tokens);
        self.dispatch(tokens, out)
    }

    /// Run one clause: a pipeline, a builtin, or a single external program.
    fn dispatch(&mut self, tokens: Vec<String>, out: &mut dyn Write) -> ExitCode {
        if tokens.is_empty() {
            return EXIT_SUCCESS;
        }
        if tokens.iter().any(|token| token == PIPE_OPERATOR) {
            debug!("dispatching pipeline {:?}", tokens);
            return run_pipeline(tokens, &self.env);
        }

        let command = crate::redirect::parse_redirections(tokens);
        let Some(name) = command.name() else {
            // Only redirections: the files are still created or truncated.
            drop(open_redirections(&command.redirects, &self.env));
            return EXIT_SUCCESS;
        };

        if let Some(builtin) = self.find_builtin(name, command.args()) {
            debug!("dispatching builtin {}", name);
            return self.run_builtin(builtin, &command, out);
        }
        debug!("dispatching external {:?}", command.argv);
        run_external(&command, &self.env)
    }

    fn find_builtin(&self, name: &str, args: &[String]) -> Option<Box<dyn ExecutableCommand>> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.commands
            .iter()
            .find_map(|factory| factory.try_create(name, &args))
    }

    /// Builtins run in this process, so only their output can be redirected; it goes to
    /// the bound file instead of `out`.
    fn run_builtin(
        &mut self,
        builtin: Box<dyn ExecutableCommand>,
        command: &ParsedCommand,
        out: &mut dyn Write,
    ) -> ExitCode {
        let bindings = open_redirections(&command.redirects, &self.env);
        let result = match bindings.stdout {
            Some(mut file) => builtin.execute(&mut file, &mut self.env),
            None => builtin
                .execute(out, &mut self.env)
                .and_then(|code| out.flush().map(|_| code).map_err(Into::into)),
        };
        result.unwrap_or_else(|e| {
            eprintln!("minish: {}: {:#}", command.name().unwrap_or_default(), e);
            EXIT_FAILURE
        })
    }

    /// Read-Eval-Print Loop over a `rustyline` editor.
    ///
    /// Ctrl-C at the prompt discards the line being typed; end of input or `exit`/`quit`
    /// ends the loop with status 0.
    pub fn repl(&mut self) -> rustyline::Result<ExitCode> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline(&self.config.prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    let status = self.execute_line(&line);
                    debug!("line status {}", status);
                    if self.should_exit() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    debug!("interrupted at the prompt");
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(EXIT_SUCCESS)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::with_config(ShellConfig::default())
    }
}

/// Response to an interrupt while a command runs: move to a fresh line and show the
/// prompt again. The running command keeps its own signal disposition.
pub fn redraw_prompt(prompt: &str) {
    let mut stdout = io::stdout();
    if write!(stdout, "\n{}", prompt).and_then(|_| stdout.flush()).is_err() {
        debug!("could not redraw the prompt");
    }
}
