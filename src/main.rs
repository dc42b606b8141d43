use argh::FromArgs;
use log::debug;
use minish::config::{DEFAULT_PROMPT, ShellConfig};
use minish::{Interpreter, history, lexer, redraw_prompt};
use std::process;

#[derive(FromArgs)]
/// A small interactive shell with `;` sequences, `&&` chains, pipelines and redirections.
struct Args {
    #[argh(option, short = 'c')]
    /// run this line, then exit with its status instead of starting the prompt
    command: Option<String>,

    #[argh(option, default = "String::from(DEFAULT_PROMPT)")]
    /// text shown before each line
    prompt: String,

    #[argh(option, default = "history::DEFAULT_CAPACITY")]
    /// number of lines remembered by `history`
    history_size: usize,

    #[argh(option, default = "lexer::DEFAULT_MAX_TOKENS")]
    /// words kept per command; later words are dropped
    max_tokens: usize,
}

impl From<Args> for ShellConfig {
    fn from(args: Args) -> Self {
        Self {
            prompt: args.prompt,
            history_capacity: args.history_size,
            max_tokens: args.max_tokens,
        }
    }
}

fn main() {
    env_logger::init();
    let mut args: Args = argh::from_env();
    let one_shot = args.command.take();
    let mut shell = Interpreter::with_config(args.into());

    if let Some(line) = one_shot {
        process::exit(shell.execute_line(&line));
    }

    let prompt = shell.config().prompt.clone();
    if let Err(e) = ctrlc::set_handler(move || redraw_prompt(&prompt)) {
        eprintln!("minish: cannot handle interrupts: {}", e);
    }

    match shell.repl() {
        Ok(code) => {
            debug!("leaving with status {}", code);
            process::exit(code)
        }
        Err(e) => {
            eprintln!("minish: input error: {}", e);
            process::exit(1)
        }
    }
}
