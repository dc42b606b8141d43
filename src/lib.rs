//! A small interactive command interpreter.
//!
//! The crate reads one line at a time and turns it into processes: the line is split
//! into statements on `;` and `&&`, each statement is tokenized on whitespace, file
//! redirections (`<`, `>`, `>>`) are peeled off, and `|` splits a statement into a
//! pipeline whose stages run concurrently. A handful of built-ins (`cd`, `history`,
//! `exit`, `quit`) run in-process; everything else is looked up on `PATH`.
//!
//! The main entry point is [`Interpreter`]. Its [`Interpreter::execute_line`] runs one
//! line to completion and returns the exit status of the last command that ran, while
//! [`Interpreter::repl`] drives the interactive loop.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
mod external;
pub mod history;
mod interpreter;
pub mod lexer;
pub mod parser;
mod pipeline;
pub mod redirect;

/// Re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;

/// Callback for an interrupt that arrives while a command is running.
pub use interpreter::redraw_prompt;
