//! Splitting of a line into statements.
//!
//! A line is a `;`-separated list of statements, and each statement is an `&&`-chain
//! of clauses. The operators are recognized anywhere in the text, spaced or not, so
//! `true&&ls;pwd` is three clauses. Clauses stay raw text here; tokenizing them is the
//! dispatcher's job.

use std::fmt;

/// One clause of a line, tagged with how the status of what came before it matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceStep {
    /// First clause of a statement: runs no matter what the previous statement did.
    Plain(String),
    /// Clause after `&&`: runs only while every earlier clause of its statement succeeded.
    AndThen(String),
}

impl SequenceStep {
    pub fn text(&self) -> &str {
        match self {
            SequenceStep::Plain(text) | SequenceStep::AndThen(text) => text,
        }
    }
}

/// Errors that reject a line before anything in it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// `|` with nothing on one of its sides.
    EmptyPipelineStage,
    /// `&&` with nothing on one of its sides.
    EmptyAndOperand,
    /// A single `&`, which would request a background job.
    LoneAmpersand,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::EmptyPipelineStage => write!(f, "syntax error: missing command around `|`"),
            SyntaxError::EmptyAndOperand => write!(f, "syntax error: missing command around `&&`"),
            SyntaxError::LoneAmpersand => {
                write!(f, "syntax error: unexpected `&` (background jobs are not supported)")
            }
        }
    }
}

impl std::error::Error for SyntaxError {}

pub const STATEMENT_SEPARATOR: char = ';';
pub const AND_OPERATOR: &str = "&&";

/// Split `line` into clauses in execution order.
///
/// Blank statements (`;;`, a trailing `;`) are skipped. Surrounding whitespace is
/// trimmed from every clause.
pub fn parse_sequence(line: &str) -> Result<Vec<SequenceStep>, SyntaxError> {
    let mut steps = Vec::new();

    for statement in line.split(STATEMENT_SEPARATOR) {
        if statement.trim().is_empty() {
            continue;
        }
        for (i, clause) in statement.split(AND_OPERATOR).enumerate() {
            let clause = clause.trim();
            if clause.is_empty() {
                return Err(SyntaxError::EmptyAndOperand);
            }
            if clause.contains('&') {
                return Err(SyntaxError::LoneAmpersand);
            }
            let text = clause.to_string();
            steps.push(if i == 0 {
                SequenceStep::Plain(text)
            } else {
                SequenceStep::AndThen(text)
            });
        }
    }

    Ok(steps)
}
