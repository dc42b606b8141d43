//! Pipelines: `stage | stage | ...`.
//!
//! Every stage is spawned before the first wait, so the stages run concurrently and a
//! large output never fills a channel that nobody reads. Each channel is created by
//! the spawn of its writer and handed to the spawn of its reader; the interpreter keeps
//! neither end afterwards and children inherit only their own ends, so a reader sees
//! end-of-file as soon as its writer exits.

use crate::command::{EXIT_SUCCESS, EXIT_SYNTAX_ERROR, ExitCode};
use crate::env::Environment;
use crate::external::{launch, wait_for};
use crate::parser::SyntaxError;
use crate::redirect::{StreamBindings, open_redirections, parse_redirections};
use log::debug;
use std::process::{Child, ChildStdout, Stdio};

pub(crate) const PIPE_OPERATOR: &str = "|";

/// Split `tokens` on `|` words into stage token lists. The operators belong to no stage.
pub(crate) fn split_stages(tokens: Vec<String>) -> Result<Vec<Vec<String>>, SyntaxError> {
    let mut stages = vec![Vec::new()];
    for token in tokens {
        if token == PIPE_OPERATOR {
            stages.push(Vec::new());
        } else if let Some(stage) = stages.last_mut() {
            stage.push(token);
        }
    }

    if stages.iter().any(Vec::is_empty) {
        return Err(SyntaxError::EmptyPipelineStage);
    }
    Ok(stages)
}

enum Stage {
    Running(Child),
    Finished(ExitCode),
}

/// Run a token list containing `|` and return the status of its last stage.
///
/// A stage that cannot be started keeps its failure status and its neighbours still
/// run; a reader with nothing upstream reads an empty stream.
pub(crate) fn run_pipeline(tokens: Vec<String>, env: &Environment) -> ExitCode {
    let stages = match split_stages(tokens) {
        Ok(stages) => stages,
        Err(e) => {
            eprintln!("minish: {}", e);
            return EXIT_SYNTAX_ERROR;
        }
    };

    let count = stages.len();
    let mut running = Vec::with_capacity(count);
    let mut upstream: Option<ChildStdout> = None;

    for (i, tokens) in stages.into_iter().enumerate() {
        let command = parse_redirections(tokens);
        let StreamBindings { stdin, stdout } = open_redirections(&command.redirects, env);

        // A file redirection takes precedence over the channel on the same stream.
        let stdin = match (stdin, upstream.take()) {
            (Some(file), _) => Stdio::from(file),
            (None, Some(channel)) => Stdio::from(channel),
            (None, None) if i == 0 => Stdio::inherit(),
            (None, None) => Stdio::null(),
        };
        let stdout = match stdout {
            Some(file) => Stdio::from(file),
            None if i + 1 == count => Stdio::inherit(),
            None => Stdio::piped(),
        };

        if command.argv.is_empty() {
            running.push(Stage::Finished(EXIT_SUCCESS));
            continue;
        }

        match launch(&command.argv, stdin, stdout, env) {
            Ok(mut child) => {
                upstream = child.stdout.take();
                running.push(Stage::Running(child));
            }
            Err(code) => running.push(Stage::Finished(code)),
        }
    }
    drop(upstream);

    let statuses: Vec<ExitCode> = running
        .into_iter()
        .map(|stage| match stage {
            Stage::Running(mut child) => wait_for(&mut child),
            Stage::Finished(code) => code,
        })
        .collect();
    debug!("pipeline statuses = {:?}", statuses);

    statuses.last().copied().unwrap_or(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::EXIT_NOT_FOUND;
    use std::fs;
    use std::path::PathBuf;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_owned).collect()
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pipeline_tests_{}_{}", std::process::id(), tag));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    fn env_in(dir: &PathBuf) -> Environment {
        let mut env = Environment::new(10);
        env.current_dir = dir.clone();
        env
    }

    #[test]
    fn stages_are_split_on_pipe_words() {
        let stages = split_stages(words("ls -l | grep x | wc -l")).unwrap();
        assert_eq!(stages, vec![words("ls -l"), words("grep x"), words("wc -l")]);
    }

    #[test]
    fn empty_stages_are_rejected() {
        for line in ["| wc", "ls |", "ls | | wc", "|"] {
            assert_eq!(
                split_stages(words(line)),
                Err(SyntaxError::EmptyPipelineStage),
                "line {:?}",
                line
            );
        }
    }

    #[test]
    #[cfg(unix)]
    fn output_flows_through_every_stage() {
        let dir = scratch_dir("flow");
        let env = env_in(&dir);

        let status = run_pipeline(words("echo hello pipe | tr a-z A-Z | cat > out.txt"), &env);

        assert_eq!(status, 0);
        assert_eq!(fs::read_to_string(dir.join("out.txt")).unwrap(), "HELLO PIPE\n");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    #[cfg(unix)]
    fn large_output_is_delivered_unmodified() {
        let dir = scratch_dir("large");
        let env = env_in(&dir);

        let status = run_pipeline(words("seq 1 200000 | cat | cat > out.txt"), &env);

        let expected: String = (1..=200000).map(|n| format!("{}\n", n)).collect();
        assert_eq!(status, 0);
        assert_eq!(fs::read_to_string(dir.join("out.txt")).unwrap(), expected);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    #[cfg(unix)]
    fn input_redirection_feeds_the_first_stage() {
        let dir = scratch_dir("input");
        let env = env_in(&dir);
        fs::write(dir.join("in.txt"), "b\na\nc\n").unwrap();

        let status = run_pipeline(words("sort < in.txt | tr a-z A-Z > out.txt"), &env);

        assert_eq!(status, 0);
        assert_eq!(fs::read_to_string(dir.join("out.txt")).unwrap(), "A\nB\nC\n");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    #[cfg(unix)]
    fn file_redirection_overrides_the_channel() {
        let dir = scratch_dir("override");
        let env = env_in(&dir);

        let status = run_pipeline(words("echo hi > mid.txt | cat > out.txt"), &env);

        assert_eq!(status, 0);
        assert_eq!(fs::read_to_string(dir.join("mid.txt")).unwrap(), "hi\n");
        assert_eq!(fs::read_to_string(dir.join("out.txt")).unwrap(), "");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    #[cfg(unix)]
    fn missing_stage_does_not_abort_its_siblings() {
        let dir = scratch_dir("missing");
        let env = env_in(&dir);

        let status = run_pipeline(
            words("echo hi > first.txt | no-such-program-4711 | echo after > last.txt"),
            &env,
        );
        assert_eq!(status, 0);
        assert_eq!(fs::read_to_string(dir.join("first.txt")).unwrap(), "hi\n");
        assert_eq!(fs::read_to_string(dir.join("last.txt")).unwrap(), "after\n");

        let status = run_pipeline(words("echo hi | no-such-program-4711"), &env);
        assert_eq!(status, EXIT_NOT_FOUND);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    #[cfg(unix)]
    fn status_is_the_last_stage_status() {
        let env = Environment::new(10);
        assert_eq!(run_pipeline(words("true | false"), &env), 1);
        assert_eq!(run_pipeline(words("false | true"), &env), 0);
    }

    #[test]
    fn syntax_error_spawns_nothing() {
        let env = Environment::new(10);
        assert_eq!(run_pipeline(words("echo hi |"), &env), EXIT_SYNTAX_ERROR);
    }
}
