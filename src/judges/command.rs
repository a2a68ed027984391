//! Opinions from an external judge program
//!
//! The program is started directly from an argv (never through a shell),
//! receives the prompt on stdin and must print a JSON opinion on stdout.

use super::prompts::{build_prompt, parse_opinion_response};
use super::{EvidenceDigest, OpinionProvider, ProviderError};
use crate::models::{Judge, Opinion};
use crate::rubric::RubricCriterion;
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Output of a finished external process
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub return_code: Option<i32>,
}

/// Run `cmd` with `input` on stdin.
///
/// A `timeout_secs` of 0 waits indefinitely. Output pipes are drained on
/// their own threads so a chatty child cannot block on a full pipe.
pub fn run_command(
    cmd: &[String],
    input: &str,
    timeout_secs: u64,
) -> Result<CommandOutput, ProviderError> {
    let Some((program, args)) = cmd.split_first() else {
        return Err(ProviderError::Launch("Empty command".to_string()));
    };

    debug!("Running judge command: {} {:?}", program, args);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProviderError::Launch(format!("{} not found", program))
            } else {
                ProviderError::Launch(format!("Failed to run {}: {}", program, e))
            }
        })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    if let Some(mut stdin) = child.stdin.take() {
        let input = input.to_string();
        // A child that exits without reading closes the pipe; that is not our failure.
        thread::spawn(move || {
            let _ = stdin.write_all(input.as_bytes());
        });
    }

    let status = wait(&mut child, program, timeout_secs)?;

    Ok(CommandOutput {
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
        return_code: status,
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn wait(child: &mut Child, program: &str, timeout_secs: u64) -> Result<Option<i32>, ProviderError> {
    let start = Instant::now();
    let timeout = Duration::from_secs(timeout_secs);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status.code()),
            Ok(None) => {
                if timeout_secs > 0 && start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!("{} timed out after {}s", program, timeout_secs);
                    return Err(ProviderError::TimedOut {
                        program: program.to_string(),
                        secs: timeout_secs,
                    });
                }
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                return Err(ProviderError::Launch(format!(
                    "Failed to wait for {}: {}",
                    program, e
                )))
            }
        }
    }
}

/// Asks an external program for each opinion
#[derive(Debug, Clone)]
pub struct CommandJudge {
    command: Vec<String>,
    timeout_secs: u64,
    retries: u32,
}

impl CommandJudge {
    pub fn new(command: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            command,
            timeout_secs,
            retries: 0,
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    fn ask_once(&self, prompt: &str, judge: Judge, criterion_id: &str) -> Result<Opinion, ProviderError> {
        let output = run_command(&self.command, prompt, self.timeout_secs)?;
        if output.return_code != Some(0) {
            return Err(ProviderError::Failed {
                code: output.return_code,
                stderr: output.stderr.trim().chars().take(200).collect(),
            });
        }
        parse_opinion_response(&output.stdout, judge, criterion_id)
    }
}

impl OpinionProvider for CommandJudge {
    fn name(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or("command")
    }

    fn produce_opinion(
        &self,
        judge: Judge,
        criterion: &RubricCriterion,
        digest: &EvidenceDigest,
    ) -> Result<Opinion, ProviderError> {
        let prompt = build_prompt(judge, criterion, digest);
        let mut attempt = 0;
        loop {
            match self.ask_once(&prompt, judge, &criterion.id) {
                Ok(opinion) => return Ok(opinion),
                // A missing program will not appear between attempts
                Err(e @ ProviderError::Launch(_)) => return Err(e),
                Err(e) if attempt >= self.retries => return Err(e),
                Err(e) => {
                    attempt += 1;
                    warn!(
                        "{} on {} failed ({}), retrying ({}/{})",
                        judge, criterion.id, e, attempt, self.retries
                    );
                }
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::models::EvidenceMap;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    fn digest() -> EvidenceDigest {
        EvidenceDigest::new(&EvidenceMap::new(), 6, 3)
    }

    #[test]
    fn test_run_command_passes_stdin() {
        let output = run_command(&sh("cat"), "hello judge", 10).unwrap();
        assert_eq!(output.stdout, "hello judge");
        assert_eq!(output.return_code, Some(0));
    }

    #[test]
    fn test_run_command_missing_program() {
        let err = run_command(&["definitely-not-a-real-judge".to_string()], "", 5).unwrap_err();
        assert!(matches!(err, ProviderError::Launch(_)));
        assert!(matches!(run_command(&[], "", 5), Err(ProviderError::Launch(_))));
    }

    #[test]
    fn test_run_command_timeout() {
        let err = run_command(&sh("sleep 5"), "", 1).unwrap_err();
        assert!(matches!(err, ProviderError::TimedOut { secs: 1, .. }));
    }

    #[test]
    fn test_command_judge_parses_reply() {
        let judge = CommandJudge::new(
            sh(r#"cat > /dev/null; echo '{"score": 4, "argument": "ok", "cited_evidence": ["repo_detective:0"]}'"#),
            10,
        );
        let criterion = RubricCriterion::new("c1", 1.0);
        let opinion = judge.produce_opinion(Judge::Defense, &criterion, &digest()).unwrap();
        assert_eq!(opinion.score, 4);
        assert_eq!(opinion.criterion_id, "c1");
    }

    #[test]
    fn test_command_judge_nonzero_exit() {
        let judge = CommandJudge::new(sh("echo boom >&2; exit 3"), 10).with_retries(1);
        let criterion = RubricCriterion::new("c1", 1.0);
        let err = judge.produce_opinion(Judge::Defense, &criterion, &digest()).unwrap_err();
        match err {
            ProviderError::Failed { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
