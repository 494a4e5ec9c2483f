//! External command execution
//!
//! Every step of a bootstrap is an external program. [`CommandRunner`] hides
//! how they are started so the workflow can be driven by a fake in tests.
//! Runs block (await) until the child exits; output lines are handed to a
//! callback as they arrive and also collected into the returned
//! [`CommandOutput`].

use crate::error::{Error, Result};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// A program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory, inherited when `None`
    pub current_dir: Option<Utf8PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Utf8Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_owned());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// One line of child output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamLine {
    Stdout(String),
    Stderr(String),
}

/// Result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the child was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs external commands to completion
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `cmd` and wait for it to exit
    ///
    /// A non-zero exit is not an error here; callers decide from
    /// [`CommandOutput::exit_code`]. Errors are reserved for commands that
    /// could not be started or waited on.
    async fn run(
        &self,
        cmd: &CommandSpec,
        on_line: &mut (dyn FnMut(StreamLine) + Send),
    ) -> Result<CommandOutput>;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        cmd: &CommandSpec,
        on_line: &mut (dyn FnMut(StreamLine) + Send),
    ) -> Result<CommandOutput> {
        debug!("Running: {}", cmd);

        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        if let Some(dir) = &cmd.current_dir {
            command.current_dir(dir);
        }
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command.kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(&cmd.program)
            } else {
                Error::process_execution(format!("failed to spawn {}: {}", cmd.program, e))
            }
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::process_execution("child stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::process_execution("child stderr was not captured"))?;

        let mut out_lines = BufReader::new(stdout).split(b'\n');
        let mut err_lines = BufReader::new(stderr).split(b'\n');
        let mut output = CommandOutput::default();
        let mut out_open = true;
        let mut err_open = true;

        // Drain both pipes together so neither fills up and stalls the child
        while out_open || err_open {
            tokio::select! {
                line = out_lines.next_segment(), if out_open => match line? {
                    Some(line) => {
                        let line = decode_line(line);
                        push_line(&mut output.stdout, &line);
                        on_line(StreamLine::Stdout(line));
                    }
                    None => out_open = false,
                },
                line = err_lines.next_segment(), if err_open => match line? {
                    Some(line) => {
                        let line = decode_line(line);
                        push_line(&mut output.stderr, &line);
                        on_line(StreamLine::Stderr(line));
                    }
                    None => err_open = false,
                },
            }
        }

        let status = child.wait().await.map_err(|e| {
            Error::process_execution(format!("failed to wait for {}: {}", cmd.program, e))
        })?;
        output.exit_code = status.code();
        debug!("{} exited with {:?}", cmd.program, output.exit_code);

        Ok(output)
    }
}

/// Strip a trailing `\r`; invalid UTF-8 becomes U+FFFD
fn decode_line(mut bytes: Vec<u8>) -> String {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn push_line(buf: &mut String, line: &str) {
    buf.push_str(line);
    buf.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_builder() {
        let cmd = CommandSpec::new("git")
            .arg("clone")
            .arg("https://github.com/acme/widget.git")
            .current_dir("/work");
        assert_eq!(cmd.program, "git");
        assert_eq!(cmd.args, vec!["clone", "https://github.com/acme/widget.git"]);
        assert_eq!(cmd.current_dir, Some(Utf8PathBuf::from("/work")));
        assert_eq!(
            cmd.to_string(),
            "git clone https://github.com/acme/widget.git"
        );
    }

    #[test]
    fn test_command_output_success() {
        let mut output = CommandOutput::default();
        assert!(!output.success());
        output.exit_code = Some(0);
        assert!(output.success());
        output.exit_code = Some(1);
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_missing_program_is_tool_not_found() {
        let cmd = CommandSpec::new("nosync-definitely-not-installed");
        let err = SystemRunner
            .run(&cmd, &mut |_: StreamLine| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ToolNotFound { program } if program == "nosync-definitely-not-installed"
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_streams_and_collects_both_pipes() {
        let cmd = CommandSpec::new("sh")
            .arg("-c")
            .arg("echo out-1; echo err-1 >&2; echo out-2; exit 3");
        let mut seen = Vec::new();
        let output = SystemRunner
            .run(&cmd, &mut |line: StreamLine| seen.push(line))
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, "out-1\nout-2\n");
        assert_eq!(output.stderr, "err-1\n");
        assert!(seen.contains(&StreamLine::Stdout("out-1".to_string())));
        assert!(seen.contains(&StreamLine::Stderr("err-1".to_string())));
        assert_eq!(seen.len(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_output_is_decoded_lossily() {
        let cmd = CommandSpec::new("sh")
            .arg("-c")
            .arg("printf 'caf\\351\\n'; printf 'crlf\\r\\n'; echo after >&2; exit 0");
        let mut seen = Vec::new();
        let output = SystemRunner
            .run(&cmd, &mut |line: StreamLine| seen.push(line))
            .await
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout, "caf\u{FFFD}\ncrlf\n");
        assert_eq!(output.stderr, "after\n");
        assert_eq!(
            seen.iter()
                .filter(|l| matches!(l, StreamLine::Stdout(_)))
                .count(),
            2
        );
        assert!(seen.contains(&StreamLine::Stderr("after".to_string())));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_in_current_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp.path().canonicalize().unwrap()).unwrap();
        let cmd = CommandSpec::new("pwd").current_dir(&dir);
        let output = SystemRunner.run(&cmd, &mut |_: StreamLine| {}).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), dir.as_str());
    }
}
