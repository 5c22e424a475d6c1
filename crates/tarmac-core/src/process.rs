//! External command execution
//!
//! Every external tool (xcodebuild, ditto, agvtool, security, gh) is invoked
//! through [`CommandRunner`]. [`SystemRunner`] spawns real processes under a
//! timeout; in dry-run mode it suppresses any command not marked read-only
//! and returns a synthetic successful output instead.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, ToolError};

/// Output returned for commands suppressed by dry-run
pub const DRY_RUN_OUTPUT: &str = "DRY RUN";

const REDACTED: &str = "********";

/// A command to run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    /// Read-only commands still run in dry-run mode
    pub read_only: bool,
    redactions: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument
    pub fn path_arg(self, path: impl AsRef<Path>) -> Self {
        let arg = path.as_ref().to_string_lossy().into_owned();
        self.arg(arg)
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Mark the command as free of side effects
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Mask a secret wherever the command is displayed or logged
    pub fn redact(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() {
            self.redactions.push(secret);
        }
        self
    }

    fn mask(&self, text: &str) -> String {
        self.redactions
            .iter()
            .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), REDACTED))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            let arg = self.mask(arg);
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg.replace('\'', r"'\''"))?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// First line of stdout, trimmed of the line terminator
    pub fn first_line(&self) -> Option<&str> {
        self.stdout.lines().next()
    }
}

/// Capability to run external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command, capturing its output; a nonzero exit is not an error
    async fn run(&self, spec: &CommandSpec, timeout: Duration) -> Result<CommandOutput>;

    /// Whether mutating commands and side effects are suppressed
    fn dry_run(&self) -> bool {
        false
    }

    /// Run a command and fail on a nonzero exit
    async fn run_checked(&self, spec: &CommandSpec, timeout: Duration) -> Result<CommandOutput> {
        let output = self.run(spec, timeout).await?;
        if output.success() {
            return Ok(output);
        }
        Err(ToolError::Failed {
            command: spec.to_string(),
            exit_code: output.status,
            stdout: spec.mask(&output.stdout),
            stderr: spec.mask(&output.stderr),
        }
        .into())
    }
}

/// Runs commands as child processes
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    dry_run: bool,
}

impl SystemRunner {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

fn install_hint(program: &str) -> &'static str {
    match program {
        "xcodebuild" | "agvtool" | "ditto" | "security" => {
            "Install Xcode and its command line tools: xcode-select --install"
        }
        "gh" => "Install the GitHub CLI: https://cli.github.com",
        _ => "Make sure it is installed and on PATH",
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec, timeout: Duration) -> Result<CommandOutput> {
        if self.dry_run && !spec.read_only {
            info!(command = %spec, "dry run, not executing");
            return Ok(CommandOutput::ok(DRY_RUN_OUTPUT));
        }

        let program = which::which(&spec.program).map_err(|_| ToolError::NotFound {
            tool: spec.program.clone(),
            hint: install_hint(&spec.program).to_string(),
        })?;

        debug!(command = %spec, cwd = ?spec.cwd, timeout_secs = timeout.as_secs(), "running");

        let mut cmd = Command::new(program);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| ToolError::Spawn {
            command: spec.to_string(),
            source: e,
        })?;

        // Dropping the future on timeout kills the child
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| ToolError::Spawn {
                command: spec.to_string(),
                source: e,
            })?,
            Err(_) => {
                return Err(ToolError::TimedOut {
                    command: spec.to_string(),
                    seconds: timeout.as_secs(),
                }
                .into())
            }
        };

        let output = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(
            command = %spec,
            status = ?output.status,
            stdout = %spec.mask(output.stdout.trim_end()),
            stderr = %spec.mask(output.stderr.trim_end()),
            "finished"
        );
        Ok(output)
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    //! Scripted runner for tests

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays scripted outputs and records every invocation
    ///
    /// Responses are matched in order against the first rule whose program
    /// and leading arguments match; unmatched commands succeed with empty
    /// output.
    #[derive(Debug, Default)]
    pub struct ScriptedRunner {
        dry_run: bool,
        rules: Mutex<Vec<(String, Vec<String>, VecDeque<Result<CommandOutput>>)>>,
        calls: Mutex<Vec<CommandSpec>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn dry_run(mut self, dry_run: bool) -> Self {
            self.dry_run = dry_run;
            self
        }

        /// Respond to `program <prefix...>` with `output`
        pub fn on(self, program: &str, prefix: &[&str], output: CommandOutput) -> Self {
            self.push(program, prefix, Ok(output));
            self
        }

        /// Respond to `program <prefix...>` with an error
        pub fn fail_with(self, program: &str, prefix: &[&str], error: crate::TarmacError) -> Self {
            self.push(program, prefix, Err(error));
            self
        }

        fn push(&self, program: &str, prefix: &[&str], response: Result<CommandOutput>) {
            let mut rules = self.rules.lock().unwrap();
            let prefix: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
            if let Some((_, _, queue)) = rules
                .iter_mut()
                .find(|(p, a, _)| p == program && *a == prefix)
            {
                queue.push_back(response);
            } else {
                rules.push((program.to_string(), prefix, VecDeque::from([response])));
            }
        }

        /// Every command run so far, in order
        pub fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().unwrap().clone()
        }

        /// Commands run so far, rendered for assertions
        pub fn rendered(&self) -> Vec<String> {
            self.calls().iter().map(|c| c.to_string()).collect()
        }

        pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
            self.calls()
                .into_iter()
                .filter(|c| c.program == program)
                .collect()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, spec: &CommandSpec, _timeout: Duration) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(spec.clone());
            if self.dry_run && !spec.read_only {
                return Ok(CommandOutput::ok(DRY_RUN_OUTPUT));
            }

            let mut rules = self.rules.lock().unwrap();
            let matching = rules.iter_mut().find(|(program, prefix, queue)| {
                *program == spec.program
                    && spec.args.len() >= prefix.len()
                    && spec.args.iter().zip(prefix).all(|(a, p)| a == p)
                    && !queue.is_empty()
            });
            match matching {
                // the last response of a rule repeats
                Some((_, _, queue)) => match queue.front() {
                    Some(Ok(output)) if queue.len() == 1 => Ok(output.clone()),
                    _ => queue
                        .pop_front()
                        .unwrap_or_else(|| Ok(CommandOutput::ok(""))),
                },
                None => Ok(CommandOutput::ok("")),
            }
        }

        fn dry_run(&self) -> bool {
            self.dry_run
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedRunner;
    use super::*;
    use crate::TarmacError;

    #[test]
    fn test_display_quotes_and_redacts() {
        let spec = CommandSpec::new("security")
            .args(["import", "/tmp/cert file.p12", "-P", "hunter2"])
            .redact("hunter2");
        assert_eq!(
            spec.to_string(),
            "security import '/tmp/cert file.p12' -P ********"
        );
    }

    #[test]
    fn test_first_line() {
        let output = CommandOutput::ok("9.0.0\nextra\n");
        assert_eq!(output.first_line(), Some("9.0.0"));
        assert_eq!(CommandOutput::ok("").first_line(), None);
    }

    #[tokio::test]
    async fn test_run_checked_carries_output() {
        let runner = ScriptedRunner::new().on(
            "xcodebuild",
            &["archive"],
            CommandOutput {
                status: Some(65),
                stdout: "** ARCHIVE FAILED **".to_string(),
                stderr: "error: No signing certificate".to_string(),
            },
        );
        let spec = CommandSpec::new("xcodebuild").args(["archive", "-scheme", "App"]);

        let err = runner
            .run_checked(&spec, Duration::from_secs(1))
            .await
            .unwrap_err();
        match err {
            TarmacError::Tool(ToolError::Failed {
                exit_code, stderr, ..
            }) => {
                assert_eq!(exit_code, Some(65));
                assert!(stderr.contains("No signing certificate"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_scripted_runner_suppresses_mutating_commands_in_dry_run() {
        let runner = ScriptedRunner::new()
            .dry_run(true)
            .on("agvtool", &["what-version"], CommandOutput::ok("142\n"));

        let query = CommandSpec::new("agvtool")
            .args(["what-version", "-terse"])
            .read_only();
        let apply = CommandSpec::new("agvtool").args(["new-version", "-all", "143"]);

        let timeout = Duration::from_secs(1);
        assert_eq!(runner.run(&query, timeout).await.unwrap().stdout, "142\n");
        assert_eq!(
            runner.run(&apply, timeout).await.unwrap().stdout,
            DRY_RUN_OUTPUT
        );
        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_system_runner_dry_run_skips_spawn() {
        let runner = SystemRunner::new(true);
        let spec = CommandSpec::new("definitely-not-installed-tool").arg("--flag");

        let output = runner.run(&spec, Duration::from_secs(1)).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, DRY_RUN_OUTPUT);
    }

    #[tokio::test]
    async fn test_system_runner_reports_missing_tool() {
        let runner = SystemRunner::new(false);
        let spec = CommandSpec::new("definitely-not-installed-tool").read_only();

        let err = runner.run(&spec, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, TarmacError::Tool(ToolError::NotFound { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_times_out() {
        let runner = SystemRunner::new(false);
        let spec = CommandSpec::new("sleep").arg("5");

        let err = runner
            .run(&spec, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, TarmacError::Tool(ToolError::TimedOut { .. })));
        assert_eq!(err.exit_code(), 9);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_captures_exit_code() {
        let runner = SystemRunner::new(false);
        let spec = CommandSpec::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);

        let output = runner.run(&spec, Duration::from_secs(5)).await.unwrap();
        assert_eq!(output.status, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }
}
