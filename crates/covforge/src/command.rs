//! External tool invocations
//!
//! Every tool the pipeline drives (cargo, llvm-profdata, llvm-cov, rustc) is
//! described as a [`ToolCommand`] and executed through a [`CommandRunner`].
//! [`SystemRunner`] spawns real processes; tests substitute their own runner.

use crate::pipeline::Stage;
use crate::result::{CovError, CovResult};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// What happens to a child's stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capture {
    /// Stream to the terminal
    #[default]
    Inherit,
    /// Collect stdout; stderr still streams
    Stdout,
    /// Collect both stdout and stderr
    All,
    /// Stream to the terminal, with stdout folded into our stderr
    ToStderr,
}

/// A single external tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: OsString,
    args: Vec<OsString>,
    envs: Vec<(String, OsString)>,
    cwd: Option<PathBuf>,
    capture: Capture,
}

impl ToolCommand {
    /// Create a command for `program`
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            cwd: None,
            capture: Capture::default(),
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        let key = key.into();
        self.envs.retain(|(k, _)| *k != key);
        self.envs.push((key, value.into()));
        self
    }

    /// Run in `dir`
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Choose what gets captured
    #[must_use]
    pub const fn capture(mut self, capture: Capture) -> Self {
        self.capture = capture;
        self
    }

    /// Program name or path
    #[must_use]
    pub fn program(&self) -> &OsString {
        &self.program
    }

    /// Arguments in order
    #[must_use]
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Extra environment
    #[must_use]
    pub fn get_envs(&self) -> &[(String, OsString)] {
        &self.envs
    }

    /// Value of an extra environment variable
    #[must_use]
    pub fn get_env(&self, key: &str) -> Option<&OsString> {
        self.envs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Working directory, if set
    #[must_use]
    pub fn get_current_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Capture mode
    #[must_use]
    pub const fn get_capture(&self) -> Capture {
        self.capture
    }

    /// Whether any argument equals `needle`
    #[must_use]
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a == needle)
    }

    /// Build the `std::process::Command` to spawn
    #[must_use]
    pub fn to_std(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        match self.capture {
            Capture::Inherit => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            Capture::Stdout => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());
            }
            Capture::All => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
            Capture::ToStderr => {
                cmd.stdout(std::io::stderr()).stderr(Stdio::inherit());
            }
        }
        cmd.stdin(Stdio::null());
        cmd
    }
}

fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=+:%,@".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words = Vec::with_capacity(self.envs.len() + self.args.len() + 1);
        for (key, value) in &self.envs {
            words.push(format!("{key}={}", quote(&value.to_string_lossy())));
        }
        words.push(quote(&self.program.to_string_lossy()));
        words.extend(self.args.iter().map(|a| quote(&a.to_string_lossy())));
        write!(f, "{}", words.join(" "))
    }
}

/// Result of running a tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    /// Captured stdout (empty unless captured)
    pub stdout: Vec<u8>,
    /// Captured stderr (empty unless captured)
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Successful exit with the given stdout
    #[must_use]
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Failed exit with the given code and stderr
    #[must_use]
    pub fn failure(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            code: Some(code),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the tool exited with status 0
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Stdout as text
    #[must_use]
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Executes tool commands
pub trait CommandRunner {
    /// Run `command` to completion.
    ///
    /// Returns `Err` only when the process could not be started; a non-zero
    /// exit is reported through [`CommandOutput::code`].
    fn run(&mut self, command: &ToolCommand) -> std::io::Result<CommandOutput>;
}

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new system runner
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &ToolCommand) -> std::io::Result<CommandOutput> {
        let output = command.to_std().output()?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Run `command` for `stage`, turning spawn errors and non-zero exits into
/// [`CovError`]s.
pub fn run_checked<R: CommandRunner + ?Sized>(
    runner: &mut R,
    stage: Stage,
    command: &ToolCommand,
) -> CovResult<CommandOutput> {
    tracing::debug!(%stage, command = %command, "running");
    let output = runner.run(command).map_err(|source| CovError::ToolSpawn {
        stage,
        command: command.to_string(),
        source,
    })?;

    if output.is_success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stderr.is_empty() {
            tracing::error!(%stage, "{stderr}");
        }
        Err(CovError::ToolFailed {
            stage,
            command: command.to_string(),
            code: output.code,
            stderr,
        })
    }
}
