//! Command execution seam
//!
//! The coordinator never spawns processes itself; it hands a [`CommandLine`]
//! to a [`CommandRunner`]. [`ProcessRunner`] runs real commands,
//! [`ScriptedRunner`] answers from a table of canned results.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Exit status reported when the program could not be started at all
pub const SPAWN_FAILURE_STATUS: i32 = 127;

/// A program plus its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Build a command line for an arbitrary program
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a `git` command line
    pub fn git<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("git", args)
    }

    /// Program name
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments, unquoted
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    /// Space-joined, with arguments containing whitespace double-quoted
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg.replace('"', "\\\""))?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Exit code and captured output of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; [`SPAWN_FAILURE_STATUS`] when the program could not start
    pub status: i32,
    /// Raw stdout
    pub stdout: Vec<u8>,
    /// Raw stderr
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Successful run with empty output
    pub const fn ok() -> Self {
        Self {
            status: 0,
            stdout: Vec::new(),
            stderr: Vec::new(),
        }
    }

    /// Successful run printing `stdout`
    pub fn ok_with(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 0,
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Failed run (exit code 1) printing `stderr`
    pub fn failed(stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 1,
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with status 0
    pub const fn success(&self) -> bool {
        self.status == 0
    }

    /// Stdout decoded lossily
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr decoded lossily
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Text worth showing for a failure: stderr, else stdout, else the status
    pub fn failure_text(&self) -> String {
        let stderr = self.stderr_str();
        if !stderr.trim().is_empty() {
            return stderr.trim().to_string();
        }
        let stdout = self.stdout_str();
        if !stdout.trim().is_empty() {
            return stdout.trim().to_string();
        }
        format!("exit status {}", self.status)
    }
}

/// Runs external commands
///
/// Implementations do not retry. Failing to start the program is reported as
/// a result with [`SPAWN_FAILURE_STATUS`], not as a panic.
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion and capture its output
    fn run(&self, command: &CommandLine) -> CommandOutput;
}

impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    fn run(&self, command: &CommandLine) -> CommandOutput {
        (**self).run(command)
    }
}

/// Runs commands as child processes in a fixed working directory
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    cwd: PathBuf,
}

impl ProcessRunner {
    /// Create a runner rooted at `cwd`
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
        }
    }

    /// Working directory commands run in
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &CommandLine) -> CommandOutput {
        debug!("Running: {command}");

        match Command::new(command.program())
            .args(command.args())
            .current_dir(&self.cwd)
            .output()
        {
            Ok(output) => CommandOutput {
                status: output.status.code().unwrap_or(-1),
                stdout: output.stdout,
                stderr: output.stderr,
            },
            Err(e) => {
                debug!("Could not start {}: {e}", command.program());
                CommandOutput {
                    status: SPAWN_FAILURE_STATUS,
                    stdout: Vec::new(),
                    stderr: e.to_string().into_bytes(),
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Exact(String),
    Prefix(String),
}

impl Matcher {
    fn matches(&self, command: &str) -> bool {
        match self {
            Self::Exact(expected) => command == expected,
            Self::Prefix(prefix) => command.starts_with(prefix.as_str()),
        }
    }
}

/// Deterministic runner answering from canned results keyed by command text
///
/// Commands are matched against their [`Display`](fmt::Display) form. Exact
/// entries win over prefix entries; among entries of the same kind the most
/// recently registered wins, so a test can re-script a command mid-run.
/// Unmatched commands get the fallback, which fails by default.
pub struct ScriptedRunner {
    responses: Mutex<Vec<(Matcher, CommandOutput)>>,
    fallback: Mutex<CommandOutput>,
    calls: Mutex<Vec<String>>,
}

impl Default for ScriptedRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRunner {
    /// Runner where every command fails until scripted
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            fallback: Mutex::new(CommandOutput::failed(Vec::new())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer `command` (exact text) with `output`
    pub fn on(&self, command: &str, output: CommandOutput) -> &Self {
        self.push(Matcher::Exact(command.to_string()), output)
    }

    /// Answer any command starting with `prefix` with `output`
    pub fn on_prefix(&self, prefix: &str, output: CommandOutput) -> &Self {
        self.push(Matcher::Prefix(prefix.to_string()), output)
    }

    /// Answer unmatched commands with `output`
    pub fn fallback(&self, output: CommandOutput) -> &Self {
        *self.fallback.lock().unwrap_or_else(PoisonError::into_inner) = output;
        self
    }

    /// Every command run so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether `command` (exact text) was run
    pub fn was_called(&self, command: &str) -> bool {
        self.calls().iter().any(|c| c == command)
    }

    /// Whether any command starting with `prefix` was run
    pub fn was_called_with_prefix(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    fn push(&self, matcher: Matcher, output: CommandOutput) -> &Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((matcher, output));
        self
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &CommandLine) -> CommandOutput {
        let text = command.to_string();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.clone());

        let responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        let exact = responses
            .iter()
            .rev()
            .find(|(m, _)| matches!(m, Matcher::Exact(_)) && m.matches(&text));
        let found = exact.or_else(|| {
            responses
                .iter()
                .rev()
                .find(|(m, _)| matches!(m, Matcher::Prefix(_)) && m.matches(&text))
        });

        found.map_or_else(
            || {
                self.fallback
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
            },
            |(_, output)| output.clone(),
        )
    }
}
