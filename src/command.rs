//! Thin layer over external executables (git, the classifier, a container runtime).

use crate::error::{ChurnError, Result};
use crate::redact::strip_url_credentials;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
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

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line = self.program.clone();
        for a in &self.args {
            line.push(' ');
            line.push_str(a);
        }
        f.write_str(&strip_url_credentials(&line))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs external programs. Implemented by [`ProcessRunner`] and by scripted fakes in tests.
pub trait CommandRunner {
    /// Run to completion and capture output. `Err` means the program could not be run at all;
    /// a non-zero exit is reported through [`CommandOutput::success`].
    fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<CommandOutput>>;
}

#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        debug!(command = %invocation, cwd = ?invocation.cwd, "running");

        let mut cmd = tokio::process::Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }
        for (k, v) in &invocation.env {
            cmd.env(k, v);
        }

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| ChurnError::Command {
                    command: invocation.to_string(),
                    detail: format!("timed out after {}", humantime::format_duration(limit)),
                })??,
            None => cmd.output().await?,
        };

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run and return stdout, turning a non-zero exit into [`ChurnError::Command`].
pub async fn run_checked<R: CommandRunner>(runner: &R, invocation: &Invocation) -> Result<String> {
    let output = runner.run(invocation).await.map_err(|e| match e {
        ChurnError::Io(io) => ChurnError::Command {
            command: invocation.to_string(),
            detail: io.to_string(),
        },
        other => other,
    })?;
    if output.success {
        return Ok(output.stdout);
    }
    let detail = match (output.stderr.trim(), output.stdout.trim()) {
        ("", "") => match output.code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        },
        ("", out) => out.to_string(),
        (err, _) => err.to_string(),
    };
    Err(ChurnError::Command {
        command: invocation.to_string(),
        detail,
    })
}

pub async fn tool_available<R: CommandRunner>(runner: &R, program: &str) -> bool {
    matches!(
        runner.run(&Invocation::new(program).arg("--version")).await,
        Ok(out) if out.success
    )
}
