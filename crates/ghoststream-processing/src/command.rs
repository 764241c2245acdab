//! External process execution.
//!
//! Every ffprobe/ffmpeg invocation goes through [`CommandRunner`], so the pipeline can
//! be driven end to end without real media tools.

use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use tokio::process::Command;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{program} not found. Please install FFmpeg (ffmpeg + ffprobe).")]
    NotFound { program: String },

    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` to completion and capture its output.
    ///
    /// A non-zero exit is not an error at this level; callers inspect `success`.
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError>;
}

/// Runs commands as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        let start = std::time::Instant::now();

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => CommandError::NotFound {
                    program: program.to_string(),
                },
                _ => CommandError::Spawn {
                    program: program.to_string(),
                    source: e,
                },
            })?;

        tracing::debug!(
            process.executable.name = %program,
            exit_code = ?output.status.code(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Process finished"
        );

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Render a command line for error messages and logs.
pub fn render_command(program: &str, args: &[String]) -> String {
    let mut rendered = String::from(program);
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}
