//! One-shot execution of the resolved `ia` executable.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

use crate::error::{CliError, CliResult};
use crate::resolver::ResolvedExecutable;

pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 50 * 1024 * 1024;
const READ_CHUNK_BYTES: usize = 8192;

/// Arguments and limits for a single run. The first argument is the subcommand.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub args: Vec<String>,
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

impl InvocationRequest {
    #[must_use]
    pub const fn new(args: Vec<String>, timeout: Duration) -> Self {
        Self {
            args,
            timeout,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    #[must_use]
    pub const fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }
}

/// Raw captured streams of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug)]
enum CaptureError {
    Io(io::Error),
    Overflow,
}

/// Runs the executable to completion, buffering both streams.
///
/// The child is killed when the timeout elapses or either stream grows past
/// `max_output_bytes`.
///
/// # Errors
/// Returns `CliError::Timeout`, `CliError::OutputTooLarge`, or
/// `CliError::Execution` for spawn failures and non-zero exits.
pub async fn invoke(
    executable: &ResolvedExecutable,
    request: &InvocationRequest,
) -> CliResult<InvocationOutput> {
    let command_line = describe(executable, &request.args);
    let mut command = build_command(executable, &request.args)?;
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(command = %command_line, shell = executable.use_shell, "spawning ia");
    let mut child = command.spawn().map_err(|err| CliError::Execution {
        message: format!("failed to start {}: {err}", executable.display()),
    })?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        let _ = child.kill().await;
        return Err(CliError::Execution {
            message: "failed to capture process output".to_string(),
        });
    };

    let limit = request.max_output_bytes;
    let outcome = tokio::time::timeout(request.timeout, async {
        let (out, err) = tokio::try_join!(read_capped(stdout, limit), read_capped(stderr, limit))?;
        let status = child.wait().await.map_err(CaptureError::Io)?;
        Ok::<_, CaptureError>((status, out, err))
    })
    .await;

    let (status, out, err) = match outcome {
        Ok(Ok(captured)) => captured,
        Ok(Err(CaptureError::Overflow)) => {
            let _ = child.kill().await;
            return Err(CliError::OutputTooLarge {
                limit,
                command: command_line,
            });
        }
        Ok(Err(CaptureError::Io(err))) => {
            let _ = child.kill().await;
            return Err(CliError::Execution {
                message: format!("failed to read output of {command_line}: {err}"),
            });
        }
        Err(_elapsed) => {
            let _ = child.kill().await;
            return Err(CliError::Timeout {
                timeout: request.timeout,
                command: command_line,
            });
        }
    };

    let output = InvocationOutput {
        stdout: String::from_utf8_lossy(&out).into_owned(),
        stderr: String::from_utf8_lossy(&err).into_owned(),
    };

    if status.success() {
        return Ok(output);
    }

    let stderr = output.stderr.trim();
    let message = if stderr.is_empty() {
        format!("{command_line} exited with {status}")
    } else {
        stderr.to_string()
    };
    Err(CliError::Execution { message })
}

/// Renders the command line for logs and error messages.
#[must_use]
pub fn describe(executable: &ResolvedExecutable, args: &[String]) -> String {
    let program = executable.display();
    shell_words::join(std::iter::once(program.as_str()).chain(args.iter().map(String::as_str)))
}

fn build_command(executable: &ResolvedExecutable, args: &[String]) -> CliResult<Command> {
    if !executable.use_shell {
        let mut command = Command::new(&executable.command);
        command.args(args);
        return Ok(command);
    }
    shell_command(executable, args)
}

#[cfg(windows)]
fn shell_command(executable: &ResolvedExecutable, args: &[String]) -> CliResult<Command> {
    let line = cmd_line(&executable.display(), args)?;
    let mut command = Command::new("cmd");
    // /S strips exactly the outer pair of quotes, leaving each quoted word intact.
    command.raw_arg(format!("/D /S /C \"{line}\""));
    Ok(command)
}

#[cfg(not(windows))]
#[allow(clippy::unnecessary_wraps)]
fn shell_command(executable: &ResolvedExecutable, args: &[String]) -> CliResult<Command> {
    let mut command = Command::new("sh");
    command.arg("-c").arg(describe(executable, args));
    Ok(command)
}

/// Joins words into a `cmd` command line, each wrapped in double quotes.
///
/// Inside quotes `cmd` treats `&`, `|`, `<`, `>`, `^` and parentheses as
/// literals. Embedded quotes are doubled so the quoting state never flips
/// between words; the C runtime of the target decodes `""` back to `"`.
/// `%` still expands inside quotes and line breaks end the command, so
/// words carrying either are refused.
#[cfg(any(windows, test))]
fn cmd_line(program: &str, args: &[String]) -> CliResult<String> {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(cmd_quote)
        .collect::<CliResult<Vec<_>>>()
        .map(|words| words.join(" "))
}

#[cfg(any(windows, test))]
fn cmd_quote(word: &str) -> CliResult<String> {
    if word.contains(['%', '\r', '\n', '\0']) {
        return Err(CliError::Execution {
            message: format!(
                "argument {word:?} cannot be passed safely through cmd; \
                 set IA_MCP_IA_PATH to a native ia executable"
            ),
        });
    }
    Ok(format!("\"{}\"", word.replace('"', "\"\"")))
}

async fn read_capped<R: AsyncRead + Unpin>(
    mut reader: R,
    limit: usize,
) -> Result<Vec<u8>, CaptureError> {
    let mut captured = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK_BYTES];
    loop {
        let read = reader.read(&mut chunk).await.map_err(CaptureError::Io)?;
        if read == 0 {
            return Ok(captured);
        }
        if captured.len() + read > limit {
            return Err(CaptureError::Overflow);
        }
        captured.extend_from_slice(&chunk[..read]);
    }
}
