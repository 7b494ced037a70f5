use std::{
    ffi::OsString,
    io::{self, Write},
    path::Path,
    process::Stdio,
};

use futures::{StreamExt, stream};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
};
use tokio_stream::wrappers::SplitStream;
use tracing::{debug, info, warn};

use crate::{error::PanaError, types::InvocationResult};

pub const DEFAULT_PROGRAM: &str = "flutter";
pub const DEFAULT_LEADING_ARGS: [&str; 4] = ["pub", "global", "run", "pana"];

#[derive(Debug, Clone, Copy)]
enum OutputStream {
    Stdout,
    Stderr,
}

/// Decodes one raw output line; invalid UTF-8 is replaced, not rejected.
fn decode_line(mut raw: &[u8]) -> String {
    if let [rest @ .., b'\r'] = raw {
        raw = rest;
    }
    String::from_utf8_lossy(raw).into_owned()
}

/// Runs pana against a package and captures what it printed.
///
/// The tool is started from an argument vector; no shell is involved, so
/// package paths are passed through verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Analyzer {
    program: String,
    leading_args: Vec<String>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM, DEFAULT_LEADING_ARGS)
    }
}

impl Analyzer {
    pub fn new<I, S>(program: impl Into<String>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            leading_args: leading_args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument vector for analysing `package`: path source, score
    /// output, warnings suppressed.
    pub fn command_args(&self, package: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.leading_args.iter().map(OsString::from).collect();
        args.extend(["--source", "path"].map(OsString::from));
        args.push(package.as_os_str().to_owned());
        args.extend(["--scores", "--no-warning"].map(OsString::from));
        args
    }

    /// Runs the tool to completion.
    ///
    /// Every stdout and stderr line is written to `echo` with a `> ` prefix
    /// as soon as it arrives, whatever the exit status turns out to be.
    /// Blocks until the tool exits; no timeout is applied.
    pub async fn invoke<W: Write>(
        &self,
        package: &Path,
        echo: &mut W,
    ) -> Result<InvocationResult, PanaError> {
        info!(
            program = %self.program,
            package = %package.display(),
            "Running package analysis"
        );

        let mut child = Command::new(&self.program)
            .args(self.command_args(package))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PanaError::ToolSpawnFailed {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PanaError::ToolOutput(io::Error::other("stdout not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| PanaError::ToolOutput(io::Error::other("stderr not captured")))?;

        let stdout_lines = SplitStream::new(BufReader::new(stdout).split(b'\n'))
            .map(|line| (OutputStream::Stdout, line));
        let stderr_lines = SplitStream::new(BufReader::new(stderr).split(b'\n'))
            .map(|line| (OutputStream::Stderr, line));
        let mut lines = stream::select(stdout_lines, stderr_lines);

        let mut captured_stdout = Vec::new();
        let mut captured_stderr = Vec::new();
        let mut output_error = None;

        while let Some((source, line)) = lines.next().await {
            let line = match line {
                Ok(raw) => decode_line(&raw),
                Err(err) => {
                    output_error = Some(err);
                    break;
                }
            };
            if let Err(err) = writeln!(echo, "> {line}") {
                output_error = Some(err);
                break;
            }
            match source {
                OutputStream::Stdout => captured_stdout.push(line),
                OutputStream::Stderr => captured_stderr.push(line),
            }
        }
        if output_error.is_none() {
            output_error = echo.flush().err();
        }

        // Close our pipe ends so the tool cannot block on a full pipe, then
        // always reap it to learn its real exit status.
        drop(lines);
        let status = child.wait().await.map_err(PanaError::ToolOutput)?;
        // Killed by a signal.
        let exit_code = status.code().unwrap_or(-1);
        debug!(
            exit_code,
            stdout_lines = captured_stdout.len(),
            stderr_lines = captured_stderr.len(),
            "Analysis tool exited"
        );

        // A failing tool outranks a broken pipe.
        if let Some(err) = output_error {
            if exit_code == 0 {
                return Err(PanaError::ToolOutput(err));
            }
            warn!(error = %err, "Lost part of the analysis tool output");
        }

        Ok(InvocationResult {
            exit_code,
            stdout: captured_stdout.join("\n"),
            stderr: captured_stderr.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_default_command_args() {
        let args = Analyzer::default().command_args(Path::new("packages/my pkg"));
        let expected: Vec<OsString> = [
            "pub",
            "global",
            "run",
            "pana",
            "--source",
            "path",
            "packages/my pkg",
            "--scores",
            "--no-warning",
        ]
        .map(OsString::from)
        .to_vec();

        assert_eq!(args, expected);
        assert_eq!(Analyzer::default().program(), "flutter");
    }

    #[test]
    fn test_custom_leading_args() {
        let analyzer = Analyzer::new("dart", ["pub", "global", "run", "pana"]);
        let args = analyzer.command_args(Path::new("."));
        assert_eq!(analyzer.program(), "dart");
        assert_eq!(args[0], OsString::from("pub"));
        assert_eq!(args[6], OsString::from("."));
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_spawn() {
        let analyzer = Analyzer::new("pana-scores-no-such-program", Vec::<String>::new());
        let mut echo = Vec::<u8>::new();

        let err = analyzer
            .invoke(&PathBuf::from("."), &mut echo)
            .await
            .unwrap_err();

        assert!(matches!(err, PanaError::ToolSpawnFailed { .. }));
        assert!(echo.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invoke_captures_and_echoes_output() {
        let analyzer = Analyzer::new(
            "sh",
            ["-c", "echo first; echo second; echo warning >&2; exit 3", "pana"],
        );
        let mut echo = Vec::new();

        let result = analyzer
            .invoke(&PathBuf::from("."), &mut echo)
            .await
            .unwrap();

        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stdout, "first\nsecond");
        assert_eq!(result.stderr, "warning");

        let echoed = String::from_utf8(echo).unwrap();
        assert!(echoed.contains("> first\n"));
        assert!(echoed.contains("> second\n"));
        assert!(echoed.contains("> warning\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invalid_utf8_output_keeps_exit_code_and_echo() {
        let analyzer = Analyzer::new(
            "sh",
            ["-c", "printf 'caf\\351\\n' >&2; echo after; exit 3", "pana"],
        );
        let mut echo = Vec::new();

        let result = analyzer
            .invoke(&PathBuf::from("."), &mut echo)
            .await
            .unwrap();

        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stdout, "after");
        assert_eq!(result.stderr, "caf\u{FFFD}");

        let echoed = String::from_utf8(echo).unwrap();
        assert!(echoed.contains("> caf\u{FFFD}\n"));
        assert!(echoed.contains("> after\n"));
    }

    #[test]
    fn test_decode_line_strips_carriage_return() {
        assert_eq!(decode_line(b"warning\r"), "warning");
        assert_eq!(decode_line(b"plain"), "plain");
        assert_eq!(decode_line(b"caf\xe9"), "caf\u{FFFD}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invoke_passes_package_path_verbatim() {
        // $3 is the package path: "--source" "path" <package>.
        let analyzer = Analyzer::new("sh", ["-c", "echo \"$3\"", "pana"]);
        let mut echo = Vec::new();

        let result = analyzer
            .invoke(&PathBuf::from("dir with spaces; rm -rf x"), &mut echo)
            .await
            .unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "dir with spaces; rm -rf x");
    }
}
