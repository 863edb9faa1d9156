use crate::core::errors::{ExecError, ScanError};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: u128,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run an external tool with a hard timeout, capturing both output streams
/// incrementally to avoid pipe-buffer stalls on chatty tools.
///
/// A non-zero exit is returned as a normal result: nmap exits non-zero for
/// unreachable hosts, which is an ordinary outcome mid-batch and the caller
/// still wants whatever output was produced. Spawn failures and timeouts are
/// errors.
pub async fn execute(
    tool: &str,
    args: &[String],
    time_limit: Duration,
) -> Result<CommandResult, ScanError> {
    let start = Instant::now();

    tracing::debug!("executing: {} {:?}", tool, args);

    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            ScanError::Exec(ExecError {
                tool: tool.to_string(),
                args: args.to_vec(),
                exit_code: None,
                stderr_tail: format!("failed to spawn: {}", e),
                duration_ms: start.elapsed().as_millis(),
            })
        })?;

    let stdout_handle = child.stdout.take().expect("stdout piped");
    let stderr_handle = child.stderr.take().expect("stderr piped");

    let (stdout_result, stderr_result, wait_result) = tokio::join!(
        read_lines(BufReader::new(stdout_handle)),
        read_lines(BufReader::new(stderr_handle)),
        timeout(time_limit, child.wait()),
    );

    let duration_ms = start.elapsed().as_millis();

    let status = match wait_result {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            return Err(ScanError::Exec(ExecError {
                tool: tool.to_string(),
                args: args.to_vec(),
                exit_code: None,
                stderr_tail: format!("process error: {}", e),
                duration_ms,
            }));
        }
        Err(_) => {
            let _ = child.kill().await;
            return Err(ScanError::ProbeTimeout(time_limit));
        }
    };

    Ok(CommandResult {
        stdout: stdout_result?,
        stderr: stderr_result?,
        exit_code: status.code().unwrap_or(-1),
        duration_ms,
    })
}

async fn read_lines<R>(reader: BufReader<R>) -> Result<String, ScanError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = Vec::new();
    let mut reader = reader.lines();

    while let Some(line) = reader.next_line().await? {
        lines.push(line);
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout() {
        let result = execute("echo", &["hello".to_string()], Duration::from_secs(5))
            .await
            .unwrap();
        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_not_an_error() {
        let result = execute(
            "sh",
            &["-c".to_string(), "echo partial; exit 3".to_string()],
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stdout.trim(), "partial");
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let err = execute(
            "sleep",
            &["30".to_string()],
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ScanError::ProbeTimeout(_)));
    }

    #[tokio::test]
    async fn test_missing_binary_is_exec_error() {
        let err = execute("definitely-not-a-real-tool", &[], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Exec(_)));
    }
}
