//! `$(command)` execution for the resolver.

use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::warn;

use super::parser::shell_refs;

/// Hard deadline for each shell command.
const SHELL_DEADLINE: Duration = Duration::from_secs(5);

/// Expands every `$(command)` expression in `input`.
///
/// On success the command's trimmed stdout is substituted. On failure
/// (non-zero exit, spawn error, or deadline exceeded) the original
/// `$(command)` text is preserved verbatim and a formatted message is
/// appended to `errors`. Failures never abort expansion of the rest of the
/// string.
pub(super) async fn expand(input: &str, errors: &mut Vec<String>) -> String {
    let refs = shell_refs(input);
    if refs.is_empty() {
        return input.to_string();
    }

    let mut result = String::with_capacity(input.len());
    let mut last_end = 0;

    for shell_ref in refs {
        result.push_str(&input[last_end..shell_ref.span.start]);
        match run(&shell_ref.command).await {
            Ok(stdout) => result.push_str(&stdout),
            Err(message) => {
                warn!(command = %shell_ref.command, error = %message, "shell expansion failed");
                errors.push(message);
                result.push_str(&input[shell_ref.span.clone()]);
            }
        }
        last_end = shell_ref.span.end;
    }

    result.push_str(&input[last_end..]);
    result
}

/// Runs one command under `sh -c` with the hard deadline.
async fn run(command: &str) -> Result<String, String> {
    let output = timeout(
        SHELL_DEADLINE,
        Command::new("sh").arg("-c").arg(command).output(),
    )
    .await
    .map_err(|_| {
        format!(
            "shell command '{command}' timed out after {}s",
            SHELL_DEADLINE.as_secs()
        )
    })?
    .map_err(|err| format!("shell command '{command}' failed to start: {err}"))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.is_empty() {
            Err(format!("shell command '{command}' exited with {}", output.status))
        } else {
            Err(format!("shell command '{command}' failed: {stderr}"))
        }
    }
}
