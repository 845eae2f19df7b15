//! Execution of one embedded command as a standalone shell script.
//!
//! Each command is written verbatim to a uniquely-named temporary script,
//! run through `bash` in the caller's working directory, and the script is
//! removed again on every exit path. The outcome is structural: a non-zero
//! exit code is data for the caller to judge, not an error of this module.

use std::io::Write;
use std::process::{Command, Stdio};

use cfg_if::cfg_if;
use tracing::warn;

use crate::composer::TagCase;
use crate::error::{ComposeError, Result};
use crate::utils::string::normalize_output;

/// Ceiling on combined captured output per command. Output beyond this is a
/// hard failure of the call, never silent truncation.
pub const MAX_COMMAND_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

const SCRIPT_FILE_PREFIX: &str = "context-composer-";
const LAUNCH_SHELL_COMMAND: &str = "bash";
const COMMAND_PROMPT_PREFIX: &str = "  ▶ ";

/// Captured outcome of one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run `command` with the default output ceiling.
pub fn execute_command(command: &str) -> Result<CommandResult> {
    execute_command_with_limit(command, MAX_COMMAND_OUTPUT_BYTES)
}

/// Run `command` as a temporary script and capture its output as text.
///
/// A launch failure (the interpreter cannot be spawned) is reported through
/// the same structural result, with the launch error as captured stderr.
pub fn execute_command_with_limit(command: &str, max_output_bytes: usize) -> Result<CommandResult> {
    let mut script = tempfile::Builder::new()
        .prefix(SCRIPT_FILE_PREFIX)
        .suffix(".sh")
        .tempfile()?;
    script.write_all(command.as_bytes())?;
    script.flush()?;
    mark_executable(script.path())?;

    let output = Command::new(LAUNCH_SHELL_COMMAND)
        .arg(script.path())
        .stdin(Stdio::null())
        .output();

    // The script is deleted before the outcome is even inspected; failure to
    // remove it must never mask the command's own result.
    if let Err(err) = script.close() {
        warn!("failed to remove temporary command script: {}", err);
    }

    let output = match output {
        Ok(output) => output,
        Err(err) => {
            return Ok(CommandResult {
                stdout: String::new(),
                stderr: err.to_string(),
                exit_code: 1,
            })
        }
    };

    if output.stdout.len() + output.stderr.len() > max_output_bytes {
        return Err(ComposeError::OutputLimitExceeded {
            command: command.to_string(),
            limit: max_output_bytes,
        });
    }

    Ok(CommandResult {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        // A child killed by a signal has no exit code; report it as a plain
        // failure.
        exit_code: output.status.code().unwrap_or(1),
    })
}

cfg_if! {
    if #[cfg(unix)] {
        fn mark_executable(path: &std::path::Path) -> std::io::Result<()> {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        }
    } else {
        fn mark_executable(_path: &std::path::Path) -> std::io::Result<()> {
            Ok(())
        }
    }
}

/// Wrap a command and its captured output in an indented tag block.
///
/// The body is the combined stdout+stderr, one line per output line with
/// trailing blank space trimmed; empty combined output produces no body
/// lines at all.
pub fn format_command_output(
    command: &str,
    result: &CommandResult,
    tag_case: TagCase,
    indent_spaces: usize,
) -> String {
    let tag_name = match tag_case {
        TagCase::Pascal => "Command",
        TagCase::Kebab => "command",
    };
    let combined = normalize_output(&format!("{}{}", result.stdout, result.stderr));
    let indent = " ".repeat(indent_spaces);

    let mut lines = vec![
        format!("{}<{}>", indent, tag_name),
        format!("{}{}{}", indent, COMMAND_PROMPT_PREFIX, command),
    ];
    if !combined.is_empty() {
        for line in combined.split('\n') {
            lines.push(format!("{}  {}", indent, line));
        }
    }
    lines.push(format!("{}</{}>", indent, tag_name));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use cfg_if::cfg_if;

    use super::{format_command_output, CommandResult, TagCase};

    fn result(stdout: &str, stderr: &str, exit_code: i32) -> CommandResult {
        CommandResult {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code,
        }
    }

    #[test]
    fn formats_pascal_block() {
        let formatted = format_command_output("ls -la", &result("total 12\n", "", 0), TagCase::Pascal, 0);
        assert_eq!(formatted, "<Command>\n  ▶ ls -la\n  total 12\n</Command>");
    }

    #[test]
    fn formats_kebab_block_with_indent() {
        let formatted = format_command_output("pwd", &result("/root\n", "", 0), TagCase::Kebab, 2);
        assert_eq!(formatted, "  <command>\n    ▶ pwd\n    /root\n  </command>");
    }

    #[test]
    fn empty_output_has_no_body_lines() {
        let formatted = format_command_output("true", &result("", "", 0), TagCase::Pascal, 0);
        assert_eq!(formatted, "<Command>\n  ▶ true\n</Command>");
    }

    #[test]
    fn stderr_follows_stdout() {
        let formatted = format_command_output("x", &result("out\n", "oops\n", 0), TagCase::Pascal, 0);
        assert_eq!(formatted, "<Command>\n  ▶ x\n  out\n  oops\n</Command>");
    }

    cfg_if! {
        if #[cfg(unix)] {
            use std::path::PathBuf;

            use super::{execute_command, execute_command_with_limit, SCRIPT_FILE_PREFIX};
            use crate::error::ComposeError;

            fn leftover_scripts() -> Vec<PathBuf> {
                std::fs::read_dir(std::env::temp_dir())
                    .unwrap()
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| {
                        path.file_name()
                            .and_then(|name| name.to_str())
                            .map(|name| name.starts_with(SCRIPT_FILE_PREFIX) && name.ends_with(".sh"))
                            .unwrap_or(false)
                    })
                    .collect()
            }

            // Success, failure and overflow in one sequential test so the
            // temp-dir scan cannot observe another invocation in flight.
            #[test]
            fn script_lifecycle() {
                let before = leftover_scripts();

                let ok = execute_command("echo oui").unwrap();
                assert_eq!(ok.exit_code, 0);
                assert_eq!(ok.stdout, "oui\n");
                assert_eq!(ok.stderr, "");

                let failed = execute_command("echo boom 1>&2; exit 7").unwrap();
                assert_eq!(failed.exit_code, 7);
                assert_eq!(failed.stdout, "");
                assert_eq!(failed.stderr, "boom\n");

                let overflow = execute_command_with_limit("printf '0123456789abcdef'", 8);
                assert!(matches!(
                    overflow,
                    Err(ComposeError::OutputLimitExceeded { limit: 8, .. })
                ));

                let multi = execute_command("echo oui; echo non").unwrap();
                assert_eq!(multi.exit_code, 0);
                assert_eq!(multi.stdout, "oui\nnon\n");

                assert_eq!(leftover_scripts(), before);
            }
        }
    }
}
