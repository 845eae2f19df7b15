use thiserror::Error;

pub type Result<T> = std::result::Result<T, ComposeError>;

/// Errors raised while replacing embedded commands in a document.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// An embedded command exited with a non-zero status. Carries the
    /// command source and its combined captured output so the failure can
    /// be reported without re-running anything.
    #[error("failed to execute embedded command: {command} (exit code {exit_code})\noutput: {output}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        output: String,
    },

    /// An embedded command produced more output than the configured ceiling.
    #[error("embedded command produced more than {limit} bytes of output: {command}")]
    OutputLimitExceeded { command: String, limit: usize },

    /// Staging the temporary command script failed.
    #[error("failed to stage command script: {0}")]
    Io(#[from] std::io::Error),
}
