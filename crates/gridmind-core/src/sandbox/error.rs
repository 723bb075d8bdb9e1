//! Error types for the sandbox module.

/// Host-side errors while driving a sandbox child.
///
/// These cover failures of the *harness* (spawning, pipe plumbing). Failures
/// of the untrusted program itself are not errors; they are reported in
/// [`super::SandboxOutcome`] and scored as zero.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("failed to spawn sandbox child `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("sandbox child stdin unavailable")]
    StdinUnavailable,

    #[error("i/o error while driving sandbox child: {0}")]
    ChildIo(#[from] std::io::Error),

    #[error("failed to encode sandbox payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Result type for sandbox operations.
pub type SandboxResult<T> = std::result::Result<T, SandboxError>;
