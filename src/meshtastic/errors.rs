use thiserror::Error;

/// Errors raised by the text parsers and the identifier codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// The `--info` dump is missing the node list or its JSON is unreadable.
    #[error("malformed node info: {0}")]
    MalformedNodeInfo(String),

    /// A node id that is not `!` followed by hexadecimal digits.
    #[error("malformed node identifier: {0:?}")]
    MalformedIdentifier(String),
}

/// Failures invoking the external `meshtastic` command line tool.
#[derive(Debug, Error)]
pub enum CliError {
    /// The program could not be launched at all (missing binary, permissions).
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited unsuccessfully.
    #[error("command exited with {code:?}: {stderr}")]
    Exit {
        code: Option<i32>,
        stderr: String,
        stdout: String,
    },

    /// The invocation exceeded the configured outer bound and was killed.
    #[error("command timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Stdout was not valid UTF-8.
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
