// core/src/error/runner_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to spawn process: {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("child process has no {0} pipe")]
    MissingPipe(&'static str),

    #[error("io error while streaming: {stream}")]
    StreamIo {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for process")]
    Wait(#[source] std::io::Error),
}
