// core/src/error/dispatch_error.rs
use thiserror::Error;

use super::RunnerError;

/// Terminal failure of one answer-process invocation.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Query is required")]
    EmptyQuery,

    #[error("answer process could not be run")]
    Runner(#[from] RunnerError),

    #[error("answer process exited with code {exit_code}")]
    ProcessFailed { exit_code: i32, stderr: String },

    /// Exit status 0, but `final_answer` or `reward_score` never arrived.
    #[error("answer process finished without final_answer/reward_score")]
    MissingFields { stdout: String },

    #[error("answer process output is not a JSON document")]
    InvalidDocument {
        stdout: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("answer process timed out after {after_secs}s")]
    TimedOut { after_secs: u64, stderr: String },
}

impl DispatchError {
    /// Diagnostic text attached to the failure: captured stderr for process
    /// failures, the raw stdout buffer for protocol violations.
    pub fn details(&self) -> String {
        match self {
            DispatchError::EmptyQuery => String::new(),
            DispatchError::Runner(e) => runner_details(e),
            DispatchError::ProcessFailed { stderr, .. } => stderr.clone(),
            DispatchError::MissingFields { stdout } => stdout.clone(),
            DispatchError::InvalidDocument { stdout, .. } => stdout.clone(),
            DispatchError::TimedOut { stderr, .. } => stderr.clone(),
        }
    }
}

fn runner_details(err: &RunnerError) -> String {
    let mut out = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(s) = source {
        out.push_str(": ");
        out.push_str(&s.to_string());
        source = s.source();
    }
    out
}
