use serde_json::Value;

use crate::error::DispatchError;
use crate::protocol::RawCollector;
use crate::runner::{run_script, RunStatus};

use super::{require_query, DispatchMode, Dispatcher};

impl Dispatcher {
    /// Compare mode: the entire stdout must parse as one JSON document,
    /// which is returned uninterpreted.
    #[tracing::instrument(name = "dispatch", skip_all, fields(run_id = %uuid::Uuid::new_v4(), mode = "compare"))]
    pub async fn compare(&self, query: &str) -> Result<Value, DispatchError> {
        require_query(query)?;

        let spec = self.script(DispatchMode::Compare);
        let mut out = RawCollector::new();
        let status = run_script(spec, query, &mut out, self.timeout).await?;

        let exit = match status {
            RunStatus::Exited(exit) => exit,
            RunStatus::TimedOut { after, stderr } => {
                return Err(DispatchError::TimedOut {
                    after_secs: after.as_secs(),
                    stderr,
                });
            }
        };

        tracing::info!(
            mode = DispatchMode::Compare.as_str(),
            exit_code = exit.exit_code,
            duration_ms = exit.duration_ms,
            stdout_bytes = out.as_bytes().len(),
            "answer process finished"
        );

        if !exit.success() {
            return Err(DispatchError::ProcessFailed {
                exit_code: exit.exit_code,
                stderr: exit.stderr,
            });
        }

        match serde_json::from_slice::<Value>(out.as_bytes()) {
            Ok(doc) => Ok(doc),
            Err(source) => {
                let stdout = out.into_string();
                tracing::error!(stdout = %stdout, "answer process output is not valid JSON");
                Err(DispatchError::InvalidDocument { stdout, source })
            }
        }
    }
}
