use crate::error::DispatchError;
use crate::protocol::{ProtocolReader, ScoredAnswer};
use crate::runner::{run_script, RunStatus};

use super::{require_query, DispatchMode, Dispatcher};

impl Dispatcher {
    /// Single-answer mode: resolves only when the process exits 0 after
    /// emitting both `final_answer` and `reward_score`.
    #[tracing::instrument(name = "dispatch", skip_all, fields(run_id = %uuid::Uuid::new_v4(), mode = "single"))]
    pub async fn query(&self, query: &str) -> Result<ScoredAnswer, DispatchError> {
        require_query(query)?;

        let spec = self.script(DispatchMode::Single);
        let mut reader = ProtocolReader::new();
        let status = run_script(spec, query, &mut reader, self.timeout).await?;

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
            mode = DispatchMode::Single.as_str(),
            exit_code = exit.exit_code,
            duration_ms = exit.duration_ms,
            discarded_lines = reader.discarded_lines(),
            "answer process finished"
        );

        if !exit.success() {
            return Err(DispatchError::ProcessFailed {
                exit_code: exit.exit_code,
                stderr: exit.stderr,
            });
        }

        reader.finish().map_err(|stdout| {
            tracing::error!(stdout = %stdout, "answer process exited without final_answer/reward_score");
            DispatchError::MissingFields { stdout }
        })
    }
}
