//! One answer-process invocation per inbound query.
//!
//! A [`Dispatcher`] only holds immutable launch settings. Every call spawns
//! its own process and owns its own buffers, so concurrent requests never
//! share mutable state.

mod compare;
mod query;

use std::time::Duration;

use crate::config::ScriptsConfig;
use crate::error::DispatchError;
use crate::runner::ScriptSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Streamed `final_answer` + `reward_score` lines.
    Single,
    /// One JSON document comparing both pipelines.
    Compare,
}

impl DispatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchMode::Single => "single",
            DispatchMode::Compare => "compare",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    query_script: ScriptSpec,
    compare_script: ScriptSpec,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(query_script: ScriptSpec, compare_script: ScriptSpec, timeout: Duration) -> Self {
        Self {
            query_script,
            compare_script,
            timeout,
        }
    }

    pub fn from_config(cfg: &ScriptsConfig) -> Self {
        let python = cfg.resolve_python();
        let spec_for = |script: &str| {
            let mut spec = ScriptSpec::new(python.clone()).arg(script);
            if let Some(dir) = &cfg.workdir {
                spec = spec.workdir(dir);
            }
            for (k, v) in &cfg.envs {
                spec = spec.env(k, v);
            }
            spec
        };

        Self::new(
            spec_for(&cfg.query_script),
            spec_for(&cfg.compare_script),
            Duration::from_secs(cfg.timeout_secs),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn script(&self, mode: DispatchMode) -> &ScriptSpec {
        match mode {
            DispatchMode::Single => &self.query_script,
            DispatchMode::Compare => &self.compare_script,
        }
    }
}

/// Rejects the query before any process is started.
fn require_query(query: &str) -> Result<(), DispatchError> {
    if query.is_empty() {
        return Err(DispatchError::EmptyQuery);
    }
    Ok(())
}
