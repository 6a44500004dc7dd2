use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::error::RunnerError;

use super::types::ScriptSpec;

pub(crate) fn spawn(spec: &ScriptSpec) -> Result<Child, RunnerError> {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .envs(&spec.envs)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // A dropped request future must not leave the interpreter running.
        .kill_on_drop(true);

    if let Some(dir) = &spec.workdir {
        cmd.current_dir(dir);
    }

    cmd.spawn().map_err(|source| RunnerError::Spawn {
        program: spec.program.clone(),
        source,
    })
}
