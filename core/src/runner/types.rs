use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// A fully resolved command line for one answer script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSpec {
    pub program: String,
    pub args: Vec<String>,
    pub envs: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
}

impl ScriptSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: HashMap::new(),
            workdir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.insert(key.into(), value.into());
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// `program args...` for logs.
    pub fn display(&self) -> String {
        let mut s = self.program.clone();
        for a in &self.args {
            s.push(' ');
            s.push_str(a);
        }
        s
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    pub exit_code: i32,
    pub stderr: String,
    pub duration_ms: u64,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Exited(ProcessExit),
    /// The bounded wait expired; the child was killed and reaped.
    TimedOut { after: Duration, stderr: String },
}
