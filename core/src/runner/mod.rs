pub mod exit;
mod run;
mod spawn;
mod types;

pub use run::run_script;
pub use types::{ProcessExit, RunStatus, ScriptSpec};
