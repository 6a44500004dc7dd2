use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "RAG vs LLM answer arena server")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Overrides `server.host`.
    #[arg(long)]
    pub host: Option<String>,

    /// Overrides `server.port`.
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AskArgs {
    /// Query text passed to the answer script on stdin.
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Pretty-print the JSON output.
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

impl AskArgs {
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Run the single-answer script once and print the result.
    Query(AskArgs),
    /// Run the comparison script once and print the result.
    Compare(AskArgs),
}
