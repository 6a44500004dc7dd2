use std::path::Path;

use anyhow::Context;
use arena_core::api::{AppContext, DispatchMode, LogConfig};
use arena_plugins::services::PluginServicesFactory;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod http;

use commands::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    let cfg = arena_core::config::load(args.config.as_deref())
        .with_context(|| config_hint(args.config.as_deref()))?;
    let log_guard = init_tracing(&cfg.log)?;

    let ctx = AppContext::build(cfg, &PluginServicesFactory)?;

    let code = match args.command {
        cli::Commands::Serve(serve_args) => {
            commands::http_server::handle_serve(serve_args, ctx).await?;
            0
        }
        cli::Commands::Query(ask_args) => {
            commands::ask::handle_ask(ask_args, DispatchMode::Single, &ctx).await?
        }
        cli::Commands::Compare(ask_args) => {
            commands::ask::handle_ask(ask_args, DispatchMode::Compare, &ctx).await?
        }
    };

    // flush the file writer before exiting
    drop(log_guard);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn config_hint(path: Option<&Path>) -> String {
    match path {
        Some(p) => format!("failed to load config from {}", p.display()),
        None => "failed to load configuration".to_string(),
    }
}

/// stderr always; a daily rolling file as well when `log.dir` is set.
fn init_tracing(log: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    match &log.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log dir {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "arena.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            Ok(None)
        }
    }
}
