//! One-shot dispatch from the command line.

use arena_core::api::{AppContext, DispatchMode};
use serde_json::Value;

use crate::commands::cli::AskArgs;
use crate::http::error::dispatch_body;

/// Runs one query in `mode` and prints the same JSON body the HTTP route
/// would return. Returns the process exit code.
pub async fn handle_ask(args: AskArgs, mode: DispatchMode, ctx: &AppContext) -> anyhow::Result<i32> {
    let query = args.query_text();
    let dispatcher = ctx.dispatcher();

    let (body, code) = match mode {
        DispatchMode::Single => match dispatcher.query(&query).await {
            Ok(answer) => (serde_json::to_value(answer)?, 0),
            Err(e) => (dispatch_body(mode, &e), 1),
        },
        DispatchMode::Compare => match dispatcher.compare(&query).await {
            Ok(doc) => (doc, 0),
            Err(e) => (dispatch_body(mode, &e), 1),
        },
    };

    println!("{}", render(&body, args.pretty)?);
    Ok(code)
}

fn render(body: &Value, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(body)
    } else {
        serde_json::to_string(body)
    }
}
