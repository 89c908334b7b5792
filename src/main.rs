mod calc;
mod completion;
mod config;
mod distribution;
mod error;
mod grades;
mod ipc;
mod level;
mod logging;
mod model;
mod snapshot;
mod stats;

use anyhow::Context;
use std::io::{self, BufRead, Write};

fn main() -> anyhow::Result<()> {
    logging::init_tracing().context("failed to initialise logging")?;
    let config = config::EngineConfig::from_env()?;
    let mut state = ipc::AppState::new(config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "assessd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            // Without a parsed id there is nothing to correlate with.
            Err(e) => ipc::err("", "bad_json", e.to_string(), None),
        };
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    Ok(())
}
