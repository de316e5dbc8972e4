//! Newline-delimited JSON bridge between the tracker and its host process
//! (typically a browser's native-messaging shim).
//!
//! Each input line is one `Command`; each is answered by exactly one line,
//! `{"ok":true,"result":...}` or `{"ok":false,"error":"..."}`. Observer
//! events are interleaved on the same output as `{"event":...}` lines.

use anyhow::{Context, Result};
use serde_json::json;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::{broadcast::error::RecvError, mpsc},
    task::JoinHandle,
};

use crate::tracker::{handle_command, Command, CommandResponse, TrackerController};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Answers commands read from `input` until it is exhausted or the output
/// side goes away.
pub async fn serve<R>(
    controller: &TrackerController,
    input: R,
    output: mpsc::UnboundedSender<String>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("failed to read command")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<Command>(line) {
            Ok(command) => handle_command(controller, command).await,
            Err(err) => Err(format!("invalid command: {err}")),
        };
        if output.send(render_reply(reply)).is_err() {
            break;
        }
    }
    Ok(())
}

pub fn render_reply(reply: Result<CommandResponse, String>) -> String {
    let value = match reply {
        Ok(result) => json!({ "ok": true, "result": result }),
        Err(error) => json!({ "ok": false, "error": error }),
    };
    value.to_string()
}

/// Copies tracker events to `output` until either side closes.
pub fn forward_events(
    controller: &TrackerController,
    output: mpsc::UnboundedSender<String>,
) -> JoinHandle<()> {
    let mut events = controller.subscribe();

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => {
                        if output.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => log_warn!("Failed to encode tracker event: {err}"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    log_warn!("Host output fell behind; dropped {skipped} tracker events")
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
