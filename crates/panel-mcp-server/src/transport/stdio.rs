//! stdio transport for MCP JSON-RPC
//!
//! Newline-delimited messages on stdin and stdout. The process is a single
//! session, so no session identifiers are exchanged.

use std::sync::Arc;

use panel_mcp_core::{PanelError, Result};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use crate::dispatch::Dispatcher;
use crate::mcp::Response;
use crate::session::SessionState;

/// Run the MCP server on stdio until stdin reaches EOF
pub async fn run(dispatcher: Arc<Dispatcher>) -> Result<()> {
    serve(dispatcher, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve one session over an arbitrary line-oriented reader and writer
pub async fn serve<R, W>(dispatcher: Arc<Dispatcher>, input: R, output: W) -> Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let output = Arc::new(Mutex::new(output));
    let state = SessionState::new();
    let mut reader = BufReader::new(input);
    let mut line = String::new();

    info!("Panel MCP server starting on stdio");

    // Forward log notifications pushed on the session
    let mut rx = state.subscribe();
    let output_for_events = output.clone();
    let event_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notification) => {
                    if let Err(e) = write_message(&output_for_events, &notification).await {
                        error!("Failed to write notification: {}", e);
                        break;
                    }
                }
                Err(RecvError::Closed) => {
                    debug!("Notification channel closed");
                    break;
                }
                Err(RecvError::Lagged(n)) => {
                    warn!("Notification forwarder lagged, missed {} messages", n);
                }
            }
        }
    });

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| PanelError::TransportError(format!("Failed to read stdin: {}", e)))?;

        if bytes_read == 0 {
            // EOF - client disconnected
            info!("Client disconnected (EOF)");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        debug!("Received: {}", trimmed);

        let payload = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                write_message(&output, &Response::parse_error(e)).await?;
                continue;
            }
        };

        match dispatcher.handle_payload(payload, &state).await {
            Ok(Some(reply)) => write_message(&output, &reply).await?,
            Ok(None) => {}
            Err(rejection) => write_message(&output, &rejection).await?,
        }
    }

    event_task.abort();
    Ok(())
}

async fn write_message<W, T>(output: &Mutex<W>, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let json = serde_json::to_string(message)?;
    debug!("Sending: {}", json);

    let mut out = output.lock().await;
    out.write_all(json.as_bytes())
        .await
        .map_err(|e| PanelError::TransportError(format!("Failed to write stdout: {}", e)))?;
    out.write_all(b"\n")
        .await
        .map_err(|e| PanelError::TransportError(format!("Failed to write newline: {}", e)))?;
    out.flush()
        .await
        .map_err(|e| PanelError::TransportError(format!("Failed to flush stdout: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePanel;
    use serde_json::Value;

    async fn run_lines(input: &str, expected: usize) -> Vec<Value> {
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(FakePanel::new())));
        let (client, server) = tokio::io::duplex(64 * 1024);

        serve(dispatcher, input.as_bytes(), server).await.unwrap();

        let mut reader = BufReader::new(client);
        let mut replies = Vec::new();
        for _ in 0..expected {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            replies.push(serde_json::from_str(&line).unwrap());
        }
        replies
    }

    #[tokio::test]
    async fn test_stdio_round() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-06-18","capabilities":{},"clientInfo":{"name":"t","version":"1"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        );
        let replies = run_lines(input, 2).await;

        let ids: Vec<&Value> = replies.iter().map(|r| &r["id"]).collect();
        assert_eq!(ids, vec![&Value::from(1), &Value::from(2)]);
    }

    #[tokio::test]
    async fn test_stdio_parse_error() {
        let replies = run_lines("{not json\n", 1).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0]["error"]["code"], -32700);
        assert!(replies[0]["id"].is_null());
    }
}
