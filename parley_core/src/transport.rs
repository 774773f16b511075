use serde_json::Value;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::error::ConnectorError;
use crate::mcp_server::JsonRpcHandler;

/// Stdio transport for MCP server: one JSON-RPC message per line.
pub struct StdioTransport {
    handler: JsonRpcHandler,
}

impl StdioTransport {
    pub fn new(handler: JsonRpcHandler) -> Self {
        Self { handler }
    }

    /// Run the stdio transport, reading from stdin and writing to stdout
    /// until stdin closes.
    pub async fn run(&self) -> io::Result<()> {
        info!("Starting stdio transport");
        let reader = BufReader::new(tokio::io::stdin());
        let mut writer = tokio::io::stdout();
        self.serve(reader, &mut writer).await
    }

    /// Serve requests from any line-oriented reader. Requests are handled
    /// strictly in arrival order.
    pub async fn serve<R, W>(&self, mut reader: R, writer: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!("EOF reached on input");
                    return Ok(());
                }
                Ok(_) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Err(e) = self.process_line(&line, writer).await {
                        error!("Error processing line: {}", e);
                        return Err(e);
                    }
                }
                Err(e) => {
                    error!("Error reading input: {}", e);
                    return Err(e);
                }
            }
        }
    }

    /// Process a single line of input
    async fn process_line<W>(&self, line: &str, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        debug!("Processing line: {}", line.trim_end());

        match serde_json::from_str::<Value>(line) {
            Ok(request) => {
                if let Some(response) = self.handler.handle_request(request).await {
                    write_response(writer, &response).await?;
                }
            }
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);

                let mut error = ConnectorError::ParseError.to_jsonrpc_error();
                error["data"] = Value::String(e.to_string());
                let error_response = serde_json::json!({
                    "jsonrpc": "2.0",
                    "error": error,
                    "id": null
                });

                write_response(writer, &error_response).await?;
            }
        }

        Ok(())
    }
}

async fn write_response<W>(writer: &mut W, response: &Value) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response_str = serde_json::to_string(response)?;

    writer.write_all(response_str.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;

    debug!("Sent response: {}", response_str);

    Ok(())
}
