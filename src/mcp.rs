// MCP hosting over stdio
//
// Newline-delimited JSON-RPC 2.0. Each `tools/call` runs on its own task so
// slow API calls (and payment retries) do not hold up other requests; all
// replies go through one writer task so lines never interleave on stdout.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::error::ToolError;
use crate::models::{InvocationRequest, ToolDefinition};
use crate::reporting::format_error;
use crate::tools::ToolDispatcher;

/// Newest protocol revision this server speaks
pub const PROTOCOL_VERSION: &str = "2025-06-18";
const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

pub struct McpServer {
    dispatcher: ToolDispatcher,
}

impl McpServer {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Handle one JSON-RPC message. Notifications produce no reply.
    pub async fn handle_message(&self, message: Value) -> Option<Value> {
        let Value::Object(obj) = message else {
            return Some(error_message(
                Value::Null,
                INVALID_REQUEST,
                "top-level message must be an object",
            ));
        };

        // no id means notification
        let id = obj.get("id").cloned();
        let Some(method) = obj.get("method").and_then(Value::as_str) else {
            return id.map(|id| error_message(id, INVALID_REQUEST, "missing method field"));
        };
        let params = obj.get("params").cloned().unwrap_or(Value::Null);

        tracing::debug!(method = %method, "MCP request");

        let id = id?;

        let response = match method {
            "initialize" => Ok(self.handle_initialize(&params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.handle_list_tools()),
            "tools/call" => self.handle_tool_call(&params).await,
            other => Err((METHOD_NOT_FOUND, format!("unsupported method '{}'", other))),
        };

        Some(match response {
            Ok(result) => result_message(id, result),
            Err((code, message)) => error_message(id, code, &message),
        })
    }

    fn handle_initialize(&self, params: &Value) -> Value {
        let requested = params.get("protocolVersion").and_then(Value::as_str);
        let version = requested
            .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
            .unwrap_or(PROTOCOL_VERSION);

        json!({
            "protocolVersion": version,
            "serverInfo": {
                "name": "shield-mcp",
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {
                "tools": { "listChanged": false },
            },
            "instructions": format!(
                "Security intelligence lookups. Mode: {}.",
                self.dispatcher.invoker().mode()
            ),
        })
    }

    fn handle_list_tools(&self) -> Value {
        let tools: Vec<Value> = self.dispatcher.tools().iter().map(tool_entry).collect();
        json!({ "tools": tools })
    }

    async fn handle_tool_call(&self, params: &Value) -> Result<Value, (i64, String)> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| (INVALID_PARAMS, "tool invocation missing name".to_string()))?;

        let request = InvocationRequest {
            tool_name: name.to_string(),
            arguments: string_arguments(params.get("arguments")),
        };

        let reply = match self.dispatcher.call(&request).await {
            Ok(reply) => reply,
            Err(err @ ToolError::UnknownTool(_)) => return Err((INVALID_PARAMS, err.to_string())),
            Err(err) => {
                tracing::warn!(tool = %name, error = %err, "Tool call failed");
                format_error(&err)
            }
        };

        serde_json::to_value(&reply).map_err(|e| (INVALID_REQUEST, e.to_string()))
    }
}

/// `tools/list` entry with a one-property input schema
pub fn tool_entry(tool: &ToolDefinition) -> Value {
    json!({
        "name": tool.name,
        "description": tool.description,
        "inputSchema": {
            "type": "object",
            "properties": {
                tool.parameter_name: {
                    "type": "string",
                    "description": tool.parameter_description,
                },
            },
            "required": [tool.parameter_name],
        },
    })
}

fn string_arguments(arguments: Option<&Value>) -> HashMap<String, String> {
    let empty = Map::new();
    let map = arguments.and_then(Value::as_object).unwrap_or(&empty);
    map.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Null => return None,
                other => other.to_string(),
            };
            Some((key.clone(), text))
        })
        .collect()
}

pub fn result_message(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

pub fn error_message(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

/// Serve MCP on stdin/stdout until stdin closes.
pub async fn run_stdio(server: Arc<McpServer>) -> std::io::Result<()> {
    serve(server, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

/// Serve MCP over any line-oriented byte stream until `input` reaches EOF.
///
/// Undecodable lines get a parse-error reply and the loop keeps going. A read
/// error ends the loop, but replies already queued are still written before
/// the error is returned.
pub async fn serve<R, W>(server: Arc<McpServer>, mut input: R, output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

    let writer = tokio::spawn(async move {
        let mut output = output;
        while let Some(message) = rx.recv().await {
            let mut line = message.to_string();
            line.push('\n');
            output.write_all(line.as_bytes()).await?;
            output.flush().await?;
        }
        Ok::<(), std::io::Error>(())
    });

    let mut buf = Vec::new();
    let read_result = loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf).await {
            Ok(0) => break Ok(()),
            Ok(_) => {}
            Err(err) => break Err(err),
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(err) => {
                tracing::warn!(error = %err, "Dropping non UTF-8 input line");
                let _ = tx.send(error_message(
                    Value::Null,
                    PARSE_ERROR,
                    &format!("invalid UTF-8: {}", err),
                ));
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let message: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                let _ = tx.send(error_message(
                    Value::Null,
                    PARSE_ERROR,
                    &format!("invalid JSON: {}", err),
                ));
                continue;
            }
        };

        let server = Arc::clone(&server);
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some(response) = server.handle_message(message).await {
                let _ = tx.send(response);
            }
        });
    };

    match &read_result {
        Ok(()) => tracing::info!("stdin closed, shutting down"),
        Err(err) => tracing::error!(error = %err, "Reading input failed, flushing pending replies"),
    }

    // in-flight calls hold their own sender; the writer drains until the last one finishes
    drop(tx);
    writer.await.map_err(std::io::Error::other)??;
    read_result
}
