//! Model Context Protocol server over stdio.
//!
//! Newline-delimited JSON-RPC 2.0. The only tool is `search_docs`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::ports::ArchiveDownloader;
use crate::services::QueryService;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const TOOL_NAME: &str = "search_docs";
const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl Response {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    num_results: Option<usize>,
}

pub struct McpServer<D: ArchiveDownloader> {
    service: Arc<QueryService<D>>,
}

impl<D: ArchiveDownloader> McpServer<D> {
    pub const fn new(service: Arc<QueryService<D>>) -> Self {
        Self { service }
    }

    pub async fn run_stdio(&self) -> Result<()> {
        info!("MCP server listening on stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            let response = if line.len() > MAX_MESSAGE_SIZE {
                Some(Response::error(
                    Value::Null,
                    RpcError::new(INVALID_REQUEST, "Message too large"),
                ))
            } else {
                self.handle_line(line.trim()).await
            };

            if let Some(response) = response {
                let json = serde_json::to_string(&response)?;
                writer.write_all(json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!("MCP client closed stdin");
        Ok(())
    }

    /// `None` for notifications, which get no reply.
    pub async fn handle_line(&self, line: &str) -> Option<Response> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                return Some(Response::error(
                    Value::Null,
                    RpcError::new(PARSE_ERROR, e.to_string()),
                ));
            }
        };
        let id = value.get("id").cloned().unwrap_or(Value::Null);

        match serde_json::from_value::<Request>(value) {
            Ok(req) => self.dispatch(req).await,
            Err(e) => Some(Response::error(
                id,
                RpcError::new(INVALID_REQUEST, e.to_string()),
            )),
        }
    }

    async fn dispatch(&self, req: Request) -> Option<Response> {
        let Some(id) = req.id else {
            debug!(method = %req.method, "MCP notification");
            return None;
        };
        debug!(method = %req.method, %id, "MCP request");

        if req.jsonrpc != "2.0" {
            return Some(Response::error(
                id,
                RpcError::new(INVALID_REQUEST, "jsonrpc must be \"2.0\""),
            ));
        }

        let outcome = match req.method.as_str() {
            "initialize" => Ok(Self::initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": [Self::tool_descriptor()] })),
            "tools/call" => self.call_tool(req.params).await,
            other => Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        };

        Some(match outcome {
            Ok(result) => Response::ok(id, result),
            Err(error) => Response::error(id, error),
        })
    }

    fn initialize_result() -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": "archive-docs",
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    fn tool_descriptor() -> Value {
        json!({
            "name": TOOL_NAME,
            "description": "Search the documentation for relevant information. \
                Returns documents with 'filename' and 'content' fields, ordered by relevance.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "The search query string" },
                    "num_results": {
                        "type": "integer",
                        "minimum": 0,
                        "default": crate::domain::DEFAULT_LIMIT,
                        "description": "Maximum number of results to return",
                    },
                },
                "required": ["query"],
            },
        })
    }

    async fn call_tool(&self, params: Value) -> std::result::Result<Value, RpcError> {
        let call: ToolCall = serde_json::from_value(params)
            .map_err(|e| RpcError::new(INVALID_PARAMS, e.to_string()))?;
        if call.name != TOOL_NAME {
            return Err(RpcError::new(
                INVALID_PARAMS,
                format!("Unknown tool: {}", call.name),
            ));
        }
        let args: SearchArgs = serde_json::from_value(call.arguments)
            .map_err(|e| RpcError::new(INVALID_PARAMS, e.to_string()))?;

        match self.service.search_docs(&args.query, args.num_results).await {
            Ok(matches) => {
                let text = serde_json::to_string(&matches)
                    .map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))?;
                Ok(json!({
                    "content": [{ "type": "text", "text": text }],
                    "structuredContent": { "result": matches },
                    "isError": false,
                }))
            }
            Err(e) => {
                warn!(error = %e, "search_docs failed");
                Ok(json!({
                    "content": [{ "type": "text", "text": e.to_string() }],
                    "isError": true,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use zip::write::SimpleFileOptions;

    use crate::config::SourceConfig;
    use crate::error::{ArchiveDocsError, FetchFailure};
    use crate::services::CorpusCache;

    struct FixedDownloader(Option<Vec<u8>>);

    #[async_trait]
    impl ArchiveDownloader for FixedDownloader {
        async fn download(&self, url: &str) -> Result<Vec<u8>> {
            self.0
                .clone()
                .ok_or_else(|| ArchiveDocsError::fetch(url, FetchFailure::Status(404)))
        }
    }

    fn server(dir: &tempfile::TempDir, reachable: bool) -> McpServer<FixedDownloader> {
        let body = reachable.then(|| {
            let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
            for (name, text) in [
                ("docs/a.md", "search ranking basics"),
                ("docs/b.mdx", "unrelated cooking recipe"),
            ] {
                writer.start_file(name, SimpleFileOptions::default()).unwrap();
                writer.write_all(text.as_bytes()).unwrap();
            }
            writer.finish().unwrap().into_inner()
        });
        let source = SourceConfig {
            cache_path: dir.path().join("docs.zip"),
            strip_prefix: String::new(),
            ..SourceConfig::default()
        };
        let cache = CorpusCache::new(source, Arc::new(FixedDownloader(body))).unwrap();
        McpServer::new(Arc::new(QueryService::new(Arc::new(cache))))
    }

    async fn call(server: &McpServer<FixedDownloader>, request: Value) -> Value {
        let response = server.handle_line(&request.to_string()).await.unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_reports_tools_capability() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir, true);

        let response = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} }),
        )
        .await;

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_tools_list_describes_search_docs() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir, true);

        let response = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": "t", "method": "tools/list" }),
        )
        .await;

        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], TOOL_NAME);
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["query"]));
    }

    #[tokio::test]
    async fn test_tools_call_returns_ranked_matches() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir, true);

        let response = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": {
                    "name": "search_docs",
                    "arguments": { "query": "ranking", "num_results": 1 },
                },
            }),
        )
        .await;

        let result = &response["result"];
        assert_eq!(result["isError"], false);
        assert_eq!(
            result["structuredContent"]["result"],
            json!([{ "filename": "docs/a.md", "content": "search ranking basics" }])
        );
        let text: Value =
            serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(text[0]["filename"], "docs/a.md");
    }

    #[tokio::test]
    async fn test_tools_call_surfaces_initialization_failure() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir, false);

        let response = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "tools/call",
                "params": { "name": "search_docs", "arguments": { "query": "ranking" } },
            }),
        )
        .await;

        assert_eq!(response["result"]["isError"], true);
        let message = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(message.contains("HTTP error 404"));
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir, true);

        let unknown = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 3, "method": "resources/list" }),
        )
        .await;
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

        let bad_tool = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": { "name": "add" },
            }),
        )
        .await;
        assert_eq!(bad_tool["error"]["code"], INVALID_PARAMS);

        let missing_query = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "tools/call",
                "params": { "name": "search_docs", "arguments": {} },
            }),
        )
        .await;
        assert_eq!(missing_query["error"]["code"], INVALID_PARAMS);

        let garbage = server.handle_line("{not json").await.unwrap();
        assert_eq!(garbage.error.unwrap().code, PARSE_ERROR);

        let no_method = call(&server, json!({ "jsonrpc": "2.0", "id": 6 })).await;
        assert_eq!(no_method["id"], 6);
        assert_eq!(no_method["error"]["code"], INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_notifications_get_no_reply() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir, true);

        let reply = server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_serve_writes_one_line_per_request() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir, true);
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        );

        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["id"], 2);
        assert_eq!(lines[1]["result"], json!({}));
    }
}
