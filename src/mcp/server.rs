// MCP server implementation

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::error::IndexError;
use crate::indexer::Indexer;
use crate::mcp::tools::{self, Args, InvalidArguments};

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC message
#[derive(Debug, Serialize, Deserialize)]
struct JsonRpcMessage {
    jsonrpc: String,
    id: Option<Value>,
    method: Option<String>,
    params: Option<Value>,
}

/// MCP tool definition
#[derive(Debug, Serialize, Deserialize)]
struct Tool {
    name: String,
    description: String,
    #[serde(rename = "inputSchema")]
    input_schema: Value,
}

/// MCP server capabilities
#[derive(Debug, Serialize, Deserialize)]
struct ServerCapabilities {
    tools: Option<Value>,
}

/// MCP server info
#[derive(Debug, Serialize, Deserialize)]
struct ServerInfo {
    name: String,
    version: String,
}

/// MCP initialize result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResult {
    protocol_version: String,
    capabilities: ServerCapabilities,
    server_info: ServerInfo,
}

fn error_response(id: Option<Value>, code: i32, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}

fn result_response(id: Option<Value>, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

/// Tool failures caused by the caller's input
fn is_invalid_params(e: &anyhow::Error) -> bool {
    e.downcast_ref::<InvalidArguments>().is_some()
        || matches!(e.downcast_ref::<IndexError>(), Some(IndexError::QueryInput(_)))
}

/// MCP server over stdio. Responses go to stdout, one per line; logs go to
/// stderr.
pub struct McpServer {
    indexer: Arc<Indexer>,
}

impl McpServer {
    pub fn new(indexer: Arc<Indexer>) -> Self {
        Self { indexer }
    }

    /// Serve requests until stdin closes
    pub async fn run(self) -> Result<()> {
        info!("Starting MCP server");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            debug!("Received: {}", line);

            if let Some(response) = self.handle_message(&line).await {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                stdout.write_all(out.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Handle one JSON-RPC message. Notifications get no response.
    pub async fn handle_message(&self, message: &str) -> Option<Value> {
        let msg: JsonRpcMessage = match serde_json::from_str(message) {
            Ok(msg) => msg,
            Err(e) => {
                error!("Unparseable message: {}", e);
                return Some(error_response(None, PARSE_ERROR, format!("Parse error: {}", e)));
            }
        };

        let is_notification = msg.id.is_none();

        match msg.method.as_deref() {
            Some("initialize") => {
                let result = InitializeResult {
                    protocol_version: "2024-11-05".to_string(),
                    capabilities: ServerCapabilities {
                        tools: Some(json!({})),
                    },
                    server_info: ServerInfo {
                        name: "symdex".to_string(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                    },
                };

                Some(result_response(msg.id, json!(result)))
            }

            Some("tools/list") => Some(result_response(msg.id, json!({ "tools": list_tools() }))),

            Some("tools/call") => {
                let Some(params) = &msg.params else {
                    return Some(error_response(msg.id, INVALID_PARAMS, "Invalid params".to_string()));
                };

                match self.call_tool(params).await {
                    Ok(result) => Some(result_response(msg.id, result)),
                    Err(e) if is_invalid_params(&e) => {
                        Some(error_response(msg.id, INVALID_PARAMS, e.to_string()))
                    }
                    Err(e) => {
                        error!("Tool call failed: {}", e);
                        Some(error_response(msg.id, INTERNAL_ERROR, format!("Internal error: {}", e)))
                    }
                }
            }

            Some("shutdown") => {
                info!("Received shutdown request");
                Some(result_response(msg.id, Value::Null))
            }

            Some(method) if is_notification => {
                debug!("Ignoring notification {}", method);
                None
            }

            _ => Some(error_response(msg.id, METHOD_NOT_FOUND, "Method not found".to_string())),
        }
    }

    async fn call_tool(&self, params: &Value) -> Result<Value> {
        let tool_name = params["name"]
            .as_str()
            .ok_or_else(|| InvalidArguments("missing tool name".to_string()))?;

        let empty = Args::new();
        let args = match &params["arguments"] {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(InvalidArguments("arguments must be an object".to_string()).into()),
        };

        debug!("Calling tool {}", tool_name);

        match tool_name {
            "build_index" => tools::build_index(&self.indexer, args).await,
            "index_stats" => tools::index_stats(&self.indexer, args).await,
            "search_symbols" => tools::search_symbols(&self.indexer, args).await,
            "file_symbols" => tools::file_symbols(&self.indexer, args).await,
            "symbol_references" => tools::symbol_references(&self.indexer, args).await,
            "find_symbols" => tools::find_symbols(&self.indexer, args).await,
            _ => Err(InvalidArguments(format!("unknown tool: {}", tool_name)).into()),
        }
    }
}

/// List available tools
fn list_tools() -> Vec<Tool> {
    let kinds: Vec<&str> = crate::index::SymbolKind::ALL.iter().map(|k| k.as_str()).collect();

    vec![
        Tool {
            name: "build_index".to_string(),
            description: "Start an incremental index build in the background".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "force": {
                        "type": "boolean",
                        "default": false,
                        "description": "Re-extract every file, ignoring fingerprints"
                    }
                }
            }),
        },
        Tool {
            name: "index_stats".to_string(),
            description: "Get index statistics and build status".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        Tool {
            name: "search_symbols".to_string(),
            description: "Search symbols by case-insensitive name substring".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Name substring; empty matches everything"
                    },
                    "kind": {
                        "type": "string",
                        "enum": kinds,
                        "description": "Filter by symbol kind"
                    },
                    "limit": {
                        "type": "integer",
                        "default": 50,
                        "description": "Maximum number of results"
                    }
                },
                "required": ["query"]
            }),
        },
        Tool {
            name: "file_symbols".to_string(),
            description: "List symbols declared in one file".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Workspace-relative file path"
                    }
                },
                "required": ["path"]
            }),
        },
        Tool {
            name: "symbol_references".to_string(),
            description: "List recorded references to a symbol".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Exact symbol name"
                    }
                },
                "required": ["name"]
            }),
        },
        Tool {
            name: "find_symbols".to_string(),
            description: "Find a symbol in the index, falling back to text search".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Symbol name"
                    },
                    "language": {
                        "type": "string",
                        "default": "python",
                        "description": "Source language"
                    }
                },
                "required": ["name"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn server_for(dir: &std::path::Path) -> McpServer {
        fs::write(dir.join("a.py"), "import os\ndef foo():\n    pass\n").unwrap();
        fs::write(dir.join("b.py"), "class Bar:\n    pass\n").unwrap();
        let indexer = Indexer::open(dir, Config::default());
        indexer.build(false).unwrap();
        McpServer::new(Arc::new(indexer))
    }

    fn call(name: &str, arguments: Value) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        })
        .to_string()
    }

    fn text_of(response: &Value) -> &str {
        response["result"]["content"][0]["text"].as_str().unwrap()
    }

    #[tokio::test]
    async fn test_initialize_and_list() {
        let dir = tempdir().unwrap();
        let server = server_for(dir.path());

        let init = server
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();
        assert_eq!(init["id"], 1);
        assert_eq!(init["result"]["serverInfo"]["name"], "symdex");

        let list = server
            .handle_message(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
            .await
            .unwrap();
        let names: Vec<&str> = list["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["build_index", "index_stats", "search_symbols", "file_symbols", "symbol_references", "find_symbols"]
        );
    }

    #[tokio::test]
    async fn test_query_tools() {
        let dir = tempdir().unwrap();
        let server = server_for(dir.path());

        let search = server
            .handle_message(&call("search_symbols", json!({"query": "foo", "kind": "function"})))
            .await
            .unwrap();
        assert_eq!(search["id"], 7);
        assert!(text_of(&search).contains("a.py:2 - foo (function)"));

        let file = server
            .handle_message(&call("file_symbols", json!({"path": "b.py"})))
            .await
            .unwrap();
        assert!(text_of(&file).contains("`class Bar`"));

        let refs = server
            .handle_message(&call("symbol_references", json!({"name": "foo"})))
            .await
            .unwrap();
        assert!(text_of(&refs).starts_with("No references"));

        let found = server
            .handle_message(&call("find_symbols", json!({"name": "Bar"})))
            .await
            .unwrap();
        assert!(text_of(&found).starts_with("Found 1 indexed symbols"));

        let stats = server
            .handle_message(&call("index_stats", json!({})))
            .await
            .unwrap();
        let summary: Value = serde_json::from_str(text_of(&stats)).unwrap();
        assert_eq!(summary["total_symbols"], 3);
        assert_eq!(summary["files_indexed"], 2);
    }

    #[tokio::test]
    async fn test_errors() {
        let dir = tempdir().unwrap();
        let server = server_for(dir.path());

        let bad_kind = server
            .handle_message(&call("search_symbols", json!({"query": "foo", "kind": "klass"})))
            .await
            .unwrap();
        assert_eq!(bad_kind["error"]["code"], INVALID_PARAMS);

        let missing = server
            .handle_message(&call("file_symbols", json!({})))
            .await
            .unwrap();
        assert_eq!(missing["error"]["code"], INVALID_PARAMS);

        let unknown_tool = server.handle_message(&call("explode", json!({}))).await.unwrap();
        assert_eq!(unknown_tool["error"]["code"], INVALID_PARAMS);

        let unknown_method = server
            .handle_message(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(unknown_method["error"]["code"], METHOD_NOT_FOUND);

        let garbage = server.handle_message("{oops").await.unwrap();
        assert_eq!(garbage["error"]["code"], PARSE_ERROR);

        let notification = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(notification.is_none());
    }

    #[tokio::test]
    async fn test_build_index_runs_in_background() {
        let dir = tempdir().unwrap();
        let server = server_for(dir.path());
        fs::write(dir.path().join("c.py"), "def baz():\n    pass\n").unwrap();

        let started = server
            .handle_message(&call("build_index", json!({"force": false})))
            .await
            .unwrap();
        assert!(text_of(&started).starts_with("Index build started"));

        for _ in 0..200 {
            if !server.indexer.is_building() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(!server.indexer.is_building());
        assert_eq!(server.indexer.store().symbols_named("baz").len(), 1);
    }
}
