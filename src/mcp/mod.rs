// MCP JSON-RPC stdio server

pub mod server;
pub mod tools;

pub use server::McpServer;
