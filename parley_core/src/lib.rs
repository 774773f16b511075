//! Parley: Slack workspace tools served over the Model Context Protocol.
//!
//! - [`config`]: startup configuration read from the environment
//! - [`connectors::slack`]: the Slack Web API client and its [`SlackApi`] seam
//! - [`tools`]: the tool table (catalog and handlers)
//! - [`mcp_server`]: tool dispatch and JSON-RPC method routing
//! - [`transport`]: line-delimited JSON-RPC over stdio
//!
//! [`SlackApi`]: connectors::slack::SlackApi

pub mod config;
pub mod connectors;
pub mod error;
pub mod mcp_server;
pub mod tools;
pub mod transport;

// Re-export types from rmcp that users of this library need
pub use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, InitializeRequestParam,
    InitializeResult, JsonObject, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
    ServerCapabilities, Tool,
};

pub use crate::config::{ConfigError, SlackConfig};
pub use crate::connectors::slack::{SlackApi, SlackClient};
pub use crate::error::ConnectorError;
pub use crate::mcp_server::{JsonRpcHandler, McpServer};
pub use crate::tools::{SlackTool, ToolContext, ToolRegistry};
pub use crate::transport::StdioTransport;
