//! MCP server over stdio.
//!
//! Stdout carries protocol messages only; all logging goes to stderr.

pub mod tools;

pub use tools::ResearchServer;

use crate::llm::tool_schema::ToolDescriptor;
use anyhow::{Context, Result};
use rmcp::{transport::stdio, ServiceExt};
use serde_json::Value;
use tracing::info;

/// The advertised tools, read back from their `inputSchema` into typed
/// descriptors. Sorted by name.
pub fn list_tools() -> Vec<ToolDescriptor> {
    let mut tools: Vec<ToolDescriptor> = ResearchServer::tool_list()
        .iter()
        .map(|tool| {
            ToolDescriptor::from_input_schema(
                &tool.name,
                tool.description.as_deref().unwrap_or_default(),
                &Value::Object(tool.input_schema.as_ref().clone()),
            )
        })
        .collect();
    tools.sort_by(|a, b| a.name.cmp(&b.name));
    tools
}

/// Serve `server` on the process's stdin and stdout until the client
/// disconnects.
pub async fn serve_stdio(server: ResearchServer) -> Result<()> {
    info!("MCP server listening on stdio");

    let running = server
        .serve(stdio())
        .await
        .context("Failed to start MCP server")?;
    running
        .waiting()
        .await
        .context("MCP server task failed")?;

    info!("Input closed, shutting down");
    Ok(())
}
