//! Stdio transport wiring (base spec §6: "Implemented in this repo by
//! `jarscope-mcp` as a thin `rmcp`-based stdio server"). Grounded on the
//! teacher's `crates/mcp/src/stdio.rs`.

use crate::McpServer;
use jarscope_core::JarscopeEngine;
use rmcp::{transport::stdio, ServiceExt};
use std::sync::Arc;

pub async fn run_stdio_server(engine: Arc<JarscopeEngine>) -> anyhow::Result<()> {
    let service = McpServer::new(engine).serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
