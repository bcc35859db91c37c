//! Thin `rmcp`-based tool surface over `jarscope-core` (base spec §6). Every
//! method here is a direct call into `JarscopeEngine`'s `QueryEngine`,
//! `DetailExtractor`, or `Indexer` — no indexing or query logic lives in this
//! crate. Grounded on the teacher's `McpServer` (`src/mcp/mod.rs`): a
//! `#[tool_router]` impl block holding one `#[tool]` method per tool name,
//! paired with a `#[tool_handler]` `ServerHandler` impl for server metadata.

pub mod stdio;

use jarscope_api::{ArtifactMatch, ClassDetail, ClassMatch, DetailKind, ResourceMatch};
use jarscope_core::JarscopeEngine;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, InitializeResult, ServerCapabilities},
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Accepts either a single value or an array in tool call arguments (base
/// spec §6: "Batched forms accept either a single value or an array").
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Deserialize, JsonSchema)]
pub struct SearchArtifactsArgs {
    /// Substring to match against an artifact's groupId or artifactId.
    pub query: OneOrMany<String>,
}

#[derive(Deserialize, JsonSchema)]
pub struct SearchClassesArgs {
    /// `regex:<pattern>` for regex mode, a pattern with `*`/`?` for glob
    /// mode, otherwise a fragment search against the full-text index.
    pub class_name: OneOrMany<String>,
}

#[derive(Deserialize, JsonSchema)]
pub struct SearchImplementationsArgs {
    /// Fully-qualified class or interface name.
    pub class_name: OneOrMany<String>,
}

#[derive(Deserialize, JsonSchema)]
pub struct SearchResourcesArgs {
    /// Substring to match against a resource's archive-relative path.
    pub pattern: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct GetClassDetailsArgs {
    pub class_name: OneOrMany<String>,
    /// Pin resolution to one artifact (`groupId:artifactId:version`).
    /// Omitted: resolved via `ArtifactResolver` among every carrying artifact.
    pub coordinate: Option<String>,
    /// One of `signatures`, `docs`, `source`.
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct RefreshIndexArgs {}

#[derive(Serialize)]
struct ClassDetailResult {
    class_name: String,
    detail: Option<ClassDetail>,
    error: Option<String>,
}

fn parse_detail_kind(kind: &str) -> Result<DetailKind, McpError> {
    match kind {
        "signatures" => Ok(DetailKind::Signatures),
        "docs" => Ok(DetailKind::Docs),
        "source" => Ok(DetailKind::Source),
        other => Err(invalid_params(format!(
            "unknown detail type '{other}'; expected signatures, docs, or source"
        ))),
    }
}

/// JSON-RPC `Invalid params`.
const INVALID_PARAMS: i32 = -32602;
/// JSON-RPC `Internal error`.
const INTERNAL_ERROR: i32 = -32603;

fn invalid_params(message: String) -> McpError {
    McpError::new(rmcp::model::ErrorCode(INVALID_PARAMS), message, None)
}

fn internal_error(message: String) -> McpError {
    McpError::new(rmcp::model::ErrorCode(INTERNAL_ERROR), message, None)
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| internal_error(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[derive(Clone)]
pub struct McpServer {
    tool_router: ToolRouter<Self>,
    engine: Arc<JarscopeEngine>,
}

#[tool_router]
impl McpServer {
    pub fn new(engine: Arc<JarscopeEngine>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            engine,
        }
    }

    #[tool(
        description = "Search indexed artifacts by a substring match against groupId or artifactId."
    )]
    pub async fn search_artifacts(
        &self,
        params: Parameters<SearchArtifactsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let queries = params.0.query.into_vec();
        let matches: Vec<ArtifactMatch> = queries
            .iter()
            .flat_map(|q| self.engine.query().search_artifacts(q))
            .collect();
        json_result(&matches)
    }

    #[tool(
        description = "Search indexed classes by fragment, `regex:<pattern>`, or a `*`/`?` glob. Returns each fully-qualified class name grouped with every artifact that carries it."
    )]
    pub async fn search_classes(
        &self,
        params: Parameters<SearchClassesArgs>,
    ) -> Result<CallToolResult, McpError> {
        let names = params.0.class_name.into_vec();
        let mut matches: Vec<ClassMatch> = Vec::new();
        for name in names {
            match self.engine.query().search_classes(&name) {
                Ok(found) => matches.extend(found),
                Err(e) => return Err(invalid_params(e.to_string())),
            }
        }
        json_result(&matches)
    }

    #[tool(
        description = "Find every class that transitively extends or implements the given class or interface name."
    )]
    pub async fn search_implementations(
        &self,
        params: Parameters<SearchImplementationsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let names = params.0.class_name.into_vec();
        let matches: Vec<ClassMatch> = names
            .iter()
            .flat_map(|name| self.engine.query().search_implementations(name))
            .collect();
        json_result(&matches)
    }

    #[tool(
        description = "Search indexed resources (e.g. .proto definitions) by a substring match against their archive-relative path."
    )]
    pub async fn search_resources(
        &self,
        params: Parameters<SearchResourcesArgs>,
    ) -> Result<CallToolResult, McpError> {
        let matches: Vec<ResourceMatch> = self.engine.query().search_resources(&params.0.pattern);
        json_result(&matches)
    }

    #[tool(
        description = "Retrieve method/field signatures, Javadoc, or decompiled source for one or more fully-qualified class names. Resolves the best artifact via ArtifactResolver unless `coordinate` pins one."
    )]
    pub async fn get_class_details(
        &self,
        params: Parameters<GetClassDetailsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0;
        let kind = parse_detail_kind(&args.kind)?;
        let names = args.class_name.into_vec();

        let mut results = Vec::with_capacity(names.len());
        for class_name in names {
            let outcome = self
                .engine
                .get_class_details(&class_name, kind, args.coordinate.as_deref())
                .await;
            results.push(match outcome {
                Ok(detail) => ClassDetailResult {
                    class_name,
                    detail: Some(detail),
                    error: None,
                },
                Err(e) => ClassDetailResult {
                    class_name,
                    detail: None,
                    error: Some(e.to_string()),
                },
            });
        }
        json_result(&results)
    }

    #[tool(
        description = "Clear the index and re-scan both configured repository roots from scratch. Returns immediately without waiting for a concurrently running pass to finish (the same pass is observed instead of racing it)."
    )]
    pub async fn refresh_index(
        &self,
        _params: Parameters<RefreshIndexArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.engine
            .refresh()
            .await
            .map_err(|e| internal_error(e.to_string()))?;
        json_result(&serde_json::json!({ "status": "ok" }))
    }
}

#[tool_handler]
impl rmcp::ServerHandler for McpServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: rmcp::model::ProtocolVersion::V_2024_11_05,
            server_info: Implementation {
                name: "jarscope".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
