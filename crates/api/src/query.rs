use crate::model::{Artifact, Resource, ResourceType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One fully-qualified class name with every artifact that carries it
/// (`QueryEngine::search_classes` / `search_implementations` group results
/// this way per the base spec §4.6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMatch {
    pub fq_name: String,
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMatch {
    pub artifact: Artifact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMatch {
    pub path: String,
    pub artifact: Artifact,
    pub resource_type: ResourceType,
    /// Populated for `getResourcesForClass` lookups; `None` for plain
    /// path-substring `searchResources` results, which don't need content.
    pub content: Option<String>,
}

impl ResourceMatch {
    pub fn from_resource(resource: &Resource, artifact: Artifact) -> Self {
        Self {
            path: resource.path.clone(),
            artifact,
            resource_type: resource.resource_type,
            content: None,
        }
    }

    pub fn with_content(resource: &Resource, artifact: Artifact) -> Self {
        Self {
            path: resource.path.clone(),
            artifact,
            resource_type: resource.resource_type,
            content: Some(resource.content.clone()),
        }
    }
}

/// Caller-facing query failures (base spec §7: `InvalidQuery`). `QueryEngine`
/// never panics or propagates a lower-level error; a malformed regex/glob/FTS
/// term is reported as this and the engine returns an empty result set.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}
