use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Opaque, monotonically-assigned identity for an [`Artifact`] row.
///
/// Assigned by the store on first insert; `0` is reserved for
/// not-yet-persisted artifacts produced by a [`Scanner`](crate) pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactId(pub u64);

impl ArtifactId {
    pub const UNASSIGNED: ArtifactId = ArtifactId(0);

    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

/// A `(groupId, artifactId, version)` triple and its on-disk files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    /// A directory for Maven layout, a full archive path for Gradle layout.
    pub abspath: PathBuf,
    /// True iff a sibling `-sources.jar` exists.
    pub has_source: bool,
    /// True once the archive's classes, inheritance edges, and resources
    /// have been fully ingested into the store.
    pub is_indexed: bool,
}

impl Artifact {
    pub fn coordinate(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }

    /// Key used for `upsertArtifact` identity: `(groupId, artifactId, version)`.
    pub fn identity(&self) -> (&str, &str, &str) {
        (&self.group_id, &self.artifact_id, &self.version)
    }
}

/// A class discovered inside an artifact's archive, indexed for fragment
/// search on both its fully-qualified and simple name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub artifact_id: ArtifactId,
    pub fq_name: String,
    pub simple_name: String,
}

impl ClassEntry {
    pub fn new(artifact_id: ArtifactId, fq_name: impl Into<String>) -> Self {
        let fq_name = fq_name.into();
        let simple_name = fq_name
            .rsplit('.')
            .next()
            .unwrap_or(fq_name.as_str())
            .to_string();
        Self {
            artifact_id,
            fq_name,
            simple_name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Extends,
    Implements,
}

/// A directed edge from a subclass/implementor to its immediate parent or
/// interface. `java.lang.Object` is never represented as a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritanceEdge {
    pub artifact_id: ArtifactId,
    pub class_name: String,
    pub parent_class_name: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ResourceType {
    Proto,
}

/// A non-class file found in an archive that a code generator maps onto one
/// or more logical Java class names (currently: `.proto` definitions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub artifact_id: ArtifactId,
    pub path: String,
    pub content: String,
    pub resource_type: ResourceType,
}

/// Links a [`Resource`] to a logical class name a code generator produces
/// for it (e.g. a protoc-generated message class).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceClassLink {
    pub resource_id: ResourceId,
    pub class_name: String,
}
