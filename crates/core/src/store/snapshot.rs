//! Metadata snapshot persistence: MessagePack + zstd, the same pairing the
//! teacher uses to persist its in-memory graph (base spec §4.2.1 storage
//! layout: `storePath/meta.msgpack.zst`). The full-text index persists
//! itself separately under `storePath/tantivy/`.

use crate::error::{CoreError, Result};
use jarscope_api::{Artifact, ClassEntry, InheritanceEdge, Resource, ResourceClassLink};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub next_artifact_id: u64,
    pub next_resource_id: u64,
    pub artifacts: Vec<Artifact>,
    pub classes: Vec<ClassEntry>,
    pub edges: Vec<InheritanceEdge>,
    pub resources: Vec<Resource>,
    pub resource_links: Vec<ResourceClassLink>,
}

impl StoreSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let bytes = rmp_serde::to_vec(self)
            .map_err(|e| CoreError::Serialization(format!("msgpack encode: {e}")))?;
        zstd::encode_all(&bytes[..], 0)
            .map_err(|e| CoreError::Serialization(format!("zstd compress: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let decoder = zstd::stream::read::Decoder::new(bytes)
            .map_err(|e| CoreError::Serialization(format!("zstd decoder init: {e}")))?;
        rmp_serde::from_read(decoder)
            .map_err(|e| CoreError::Serialization(format!("msgpack decode: {e}")))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = self.to_bytes()?;
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, bytes)?;
        std::fs::rename(temp_path, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = std::fs::read(path)?;
        let snapshot = Self::from_bytes(&bytes)?;
        if snapshot.version != CURRENT_VERSION {
            tracing::warn!(
                "store snapshot at {} has version {} (expected {}); ignoring",
                path.display(),
                snapshot.version,
                CURRENT_VERSION
            );
            return Ok(None);
        }
        Ok(Some(snapshot))
    }
}
