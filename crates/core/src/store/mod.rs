//! Concurrent in-memory metadata store with disk persistence (base spec
//! §4.2). Artifact/class/edge/resource tables are `dashmap`-backed so reads
//! and writes from concurrent query and indexing tasks never block each
//! other at a coarse grain; this supersedes the teacher's whole-graph
//! `Arc<RwLock<Arc<CodeGraph>>>` MVCC swap, which fits a rebuild-the-world
//! model better than ours incremental, per-artifact upserts.

pub mod fts;
pub mod snapshot;

use crate::error::{CoreError, Result};
use dashmap::DashMap;
use fts::FtsIndex;
use jarscope_api::{
    Artifact, ArtifactId, ClassEntry, EdgeKind, InheritanceEdge, Resource, ResourceClassLink,
    ResourceId,
};
use regex::Regex;
use snapshot::StoreSnapshot;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Upper bound on how many descendants a single inheritance walk will
/// return, so a deep or cyclic (malformed bytecode) hierarchy can't make a
/// query run unbounded.
pub const MAX_DESCENDANTS: usize = 100;

pub struct Store {
    store_path: PathBuf,
    artifacts: DashMap<ArtifactId, Artifact>,
    artifacts_by_identity: DashMap<(String, String, String), ArtifactId>,
    next_artifact_id: AtomicU64,
    classes_by_fq_name: DashMap<String, Vec<ClassEntry>>,
    edges_by_parent: DashMap<String, Vec<InheritanceEdge>>,
    resources: DashMap<ResourceId, Resource>,
    next_resource_id: AtomicU64,
    resource_links_by_class: DashMap<String, Vec<ResourceClassLink>>,
    fts: FtsIndex,
}

impl Store {
    /// Open (or initialize) a store rooted at `store_path`, loading any
    /// existing metadata snapshot and full-text index found there.
    pub fn open(store_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(store_path)?;
        let fts = FtsIndex::open_or_create(&store_path.join("tantivy"))?;

        let store = Self {
            store_path: store_path.to_path_buf(),
            artifacts: DashMap::new(),
            artifacts_by_identity: DashMap::new(),
            next_artifact_id: AtomicU64::new(1),
            classes_by_fq_name: DashMap::new(),
            edges_by_parent: DashMap::new(),
            resources: DashMap::new(),
            next_resource_id: AtomicU64::new(1),
            resource_links_by_class: DashMap::new(),
            fts,
        };

        store.load_snapshot()?;
        Ok(store)
    }

    fn meta_path(&self) -> PathBuf {
        self.store_path.join("meta.msgpack.zst")
    }

    fn load_snapshot(&self) -> Result<()> {
        let Some(snapshot) = StoreSnapshot::load(&self.meta_path())? else {
            return Ok(());
        };

        for artifact in snapshot.artifacts {
            self.artifacts_by_identity.insert(
                (
                    artifact.group_id.clone(),
                    artifact.artifact_id.clone(),
                    artifact.version.clone(),
                ),
                artifact.id,
            );
            self.artifacts.insert(artifact.id, artifact);
        }
        for class in snapshot.classes {
            self.classes_by_fq_name
                .entry(class.fq_name.clone())
                .or_default()
                .push(class);
        }
        for edge in snapshot.edges {
            self.edges_by_parent
                .entry(edge.parent_class_name.clone())
                .or_default()
                .push(edge);
        }
        for resource in snapshot.resources {
            self.resources.insert(resource.id, resource);
        }
        for link in snapshot.resource_links {
            self.resource_links_by_class
                .entry(link.class_name.clone())
                .or_default()
                .push(link);
        }
        self.next_artifact_id
            .store(snapshot.next_artifact_id, Ordering::SeqCst);
        self.next_resource_id
            .store(snapshot.next_resource_id, Ordering::SeqCst);

        Ok(())
    }

    /// Persist the current metadata tables and commit the full-text index.
    /// Called after each indexing pass.
    pub fn save(&self) -> Result<()> {
        self.fts.commit()?;

        let snapshot = StoreSnapshot {
            version: snapshot::CURRENT_VERSION,
            next_artifact_id: self.next_artifact_id.load(Ordering::SeqCst),
            next_resource_id: self.next_resource_id.load(Ordering::SeqCst),
            artifacts: self.artifacts.iter().map(|e| e.value().clone()).collect(),
            classes: self
                .classes_by_fq_name
                .iter()
                .flat_map(|e| e.value().clone())
                .collect(),
            edges: self
                .edges_by_parent
                .iter()
                .flat_map(|e| e.value().clone())
                .collect(),
            resources: self.resources.iter().map(|e| e.value().clone()).collect(),
            resource_links: self
                .resource_links_by_class
                .iter()
                .flat_map(|e| e.value().clone())
                .collect(),
        };

        snapshot.save(&self.meta_path())
    }

    /// Group several store mutations under one conceptual unit, so a
    /// failure partway through a batch is easy to reason about. `dashmap`
    /// already makes each individual table mutation atomic; this wrapper
    /// exists for callers (the indexer) that want a single place to hang
    /// "apply this artifact's class/edge/resource batch" logic.
    pub fn with_transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        f(self)
    }

    /// Insert a new artifact or update an existing one matched by
    /// `(groupId, artifactId, version)`, preserving its assigned id and
    /// `is_indexed` flag across re-scans.
    pub fn upsert_artifact(&self, mut artifact: Artifact) -> ArtifactId {
        let identity = (
            artifact.group_id.clone(),
            artifact.artifact_id.clone(),
            artifact.version.clone(),
        );

        if let Some(existing_id) = self.artifacts_by_identity.get(&identity).map(|e| *e) {
            artifact.id = existing_id;
            if let Some(existing) = self.artifacts.get(&existing_id) {
                artifact.is_indexed = existing.is_indexed;
            }
            self.artifacts.insert(existing_id, artifact);
            return existing_id;
        }

        let id = ArtifactId(self.next_artifact_id.fetch_add(1, Ordering::SeqCst));
        artifact.id = id;
        artifact.is_indexed = false;
        self.artifacts_by_identity.insert(identity, id);
        self.artifacts.insert(id, artifact);
        id
    }

    pub fn get_artifact(&self, id: ArtifactId) -> Option<Artifact> {
        self.artifacts.get(&id).map(|e| e.value().clone())
    }

    pub fn all_artifacts(&self) -> Vec<Artifact> {
        self.artifacts.iter().map(|e| e.value().clone()).collect()
    }

    /// Artifacts discovered by a scan but not yet fully ingested.
    pub fn find_unindexed(&self) -> Vec<Artifact> {
        self.artifacts
            .iter()
            .filter(|e| !e.value().is_indexed)
            .map(|e| e.value().clone())
            .collect()
    }

    pub fn mark_indexed(&self, id: ArtifactId) {
        if let Some(mut artifact) = self.artifacts.get_mut(&id) {
            artifact.is_indexed = true;
        }
    }

    /// Replace everything ingested for an artifact (classes, inheritance
    /// edges, resources, resource-class links), in preparation for a
    /// re-scan overwriting stale data.
    pub fn clear_artifact_contents(&self, id: ArtifactId) -> Result<()> {
        self.classes_by_fq_name
            .retain(|_, entries| {
                entries.retain(|e| e.artifact_id != id);
                !entries.is_empty()
            });
        self.edges_by_parent.retain(|_, entries| {
            entries.retain(|e| e.artifact_id != id);
            !entries.is_empty()
        });
        self.resources.retain(|_, r| r.artifact_id != id);
        self.fts.delete_artifact(id)?;
        Ok(())
    }

    pub fn insert_class(&self, entry: ClassEntry) -> Result<()> {
        self.fts.add_class(&entry)?;
        self.classes_by_fq_name
            .entry(entry.fq_name.clone())
            .or_default()
            .push(entry);
        Ok(())
    }

    pub fn insert_edge(&self, edge: InheritanceEdge) {
        self.edges_by_parent
            .entry(edge.parent_class_name.clone())
            .or_default()
            .push(edge);
    }

    pub fn insert_resource(&self, mut resource: Resource) -> ResourceId {
        let id = ResourceId(self.next_resource_id.fetch_add(1, Ordering::SeqCst));
        resource.id = id;
        self.resources.insert(id, resource);
        id
    }

    pub fn insert_resource_link(&self, link: ResourceClassLink) {
        self.resource_links_by_class
            .entry(link.class_name.clone())
            .or_default()
            .push(link);
    }

    /// In one pass, clear every class, inheritance edge, resource, and
    /// resource-class link, and reset `is_indexed` to `false` on every
    /// artifact (base spec §4.2 `refreshAll`). The artifacts themselves
    /// survive so the following `index()` pass re-upserts and re-ingests
    /// them rather than discovering them as brand new rows.
    pub fn refresh_all(&self) -> Result<()> {
        self.classes_by_fq_name.clear();
        self.edges_by_parent.clear();
        self.resources.clear();
        self.resource_links_by_class.clear();
        self.fts.clear_all()?;
        self.fts.commit()?;
        for mut entry in self.artifacts.iter_mut() {
            entry.value_mut().is_indexed = false;
        }
        Ok(())
    }

    /// One-time migration check (base spec §4.5 step 3): inheritance
    /// capture was added after this store may already have indexed
    /// artifacts without it, which would make the hierarchy-aware queries
    /// silently return nothing forever. If the edge table is empty but some
    /// artifact is already marked indexed, reset those artifacts and clear
    /// the class FTS so the next pass re-ingests them with edges included.
    pub fn reset_if_inheritance_missing(&self) {
        if !self.edges_by_parent.is_empty() {
            return;
        }
        let any_indexed = self.artifacts.iter().any(|e| e.value().is_indexed);
        if !any_indexed {
            return;
        }
        tracing::info!(
            "inheritance table is empty but artifacts are marked indexed; forcing re-ingestion"
        );
        for mut entry in self.artifacts.iter_mut() {
            entry.value_mut().is_indexed = false;
        }
        self.classes_by_fq_name.clear();
        let _ = self.fts.clear_all();
    }

    // ---- Class search ----

    pub fn classes_exact(&self, fq_name: &str) -> Vec<ClassEntry> {
        self.classes_by_fq_name
            .get(fq_name)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    pub fn classes_regex(&self, pattern: &str) -> Result<Vec<ClassEntry>> {
        let regex =
            Regex::new(pattern).map_err(|e| CoreError::InvalidQuery(format!("regex: {e}")))?;
        Ok(self
            .classes_by_fq_name
            .iter()
            .filter(|e| regex.is_match(e.key()))
            .flat_map(|e| e.value().clone())
            .collect())
    }

    pub fn classes_glob(&self, pattern: &str) -> Result<Vec<ClassEntry>> {
        let regex_source = glob_to_regex(pattern);
        let regex = Regex::new(&regex_source)
            .map_err(|e| CoreError::InvalidQuery(format!("glob: {e}")))?;
        Ok(self
            .classes_by_fq_name
            .iter()
            .filter(|e| regex.is_match(e.key()))
            .flat_map(|e| e.value().clone())
            .collect())
    }

    pub fn classes_fragment(&self, text: &str, limit: usize) -> Result<Vec<ClassEntry>> {
        let names = self.fts.search_fragment(text, limit)?;
        Ok(names
            .into_iter()
            .flat_map(|name| self.classes_exact(&name))
            .collect())
    }

    /// Immediate children of `parent_class_name` (one inheritance hop),
    /// optionally filtered to one [`EdgeKind`].
    pub fn direct_children_of(
        &self,
        parent_class_name: &str,
        kind: Option<EdgeKind>,
    ) -> Vec<InheritanceEdge> {
        self.edges_by_parent
            .get(parent_class_name)
            .map(|e| {
                e.value()
                    .iter()
                    .filter(|edge| kind.is_none_or(|k| edge.kind == k))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All immediate parents (`extends`/`implements`) of `class_name` found
    /// in the store, from any indexed artifact.
    pub fn parents_of(&self, class_name: &str) -> Vec<InheritanceEdge> {
        self.edges_by_parent
            .iter()
            .flat_map(|e| e.value().clone())
            .filter(|edge| edge.class_name == class_name)
            .collect()
    }

    /// Every transitive subclass/implementor of `class_name`, bounded to
    /// [`MAX_DESCENDANTS`] results. Cycles (malformed bytecode) terminate
    /// the walk via the visited set rather than looping forever.
    pub fn descendants_of(&self, class_name: &str, kind: Option<EdgeKind>) -> Vec<InheritanceEdge> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier = vec![class_name.to_string()];
        let mut results = Vec::new();

        visited.insert(class_name.to_string());

        while let Some(current) = frontier.pop() {
            let Some(direct) = self.edges_by_parent.get(&current) else {
                continue;
            };
            for edge in direct.value() {
                if let Some(kind) = kind {
                    if edge.kind != kind {
                        continue;
                    }
                }
                if results.len() >= MAX_DESCENDANTS {
                    return results;
                }
                if visited.insert(edge.class_name.clone()) {
                    frontier.push(edge.class_name.clone());
                }
                results.push(edge.clone());
            }
        }

        results
    }

    // ---- Resources ----

    pub fn resources_matching(&self, substring: &str) -> Vec<Resource> {
        let needle = substring.to_lowercase();
        self.resources
            .iter()
            .filter(|e| e.value().path.to_lowercase().contains(&needle))
            .map(|e| e.value().clone())
            .collect()
    }

    pub fn links_for_class(&self, class_name: &str) -> Vec<ResourceClassLink> {
        self.resource_links_by_class
            .get(class_name)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    pub fn get_resource(&self, id: ResourceId) -> Option<Resource> {
        self.resources.get(&id).map(|e| e.value().clone())
    }
}

/// Translate a shell-style glob (`*`, `?`) into an anchored regex.
fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c if "\\.+^$()[]{}|".contains(c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarscope_api::ArtifactId;
    use std::path::PathBuf;

    fn sample_artifact(group: &str, artifact: &str, version: &str) -> Artifact {
        Artifact {
            id: ArtifactId::UNASSIGNED,
            group_id: group.to_string(),
            artifact_id: artifact.to_string(),
            version: version.to_string(),
            abspath: PathBuf::from("/repo"),
            has_source: false,
            is_indexed: false,
        }
    }

    #[test]
    fn upsert_is_idempotent_by_identity() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let id1 = store.upsert_artifact(sample_artifact("com.example", "demo", "1.0.0"));
        let id2 = store.upsert_artifact(sample_artifact("com.example", "demo", "1.0.0"));

        assert_eq!(id1, id2);
        assert_eq!(store.all_artifacts().len(), 1);
    }

    #[test]
    fn mark_indexed_survives_rescan_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let id = store.upsert_artifact(sample_artifact("com.example", "demo", "1.0.0"));
        store.mark_indexed(id);
        store.upsert_artifact(sample_artifact("com.example", "demo", "1.0.0"));

        assert!(store.get_artifact(id).unwrap().is_indexed);
    }

    #[test]
    fn descendant_walk_is_transitive_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        store.insert_edge(InheritanceEdge {
            artifact_id: ArtifactId(1),
            class_name: "com.example.Child".to_string(),
            parent_class_name: "com.example.Base".to_string(),
            kind: EdgeKind::Extends,
        });
        store.insert_edge(InheritanceEdge {
            artifact_id: ArtifactId(1),
            class_name: "com.example.Grandchild".to_string(),
            parent_class_name: "com.example.Child".to_string(),
            kind: EdgeKind::Extends,
        });

        let descendants = store.descendants_of("com.example.Base", None);
        let names: Vec<_> = descendants.iter().map(|e| e.class_name.as_str()).collect();
        assert!(names.contains(&"com.example.Child"));
        assert!(names.contains(&"com.example.Grandchild"));
    }

    #[test]
    fn glob_search_matches_wildcard_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store
            .insert_class(ClassEntry::new(ArtifactId(1), "com.example.demo.UserService"))
            .unwrap();

        let matches = store.classes_glob("com.example.demo.*").unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn save_and_reopen_restores_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = Store::open(dir.path()).unwrap();
            store.upsert_artifact(sample_artifact("com.example", "demo", "1.0.0"));
            store.save().unwrap();
        }

        let reopened = Store::open(dir.path()).unwrap();
        assert_eq!(reopened.all_artifacts().len(), 1);
    }

    #[test]
    fn refresh_all_clears_content_but_keeps_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let id = store.upsert_artifact(sample_artifact("com.example", "demo", "1.0.0"));
        store.mark_indexed(id);
        store
            .insert_class(ClassEntry::new(id, "com.example.demo.Widget"))
            .unwrap();
        store.insert_edge(InheritanceEdge {
            artifact_id: id,
            class_name: "com.example.demo.Widget".to_string(),
            parent_class_name: "com.example.demo.Base".to_string(),
            kind: EdgeKind::Extends,
        });

        store.refresh_all().unwrap();

        assert_eq!(store.all_artifacts().len(), 1);
        assert!(!store.get_artifact(id).unwrap().is_indexed);
        assert!(store.classes_exact("com.example.demo.Widget").is_empty());
        assert!(store.descendants_of("com.example.demo.Base", None).is_empty());
    }

    #[test]
    fn inheritance_migration_check_resets_indexed_artifacts_without_edges() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let id = store.upsert_artifact(sample_artifact("com.example", "demo", "1.0.0"));
        store.mark_indexed(id);
        store
            .insert_class(ClassEntry::new(id, "com.example.demo.Widget"))
            .unwrap();

        store.reset_if_inheritance_missing();

        assert!(!store.get_artifact(id).unwrap().is_indexed);
        assert!(store.classes_exact("com.example.demo.Widget").is_empty());
    }

    #[test]
    fn inheritance_migration_check_is_a_no_op_once_edges_exist() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let id = store.upsert_artifact(sample_artifact("com.example", "demo", "1.0.0"));
        store.mark_indexed(id);
        store.insert_edge(InheritanceEdge {
            artifact_id: id,
            class_name: "com.example.demo.Widget".to_string(),
            parent_class_name: "com.example.demo.Base".to_string(),
            kind: EdgeKind::Extends,
        });

        store.reset_if_inheritance_missing();

        assert!(store.get_artifact(id).unwrap().is_indexed);
    }
}
