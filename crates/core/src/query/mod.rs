//! Read-side query surface over the [`Store`](crate::store::Store) (base
//! spec §4.5): artifact/class/implementation/resource search, dispatched by
//! query-string syntax the way the base spec's external interface describes.

use crate::error::Result;
use crate::store::Store;
use jarscope_api::{ArtifactMatch, ClassMatch, EdgeKind, ResourceMatch};
use std::sync::Arc;

const ARTIFACT_SEARCH_LIMIT: usize = 50;
const FRAGMENT_SEARCH_LIMIT: usize = 100;
const CLASS_MATCH_LIMIT: usize = 100;

pub struct QueryEngine {
    store: Arc<Store>,
}

impl QueryEngine {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Substring match on `groupId` or `artifactId`; capped at 50 rows.
    pub fn search_artifacts(&self, query: &str) -> Vec<ArtifactMatch> {
        let needle = query.to_lowercase();
        self.store
            .all_artifacts()
            .into_iter()
            .filter(|a| {
                a.group_id.to_lowercase().contains(&needle)
                    || a.artifact_id.to_lowercase().contains(&needle)
            })
            .take(ARTIFACT_SEARCH_LIMIT)
            .map(|artifact| ArtifactMatch { artifact })
            .collect()
    }

    /// Search classes. A leading `regex:` prefix selects regex mode, a
    /// pattern containing `*`/`?` selects glob mode, otherwise the query
    /// runs as a tokenized fragment search against the full-text index.
    pub fn search_classes(&self, query: &str) -> Result<Vec<ClassMatch>> {
        let entries = if let Some(pattern) = query.strip_prefix("regex:") {
            self.store.classes_regex(pattern)?
        } else if query.contains('*') || query.contains('?') {
            self.store.classes_glob(query)?
        } else {
            self.store.classes_fragment(query, FRAGMENT_SEARCH_LIMIT)?
        };

        let mut matches = self.group_by_fq_name(entries);
        matches.truncate(CLASS_MATCH_LIMIT);
        Ok(matches)
    }

    fn group_by_fq_name(&self, entries: Vec<jarscope_api::ClassEntry>) -> Vec<ClassMatch> {
        use std::collections::BTreeMap;
        let mut grouped: BTreeMap<String, Vec<jarscope_api::ArtifactId>> = BTreeMap::new();
        for entry in entries {
            grouped
                .entry(entry.fq_name)
                .or_default()
                .push(entry.artifact_id);
        }

        grouped
            .into_iter()
            .map(|(fq_name, artifact_ids)| {
                let artifacts = artifact_ids
                    .into_iter()
                    .filter_map(|id| self.store.get_artifact(id))
                    .collect();
                ClassMatch { fq_name, artifacts }
            })
            .collect()
    }

    /// Every class that transitively extends or implements `class_name`,
    /// capped at 100 rows (the store's own descendant-walk bound).
    pub fn search_implementations(&self, class_name: &str) -> Vec<ClassMatch> {
        let descendants = self.store.descendants_of(class_name, None);
        let entries: Vec<jarscope_api::ClassEntry> = descendants
            .into_iter()
            .flat_map(|edge| self.store.classes_exact(&edge.class_name))
            .collect();
        self.group_by_fq_name(entries)
    }

    /// Every class that directly implements an interface (not `extends`).
    pub fn search_implementors_of_interface(&self, interface_name: &str) -> Vec<ClassMatch> {
        let entries: Vec<jarscope_api::ClassEntry> = self
            .store
            .direct_children_of(interface_name, Some(EdgeKind::Implements))
            .into_iter()
            .flat_map(|edge| self.store.classes_exact(&edge.class_name))
            .collect();
        self.group_by_fq_name(entries)
    }

    /// Resources (e.g. `.proto` files) whose path contains `fragment`.
    pub fn search_resources(&self, fragment: &str) -> Vec<ResourceMatch> {
        self.store
            .resources_matching(fragment)
            .into_iter()
            .filter_map(|resource| {
                let artifact = self.store.get_artifact(resource.artifact_id)?;
                Some(ResourceMatch::from_resource(&resource, artifact))
            })
            .collect()
    }

    /// Resources that generate code for `class_name`, including their
    /// content (the base spec's `(path, content, type)[]` shape).
    pub fn get_resources_for_class(&self, class_name: &str) -> Vec<ResourceMatch> {
        self.store
            .links_for_class(class_name)
            .into_iter()
            .filter_map(|link| {
                let resource = self.store.get_resource(link.resource_id)?;
                let artifact = self.store.get_artifact(resource.artifact_id)?;
                Some(ResourceMatch::with_content(&resource, artifact))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use jarscope_api::{Artifact, ArtifactId, ClassEntry, InheritanceEdge, Resource, ResourceType};
    use std::path::PathBuf;

    fn artifact(group: &str, artifact_id: &str, version: &str) -> Artifact {
        Artifact {
            id: ArtifactId::UNASSIGNED,
            group_id: group.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            abspath: PathBuf::from("/repo"),
            has_source: false,
            is_indexed: false,
        }
    }

    fn engine_with_store() -> (QueryEngine, std::sync::Arc<Store>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(Store::open(dir.path()).unwrap());
        let engine = QueryEngine::new(store.clone());
        (engine, store, dir)
    }

    #[test]
    fn search_artifacts_matches_group_or_artifact_id_case_insensitively() {
        let (engine, store, _dir) = engine_with_store();
        store.upsert_artifact(artifact("com.example", "widget-core", "1.0.0"));
        store.upsert_artifact(artifact("com.other", "unrelated", "2.0.0"));

        let matches = engine.search_artifacts("WIDGET");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].artifact.artifact_id, "widget-core");
    }

    #[test]
    fn search_classes_glob_groups_results_by_fully_qualified_name() {
        let (engine, store, _dir) = engine_with_store();
        let id = store.upsert_artifact(artifact("com.example", "demo", "1.0.0"));
        store
            .insert_class(ClassEntry::new(id, "com.example.demo.Widget"))
            .unwrap();

        let matches = engine.search_classes("com.example.demo.*").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].fq_name, "com.example.demo.Widget");
        assert_eq!(matches[0].artifacts.len(), 1);
    }

    #[test]
    fn search_classes_rejects_invalid_regex_as_invalid_query() {
        let (engine, _store, _dir) = engine_with_store();
        let err = engine.search_classes("regex:(").unwrap_err();
        assert!(matches!(err, crate::error::CoreError::InvalidQuery(_)));
    }

    #[test]
    fn search_implementations_finds_transitive_descendants() {
        let (engine, store, _dir) = engine_with_store();
        let id = store.upsert_artifact(artifact("com.example", "demo", "1.0.0"));
        store
            .insert_class(ClassEntry::new(id, "com.example.demo.Grandchild"))
            .unwrap();
        store.insert_edge(InheritanceEdge {
            artifact_id: id,
            class_name: "com.example.demo.Child".to_string(),
            parent_class_name: "com.example.demo.Base".to_string(),
            kind: jarscope_api::EdgeKind::Extends,
        });
        store.insert_edge(InheritanceEdge {
            artifact_id: id,
            class_name: "com.example.demo.Grandchild".to_string(),
            parent_class_name: "com.example.demo.Child".to_string(),
            kind: jarscope_api::EdgeKind::Extends,
        });

        let matches = engine.search_implementations("com.example.demo.Base");
        let names: Vec<_> = matches.iter().map(|m| m.fq_name.as_str()).collect();
        assert!(names.contains(&"com.example.demo.Grandchild"));
    }

    #[test]
    fn search_resources_returns_path_matches_without_content() {
        let (engine, store, _dir) = engine_with_store();
        let id = store.upsert_artifact(artifact("com.example", "demo", "1.0.0"));
        store.insert_resource(Resource {
            id: jarscope_api::ResourceId(0),
            artifact_id: id,
            path: "demo/Widget.proto".to_string(),
            resource_type: ResourceType::Proto,
            content: "message Widget {}".to_string(),
        });

        let matches = engine.search_resources("widget.proto");
        assert_eq!(matches.len(), 1);
        assert!(matches[0].content.is_none());
    }

    #[test]
    fn get_resources_for_class_includes_content() {
        let (engine, store, _dir) = engine_with_store();
        let id = store.upsert_artifact(artifact("com.example", "demo", "1.0.0"));
        let resource_id = store.insert_resource(Resource {
            id: jarscope_api::ResourceId(0),
            artifact_id: id,
            path: "demo/Widget.proto".to_string(),
            resource_type: ResourceType::Proto,
            content: "message Widget {}".to_string(),
        });
        store.insert_resource_link(jarscope_api::ResourceClassLink {
            resource_id,
            class_name: "com.example.demo.Widget".to_string(),
        });

        let matches = engine.get_resources_for_class("com.example.demo.Widget");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].content.as_deref(), Some("message Widget {}"));
    }
}
