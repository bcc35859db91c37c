//! Walks a Maven-layout repository root and emits candidate [`Artifact`]s
//! (base spec §4.1). Built on `walkdir`, the same crate the Gradle-layout
//! scanner in `jarscope-gradle` uses for its own directory traversal.

use jarscope_api::naming::matches_any_prefix;
use jarscope_api::{Artifact, ArtifactId};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A Maven-layout repository is a directory tree where a leaf directory
/// contains a `<artifactId>-<version>.pom` file; the leaf's name is
/// `version`, its parent is `artifactId`, and the relative path from the
/// repository root to the grandparent (dots instead of separators) is
/// `groupId`.
pub struct MavenScanner<'a> {
    pub normalized_prefixes: &'a [String],
}

impl<'a> MavenScanner<'a> {
    pub fn new(normalized_prefixes: &'a [String]) -> Self {
        Self {
            normalized_prefixes,
        }
    }

    /// `scan(repoPath, prefixes) -> list<Artifact>` with `id = 0` and
    /// `is_indexed = false`. Unreadable directories are skipped silently;
    /// scanning never aborts globally.
    pub fn scan(&self, repo_root: &Path) -> Vec<Artifact> {
        if !repo_root.is_dir() {
            return Vec::new();
        }

        let mut artifacts = Vec::new();

        let walker = WalkDir::new(repo_root).into_iter().filter_entry(|entry| {
            if !entry.file_type().is_dir() {
                return true;
            }
            self.directory_is_in_scope(repo_root, entry.path())
        });

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(artifact) = self.artifact_from_leaf(repo_root, entry.path()) {
                artifacts.push(artifact);
            }
        }

        artifacts
    }

    /// Directory-level include-pattern pruning: only descend into subtrees
    /// whose dotted path corresponds to one of the normalized prefixes (or
    /// is itself a prefix of one, so we can still reach a deeper match).
    fn directory_is_in_scope(&self, repo_root: &Path, dir: &Path) -> bool {
        if self.normalized_prefixes.is_empty() {
            return true;
        }
        let Some(dotted) = dotted_relative_path(repo_root, dir) else {
            return true;
        };
        if dotted.is_empty() {
            return true;
        }

        self.normalized_prefixes.iter().any(|prefix| {
            // Either this directory is already under an allowed prefix, or
            // it's an ancestor of one we still need to descend through.
            prefix == &dotted
                || dotted.starts_with(&format!("{prefix}."))
                || prefix.starts_with(&format!("{dotted}."))
        })
    }

    fn artifact_from_leaf(&self, repo_root: &Path, leaf: &Path) -> Option<Artifact> {
        let version = leaf.file_name()?.to_str()?.to_string();
        let artifact_parent = leaf.parent()?;
        let artifact_id = artifact_parent.file_name()?.to_str()?.to_string();
        let group_dir = artifact_parent.parent()?;

        let pom_name = format!("{artifact_id}-{version}.pom");
        if !leaf.join(&pom_name).is_file() {
            return None;
        }

        let group_id = dotted_relative_path(repo_root, group_dir)?;
        if group_id.is_empty() {
            return None;
        }

        let fq_name_for_filter = format!("{group_id}.{artifact_id}");
        if !matches_any_prefix(&fq_name_for_filter, self.normalized_prefixes)
            && !matches_any_prefix(&group_id, self.normalized_prefixes)
        {
            return None;
        }

        let sources_jar = leaf.join(format!("{artifact_id}-{version}-sources.jar"));

        Some(Artifact {
            id: ArtifactId::UNASSIGNED,
            group_id,
            artifact_id,
            version,
            abspath: leaf.to_path_buf(),
            has_source: sources_jar.is_file(),
            is_indexed: false,
        })
    }
}

/// The relative path from `root` to `path`, with separators replaced by
/// dots. `None` if `path` does not descend from `root`.
fn dotted_relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("."))
}

/// The main archive jar for a Maven-layout artifact, if present.
pub fn main_jar_path(artifact: &Artifact) -> PathBuf {
    artifact
        .abspath
        .join(format!("{}-{}.jar", artifact.artifact_id, artifact.version))
}

/// The sibling `-sources.jar` path for a Maven-layout artifact.
pub fn sources_jar_path(artifact: &Artifact) -> PathBuf {
    artifact.abspath.join(format!(
        "{}-{}-sources.jar",
        artifact.artifact_id, artifact.version
    ))
}
