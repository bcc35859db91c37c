//! Walks a Gradle dependency cache (`~/.gradle/caches/modules-2/files-2.1`)
//! and emits candidate [`Artifact`]s (base spec §4.1). Grounded on the
//! discoverer pattern used to parse this exact cache layout: a lazy
//! `walkdir::WalkDir` traversal over
//! `{group}/{artifact}/{version}/{hash}/{file}`.
//!
//! Unlike Maven layout, a single `(group, artifact, version)` can have
//! several hash directories (one per downloaded file's checksum — the jar,
//! the sources jar, and the POM each live under their own hash). Scanning
//! therefore groups entries by coordinate before emitting one [`Artifact`]
//! per version.

use jarscope_api::naming::matches_any_prefix;
use jarscope_api::{Artifact, ArtifactId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Default)]
struct VersionFiles {
    main_jar: Option<PathBuf>,
    has_source: bool,
}

/// A Gradle-layout dependency cache scanner.
pub struct GradleScanner<'a> {
    pub normalized_prefixes: &'a [String],
}

impl<'a> GradleScanner<'a> {
    pub fn new(normalized_prefixes: &'a [String]) -> Self {
        Self {
            normalized_prefixes,
        }
    }

    /// The default Gradle cache root for the current user, if resolvable.
    pub fn default_cache_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".gradle/caches/modules-2/files-2.1"))
    }

    /// `scan(cacheRoot, prefixes) -> list<Artifact>` with `id = 0` and
    /// `is_indexed = false`. Unreadable directories are skipped silently.
    pub fn scan(&self, cache_root: &Path) -> Vec<Artifact> {
        if !cache_root.is_dir() {
            return Vec::new();
        }

        // Keyed by (group, artifact, version) to aggregate across hash dirs.
        let mut by_coordinate: BTreeMap<(String, String, String), VersionFiles> = BTreeMap::new();

        let walker = WalkDir::new(cache_root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().and_then(|ext| ext.to_str()) == Some("jar"));

        for entry in walker {
            let Some(coordinate) = self.coordinate_for(cache_root, entry.path()) else {
                continue;
            };
            let fq_name = format!("{}.{}", coordinate.0, coordinate.1);
            if !matches_any_prefix(&fq_name, self.normalized_prefixes)
                && !matches_any_prefix(&coordinate.0, self.normalized_prefixes)
            {
                continue;
            }

            let file_name = entry
                .path()
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();

            let slot = by_coordinate.entry(coordinate).or_default();
            if file_name.ends_with("-sources.jar") {
                slot.has_source = true;
            } else if file_name.ends_with("-javadoc.jar") {
                // Neither the main artifact nor a source of detail-extraction text.
            } else if slot.main_jar.is_none() {
                slot.main_jar = Some(entry.path().to_path_buf());
            }
        }

        by_coordinate
            .into_iter()
            .filter_map(|((group_id, artifact_id, version), files)| {
                let main_jar = files.main_jar?;
                let abspath = main_jar.parent()?.to_path_buf();
                Some(Artifact {
                    id: ArtifactId::UNASSIGNED,
                    group_id,
                    artifact_id,
                    version,
                    abspath,
                    has_source: files.has_source,
                    is_indexed: false,
                })
            })
            .collect()
    }

    /// Extract `(group, artifact, version)` from a path under the cache
    /// root. Expected shape: `group/artifact/version/hash/file`.
    fn coordinate_for(&self, cache_root: &Path, path: &Path) -> Option<(String, String, String)> {
        let relative = path.strip_prefix(cache_root).ok()?;
        let components: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if components.len() < 4 {
            return None;
        }
        Some((
            components[0].clone(),
            components[1].clone(),
            components[2].clone(),
        ))
    }
}

/// The main archive jar for a Gradle-layout artifact, as discovered by
/// scanning (already absolute, unlike the Maven layout's derived path).
pub fn main_jar_path(artifact: &Artifact) -> Option<PathBuf> {
    std::fs::read_dir(&artifact.abspath)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| {
            let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
            name.ends_with(".jar") && !name.ends_with("-sources.jar") && !name.ends_with("-javadoc.jar")
        })
}

/// The sibling `-sources.jar` path for a Gradle-layout artifact, if one was
/// found during scanning (`has_source`). The sources jar lives in its own
/// hash directory, a sibling of `abspath`'s parent, so this walks up one
/// level and searches siblings.
pub fn sources_jar_path(artifact: &Artifact) -> Option<PathBuf> {
    let version_dir = artifact.abspath.parent()?;
    for hash_dir in std::fs::read_dir(version_dir).ok()?.filter_map(|e| e.ok()) {
        let hash_path = hash_dir.path();
        if !hash_path.is_dir() {
            continue;
        }
        if let Some(found) = std::fs::read_dir(&hash_path)
            .ok()?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .find(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with("-sources.jar"))
            })
        {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn finds_a_jar_and_its_sources_across_hash_directories() {
        let dir = tempdir().unwrap();
        let jar_dir = dir.path().join("io.netty/netty-common/4.1.100.Final/abc123");
        fs::create_dir_all(&jar_dir).unwrap();
        touch(&jar_dir.join("netty-common-4.1.100.Final.jar"));

        let sources_dir = dir
            .path()
            .join("io.netty/netty-common/4.1.100.Final/def456");
        fs::create_dir_all(&sources_dir).unwrap();
        touch(&sources_dir.join("netty-common-4.1.100.Final-sources.jar"));

        let scanner = GradleScanner::new(&[]);
        let artifacts = scanner.scan(dir.path());

        assert_eq!(artifacts.len(), 1);
        let a = &artifacts[0];
        assert_eq!(a.group_id, "io.netty");
        assert_eq!(a.artifact_id, "netty-common");
        assert_eq!(a.version, "4.1.100.Final");
        assert!(a.has_source);
    }

    #[test]
    fn javadoc_jars_are_ignored() {
        let dir = tempdir().unwrap();
        let jar_dir = dir.path().join("com.example/demo/1.0/hash1");
        fs::create_dir_all(&jar_dir).unwrap();
        touch(&jar_dir.join("demo-1.0-javadoc.jar"));

        let scanner = GradleScanner::new(&[]);
        assert!(scanner.scan(dir.path()).is_empty());
    }

    #[test]
    fn include_patterns_prune_unrelated_groups() {
        let dir = tempdir().unwrap();
        for (group, artifact) in [("com.test", "allowed"), ("com.other", "ignored")] {
            let jar_dir = dir.path().join(group).join(artifact).join("1.0").join("hash1");
            fs::create_dir_all(&jar_dir).unwrap();
            touch(&jar_dir.join(format!("{artifact}-1.0.jar")));
        }

        let prefixes = vec!["com.test".to_string()];
        let scanner = GradleScanner::new(&prefixes);
        let artifacts = scanner.scan(dir.path());

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].artifact_id, "allowed");
    }
}
