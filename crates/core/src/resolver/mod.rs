//! Deterministic "pick one artifact among several" comparator (base spec
//! §4.8). No crate in this lineage ships a version-resolution strategy, so
//! this module is a small self-contained comparator, built the way the
//! teacher structures its own dispatch-by-policy types (a plain struct
//! holding the active strategy, methods doing the comparison).

use jarscope_api::{Artifact, VersionStrategy};
use regex::Regex;
use std::cmp::Ordering;
use std::time::SystemTime;

pub struct ArtifactResolver {
    strategy: VersionStrategy,
}

impl ArtifactResolver {
    pub fn new(strategy: VersionStrategy) -> Self {
        Self { strategy }
    }

    /// Pick the best candidate per the base spec's comparator: `hasSource`
    /// wins absolutely, then the configured strategy breaks ties, then the
    /// higher (later-discovered) artifact id breaks any remaining tie.
    pub fn resolve_best<'a>(&self, candidates: &'a [Artifact]) -> Option<&'a Artifact> {
        candidates.iter().max_by(|a, b| self.compare(a, b))
    }

    fn compare(&self, a: &Artifact, b: &Artifact) -> Ordering {
        a.has_source
            .cmp(&b.has_source)
            .then_with(|| self.compare_by_strategy(a, b))
            .then_with(|| a.id.cmp(&b.id))
    }

    fn compare_by_strategy(&self, a: &Artifact, b: &Artifact) -> Ordering {
        match self.strategy {
            VersionStrategy::Semver => compare_semver(&a.version, &b.version),
            VersionStrategy::LatestPublished => {
                published_timestamp(a).cmp(&published_timestamp(b))
            }
            VersionStrategy::LatestUsed => created_timestamp(a).cmp(&created_timestamp(b)),
        }
    }
}

/// Higher semantic version wins; a pre-release loses to the same base
/// release (`1.0.0-SNAPSHOT` < `1.0.0`).
fn compare_semver(a: &str, b: &str) -> Ordering {
    match (parse_loose_semver(a), parse_loose_semver(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

fn parse_loose_semver(version: &str) -> Option<semver::Version> {
    if let Ok(v) = semver::Version::parse(version) {
        return Some(v);
    }
    // Maven versions often omit the patch component (`1.0`) or use
    // qualifiers semver doesn't accept verbatim (`1.0.0.Final`); normalize
    // the common shapes before giving up.
    let numeric_prefix: String = version
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let parts: Vec<&str> = numeric_prefix.split('.').filter(|s| !s.is_empty()).collect();
    if parts.is_empty() {
        return None;
    }
    let major = parts.first()?.parse().ok()?;
    let minor = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);
    let patch = parts.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);
    let rest = &version[numeric_prefix.len()..];
    let pre = if rest.to_lowercase().contains("snapshot") || rest.starts_with('-') {
        semver::Prerelease::new("snapshot").ok()?
    } else {
        semver::Prerelease::EMPTY
    };
    Some(semver::Version {
        major,
        minor,
        patch,
        pre,
        build: semver::BuildMetadata::EMPTY,
    })
}

const LAST_UPDATED_RE: &str = r"lastUpdated=(\d+)";

/// A per-artifact publish timestamp: the greatest `lastUpdated=<millis>`
/// value in a sibling `*.pom.lastUpdated` marker file if one exists,
/// otherwise the main archive's modification time.
fn published_timestamp(artifact: &Artifact) -> i64 {
    if let Some(marker) = find_last_updated_marker(artifact) {
        if let Ok(content) = std::fs::read_to_string(&marker) {
            if let Ok(re) = Regex::new(LAST_UPDATED_RE) {
                if let Some(max) = re
                    .captures_iter(&content)
                    .filter_map(|c| c.get(1)?.as_str().parse::<i64>().ok())
                    .max()
                {
                    return max;
                }
            }
        }
    }

    main_archive_path(artifact)
        .and_then(|p| std::fs::metadata(p).ok())
        .and_then(|m| m.modified().ok())
        .map(system_time_millis)
        .unwrap_or(0)
}

fn created_timestamp(artifact: &Artifact) -> i64 {
    main_archive_path(artifact)
        .and_then(|p| std::fs::metadata(p).ok())
        .and_then(|m| m.created().ok())
        .map(system_time_millis)
        .unwrap_or(0)
}

fn system_time_millis(time: SystemTime) -> i64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn find_last_updated_marker(artifact: &Artifact) -> Option<std::path::PathBuf> {
    let candidate = artifact.abspath.join(format!(
        "{}-{}.pom.lastUpdated",
        artifact.artifact_id, artifact.version
    ));
    candidate.is_file().then_some(candidate)
}

/// The main jar for an artifact, trying the Maven-layout derivation first
/// (a sibling of `abspath`) and falling back to a Gradle-layout directory
/// scan (`abspath` itself is the jar's hash directory).
pub(crate) fn main_archive_path(artifact: &Artifact) -> Option<std::path::PathBuf> {
    let maven_candidate = jarscope_java::main_jar_path(artifact);
    if maven_candidate.is_file() {
        return Some(maven_candidate);
    }
    jarscope_gradle::main_jar_path(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarscope_api::ArtifactId;
    use std::path::PathBuf;

    fn artifact(id: u64, version: &str, has_source: bool) -> Artifact {
        Artifact {
            id: ArtifactId(id),
            group_id: "com.example".to_string(),
            artifact_id: "demo".to_string(),
            version: version.to_string(),
            abspath: PathBuf::from("/repo/com/example/demo").join(version),
            has_source,
            is_indexed: true,
        }
    }

    #[test]
    fn has_source_wins_absolutely() {
        let resolver = ArtifactResolver::new(VersionStrategy::Semver);
        let candidates = vec![artifact(1, "2.0.0", false), artifact(2, "1.0.0", true)];
        let best = resolver.resolve_best(&candidates).unwrap();
        assert_eq!(best.id, ArtifactId(2));
    }

    #[test]
    fn semver_strategy_prefers_higher_release_over_snapshot() {
        let resolver = ArtifactResolver::new(VersionStrategy::Semver);
        let candidates = vec![
            artifact(1, "1.0.0-SNAPSHOT", true),
            artifact(2, "1.0.0", true),
        ];
        let best = resolver.resolve_best(&candidates).unwrap();
        assert_eq!(best.version, "1.0.0");
    }

    #[test]
    fn final_tiebreak_is_higher_insertion_id() {
        let resolver = ArtifactResolver::new(VersionStrategy::Semver);
        let candidates = vec![artifact(1, "1.0.0", true), artifact(5, "1.0.0", true)];
        let best = resolver.resolve_best(&candidates).unwrap();
        assert_eq!(best.id, ArtifactId(5));
    }
}
