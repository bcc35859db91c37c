//! Per-class detail extraction (base spec §4.7): signatures disassembled
//! from bytecode, or Javadoc/source text read from a sibling sources jar,
//! falling back to an external decompiler when no source is available.
//!
//! Read-only with respect to the [`Store`](crate::store::Store); this module
//! never touches it; callers supply the resolved `Artifact` directly (having
//! already consulted `ArtifactResolver` if the class spans several).

mod source_parser;

use crate::config::Config;
use crate::error::{CoreError, Result};
use jarscope_api::{Artifact, ClassDetail, DetailKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Per-archive operations (class extraction, decompiler subprocess calls)
/// are given this much time before being treated as a failure, matching the
/// base spec's "archive processing failed" soft-timeout semantics.
const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DetailExtractor {
    config: Arc<Config>,
}

impl DetailExtractor {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    pub async fn extract(
        &self,
        artifact: &Artifact,
        class_name: &str,
        kind: DetailKind,
    ) -> Result<ClassDetail> {
        let artifact = artifact.clone();
        let class_name = class_name.to_string();
        let config = Arc::clone(&self.config);

        let result = timeout(
            OPERATION_TIMEOUT,
            tokio::task::spawn_blocking(move || extract_blocking(&config, &artifact, &class_name, kind)),
        )
        .await;

        match result {
            Ok(Ok(inner)) => inner,
            Ok(Err(join_err)) => Err(CoreError::Internal(join_err.to_string())),
            Err(_timed_out) => Err(CoreError::ArchiveUnreadable(
                "archive processing timed out".to_string(),
            )),
        }
    }
}

fn extract_blocking(
    config: &Config,
    artifact: &Artifact,
    class_name: &str,
    kind: DetailKind,
) -> Result<ClassDetail> {
    match kind {
        DetailKind::Signatures => extract_signatures(artifact, class_name),
        DetailKind::Docs | DetailKind::Source => extract_docs_or_source(config, artifact, class_name),
    }
}

fn extract_signatures(artifact: &Artifact, class_name: &str) -> Result<ClassDetail> {
    let Some(main_archive) = main_archive_path(artifact) else {
        return Err(not_found(artifact, class_name));
    };

    let entry_name = format!("{}.class", class_name.replace('.', "/"));
    let mut reader = jarscope_java::ArchiveReader::open(&main_archive)?;
    let Some(bytes) = reader.read_by_name(&entry_name)? else {
        return Err(not_found(artifact, class_name));
    };

    let signatures = jarscope_java::read_signatures(&bytes)?
        .into_iter()
        .map(|s| s.text)
        .collect();

    Ok(ClassDetail {
        signatures,
        ..Default::default()
    })
}

fn extract_docs_or_source(
    config: &Config,
    artifact: &Artifact,
    class_name: &str,
) -> Result<ClassDetail> {
    if artifact.has_source {
        if let Some(detail) = read_from_sources_archive(artifact, class_name)? {
            return Ok(detail);
        }
    }

    decompile(config, artifact, class_name)
}

/// Looks for `<className>.java` or `<className>.kt` (directory form: dots
/// replaced by slashes, simple name appended) inside the sibling sources
/// archive. `Ok(None)` means "keep trying", not "class missing" — the
/// decompiler fallback still gets a chance.
fn read_from_sources_archive(artifact: &Artifact, class_name: &str) -> Result<Option<ClassDetail>> {
    let Some(sources_archive) = sources_archive_path(artifact) else {
        return Ok(None);
    };

    let mut reader = match jarscope_java::ArchiveReader::open(&sources_archive) {
        Ok(r) => r,
        Err(_) => return Ok(None),
    };

    let base = class_name.replace('.', "/");
    for ext in ["java", "kt"] {
        let entry_name = format!("{base}.{ext}");
        if let Some(bytes) = reader.read_by_name(&entry_name)? {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            let (signatures, doc) = source_parser::parse(&text);
            return Ok(Some(ClassDetail {
                signatures,
                doc,
                source: Some(text),
                language: Some(if ext == "kt" { "kotlin" } else { "java" }.to_string()),
                used_decompilation: false,
            }));
        }
    }

    Ok(None)
}

fn decompile(config: &Config, artifact: &Artifact, class_name: &str) -> Result<ClassDetail> {
    let Some(decompiler_path) = &config.decompiler_path else {
        return Err(CoreError::DecompilerUnavailable(
            "no decompilerPath configured".to_string(),
        ));
    };
    if !decompiler_path.is_file() {
        return Err(CoreError::DecompilerUnavailable(format!(
            "{} does not exist",
            decompiler_path.display()
        )));
    }

    let Some(main_archive) = main_archive_path(artifact) else {
        return Err(not_found(artifact, class_name));
    };

    let entry_name = format!("{}.class", class_name.replace('.', "/"));
    let mut reader = jarscope_java::ArchiveReader::open(&main_archive)?;
    let Some(bytes) = reader.read_by_name(&entry_name)? else {
        return Err(not_found(artifact, class_name));
    };

    let simple_name = class_name.rsplit('.').next().unwrap_or(class_name);
    let scratch = scratch_class_path(&bytes, simple_name);
    std::fs::write(&scratch, &bytes)?;
    let output = run_decompiler(decompiler_path, &scratch, &main_archive, class_name);
    let _ = std::fs::remove_file(&scratch);

    let text = output?;
    let (signatures, doc) = source_parser::parse(&text);
    Ok(ClassDetail {
        signatures,
        doc,
        source: Some(text),
        language: Some("java".to_string()),
        used_decompilation: true,
    })
}

fn run_decompiler(
    decompiler_path: &Path,
    scratch_class: &Path,
    main_archive: &Path,
    class_name: &str,
) -> Result<String> {
    // CFR-style invocation: `java -jar <decompiler> <classFile>`. Decompilers
    // that want the whole archive plus an inner class name are invoked with
    // the archive path instead; CFR accepts a bare `.class` file directly,
    // which is simplest and needs no archive-relative path translation. This
    // already runs inside `spawn_blocking`, so a plain synchronous `Command`
    // is fine here.
    let output = std::process::Command::new("java")
        .arg("-jar")
        .arg(decompiler_path)
        .arg(scratch_class)
        .output()
        .map_err(|e| CoreError::DecompilerUnavailable(e.to_string()))?;

    if !output.status.success() {
        let _ = main_archive;
        let _ = class_name;
        return Err(CoreError::DecompilerUnavailable(format!(
            "decompiler exited with {}",
            output.status
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn scratch_class_path(bytes: &[u8], simple_name: &str) -> PathBuf {
    let digest = xxhash_rust::xxh3::xxh3_64(bytes);
    std::env::temp_dir().join(format!("jarscope-decompile-{digest}-{simple_name}.class"))
}

fn not_found(artifact: &Artifact, class_name: &str) -> CoreError {
    CoreError::ClassNotFound {
        class_name: class_name.to_string(),
        coordinate: artifact.coordinate(),
    }
}

/// The main archive for an artifact, trying the Maven-layout derivation
/// first and falling back to a Gradle-layout directory scan, mirroring
/// `ArtifactResolver`'s own layout-agnostic lookup.
fn main_archive_path(artifact: &Artifact) -> Option<PathBuf> {
    crate::resolver::main_archive_path(artifact)
}

/// The sibling sources archive, trying the Maven-layout sibling file first
/// and falling back to a Gradle-layout sibling hash-directory scan.
fn sources_archive_path(artifact: &Artifact) -> Option<PathBuf> {
    let maven_candidate = jarscope_java::sources_jar_path(artifact);
    if maven_candidate.is_file() {
        return Some(maven_candidate);
    }
    jarscope_gradle::sources_jar_path(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarscope_api::ArtifactId;
    use std::io::Write;
    use tempfile::tempdir;

    fn make_jar(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }

    fn artifact(dir: &Path, has_source: bool) -> Artifact {
        Artifact {
            id: ArtifactId(1),
            group_id: "com.example".to_string(),
            artifact_id: "demo".to_string(),
            version: "1.0.0".to_string(),
            abspath: dir.to_path_buf(),
            has_source,
            is_indexed: true,
        }
    }

    #[test]
    fn signatures_extraction_reports_not_found_for_missing_archive() {
        let dir = tempdir().unwrap();
        let a = artifact(dir.path(), false);
        let err = extract_signatures(&a, "com.example.Demo").unwrap_err();
        assert!(matches!(err, CoreError::ClassNotFound { .. }));
    }

    #[test]
    fn docs_are_read_from_sibling_sources_archive() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("demo-1.0.0.jar"), b"").unwrap();
        make_jar(
            &dir.path().join("demo-1.0.0-sources.jar"),
            &[(
                "com/example/Demo.java",
                b"/**\n * Says hello.\n */\npublic class Demo {\n    public void greet() {}\n}",
            )],
        );

        let a = artifact(dir.path(), true);
        let detail = read_from_sources_archive(&a, "com.example.Demo")
            .unwrap()
            .unwrap();
        assert_eq!(detail.doc.as_deref(), Some("Says hello."));
        assert!(!detail.used_decompilation);
        assert_eq!(detail.language.as_deref(), Some("java"));
    }

    #[test]
    fn missing_source_entry_returns_none_not_an_error() {
        let dir = tempdir().unwrap();
        make_jar(&dir.path().join("demo-1.0.0-sources.jar"), &[("a.txt", b"x")]);
        let a = artifact(dir.path(), true);
        assert!(read_from_sources_archive(&a, "com.example.Demo")
            .unwrap()
            .is_none());
    }
}
