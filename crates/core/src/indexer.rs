//! Orchestrates Scanner → Store synchronization, per-artifact archive
//! ingestion, the debounced filesystem watcher, and the hourly periodic
//! re-scan (base spec §4.5, §5). Grounded on the teacher's
//! `runtime/orchestrator/indexing.rs` single-flight rebuild and
//! `runtime/watch.rs` debounced watcher, adapted from a whole-graph MVCC
//! swap onto jarscope's per-artifact transactional ingestion model: there
//! is no single "current graph" to swap, only a `Store` whose rows are
//! inserted per artifact as ingestion proceeds.

use crate::config::Config;
use crate::error::{CoreError, Result};
use crate::resolver::main_archive_path;
use crate::store::Store;
use jarscope_api::naming::matches_any_prefix;
use jarscope_api::{
    Artifact, ClassEntry, EdgeKind, InheritanceEdge, Resource, ResourceClassLink, ResourceId,
    ResourceType,
};
use jarscope_gradle::GradleScanner;
use jarscope_java::MavenScanner;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Artifacts are ingested in fixed-size batches with bounded parallelism
/// inside each batch (base spec §4.5 step 4, §9).
const CHUNK_SIZE: usize = 50;
/// Stability window a burst of watcher events must sit quiet for before a
/// debounced reindex fires (base spec §4.5 "Watcher").
const WATCH_DEBOUNCE: Duration = Duration::from_secs(2);
/// Periodic full re-scan interval (base spec §4.5 "A periodic timer
/// additionally triggers `index()` every hour").
const PERIODIC_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexerState {
    Idle,
    Indexing,
}

/// Counters describing one completed `index()`/`refresh()` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexStats {
    /// Total artifacts returned by this pass's scan (already-indexed ones
    /// included).
    pub scanned: usize,
    /// Artifacts that were unindexed at the start of this pass and were
    /// processed (successfully or not — failures are swallowed per §4.5).
    pub processed: usize,
}

/// Outcome of one `index()`/`refresh()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    Completed(IndexStats),
    /// A concurrent `index()` call observed the single-flight guard already
    /// held and returned immediately without queuing (base spec §4.5: the
    /// Indexing state "return[s] immediately without queuing").
    AlreadyRunning,
}

/// The indexing orchestrator: Scanner → Store synchronization, the
/// single-flight `index()`/`refresh()` guard, and the background watcher +
/// periodic timer tasks.
pub struct Indexer {
    config: Arc<Config>,
    store: Arc<Store>,
    /// Serializes `index()` and `refresh()` against each other; `refresh()`
    /// waits on this rather than racing an in-progress `index()` (base spec
    /// §9's decided Open Question).
    state: Arc<Mutex<IndexerState>>,
    /// Fast-path check so a concurrent `index()` call can return
    /// `AlreadyRunning` without blocking on the mutex.
    is_running: Arc<AtomicBool>,
}

impl Indexer {
    pub fn new(config: Arc<Config>, store: Arc<Store>) -> Self {
        Self {
            config,
            store,
            state: Arc::new(Mutex::new(IndexerState::Idle)),
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Single-flight scan + ingest (base spec §4.5 `index()`). Returns
    /// [`IndexOutcome::AlreadyRunning`] immediately, without blocking, if
    /// another pass is already in flight.
    pub async fn index(&self) -> Result<IndexOutcome> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return Ok(IndexOutcome::AlreadyRunning);
        }
        *self.state.lock().await = IndexerState::Indexing;

        let result = self.run_index_pass().await;

        *self.state.lock().await = IndexerState::Idle;
        self.is_running.store(false, Ordering::SeqCst);
        result.map(IndexOutcome::Completed)
    }

    /// Reset all ingested content and re-run `index()` (base spec §4.5
    /// `refresh()`). Waits for an in-progress `index()` to reach Idle before
    /// clearing the store, rather than racing it — the reference behavior
    /// for the single-flight/refresh race (base spec §9).
    pub async fn refresh(&self) -> Result<IndexOutcome> {
        let mut guard = self.state.lock().await;
        *guard = IndexerState::Indexing;
        self.is_running.store(true, Ordering::SeqCst);
        drop(guard);

        let result = match self.store.refresh_all() {
            Ok(()) => self.run_index_pass().await,
            Err(e) => Err(e),
        };

        *self.state.lock().await = IndexerState::Idle;
        self.is_running.store(false, Ordering::SeqCst);
        result.map(IndexOutcome::Completed)
    }

    async fn run_index_pass(&self) -> Result<IndexStats> {
        let prefixes = Arc::new(self.config.normalized_prefixes());

        let scanned = self.scan_roots(Arc::clone(&prefixes)).await?;
        let scanned_count = scanned.len();

        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            for artifact in scanned {
                store.upsert_artifact(artifact);
            }
        })
        .await
        .map_err(|e| CoreError::Fatal(e.to_string()))?;

        self.store.reset_if_inheritance_missing();

        let unindexed = self.store.find_unindexed();
        let processed = unindexed.len();

        let store = Arc::clone(&self.store);
        let worker = Arc::new(move |artifact: Artifact| -> std::result::Result<(), String> {
            ingest_artifact(&store, &artifact, &prefixes);
            Ok(())
        });
        jarscope_ingest::run_chunked(unindexed, CHUNK_SIZE, worker)
            .await
            .map_err(CoreError::from)?;

        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.save())
            .await
            .map_err(|e| CoreError::Fatal(e.to_string()))??;

        Ok(IndexStats {
            scanned: scanned_count,
            processed,
        })
    }

    async fn scan_roots(&self, prefixes: Arc<Vec<String>>) -> Result<Vec<Artifact>> {
        let maven_root = self.config.maven_repo.clone();
        let gradle_root = self.config.gradle_repo.clone();

        tokio::task::spawn_blocking(move || {
            let mut artifacts = Vec::new();
            if maven_root.is_dir() {
                artifacts.extend(MavenScanner::new(&prefixes).scan(&maven_root));
            }
            if gradle_root.is_dir() {
                artifacts.extend(GradleScanner::new(&prefixes).scan(&gradle_root));
            }
            artifacts
        })
        .await
        .map_err(|e| CoreError::Fatal(e.to_string()))
    }

    /// Start the debounced filesystem watcher over the configured Maven and
    /// Gradle roots (base spec §4.5 "Watcher"). A no-op, logged, if neither
    /// root currently exists (base spec §7 `ConfigurationError`: "refuses to
    /// start the watcher").
    pub fn spawn_watch(self: Arc<Self>, cancel_token: CancellationToken) {
        let roots: Vec<std::path::PathBuf> = [
            self.config.maven_repo.clone(),
            self.config.gradle_repo.clone(),
        ]
        .into_iter()
        .filter(|p| p.is_dir())
        .collect();

        if roots.is_empty() {
            tracing::warn!("neither configured root exists; filesystem watcher not started");
            return;
        }

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut watcher = match notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        }) {
            Ok(w) => w,
            Err(e) => {
                tracing::error!("failed to initialize filesystem watcher: {e}");
                return;
            }
        };
        for root in &roots {
            if let Err(e) =
                notify::Watcher::watch(&mut watcher, root, notify::RecursiveMode::Recursive)
            {
                tracing::error!(root = %root.display(), "failed to watch root: {e}");
            }
        }

        tokio::spawn(async move {
            // Keep the watcher handle alive for the life of this task; it
            // stops emitting events once dropped.
            let _watcher = watcher;
            let mut pending = false;

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    event = rx.recv() => {
                        match event {
                            Some(Ok(event)) => {
                                if is_relevant_event(&event) {
                                    pending = true;
                                }
                            }
                            Some(Err(e)) => tracing::warn!("filesystem watcher error: {e}"),
                            None => break,
                        }
                    }
                    _ = tokio::time::sleep(WATCH_DEBOUNCE), if pending => {
                        pending = false;
                        tracing::info!("filesystem change detected; reindexing");
                        if let Err(e) = self.index().await {
                            tracing::error!("watcher-triggered index() failed: {e}");
                        }
                    }
                }
            }
            tracing::info!("filesystem watcher task stopped");
        });
    }

    /// Start the hourly periodic re-scan (base spec §4.5 "A periodic timer
    /// additionally triggers `index()` every hour").
    pub fn spawn_periodic(self: Arc<Self>, cancel_token: CancellationToken) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PERIODIC_INTERVAL);
            // The first tick fires immediately; the caller already kicks off
            // an initial `index()` pass, so skip it here.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = interval.tick() => {
                        tracing::info!("periodic re-scan firing");
                        if let Err(e) = self.index().await {
                            tracing::error!("periodic index() failed: {e}");
                        }
                    }
                }
            }
        });
    }
}

/// A watcher event is relevant iff it's a create/remove touching a `.jar`
/// or `.pom` path (base spec §4.5: "glob patterns that match only `*.jar`
/// and `*.pom`"; `add`/`addDir`/`unlink`/`unlinkDir` collapse onto
/// create/remove here since `notify` doesn't distinguish file vs directory
/// kinds at this level).
fn is_relevant_event(event: &notify::Event) -> bool {
    use notify::EventKind::{Create, Remove};
    matches!(event.kind, Create(_) | Remove(_))
        && event.paths.iter().any(|p| is_relevant_path(p))
}

fn is_relevant_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("jar") | Some("pom")
    )
}

/// Ingest one artifact's archive into `store`: classes, inheritance edges,
/// and `.proto` resources, filtered by the normalized include-package
/// prefixes (base spec §4.5 "Include-pattern filter at symbol level").
/// Failures are swallowed per the base spec's §4.5/§7 failure semantics —
/// the artifact is always marked indexed afterward so a broken or missing
/// archive is never retried forever.
fn ingest_artifact(store: &Store, artifact: &Artifact, prefixes: &[String]) {
    if let Err(e) = ingest_artifact_inner(store, artifact, prefixes) {
        tracing::warn!(
            artifact = %artifact.coordinate(),
            error = %e,
            "archive ingestion failed; marking indexed anyway"
        );
    }
    store.mark_indexed(artifact.id);
}

fn ingest_artifact_inner(store: &Store, artifact: &Artifact, prefixes: &[String]) -> Result<()> {
    let Some(main_archive) = main_archive_path(artifact) else {
        // A pom-only artifact (no main jar): nothing to ingest, not a
        // failure (base spec §4.5/§8: "marked indexed and does not return
        // to the unindexed queue").
        return Ok(());
    };

    let mut reader = jarscope_java::ArchiveReader::open(&main_archive)?;
    store.clear_artifact_contents(artifact.id)?;

    for entry in reader.class_entries() {
        let bytes = match reader.read(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(entry = %entry.name, error = %e, "skipping unreadable class entry");
                continue;
            }
        };
        let info = match jarscope_java::read_class(&bytes) {
            Ok(info) => info,
            Err(e) => {
                tracing::debug!(entry = %entry.name, error = %e, "skipping malformed class");
                continue;
            }
        };
        if info.is_nested() || !matches_any_prefix(&info.fq_name, prefixes) {
            continue;
        }

        store.insert_class(ClassEntry::new(artifact.id, info.fq_name.clone()))?;

        if let Some(super_name) = &info.super_name {
            store.insert_edge(InheritanceEdge {
                artifact_id: artifact.id,
                class_name: info.fq_name.clone(),
                parent_class_name: super_name.clone(),
                kind: EdgeKind::Extends,
            });
        }
        for interface_name in &info.interface_names {
            if interface_name == "java.lang.Object" {
                continue;
            }
            store.insert_edge(InheritanceEdge {
                artifact_id: artifact.id,
                class_name: info.fq_name.clone(),
                parent_class_name: interface_name.clone(),
                kind: EdgeKind::Implements,
            });
        }
    }

    for entry in reader.entries() {
        if !entry.name.ends_with(".proto") {
            continue;
        }
        let bytes = match reader.read(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(entry = %entry.name, error = %e, "skipping unreadable resource entry");
                continue;
            }
        };
        index_proto_resource(store, artifact.id, &entry.name, bytes);
    }

    Ok(())
}

fn index_proto_resource(store: &Store, artifact_id: jarscope_api::ArtifactId, path: &str, bytes: Vec<u8>) {
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let proto = jarscope_java::parse_proto(&text);
    let file_base_name = path
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .trim_end_matches(".proto");
    let logical_names = proto.logical_class_names(file_base_name);

    let resource_id = store.insert_resource(Resource {
        id: ResourceId(0),
        artifact_id,
        path: path.to_string(),
        content: text,
        resource_type: ResourceType::Proto,
    });
    for class_name in logical_names {
        store.insert_resource_link(ResourceClassLink {
            resource_id,
            class_name,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn config_for(maven_repo: PathBuf) -> Config {
        Config {
            maven_repo,
            gradle_repo: PathBuf::from("/nonexistent-gradle-root"),
            included_packages: Vec::new(),
            decompiler_path: None,
            version_strategy: jarscope_api::VersionStrategy::default(),
            store_path: PathBuf::from("/unused"),
            javap_tool: PathBuf::from("javap"),
        }
    }

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

    fn compile_trivial_class(fq_name: &str) -> Vec<u8> {
        // A minimal valid classfile for a top-level public class with no
        // super interfaces, extending java.lang.Object, is simplest to
        // fabricate with ristretto_classfile's builder; tests elsewhere in
        // `jarscope-java` already cover `read_class`'s own correctness, so
        // here we only need `main_archive_path`/ingestion plumbing to run
        // without panicking when handed a class it can't parse. An invalid
        // class entry exercises exactly that "malformed, skip it" path.
        b"not a real classfile".to_vec()
    }

    #[tokio::test]
    async fn index_on_empty_roots_produces_no_artifacts() {
        let store_dir = tempfile::tempdir().unwrap();
        let maven_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(store_dir.path()).unwrap());
        let config = Arc::new(config_for(maven_dir.path().to_path_buf()));
        let indexer = Indexer::new(config, store);

        let outcome = indexer.index().await.unwrap();
        match outcome {
            IndexOutcome::Completed(stats) => assert_eq!(stats.scanned, 0),
            IndexOutcome::AlreadyRunning => panic!("expected Completed"),
        }
    }

    #[tokio::test]
    async fn pom_only_artifact_is_marked_indexed_and_not_retried() {
        let store_dir = tempfile::tempdir().unwrap();
        let maven_dir = tempfile::tempdir().unwrap();
        let leaf = maven_dir.path().join("com/test/demo/1.0.0");
        std::fs::create_dir_all(&leaf).unwrap();
        std::fs::write(leaf.join("demo-1.0.0.pom"), b"").unwrap();

        let store = Arc::new(Store::open(store_dir.path()).unwrap());
        let config = Arc::new(config_for(maven_dir.path().to_path_buf()));
        let indexer = Indexer::new(config, store.clone());

        indexer.index().await.unwrap();
        assert!(store.find_unindexed().is_empty());
        assert_eq!(store.all_artifacts().len(), 1);
        assert!(store.all_artifacts()[0].is_indexed);

        // Re-running index() must not put it back in the unindexed queue.
        indexer.index().await.unwrap();
        assert!(store.find_unindexed().is_empty());
    }

    #[tokio::test]
    async fn malformed_class_entry_is_skipped_not_fatal() {
        let store_dir = tempfile::tempdir().unwrap();
        let maven_dir = tempfile::tempdir().unwrap();
        let leaf = maven_dir.path().join("com/test/demo/1.0.0");
        std::fs::create_dir_all(&leaf).unwrap();
        std::fs::write(leaf.join("demo-1.0.0.pom"), b"").unwrap();
        make_jar(
            &leaf.join("demo-1.0.0.jar"),
            &[("com/test/demo/Broken.class", &compile_trivial_class("x"))],
        );

        let store = Arc::new(Store::open(store_dir.path()).unwrap());
        let config = Arc::new(config_for(maven_dir.path().to_path_buf()));
        let indexer = Indexer::new(config, store.clone());

        indexer.index().await.unwrap();
        assert!(store.all_artifacts()[0].is_indexed);
        assert!(store.classes_exact("com.test.demo.Broken").is_empty());
    }

    #[tokio::test]
    async fn concurrent_index_calls_do_not_queue() {
        let store_dir = tempfile::tempdir().unwrap();
        let maven_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(store_dir.path()).unwrap());
        let config = Arc::new(config_for(maven_dir.path().to_path_buf()));
        let indexer = Arc::new(Indexer::new(config, store));

        let a = Arc::clone(&indexer);
        let b = Arc::clone(&indexer);
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { a.index().await }),
            tokio::spawn(async move { b.index().await })
        );
        let outcomes = [r1.unwrap().unwrap(), r2.unwrap().unwrap()];
        let already_running_count = outcomes
            .iter()
            .filter(|o| matches!(o, IndexOutcome::AlreadyRunning))
            .count();
        // One of the two calls may win the race and both complete, or one
        // observes the other already running; either way at most one
        // `Completed` per overlapping window and never a panic/deadlock.
        assert!(already_running_count <= 1);
    }

    #[test]
    fn relevant_event_filters_to_jar_and_pom() {
        assert!(is_relevant_path(Path::new("/a/b/demo-1.0.0.jar")));
        assert!(is_relevant_path(Path::new("/a/b/demo-1.0.0.pom")));
        assert!(!is_relevant_path(Path::new("/a/b/demo-1.0.0-sources.jar.bak")));
        assert!(!is_relevant_path(Path::new("/a/b/readme.txt")));
    }
}
