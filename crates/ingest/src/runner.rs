use crate::error::{IngestError, Result};
use rayon::prelude::*;
use std::sync::Arc;

/// Counters describing one `run_chunked` call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChunkStats {
    pub chunks: usize,
    pub items: usize,
    pub failed: usize,
}

/// Runs `worker` over `items` in fixed-size chunks, fanning each chunk out
/// across the process's CPU cores via rayon inside one `spawn_blocking` call
/// per chunk.
///
/// A failure in one item never aborts its chunk or subsequent chunks:
/// `worker` returns a `Result` per item and the caller decides what a
/// failure means (the indexer, for instance, still marks an artifact
/// indexed on ingestion failure so the pipeline keeps making progress
/// instead of retrying the same broken archive forever).
pub async fn run_chunked<T, R, E, F>(
    items: Vec<T>,
    chunk_size: usize,
    worker: Arc<F>,
) -> Result<(Vec<std::result::Result<R, E>>, ChunkStats)>
where
    T: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(T) -> std::result::Result<R, E> + Send + Sync + 'static,
{
    let chunk_size = chunk_size.max(1);
    let mut stats = ChunkStats::default();
    let mut all_results = Vec::with_capacity(items.len());

    let mut remaining = items;
    while !remaining.is_empty() {
        let take = chunk_size.min(remaining.len());
        let chunk: Vec<T> = remaining.drain(..take).collect();
        stats.chunks += 1;
        stats.items += chunk.len();

        let worker = Arc::clone(&worker);
        let chunk_results = tokio::task::spawn_blocking(move || {
            chunk.into_par_iter().map(|item| worker(item)).collect::<Vec<_>>()
        })
        .await
        .map_err(|e| IngestError::Join(e.to_string()))?;

        stats.failed += chunk_results.iter().filter(|r| r.is_err()).count();
        all_results.extend(chunk_results);
    }

    Ok((all_results, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn processes_every_item_across_several_chunks() {
        let items: Vec<u32> = (0..137).collect();
        let worker = Arc::new(|n: u32| -> std::result::Result<u32, String> { Ok(n * 2) });

        let (results, stats) = run_chunked(items, 50, worker).await.unwrap();

        assert_eq!(stats.chunks, 3);
        assert_eq!(stats.items, 137);
        assert_eq!(stats.failed, 0);
        assert_eq!(results.len(), 137);
        assert_eq!(results[10].as_ref().unwrap(), &20);
    }

    #[tokio::test]
    async fn one_item_failure_does_not_abort_the_chunk() {
        let items: Vec<u32> = (0..10).collect();
        let worker = Arc::new(|n: u32| -> std::result::Result<u32, String> {
            if n == 3 {
                Err("boom".to_string())
            } else {
                Ok(n)
            }
        });

        let (results, stats) = run_chunked(items, 50, worker).await.unwrap();

        assert_eq!(stats.failed, 1);
        assert_eq!(results.len(), 10);
        assert!(results[3].is_err());
        assert!(results[4].is_ok());
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let worker = Arc::new(|n: u32| -> std::result::Result<u32, String> { Ok(n) });
        let (results, stats) = run_chunked(Vec::<u32>::new(), 50, worker).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(stats.chunks, 0);
    }
}
