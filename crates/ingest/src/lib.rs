//! Generic bounded-parallelism chunk executor used by `jarscope-core`'s
//! indexer to ingest artifacts in fixed-size batches (base spec §4.5 step 4,
//! §5 worker pool). Deliberately small: unlike a general ingestion runtime,
//! artifact ingestion has no cross-item dependency graph, so a single
//! schedule/execute stage is enough.

pub mod error;
pub mod runner;

pub use error::{IngestError, Result};
pub use runner::{run_chunked, ChunkStats};
