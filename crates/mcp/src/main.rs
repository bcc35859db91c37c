//! Entry point for the standalone `jarscope-mcp` stdio server. Normally
//! launched by `jarscope-cli`'s `mcp` subcommand, but buildable and runnable
//! on its own the same way the teacher ships `naviscope-mcp` as its own
//! binary crate.

use jarscope_core::{Config, JarscopeEngine};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let _guard = jarscope_core::logging::init_logging("mcp", false);

    let config = Config::load(None)?;
    let engine = Arc::new(JarscopeEngine::open(config)?);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        // The tool surface must be available before the initial scan
        // completes (base spec §6), so the first `index()` pass runs in the
        // background rather than being awaited here.
        let background_engine = Arc::clone(&engine);
        tokio::spawn(async move {
            if let Err(e) = background_engine.index().await {
                tracing::error!("initial index() pass failed: {e}");
            }
        });
        engine.start_background();

        jarscope_mcp::stdio::run_stdio_server(engine).await
    })
}
