use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

use crate::engine::{self, Depth, Operation, ResultFlags};
use crate::output::Logger;
use crate::utils::bytes_to_path;
use crate::utils::paths::{NormalizeStrategy, resolve_source_root};

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// What to do.
    pub operation: Operation,
    /// Source directory as given; resolved to an absolute root before the walk.
    pub source: PathBuf,
    /// Collection directory; `None` means the current directory.
    pub collection: Option<PathBuf>,
    /// Recursion limit.
    pub depth: Depth,
    /// How the source directory is made absolute.
    pub normalize: NormalizeStrategy,
}

/// Resolves the source root and runs the requested operation.
///
/// # Errors
///
/// Returns an error if the source root cannot be resolved. Problems with
/// individual entries are reported through `logger` and the returned flags.
pub fn execute(request: &Request, logger: &dyn Logger) -> Result<ResultFlags> {
    let root = resolve_source_root(&request.source, request.normalize).with_context(|| {
        format!(
            "Failed to resolve source directory {}",
            request.source.display()
        )
    })?;

    let collection = request.collection.as_deref();
    logger.info(format_args!(
        "{} {} {} {}",
        request.operation.name(),
        bytes_to_path(root.as_bytes()).display(),
        request.operation.preposition(),
        collection.map_or_else(|| ".".into(), |c| c.display().to_string()),
    ));
    debug!(?request, "starting run");

    let flags = engine::run(request.operation, root, collection, request.depth, logger)?;
    debug!(%flags, "run finished");
    Ok(flags)
}
