//! Optimizer that writes every matched image unchanged.

use super::{ImageOptimizer, OptimizedFile};
use crate::error::SyncError;
use crate::file_manager::FileManager;
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

/// Copies matched files into the destination without re-encoding them
#[derive(Debug, Default, Clone)]
pub struct PassthroughOptimizer;

impl PassthroughOptimizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageOptimizer for PassthroughOptimizer {
    fn name(&self) -> &str {
        "passthrough"
    }

    async fn optimize(
        &self,
        patterns: &[String],
        destination: &Path,
    ) -> Result<Vec<OptimizedFile>, SyncError> {
        let sources = FileManager::expand_patterns(patterns)?;
        let mut written = Vec::with_capacity(sources.len());

        for source in sources {
            let target = FileManager::destination_for(&source, destination)?;
            let temp = FileManager::temp_file_for(&target)?;
            tokio::fs::copy(&source, temp.path()).await?;
            FileManager::persist_into(temp, &target)?;
            debug!("Copied {} -> {}", source.display(), target.display());

            written.push(OptimizedFile {
                source_path: source,
                destination_path: target,
            });
        }

        Ok(written)
    }
}
