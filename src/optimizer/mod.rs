//! # Optimizer Module
//!
//! Il collaboratore esterno che legge, comprime e scrive le immagini.
//! La sincronizzazione conosce solo il trait `ImageOptimizer`:
//! - `passthrough`: copia i file così come sono
//! - `external`: delega a tool da riga di comando (jpegoptim, oxipng, ...)

pub mod external;
pub mod passthrough;

pub use external::ExternalToolOptimizer;
pub use passthrough::PassthroughOptimizer;

use crate::config::{OptimizerMode, SyncConfig};
use crate::error::SyncError;
use crate::tool_resolver::ToolResolver;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One file written by an optimizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedFile {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
}

/// Reads every file matched by `patterns`, writes the result into `destination`
/// and returns one entry per written file, in input order.
///
/// Any failure aborts the whole batch.
#[async_trait]
pub trait ImageOptimizer: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    async fn optimize(
        &self,
        patterns: &[String],
        destination: &Path,
    ) -> Result<Vec<OptimizedFile>, SyncError>;
}

/// Build the optimizer selected by `config.mode`
pub fn from_config(config: &SyncConfig) -> Arc<dyn ImageOptimizer> {
    match config.mode {
        OptimizerMode::Passthrough => Arc::new(PassthroughOptimizer::new()),
        OptimizerMode::ExternalTools => Arc::new(ExternalToolOptimizer::new(
            ToolResolver::from_env(),
            config.jpeg_quality,
            config.workers,
        )),
    }
}
