//! # Image Sync Operation
//!
//! Orchestratore della sincronizzazione: una sola passata sequenziale.
//!
//! ## Flusso di esecuzione:
//! 1. **Directory di output**: creata se manca (idempotente)
//! 2. **Input set**: pattern `{input_dir}/*.{jpg,jpeg,png}`
//! 3. **Delega**: l'`ImageOptimizer` iniettato legge, comprime e scrive i file
//! 4. **Stat**: dimensione di ogni file prodotto, raccolta prima di stampare
//! 5. **Report**: una riga per file e il conteggio finale
//!
//! Qualsiasi errore interrompe l'intera run: nessun risultato parziale.
//!
//! ## Esempio:
//! ```rust,ignore
//! let sync = ImageSync::from_config(SyncConfig::relative_to(Path::new(".")))?;
//! let result = sync.run_and_report(&mut std::io::stdout()).await?;
//! assert_eq!(result.count(), 3);
//! ```

use crate::{
    config::SyncConfig,
    error::SyncError,
    file_manager::FileManager,
    json_output::JsonMessage,
    optimizer::{self, ImageOptimizer, OptimizedFile},
    report::{ProgressManager, Reporter},
};
use anyhow::Result;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One file written into the output directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub source: Option<PathBuf>,
    pub destination: PathBuf,
    /// Size in bytes of the written file
    pub size: u64,
    /// Image format derived from the destination extension
    pub format: Option<String>,
}

impl OutputRecord {
    pub fn new(source: Option<PathBuf>, destination: PathBuf, size: u64) -> Self {
        let format = ImageFormat::from_path(&destination)
            .ok()
            .and_then(|format| format.extensions_str().first())
            .map(|ext| ext.to_string());

        Self {
            source,
            destination,
            size,
            format,
        }
    }

    /// File name of the destination, as shown in the report
    pub fn file_name(&self) -> String {
        self.destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Size in kilobytes, one decimal place
    pub fn size_kb(&self) -> String {
        FileManager::format_kilobytes(self.size)
    }
}

/// Outcome of one sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub records: Vec<OutputRecord>,
}

impl RunResult {
    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|record| record.size).sum()
    }
}

/// Syncs the configured input directory into the output directory
pub struct ImageSync {
    config: SyncConfig,
    optimizer: Arc<dyn ImageOptimizer>,
}

impl ImageSync {
    /// Sync that delegates to `optimizer`
    pub fn new(config: SyncConfig, optimizer: Arc<dyn ImageOptimizer>) -> Result<Self, SyncError> {
        config.validate()?;
        Ok(Self { config, optimizer })
    }

    /// Sync using the optimizer selected by `config.mode`
    pub fn from_config(config: SyncConfig) -> Result<Self, SyncError> {
        let optimizer = optimizer::from_config(&config);
        Self::new(config, optimizer)
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run the sync and return one record per written file
    pub async fn run(&self) -> Result<RunResult, SyncError> {
        let output_dir = &self.config.output_dir;
        if FileManager::ensure_dir(output_dir).await? {
            info!("Created output directory: {}", output_dir.display());
        }

        let pattern = self.config.input_pattern();
        info!("Syncing {} with {} optimizer", pattern, self.optimizer.name());

        let spinner = ProgressManager::spinner(&format!("Processing images with {}...", self.optimizer.name()));
        let optimized = self.optimizer.optimize(&[pattern.clone()], output_dir).await;
        spinner.finish_and_clear();

        let result = Self::collect_records(optimized?).await?;
        if result.is_empty() {
            warn!("No images matched {}", pattern);
        }

        debug!(
            "Synced {} images, {} total",
            result.count(),
            FileManager::format_size(result.total_bytes())
        );
        Ok(result)
    }

    async fn collect_records(files: Vec<OptimizedFile>) -> Result<RunResult, SyncError> {
        let mut records = Vec::with_capacity(files.len());
        for file in files {
            let size = FileManager::file_size(&file.destination_path).await?;
            records.push(OutputRecord::new(Some(file.source_path), file.destination_path, size));
        }
        Ok(RunResult { records })
    }

    /// Run the sync and write the report to `out`, as text or as JSON
    pub async fn run_and_report<W: Write>(&self, out: &mut W) -> Result<RunResult> {
        if self.config.json_output {
            let result = self.run().await?;
            let message = JsonMessage::complete(&self.config, self.optimizer.name(), &result);
            writeln!(out, "{}", message.to_json()?)?;
            return Ok(result);
        }

        // No header when the output directory cannot be created
        FileManager::ensure_dir(&self.config.output_dir).await?;
        let mut reporter = Reporter::new(out);
        reporter.start(&self.config)?;
        let result = self.run().await?;
        reporter.records(&result)?;
        reporter.complete()?;
        Ok(result)
    }

    /// Directory images are read from
    pub fn input_dir(&self) -> &Path {
        &self.config.input_dir
    }

    /// Directory images are written to
    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::PassthroughOptimizer;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    /// Records each call and writes 1.5KB placeholder outputs
    #[derive(Default)]
    struct RecordingOptimizer {
        calls: Mutex<Vec<(Vec<String>, PathBuf)>>,
        fail: bool,
    }

    #[async_trait]
    impl ImageOptimizer for RecordingOptimizer {
        fn name(&self) -> &str {
            "recording"
        }

        async fn optimize(
            &self,
            patterns: &[String],
            destination: &Path,
        ) -> Result<Vec<OptimizedFile>, SyncError> {
            self.calls
                .lock()
                .unwrap()
                .push((patterns.to_vec(), destination.to_path_buf()));

            if self.fail {
                return Err(SyncError::Optimization("corrupt input".to_string()));
            }

            let mut written = Vec::new();
            for source in FileManager::expand_patterns(patterns)? {
                let target = FileManager::destination_for(&source, destination)?;
                std::fs::write(&target, vec![0u8; 1536])?;
                written.push(OptimizedFile {
                    source_path: source,
                    destination_path: target,
                });
            }
            Ok(written)
        }
    }

    struct Site {
        _root: TempDir,
        config: SyncConfig,
    }

    impl Site {
        fn new(files: &[&str]) -> Self {
            let root = TempDir::new().unwrap();
            let base = root.path().join("assets");
            let config = SyncConfig::relative_to(&base);
            std::fs::create_dir_all(&config.input_dir).unwrap();
            for name in files {
                std::fs::write(config.input_dir.join(name), b"image bytes").unwrap();
            }
            Self { _root: root, config }
        }
    }

    #[tokio::test]
    async fn test_counts_only_matching_files() {
        let site = Site::new(&["a.jpg", "b.jpeg", "c.png", "d.gif", "e.txt", "F.PNG"]);
        let sync = ImageSync::new(site.config.clone(), Arc::new(RecordingOptimizer::default())).unwrap();

        let result = sync.run().await.unwrap();

        assert_eq!(result.count(), 3);
        let names: Vec<_> = result.records.iter().map(|r| r.file_name()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpeg", "c.png"]);
        assert!(result.records.iter().all(|r| r.size == 1536 && r.size_kb() == "1.5"));
        assert_eq!(result.total_bytes(), 3 * 1536);
    }

    #[tokio::test]
    async fn test_delegates_pattern_and_destination() {
        let site = Site::new(&["a.jpg"]);
        let optimizer = Arc::new(RecordingOptimizer::default());
        let sync = ImageSync::new(site.config.clone(), optimizer.clone()).unwrap();

        sync.run().await.unwrap();

        let calls = optimizer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, vec![site.config.input_pattern()]);
        assert_eq!(calls[0].1, site.config.output_dir);
    }

    #[tokio::test]
    async fn test_creates_missing_output_dir_and_is_idempotent() {
        let site = Site::new(&["a.png"]);
        assert!(!site.config.output_dir.exists());
        let sync = ImageSync::new(site.config.clone(), Arc::new(PassthroughOptimizer::new())).unwrap();

        assert_ok!(sync.run().await);
        assert!(site.config.output_dir.is_dir());

        let second = assert_ok!(sync.run().await);
        assert_eq!(second.count(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_is_success() {
        let site = Site::new(&["notes.md"]);
        let sync = ImageSync::new(site.config.clone(), Arc::new(PassthroughOptimizer::new())).unwrap();

        let mut out = Vec::new();
        let result = sync.run_and_report(&mut out).await.unwrap();

        assert_eq!(result.count(), 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Copied 0 images"));
        assert!(text.contains("Image copy complete!"));
    }

    #[tokio::test]
    async fn test_missing_input_dir_is_empty_run() {
        let root = TempDir::new().unwrap();
        let config = SyncConfig::relative_to(&root.path().join("assets"));
        let sync = ImageSync::new(config.clone(), Arc::new(PassthroughOptimizer::new())).unwrap();

        let result = sync.run().await.unwrap();
        assert!(result.is_empty());
        assert!(config.output_dir.is_dir());
    }

    #[tokio::test]
    async fn test_unwritable_output_reports_nothing() {
        let site = Site::new(&["a.jpg"]);
        let blocker = site.config.input_dir.join("blocker");
        std::fs::write(&blocker, b"file").unwrap();
        let config = SyncConfig {
            output_dir: blocker.join("images"),
            ..site.config.clone()
        };
        let optimizer = Arc::new(RecordingOptimizer::default());
        let sync = ImageSync::new(config, optimizer.clone()).unwrap();

        let mut out = Vec::new();
        let err = sync.run_and_report(&mut out).await.unwrap_err();

        assert!(matches!(err.downcast_ref::<SyncError>(), Some(SyncError::Io(_))));
        assert!(optimizer.calls.lock().unwrap().is_empty());
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("a.jpg"));
        assert!(!text.contains("complete"));
        assert!(!text.contains("Copying images"));
    }

    #[tokio::test]
    async fn test_output_path_that_is_a_file_is_io_error() {
        let site = Site::new(&["a.jpg"]);
        std::fs::create_dir_all(site.config.output_dir.parent().unwrap()).unwrap();
        std::fs::write(&site.config.output_dir, b"not a dir").unwrap();
        let optimizer = Arc::new(RecordingOptimizer::default());
        let sync = ImageSync::new(site.config.clone(), optimizer.clone()).unwrap();

        let err = assert_err!(sync.run().await);
        assert!(matches!(err, SyncError::Io(_)));
        assert!(optimizer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_optimizer_failure_aborts_run() {
        let site = Site::new(&["a.jpg", "b.png"]);
        let optimizer = RecordingOptimizer {
            fail: true,
            ..Default::default()
        };
        let sync = ImageSync::new(site.config.clone(), Arc::new(optimizer)).unwrap();

        let err = assert_err!(sync.run().await);
        assert!(err.is_optimization());
    }

    #[tokio::test]
    async fn test_report_lists_files_with_kilobytes() {
        let site = Site::new(&["hero.jpg", "logo.png"]);
        let sync = ImageSync::new(site.config.clone(), Arc::new(RecordingOptimizer::default())).unwrap();

        let mut out = Vec::new();
        sync.run_and_report(&mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Copied 2 images:"));
        assert!(text.contains("   hero.jpg: 1.5KB\n"));
        assert!(text.contains("   logo.png: 1.5KB\n"));
        assert!(text.find("hero.jpg").unwrap() < text.find("logo.png").unwrap());
    }

    #[tokio::test]
    async fn test_json_report() {
        let site = Site::new(&["hero.jpg"]);
        let config = SyncConfig {
            json_output: true,
            ..site.config.clone()
        };
        let sync = ImageSync::new(config, Arc::new(RecordingOptimizer::default())).unwrap();

        let mut out = Vec::new();
        sync.run_and_report(&mut out).await.unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["type"], "complete");
        assert_eq!(value["count"], 1);
        assert_eq!(value["files"][0]["name"], "hero.jpg");
        assert_eq!(value["files"][0]["size_kb"], "1.5");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SyncConfig {
            workers: 0,
            ..SyncConfig::default()
        };
        let result = ImageSync::new(config, Arc::new(PassthroughOptimizer::new()));
        assert!(matches!(result, Err(SyncError::Validation(_))));
    }

    #[test]
    fn test_output_record_format() {
        let record = OutputRecord::new(None, PathBuf::from("public/images/a.jpeg"), 2048);
        assert_eq!(record.format.as_deref(), Some("jpg"));
        assert_eq!(record.size_kb(), "2.0");
        assert_eq!(record.file_name(), "a.jpeg");
    }
}
