//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione della sincronizzazione immagini.
//!
//! ## Responsabilità:
//! - Definisce la struct `SyncConfig` con directory di input/output e opzioni
//! - Fornisce il layout di default (`static/images` → `../public/images`)
//! - Valida i parametri prima dell'avvio
//! - Supporta caricamento/salvataggio da/verso file JSON
//!
//! ## Parametri di configurazione:
//! - `input_dir`: Directory sorgente delle immagini
//! - `output_dir`: Directory pubblica di destinazione
//! - `extensions`: Estensioni accettate, case-sensitive (default: jpg, jpeg, png)
//! - `mode`: `passthrough` (copia) o `external_tools` (ottimizzazione con tool esterni)
//! - `jpeg_quality`: Qualità JPEG per i tool esterni (1-100, default: 80)
//! - `workers`: Numero di tool eseguiti in parallelo (default: 4)
//! - `json_output`: Report finale in JSON invece che testo
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = SyncConfig {
//!     mode: OptimizerMode::ExternalTools,
//!     ..SyncConfig::relative_to(Path::new("assets"))
//! };
//! config.validate()?;
//! ```

use crate::error::SyncError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Input directory, relative to the base directory
pub const DEFAULT_INPUT_DIR: &str = "static/images";
/// Output directory, relative to the base directory
pub const DEFAULT_OUTPUT_DIR: &str = "../public/images";

/// Which image optimizer the sync delegates to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerMode {
    /// Copy matched files unchanged
    #[default]
    Passthrough,
    /// Run installed command-line optimizers (jpegoptim, oxipng, ...)
    ExternalTools,
}

/// Configuration for one image sync run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Directory the images are read from
    pub input_dir: PathBuf,
    /// Directory the images are written to
    pub output_dir: PathBuf,
    /// Accepted file extensions, matched case-sensitively
    pub extensions: Vec<String>,
    /// Image optimizer to delegate to
    pub mode: OptimizerMode,
    /// JPEG quality (1-100) for lossy external tools
    pub jpeg_quality: u8,
    /// Number of external tool processes run in parallel
    pub workers: usize,
    /// Print the final report as JSON
    pub json_output: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::relative_to(Path::new("."))
    }
}

impl SyncConfig {
    /// Default layout rooted at `base`
    pub fn relative_to(base: &Path) -> Self {
        Self {
            input_dir: base.join(DEFAULT_INPUT_DIR),
            output_dir: base.join(DEFAULT_OUTPUT_DIR),
            extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            mode: OptimizerMode::default(),
            jpeg_quality: 80,
            workers: 4,
            json_output: false,
        }
    }

    /// Glob pattern selecting the input set, e.g. `static/images/*.{jpg,jpeg,png}`
    pub fn input_pattern(&self) -> String {
        format!(
            "{}/*.{{{}}}",
            self.input_dir.display(),
            self.extensions.join(",")
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.extensions.is_empty() {
            return Err(SyncError::Validation("At least one image extension is required".to_string()));
        }

        for ext in &self.extensions {
            if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(SyncError::Validation(format!("Invalid image extension: {:?}", ext)));
            }
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(SyncError::Validation("JPEG quality must be between 1 and 100".to_string()));
        }

        if self.workers == 0 {
            return Err(SyncError::Validation("Number of workers must be greater than 0".to_string()));
        }

        Ok(())
    }

    /// Load configuration from file, falling back to `defaults` when it does not exist
    pub async fn from_file(path: &Path, defaults: SyncConfig) -> Result<Self> {
        if !path.exists() {
            return Ok(defaults);
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: SyncConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
