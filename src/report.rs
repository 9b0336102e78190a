//! # Progress and Report Module
//!
//! Questo modulo gestisce il feedback all'utente durante e dopo la sincronizzazione.
//!
//! ## Componenti principali:
//! - `ProgressManager`: spinner su stderr mentre l'optimizer lavora
//! - `Reporter`: report leggibile su stdout (non pensato per il parsing)
//!
//! ## Formato del report:
//! ```text
//! 🖼️  Copying images to public directory...
//! 📁 Input: /site/assets/static/images
//! 📁 Output: /site/public/images
//! ✅ Copied 2 images:
//!    hero.jpg: 84.2KB
//!    logo.png: 3.1KB
//! 🎉 Image copy complete!
//! ```

use crate::config::SyncConfig;
use crate::sync::RunResult;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

/// Manages progress feedback while the optimizer runs
pub struct ProgressManager;

impl ProgressManager {
    /// Create a spinner for indeterminate progress.
    ///
    /// Draws on stderr and stays hidden when stderr is not a terminal.
    pub fn spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();

        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            spinner.set_style(style);
        }

        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));

        spinner
    }
}

/// Writes the human-readable sync report
pub struct Reporter<'a, W: Write> {
    out: &'a mut W,
}

impl<'a, W: Write> Reporter<'a, W> {
    pub fn new(out: &'a mut W) -> Self {
        Self { out }
    }

    /// Announce the run and the directories involved
    pub fn start(&mut self, config: &SyncConfig) -> io::Result<()> {
        writeln!(self.out, "🖼️  Copying images to public directory...")?;
        writeln!(self.out, "📁 Input: {}", config.input_dir.display())?;
        writeln!(self.out, "📁 Output: {}", config.output_dir.display())
    }

    /// Count, then one line per written file
    pub fn records(&mut self, result: &RunResult) -> io::Result<()> {
        writeln!(self.out, "✅ Copied {} images:", result.count())?;
        for record in &result.records {
            writeln!(self.out, "   {}: {}KB", record.file_name(), record.size_kb())?;
        }
        Ok(())
    }

    pub fn complete(&mut self) -> io::Result<()> {
        writeln!(self.out, "🎉 Image copy complete!")?;
        self.out.flush()
    }
}
