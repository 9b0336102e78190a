//! # External Tool Optimizer
//!
//! Ottimizza le immagini delegando a tool da riga di comando installati nel sistema.
//!
//! ## Strategia Tool Selection
//!
//! ### JPEG (priorità decrescente):
//! 1. **jpegoptim**: controllo qualità, output su stdout
//! 2. **mozjpeg**: migliore compressione, encoding progressivo
//! 3. **jpegtran**: solo ottimizzazione lossless
//!
//! ### PNG (priorità decrescente):
//! 1. **oxipng**: veloce, strip metadata sicuro
//! 2. **optipng**: compressione aggressiva
//! 3. **pngcrush**: brute force, più lento
//!
//! I tool non installati vengono saltati; se un tool fallisce si prova il
//! successivo. Nessun tool disponibile, o tutti falliti, interrompe l'intero
//! batch con `SyncError::Optimization`. Se il risultato non è più piccolo
//! dell'originale viene scritto il file originale.

use super::{ImageOptimizer, OptimizedFile};
use crate::error::SyncError;
use crate::file_manager::FileManager;
use crate::tool_resolver::ToolResolver;
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Where a tool leaves its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToolOutput {
    /// Written to the path passed on the command line
    File,
    /// Printed on stdout
    Stdout,
}

/// A command-line optimizer and how to call it
struct ToolSpec {
    name: &'static str,
    output: ToolOutput,
    args: fn(input: &str, output: &str, quality: u8) -> Vec<String>,
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn jpegoptim_args(input: &str, _output: &str, quality: u8) -> Vec<String> {
    let max = format!("--max={}", quality);
    args(&[max.as_str(), "--strip-all", "--stdout", input])
}

fn mozjpeg_args(input: &str, output: &str, quality: u8) -> Vec<String> {
    let quality = quality.to_string();
    args(&["-quality", quality.as_str(), "-optimize", "-progressive", "-outfile", output, input])
}

fn jpegtran_args(input: &str, output: &str, _quality: u8) -> Vec<String> {
    args(&["-optimize", "-progressive", "-outfile", output, input])
}

fn oxipng_args(input: &str, output: &str, _quality: u8) -> Vec<String> {
    args(&["-o", "6", "--strip", "safe", "--out", output, input])
}

fn optipng_args(input: &str, output: &str, _quality: u8) -> Vec<String> {
    args(&["-o7", "-strip", "all", "-clobber", "-out", output, input])
}

fn pngcrush_args(input: &str, output: &str, _quality: u8) -> Vec<String> {
    args(&["-rem", "alla", "-brute", input, output])
}

const JPEG_TOOLS: &[ToolSpec] = &[
    ToolSpec { name: "jpegoptim", output: ToolOutput::Stdout, args: jpegoptim_args },
    ToolSpec { name: "mozjpeg", output: ToolOutput::File, args: mozjpeg_args },
    ToolSpec { name: "jpegtran", output: ToolOutput::File, args: jpegtran_args },
];

const PNG_TOOLS: &[ToolSpec] = &[
    ToolSpec { name: "oxipng", output: ToolOutput::File, args: oxipng_args },
    ToolSpec { name: "optipng", output: ToolOutput::File, args: optipng_args },
    ToolSpec { name: "pngcrush", output: ToolOutput::File, args: pngcrush_args },
];

/// Optimizes images with the best installed command-line tool for each format
pub struct ExternalToolOptimizer {
    resolver: ToolResolver,
    jpeg_quality: u8,
    workers: usize,
}

impl ExternalToolOptimizer {
    pub fn new(resolver: ToolResolver, jpeg_quality: u8, workers: usize) -> Self {
        Self {
            resolver,
            jpeg_quality,
            workers: workers.max(1),
        }
    }

    fn tools_for(source: &Path) -> Result<(&'static str, &'static [ToolSpec]), SyncError> {
        match ImageFormat::from_path(source) {
            Ok(ImageFormat::Jpeg) => Ok(("JPEG", JPEG_TOOLS)),
            Ok(ImageFormat::Png) => Ok(("PNG", PNG_TOOLS)),
            _ => Err(SyncError::Optimization(format!(
                "Unsupported image format: {}. Only JPEG and PNG are supported.",
                source.display()
            ))),
        }
    }

    async fn optimize_file(&self, source: PathBuf, destination: &Path) -> Result<OptimizedFile, SyncError> {
        let (format_name, tools) = Self::tools_for(&source)?;
        let target = FileManager::destination_for(&source, destination)?;
        let temp = FileManager::temp_file_for(&target)?;

        self.try_tools(&source, temp.path(), format_name, tools).await?;

        let original_size = FileManager::file_size(&source).await?;
        let optimized_size = FileManager::file_size(temp.path()).await?;
        if optimized_size == 0 || optimized_size >= original_size {
            debug!(
                "{}: optimized size {} is not smaller than {}, keeping original",
                source.display(),
                optimized_size,
                original_size
            );
            tokio::fs::copy(&source, temp.path()).await?;
        }

        // Temp files are created 0600; published images carry the source's mode
        let permissions = tokio::fs::metadata(&source).await?.permissions();
        tokio::fs::set_permissions(temp.path(), permissions).await?;
        FileManager::persist_into(temp, &target)?;
        Ok(OptimizedFile {
            source_path: source,
            destination_path: target,
        })
    }

    async fn try_tools(
        &self,
        source: &Path,
        output: &Path,
        format_name: &str,
        tools: &[ToolSpec],
    ) -> Result<(), SyncError> {
        let input_str = source
            .to_str()
            .ok_or_else(|| SyncError::Validation(format!("Invalid input path: {:?}", source)))?;
        let output_str = output
            .to_str()
            .ok_or_else(|| SyncError::Validation(format!("Invalid output path: {:?}", output)))?;

        let mut any_tool_available = false;

        for tool in tools {
            let Some(tool_path) = self.resolver.resolve(tool.name) else {
                continue;
            };
            any_tool_available = true;

            let tool_args = (tool.args)(input_str, output_str, self.jpeg_quality);
            debug!("Running {:?} {:?}", tool_path, tool_args);

            let start_time = Instant::now();
            let result = Command::new(&tool_path).args(&tool_args).output().await?;
            let elapsed = start_time.elapsed();

            if result.status.success() {
                if tool.output == ToolOutput::Stdout {
                    tokio::fs::write(output, &result.stdout).await?;
                }
                debug!("{} optimized with {} in {:?}", source.display(), tool.name, elapsed);
                return Ok(());
            }

            warn!(
                "{} failed on {} after {:?} ({}), trying next tool",
                tool.name,
                source.display(),
                elapsed,
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }

        let tool_names: Vec<&str> = tools.iter().map(|tool| tool.name).collect();
        if any_tool_available {
            Err(SyncError::Optimization(format!(
                "All {} optimization tools failed for {}",
                format_name,
                source.display()
            )))
        } else {
            Err(SyncError::Optimization(format!(
                "No {} optimization tools available. Please install one of: {}",
                format_name,
                tool_names.join(", ")
            )))
        }
    }
}

#[async_trait]
impl ImageOptimizer for ExternalToolOptimizer {
    fn name(&self) -> &str {
        "external-tools"
    }

    async fn optimize(
        &self,
        patterns: &[String],
        destination: &Path,
    ) -> Result<Vec<OptimizedFile>, SyncError> {
        let sources = FileManager::expand_patterns(patterns)?;
        info!(
            "Optimizing {} images with {} workers (available tools: {})",
            sources.len(),
            self.workers,
            self.resolver.available_tools().join(", ")
        );

        futures::stream::iter(sources)
            .map(|source| self.optimize_file(source, destination))
            .buffered(self.workers)
            .try_collect()
            .await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    struct Fixture {
        input: TempDir,
        output: TempDir,
        bin: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                input: TempDir::new().unwrap(),
                output: TempDir::new().unwrap(),
                bin: TempDir::new().unwrap(),
            }
        }

        fn tool(&self, name: &str, script: &str) {
            let path = self.bin.path().join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        fn image(&self, name: &str, bytes: &[u8]) {
            std::fs::write(self.input.path().join(name), bytes).unwrap();
        }

        fn optimizer(&self) -> ExternalToolOptimizer {
            let resolver = ToolResolver::with_dirs(None, vec![self.bin.path().to_path_buf()]);
            ExternalToolOptimizer::new(resolver, 80, 2)
        }

        fn patterns(&self) -> Vec<String> {
            vec![format!("{}/*.{{jpg,jpeg,png}}", self.input.path().display())]
        }
    }

    #[tokio::test]
    async fn test_png_optimized_with_first_tool() {
        let fx = Fixture::new();
        // oxipng -o 6 --strip safe --out OUT IN
        fx.tool("oxipng", r#"printf small > "$6""#);
        fx.image("icon.png", &[7u8; 256]);

        let files = fx.optimizer().optimize(&fx.patterns(), fx.output.path()).await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(std::fs::read(fx.output.path().join("icon.png")).unwrap(), b"small");
    }

    #[tokio::test]
    async fn test_jpeg_stdout_tool() {
        let fx = Fixture::new();
        fx.tool("jpegoptim", "printf tiny");
        fx.image("photo.jpg", &[1u8; 128]);

        fx.optimizer().optimize(&fx.patterns(), fx.output.path()).await.unwrap();

        assert_eq!(std::fs::read(fx.output.path().join("photo.jpg")).unwrap(), b"tiny");
    }

    #[tokio::test]
    async fn test_output_keeps_source_permissions() {
        let fx = Fixture::new();
        fx.tool("jpegoptim", "printf tiny");
        fx.image("photo.jpg", &[1u8; 128]);
        let source = fx.input.path().join("photo.jpg");
        std::fs::set_permissions(&source, std::fs::Permissions::from_mode(0o644)).unwrap();

        fx.optimizer().optimize(&fx.patterns(), fx.output.path()).await.unwrap();

        let mode = std::fs::metadata(fx.output.path().join("photo.jpg"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[tokio::test]
    async fn test_falls_back_to_next_tool() {
        let fx = Fixture::new();
        fx.tool("oxipng", "exit 1");
        // optipng -o7 -strip all -clobber -out OUT IN
        fx.tool("optipng", r#"printf ok > "$6""#);
        fx.image("icon.png", &[7u8; 64]);

        fx.optimizer().optimize(&fx.patterns(), fx.output.path()).await.unwrap();

        assert_eq!(std::fs::read(fx.output.path().join("icon.png")).unwrap(), b"ok");
    }

    #[tokio::test]
    async fn test_larger_result_keeps_original() {
        let fx = Fixture::new();
        fx.tool("oxipng", r#"printf 'much larger than the source' > "$6""#);
        fx.image("dot.png", b"tiny");

        fx.optimizer().optimize(&fx.patterns(), fx.output.path()).await.unwrap();

        assert_eq!(std::fs::read(fx.output.path().join("dot.png")).unwrap(), b"tiny");
    }

    #[tokio::test]
    async fn test_all_tools_failing_aborts_batch() {
        let fx = Fixture::new();
        fx.tool("oxipng", "exit 2");
        fx.tool("pngcrush", "exit 3");
        fx.image("icon.png", &[7u8; 64]);

        let err = fx
            .optimizer()
            .optimize(&fx.patterns(), fx.output.path())
            .await
            .unwrap_err();

        assert!(err.is_optimization());
        assert!(err.to_string().contains("All PNG optimization tools failed"));
        assert!(!fx.output.path().join("icon.png").exists());
    }

    #[tokio::test]
    async fn test_missing_tools_aborts_batch() {
        let fx = Fixture::new();
        fx.image("photo.jpeg", &[1u8; 64]);

        let err = fx
            .optimizer()
            .optimize(&fx.patterns(), fx.output.path())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("No JPEG optimization tools available"));
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let fx = Fixture::new();
        fx.tool("jpegoptim", "printf j");
        fx.tool("oxipng", r#"printf p > "$6""#);
        for name in ["c.png", "a.jpg", "b.png", "d.jpeg"] {
            fx.image(name, &[0u8; 32]);
        }

        let files = fx.optimizer().optimize(&fx.patterns(), fx.output.path()).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.destination_path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.jpg", "b.png", "c.png", "d.jpeg"]);
    }
}
