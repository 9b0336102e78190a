//! # Image Sync Library
//!
//! Copia e ottimizza le immagini statiche nella directory pubblica.
//!
//! ## Architettura dei moduli:
//! - `config`: Directory di input/output e opzioni, caricamento da JSON
//! - `error`: Tipi di errore (`Io`, `Optimization`, ...)
//! - `file_manager`: Espansione pattern, creazione directory, dimensioni file
//! - `optimizer`: Trait `ImageOptimizer` e implementazioni (copia, tool esterni)
//! - `tool_resolver`: Ricerca dei tool esterni in `TOOLS_DIR` e `PATH`
//! - `sync`: La sincronizzazione vera e propria e il `RunResult`
//! - `report`: Spinner e report testuale
//! - `json_output`: Report in JSON
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use image_sync::{ImageSync, SyncConfig};
//!
//! let config = SyncConfig::relative_to(Path::new("assets"));
//! let sync = ImageSync::from_config(config)?;
//! let result = sync.run().await?;
//! println!("{} images", result.count());
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod optimizer;
pub mod report;
pub mod sync;
pub mod tool_resolver;

pub use config::{OptimizerMode, SyncConfig};
pub use error::SyncError;
pub use json_output::JsonMessage;
pub use optimizer::{ImageOptimizer, OptimizedFile};
pub use sync::{ImageSync, OutputRecord, RunResult};
