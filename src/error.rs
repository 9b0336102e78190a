//! # Error Types Module
//!
//! Questo modulo definisce i tipi di errore della sincronizzazione immagini.
//!
//! ## Categorie di errori:
//! - `Io`: creazione directory, stat dei file di output, copia e rename
//! - `Optimization`: l'optimizer ha rifiutato o fallito sul batch di input
//! - `Pattern`: pattern glob di input non valido
//! - `Validation`: configurazione non valida
//!
//! Nessun errore è recuperabile a questo livello: la run intera viene
//! interrotta e il processo esce con stato 1.
//!
//! ## Esempio:
//! ```rust,ignore
//! if tool_names.is_empty() {
//!     return Err(SyncError::Optimization("no tools installed".to_string()));
//! }
//! ```

/// Errors produced while syncing images into the output directory
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image optimization error: {0}")]
    Optimization(String),

    #[error("Invalid input pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

impl SyncError {
    /// True for failures reported by the image optimizer itself
    pub fn is_optimization(&self) -> bool {
        matches!(self, SyncError::Optimization(_))
    }
}

impl From<tempfile::PersistError> for SyncError {
    fn from(err: tempfile::PersistError) -> Self {
        SyncError::Io(err.error)
    }
}
