//! # JSON Output Module
//!
//! Output strutturato in JSON per chi integra la sincronizzazione in altri tool di build.
//!
//! ## Tipi di messaggi:
//! - `complete`: fine della run con conteggio e file scritti
//! - `error`: la run è fallita, nessun file riportato

use crate::config::SyncConfig;
use crate::sync::RunResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A file entry in the JSON summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    /// Size in kilobytes, one decimal place, same as the text report
    pub size_kb: String,
    pub format: Option<String>,
}

/// JSON message type
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JsonMessage {
    /// The run finished successfully
    #[serde(rename = "complete")]
    Complete {
        input_dir: PathBuf,
        output_dir: PathBuf,
        optimizer: String,
        count: usize,
        total_bytes: u64,
        files: Vec<JsonFile>,
    },

    /// The run failed
    #[serde(rename = "error")]
    Error { message: String },
}

impl JsonMessage {
    pub fn complete(config: &SyncConfig, optimizer: &str, result: &RunResult) -> Self {
        let files = result
            .records
            .iter()
            .map(|record| JsonFile {
                name: record.file_name(),
                path: record.destination.clone(),
                size: record.size,
                size_kb: record.size_kb(),
                format: record.format.clone(),
            })
            .collect();

        JsonMessage::Complete {
            input_dir: config.input_dir.clone(),
            output_dir: config.output_dir.clone(),
            optimizer: optimizer.to_string(),
            count: result.count(),
            total_bytes: result.total_bytes(),
            files,
        }
    }

    /// Error message carrying the whole error chain
    pub fn error(err: &anyhow::Error) -> Self {
        JsonMessage::Error {
            message: format!("{:#}", err),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
