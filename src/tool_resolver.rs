//! # Tool Path Resolver
//!
//! Finds the command-line image optimizers used by `ExternalToolOptimizer`:
//! - `TOOLS_DIR` environment variable (bundled tools, checked first)
//! - System `PATH`

use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Every tool the external optimizer knows how to drive
pub const KNOWN_TOOLS: &[&str] = &["jpegoptim", "mozjpeg", "jpegtran", "oxipng", "optipng", "pngcrush"];

/// Tool path resolver
#[derive(Debug, Clone, Default)]
pub struct ToolResolver {
    /// Directory with bundled tools, searched before `PATH`
    tools_dir: Option<PathBuf>,
    /// Directories from `PATH`
    search_path: Vec<PathBuf>,
}

impl ToolResolver {
    /// Resolver for the current process environment
    pub fn from_env() -> Self {
        let tools_dir = env::var_os("TOOLS_DIR")
            .map(PathBuf::from)
            .filter(|dir| dir.is_dir());
        let search_path = env::var_os("PATH")
            .map(|path| env::split_paths(&path).collect())
            .unwrap_or_default();

        debug!("Tools directory: {:?}", tools_dir);
        Self { tools_dir, search_path }
    }

    /// Resolver that only looks in the given directories
    pub fn with_dirs(tools_dir: Option<PathBuf>, search_path: Vec<PathBuf>) -> Self {
        Self { tools_dir, search_path }
    }

    /// Resolve the path to a specific tool
    pub fn resolve(&self, tool_name: &str) -> Option<PathBuf> {
        let file_name = Self::executable_name(tool_name);

        if let Some(ref tools_dir) = self.tools_dir {
            let bundled = tools_dir.join(&file_name);
            if is_executable(&bundled) {
                debug!("Using bundled tool: {} -> {:?}", tool_name, bundled);
                return Some(bundled);
            }
        }

        let found = self
            .search_path
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|path| is_executable(path));

        match found {
            Some(ref path) => debug!("Using system tool: {} -> {:?}", tool_name, path),
            None => debug!("Tool not found: {}", tool_name),
        }
        found
    }

    /// Check if a specific tool is available
    pub fn is_available(&self, tool_name: &str) -> bool {
        self.resolve(tool_name).is_some()
    }

    /// Names of the known tools that can be resolved
    pub fn available_tools(&self) -> Vec<&'static str> {
        KNOWN_TOOLS
            .iter()
            .copied()
            .filter(|tool| self.is_available(tool))
            .collect()
    }

    fn executable_name(tool_name: &str) -> String {
        if cfg!(windows) {
            format!("{}.exe", tool_name)
        } else {
            tool_name.to_string()
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
