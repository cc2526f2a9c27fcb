//! Locate external helper executables.

use std::path::{Path, PathBuf};
use tracing::trace;

/// Searches the executable's directory, then the working directory, then PATH.
#[derive(Debug, Clone, Default)]
pub struct ToolLocator {
    search_dirs: Vec<PathBuf>,
    use_path: bool,
}

impl ToolLocator {
    pub fn system() -> Self {
        let mut search_dirs = Vec::new();
        if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
            search_dirs.push(exe_dir);
        }
        if let Ok(cwd) = std::env::current_dir() {
            search_dirs.push(cwd);
        }
        Self { search_dirs, use_path: true }
    }

    /// Search only the given directories, in order.
    pub fn with_dirs(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs, use_path: false }
    }

    pub fn locate(&self, tool: &str) -> Option<PathBuf> {
        for dir in &self.search_dirs {
            let candidate = dir.join(tool);
            trace!("Looking for {} at {:?}", tool, candidate);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        if self.use_path {
            return which::which(tool).ok();
        }
        None
    }
}
