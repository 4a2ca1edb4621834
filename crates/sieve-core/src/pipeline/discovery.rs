//! Candidate discovery: supported images directly inside a folder.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::error::PipelineError;

/// Finds reviewable image files in a folder (non-recursive).
#[derive(Debug, Clone, Default)]
pub struct FileDiscovery {
    config: ProcessingConfig,
}

/// Information about a discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// List supported files directly inside `folder`, sorted by name.
    ///
    /// Subdirectories are not entered, so the `archive`/`keep`/`modify`
    /// folders a previous session wrote are never picked up again.
    pub fn discover(&self, folder: &Path) -> Result<Vec<DiscoveredFile>, PipelineError> {
        if !folder.is_dir() {
            return Err(PipelineError::FolderUnreadable {
                path: folder.to_path_buf(),
                message: "not a directory".into(),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(PipelineError::FolderUnreadable {
                        path: folder.to_path_buf(),
                        message: e.to_string(),
                    })
                }
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry in {:?}: {}", folder, e);
                    continue;
                }
            };

            let entry_path = entry.path();
            if entry.file_type().is_file() && self.is_supported(entry_path) {
                if let Ok(meta) = entry.metadata() {
                    files.push(DiscoveredFile {
                        path: entry_path.to_path_buf(),
                        size: meta.len(),
                    });
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);
        tracing::debug!("Discovered {} candidates in {:?}", files.len(), folder);
        Ok(files)
    }

    /// Check if a file has a supported extension.
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.to_lowercase() == ext_lower)
            })
            .unwrap_or(false)
    }
}
