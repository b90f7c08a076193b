use crate::error::IndexLoadError;
use crate::listing::FileListing;
use crate::model::{RepositoryFile, base_name};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::info;

/// Session-lifetime cache of a repository's files.
///
/// The listing collaborator is consulted lazily and at most once: concurrent
/// first callers await the same in-flight load. Once loaded the order is
/// fixed; there is no refresh. A failed load leaves the index empty and is
/// reported to the caller, not retried here.
pub struct RepositoryFileIndex {
    repo_root: PathBuf,
    listing: Arc<dyn FileListing>,
    files: OnceCell<Vec<RepositoryFile>>,
}

impl RepositoryFileIndex {
    pub fn new(repo_root: impl Into<PathBuf>, listing: Arc<dyn FileListing>) -> Self {
        Self {
            repo_root: repo_root.into(),
            listing,
            files: OnceCell::new(),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn is_loaded(&self) -> bool {
        self.files.initialized()
    }

    pub async fn get_all_files(&self) -> Result<&[RepositoryFile], IndexLoadError> {
        let files = self.files.get_or_try_init(|| self.load()).await?;
        Ok(files.as_slice())
    }

    /// First file (in index order) whose base name equals the base name of
    /// `name`. Duplicate base names are not disambiguated.
    pub async fn find_file(&self, name: &str) -> Result<Option<&RepositoryFile>, IndexLoadError> {
        let wanted = base_name(name);
        let files = self.get_all_files().await?;
        Ok(files.iter().find(|file| file.file_name() == wanted))
    }

    async fn load(&self) -> Result<Vec<RepositoryFile>, IndexLoadError> {
        let started = Instant::now();
        info!(repo = %self.repo_root.display(), "loading repository file list");
        let files = self
            .listing
            .list_files(&self.repo_root)
            .await
            .map_err(|err| IndexLoadError {
                repo_root: self.repo_root.display().to_string(),
                reason: format!("{err:#}"),
            })?;
        info!(
            repo = %self.repo_root.display(),
            files = files.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "repository file list loaded"
        );
        Ok(files)
    }
}

impl std::fmt::Debug for RepositoryFileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryFileIndex")
            .field("repo_root", &self.repo_root)
            .field("files", &self.files.get().map(Vec::len))
            .finish()
    }
}
