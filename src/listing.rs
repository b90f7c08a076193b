use crate::config::Config;
use crate::model::RepositoryFile;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use ignore::WalkBuilder;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Produces the ordered `{path, contents}` list for a repository.
///
/// Implementations own any timeout or retry policy; the index calls this at
/// most once per session and treats an `Err` as fatal.
#[async_trait]
pub trait FileListing: Send + Sync {
    async fn list_files(&self, repo_root: &Path) -> Result<Vec<RepositoryFile>>;
}

#[derive(Debug, Clone, Copy)]
pub struct WalkOptions {
    pub no_ignore: bool,
    pub max_file_bytes: u64,
}

impl WalkOptions {
    pub fn new(no_ignore: bool) -> Self {
        Self {
            no_ignore,
            ..Self::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            no_ignore: config.no_ignore,
            max_file_bytes: config.max_file_bytes,
        }
    }
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Lists a checked-out working tree from disk, honouring .gitignore.
#[derive(Debug, Clone, Default)]
pub struct WalkListing {
    options: WalkOptions,
}

impl WalkListing {
    pub fn new(options: WalkOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl FileListing for WalkListing {
    async fn list_files(&self, repo_root: &Path) -> Result<Vec<RepositoryFile>> {
        let root = repo_root.to_path_buf();
        let options = self.options;
        tokio::task::spawn_blocking(move || walk_repo(&root, options))
            .await
            .context("join repository walker")?
    }
}

/// Walks `repo_root` and reads every text file into memory, sorted by path.
pub fn walk_repo(repo_root: &Path, options: WalkOptions) -> Result<Vec<RepositoryFile>> {
    if !repo_root.is_dir() {
        bail!("repository root {} is not a directory", repo_root.display());
    }
    let mut builder = WalkBuilder::new(repo_root);
    if options.no_ignore {
        builder
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false);
    } else {
        builder
            .ignore(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .parents(true)
            .require_git(false);
    }
    let walker = builder
        // dotfiles are listed; only the .git directory is pruned
        .hidden(false)
        .filter_entry(|entry| entry.file_name() != OsStr::new(".git"))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(value) => value,
            Err(err) => {
                warn!("walk error: {err}");
                continue;
            }
        };
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        let size = match fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                warn!("stat error {}: {err}", path.display());
                continue;
            }
        };
        if size > options.max_file_bytes {
            debug!(path = %path.display(), size, "skipping oversized file");
            continue;
        }
        let bytes = match fs::read(path) {
            Ok(value) => value,
            Err(err) => {
                warn!("read error {}: {err}", path.display());
                continue;
            }
        };
        if looks_binary(&bytes) {
            debug!(path = %path.display(), "skipping binary file");
            continue;
        }
        files.push(RepositoryFile::new(
            path.to_string_lossy(),
            String::from_utf8_lossy(&bytes),
        ));
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn looks_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(8000).any(|byte| *byte == 0)
}
