use serde::Serialize;

/// Snapshot of one repository file taken when the index is loaded.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RepositoryFile {
    pub path: String,
    pub contents: String,
}

impl RepositoryFile {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Base name of the file; both separator styles are honoured so listings
    /// produced on Windows compare the same way.
    pub fn file_name(&self) -> &str {
        base_name(&self.path)
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }
}

pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
