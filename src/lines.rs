use crate::model::RepositoryFile;
use std::collections::HashMap;

/// Splits on `\r\n`, `\r` or `\n`, keeping empty lines. Mixed endings are
/// split as found. An empty string yields one empty line, and a trailing
/// terminator yields a trailing empty line.
pub fn split_lines(contents: &str) -> Vec<String> {
    let bytes = contents.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'\n' => {
                lines.push(contents[start..idx].to_string());
                idx += 1;
                start = idx;
            }
            b'\r' => {
                lines.push(contents[start..idx].to_string());
                idx += if bytes.get(idx + 1) == Some(&b'\n') { 2 } else { 1 };
                start = idx;
            }
            _ => idx += 1,
        }
    }
    lines.push(contents[start..].to_string());
    lines
}

/// Per-file line arrays, computed on first access and kept for the session.
#[derive(Debug, Default)]
pub struct LineCache {
    entries: HashMap<String, Vec<String>>,
}

impl LineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&mut self, file: &RepositoryFile) -> &[String] {
        if !self.entries.contains_key(&file.path) {
            self.entries
                .insert(file.path.clone(), split_lines(&file.contents));
        }
        &self.entries[&file.path]
    }

    pub fn is_cached(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
