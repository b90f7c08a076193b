use thiserror::Error;

/// Raised when the file listing collaborator fails on first load. Nothing in a
/// session is answerable without the file list, so this is never retried.
#[derive(Debug, Error)]
#[error("could not list files in repository {repo_root}: {reason}")]
pub struct IndexLoadError {
    pub repo_root: String,
    pub reason: String,
}

/// Expected exploration outcomes. These are reported as a single `ERROR:`
/// line inside the operation's output block and never abort the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryMiss {
    #[error("Could not find file in repository named '{0}'")]
    FileNotFound(String),
    #[error("Could not find class '{0}' in any repository file.")]
    TypeNotFound(String),
    #[error("Could not find function '{member}' in class '{type_name}'.")]
    MemberNotFound { type_name: String, member: String },
    #[error("Search text exceeds the {limit} byte limit")]
    PatternTooLong { limit: usize },
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),
    #[error("No summary available for '{0}'")]
    NoSummary(String),
}
