use std::path::{Component, Path};

/// Human-readable path for report lines: `path` relative to `repo_root` when
/// it lives underneath it, otherwise the path as given.
pub fn relative_display_path(repo_root: &Path, path: &str) -> String {
    let candidate = Path::new(path);
    match candidate.strip_prefix(repo_root) {
        Ok(rel) => normalize_path(rel),
        Err(_) if candidate.is_relative() => normalize_path(candidate),
        Err(_) => path.to_string(),
    }
}

pub fn normalize_path(path: &Path) -> String {
    let mut parts = Vec::new();
    for comp in path.components() {
        match comp {
            Component::Normal(os) => parts.push(os.to_string_lossy().to_string()),
            Component::ParentDir => parts.push("..".to_string()),
            Component::CurDir => {}
            _ => {}
        }
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Repo-relative key for a path typed by a caller: `/` and `\` both
/// separate, `.` and empty segments drop out, and a rooted path keeps its
/// leading `/` so it never collides with a relative one. The root is `""`.
pub fn normalize_rel_path(rel_path: &str) -> String {
    let parts: Vec<&str> = rel_path
        .split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();
    let joined = parts.join("/");
    if rel_path.starts_with(['/', '\\']) {
        format!("/{joined}")
    } else {
        joined
    }
}
