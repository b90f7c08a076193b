use crate::config::Config;
use crate::error::QueryMiss;
use crate::lines::LineCache;
use crate::model::RepositoryFile;
use crate::util;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub pattern_max_length: usize,
    pub regex_size_limit: usize,
}

impl SearchOptions {
    pub fn new(case_sensitive: bool, whole_word: bool) -> Self {
        Self::with_limits(case_sensitive, whole_word, &Config::default())
    }

    pub fn with_limits(case_sensitive: bool, whole_word: bool, config: &Config) -> Self {
        Self {
            case_sensitive,
            whole_word,
            pattern_max_length: config.pattern_max_length,
            regex_size_limit: config.regex_size_limit,
        }
    }
}

/// One matching line, rendered as `<path>(<line>): <text>`.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct LineHit {
    pub path: String,
    pub line: usize,
    pub line_text: String,
}

impl fmt::Display for LineHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}): {}", self.path, self.line, self.line_text)
    }
}

/// File-name glob: `*` is any run of characters, `?` exactly one, everything
/// else literal. The whole name must match, ignoring case. Globs containing
/// `/` are matched against the repo-relative path, others against the base
/// name.
#[derive(Debug, Clone)]
pub struct FileGlob {
    regex: Regex,
    match_path: bool,
}

impl FileGlob {
    pub fn new(glob: &str, size_limit: usize) -> Result<Self, QueryMiss> {
        let regex = RegexBuilder::new(&glob_to_pattern(glob))
            .case_insensitive(true)
            .size_limit(size_limit)
            .build()
            .map_err(|err| QueryMiss::InvalidPattern(err.to_string()))?;
        Ok(Self {
            regex,
            match_path: glob.contains('/'),
        })
    }

    pub fn is_match(&self, file: &RepositoryFile, rel_path: &str) -> bool {
        if self.match_path {
            self.regex.is_match(rel_path)
        } else {
            self.regex.is_match(file.file_name())
        }
    }
}

pub fn glob_to_pattern(glob: &str) -> String {
    let mut pattern = String::with_capacity(glob.len() + 8);
    pattern.push('^');
    let mut buf = [0u8; 4];
    for ch in glob.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    pattern.push('$');
    pattern
}

/// Literal text matcher; `\b` assertions wrap the escaped text for whole-word
/// searches.
pub fn text_matcher(text: &str, options: SearchOptions) -> Result<Regex, QueryMiss> {
    if text.len() > options.pattern_max_length {
        return Err(QueryMiss::PatternTooLong {
            limit: options.pattern_max_length,
        });
    }
    let escaped = regex::escape(text);
    let pattern = if options.whole_word {
        format!(r"\b{escaped}\b")
    } else {
        escaped
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .size_limit(options.regex_size_limit)
        .build()
        .map_err(|err| QueryMiss::InvalidPattern(err.to_string()))
}

/// Scans `files` in index order, and each file's lines in ascending order.
/// Hits are neither re-sorted nor deduplicated.
pub fn search(
    files: &[RepositoryFile],
    repo_root: &Path,
    line_cache: &mut LineCache,
    file_glob: &str,
    text: &str,
    options: SearchOptions,
) -> Result<Vec<LineHit>, QueryMiss> {
    let glob = FileGlob::new(file_glob, options.regex_size_limit)?;
    let matcher = text_matcher(text, options)?;
    let mut hits = Vec::new();
    for file in files {
        let rel_path = util::relative_display_path(repo_root, &file.path);
        if !glob.is_match(file, &rel_path) {
            continue;
        }
        for (idx, line) in line_cache.lines(file).iter().enumerate() {
            if matcher.is_match(line) {
                hits.push(LineHit {
                    path: rel_path.clone(),
                    line: idx + 1,
                    line_text: line.clone(),
                });
            }
        }
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glob_matches(glob: &str, name: &str) -> bool {
        let file = RepositoryFile::new(format!("src/{name}"), "");
        FileGlob::new(glob, 1 << 20)
            .unwrap()
            .is_match(&file, &format!("src/{name}"))
    }

    #[test]
    fn star_glob_matches_extension() {
        assert!(glob_matches("*.cs", "Program.cs"));
        assert!(!glob_matches("*.cs", "Program.txt"));
        assert!(!glob_matches("*.cs", "Program.csproj"));
    }

    #[test]
    fn question_mark_matches_one_character() {
        assert!(glob_matches("?oo.cs", "Foo.cs"));
        assert!(glob_matches("?oo.cs", "Boo.cs"));
        assert!(!glob_matches("?oo.cs", "Zoo1.cs"));
        assert!(!glob_matches("?oo.cs", "oo.cs"));
    }

    #[test]
    fn glob_is_case_insensitive_and_literal() {
        assert!(glob_matches("program.CS", "Program.cs"));
        assert!(!glob_matches("Program.cs", "ProgramXcs"));
        assert!(glob_matches("a+b(1).cs", "a+b(1).cs"));
    }

    #[test]
    fn glob_with_separator_matches_relative_path() {
        assert!(glob_matches("src/*.cs", "Job.cs"));
        assert!(!glob_matches("tests/*.cs", "Job.cs"));
    }

    #[test]
    fn whole_word_requires_boundaries() {
        let matcher = text_matcher("Job", SearchOptions::new(false, true)).unwrap();
        assert!(matcher.is_match("start Job now"));
        assert!(!matcher.is_match("JobRunner started"));
    }

    #[test]
    fn case_sensitivity_is_opt_in() {
        let sensitive = text_matcher("Job", SearchOptions::new(true, false)).unwrap();
        assert!(sensitive.is_match("Job failed"));
        assert!(!sensitive.is_match("job failed"));

        let insensitive = text_matcher("Job", SearchOptions::new(false, false)).unwrap();
        assert!(insensitive.is_match("job failed"));
    }

    #[test]
    fn text_is_matched_literally() {
        let matcher = text_matcher("a.b(", SearchOptions::new(true, false)).unwrap();
        assert!(matcher.is_match("call a.b(1)"));
        assert!(!matcher.is_match("call axb(1)"));
    }

    #[test]
    fn overlong_text_is_rejected() {
        let mut options = SearchOptions::new(false, false);
        options.pattern_max_length = 3;
        assert_eq!(
            text_matcher("abcd", options).unwrap_err(),
            QueryMiss::PatternTooLong { limit: 3 }
        );
    }

    #[test]
    fn hit_renders_report_line() {
        let hit = LineHit {
            path: "src/Job.cs".to_string(),
            line: 12,
            line_text: "    Run();".to_string(),
        };
        assert_eq!(hit.to_string(), "src/Job.cs(12):     Run();");
    }
}
