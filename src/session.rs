use crate::config::Config;
use crate::error::QueryMiss;
use crate::extract::{self, SyntaxExtractor};
use crate::index::RepositoryFileIndex;
use crate::lines::LineCache;
use crate::listing::FileListing;
use crate::model::RepositoryFile;
use crate::report::{Frame, ReportWriter};
use crate::search::{self, SearchOptions};
use crate::summary::SummaryStore;
use crate::util;
use anyhow::Result;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

type Outcome = Result<Result<(), QueryMiss>>;

/// Code query session over one repository.
///
/// Each `print_*` operation writes one framed block to the report sink.
/// Operations take `&mut self`, so invocations against a session are
/// serialized and blocks never interleave. Soft misses become an `ERROR:`
/// line; only a failed file listing is returned as `Err`.
pub struct RepositoryQuerySession<W: Write = Stdout> {
    index: Arc<RepositoryFileIndex>,
    lines: LineCache,
    extractor: SyntaxExtractor,
    summaries: Option<Arc<dyn SummaryStore>>,
    config: Config,
    report: ReportWriter<W>,
}

impl RepositoryQuerySession<Stdout> {
    pub fn stdout(repo_root: impl Into<PathBuf>, listing: Arc<dyn FileListing>) -> Result<Self> {
        let index = Arc::new(RepositoryFileIndex::new(repo_root, listing));
        Self::new(index, io::stdout())
    }
}

impl<W: Write> RepositoryQuerySession<W> {
    pub fn new(index: Arc<RepositoryFileIndex>, out: W) -> Result<Self> {
        Ok(Self {
            index,
            lines: LineCache::new(),
            extractor: SyntaxExtractor::new()?,
            summaries: None,
            config: Config::get().clone(),
            report: ReportWriter::new(out),
        })
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_summaries(mut self, store: Arc<dyn SummaryStore>) -> Self {
        self.summaries = Some(store);
        self
    }

    pub fn repo_root(&self) -> &Path {
        self.index.repo_root()
    }

    pub fn index(&self) -> &Arc<RepositoryFileIndex> {
        &self.index
    }

    pub fn report(&self) -> &W {
        self.report.get_ref()
    }

    pub fn into_report(self) -> W {
        self.report.into_inner()
    }

    pub async fn get_all_files(&self) -> Result<&[RepositoryFile]> {
        Ok(self.index.get_all_files().await?)
    }

    /// Base-name lookup, first match in index order. A miss is logged as a
    /// diagnostic when `report_if_missing` is set.
    pub async fn find_file(
        &self,
        name: &str,
        report_if_missing: bool,
    ) -> Result<Option<&RepositoryFile>> {
        let found = self.index.find_file(name).await?;
        if found.is_none() && report_if_missing {
            warn!(file = name, "file not found in repository");
        }
        Ok(found)
    }

    /// Lists every indexed file by repo-relative path.
    pub async fn print_repository_files(&mut self) -> Result<()> {
        let mut frame = self.report.begin("PrintRepositoryFiles", &[])?;
        let outcome = repository_files(&self.index, &mut frame).await;
        frame.close(outcome)
    }

    /// Prints the stored summary of a folder or file; `""` is the whole
    /// repository.
    pub async fn print_repository_path_summary(&mut self, path: &str) -> Result<()> {
        let mut frame = self
            .report
            .begin("PrintRepositoryPathSummary", &[("path", &path)])?;
        let outcome = path_summary(self.summaries.as_deref(), &mut frame, path).await;
        frame.close(outcome)
    }

    /// Prints every line of a file as `<n>: <line>`.
    pub async fn print_file_contents(&mut self, file_name: &str) -> Result<()> {
        let mut frame = self
            .report
            .begin("PrintFileContents", &[("fileName", &file_name)])?;
        let outcome =
            file_window(&self.index, &mut self.lines, &mut frame, file_name, None).await;
        frame.close(outcome)
    }

    /// Prints `lines_to_include` lines either side of `line_number`, clamped
    /// to the file.
    pub async fn print_file_contents_around_line(
        &mut self,
        file_name: &str,
        line_number: i64,
        lines_to_include: i64,
    ) -> Result<()> {
        let mut frame = self.report.begin(
            "PrintFileContentsAroundLine",
            &[
                ("fileName", &file_name),
                ("lineNumber", &line_number),
                ("linesToInclude", &lines_to_include),
            ],
        )?;
        let outcome = file_window(
            &self.index,
            &mut self.lines,
            &mut frame,
            file_name,
            Some((line_number, lines_to_include)),
        )
        .await;
        frame.close(outcome)
    }

    /// "Find in files": lines containing `text` in files whose name matches
    /// `file_matching_pattern`.
    pub async fn print_matching_source_lines(
        &mut self,
        file_matching_pattern: &str,
        text: &str,
        case_sensitive: bool,
        match_whole_word: bool,
    ) -> Result<()> {
        let options = SearchOptions::with_limits(case_sensitive, match_whole_word, &self.config);
        let mut frame = self.report.begin(
            "PrintMatchingSourceLines",
            &[
                ("fileMatchingPattern", &file_matching_pattern),
                ("text", &text),
                ("caseSensitive", &case_sensitive),
                ("matchWholeWord", &match_whole_word),
            ],
        )?;
        let outcome = matching_lines(
            &self.index,
            &mut self.lines,
            &mut frame,
            file_matching_pattern,
            text,
            options,
        )
        .await;
        frame.close(outcome)
    }

    /// Prints the verbatim source of method `function_name` in type
    /// `class_name`, taken from the first source file that declares the type.
    pub async fn print_function_source_code(
        &mut self,
        class_name: &str,
        function_name: &str,
    ) -> Result<()> {
        let mut frame = self.report.begin(
            "PrintFunctionSourceCode",
            &[("className", &class_name), ("functionName", &function_name)],
        )?;
        let outcome = function_source(
            &self.index,
            &mut self.extractor,
            &mut frame,
            class_name,
            function_name,
        )
        .await;
        frame.close(outcome)
    }
}

async fn repository_files<W: Write>(
    index: &RepositoryFileIndex,
    frame: &mut Frame<'_, W>,
) -> Outcome {
    let files = index.get_all_files().await?;
    for file in files {
        frame.line(util::relative_display_path(index.repo_root(), &file.path))?;
    }
    Ok(Ok(()))
}

async fn path_summary<W: Write>(
    store: Option<&dyn SummaryStore>,
    frame: &mut Frame<'_, W>,
    path: &str,
) -> Outcome {
    let Some(store) = store else {
        return Ok(Err(QueryMiss::NoSummary(path.to_string())));
    };
    match store.summary(path).await? {
        Some(summary) if !summary.is_empty() => {
            frame.verbatim(&summary)?;
            Ok(Ok(()))
        }
        _ => Ok(Err(QueryMiss::NoSummary(path.to_string()))),
    }
}

async fn file_window<W: Write>(
    index: &RepositoryFileIndex,
    line_cache: &mut LineCache,
    frame: &mut Frame<'_, W>,
    file_name: &str,
    around: Option<(i64, i64)>,
) -> Outcome {
    let Some(file) = index.find_file(file_name).await? else {
        return Ok(Err(QueryMiss::FileNotFound(file_name.to_string())));
    };
    let lines = line_cache.lines(file);
    let (first, last) = match around {
        None => (1, lines.len() as i64),
        Some((target, radius)) => (
            target.saturating_sub(radius).max(1),
            target.saturating_add(radius).min(lines.len() as i64),
        ),
    };
    for number in first..=last {
        frame.line(format_args!("{number}: {}", lines[(number - 1) as usize]))?;
    }
    Ok(Ok(()))
}

async fn matching_lines<W: Write>(
    index: &RepositoryFileIndex,
    line_cache: &mut LineCache,
    frame: &mut Frame<'_, W>,
    file_glob: &str,
    text: &str,
    options: SearchOptions,
) -> Outcome {
    let files = index.get_all_files().await?;
    let hits = match search::search(files, index.repo_root(), line_cache, file_glob, text, options) {
        Ok(hits) => hits,
        Err(miss) => return Ok(Err(miss)),
    };
    debug!(glob = file_glob, text, hits = hits.len(), "text search finished");
    for hit in &hits {
        frame.line(hit)?;
    }
    Ok(Ok(()))
}

async fn function_source<W: Write>(
    index: &RepositoryFileIndex,
    extractor: &mut SyntaxExtractor,
    frame: &mut Frame<'_, W>,
    class_name: &str,
    function_name: &str,
) -> Outcome {
    let files = index.get_all_files().await?;
    let candidates = files.iter().filter(|file| {
        file.extension().is_some_and(extract::handles_extension)
            && file.contents.contains(class_name)
    });
    for file in candidates {
        match extractor.extract_declaration(&file.contents, class_name, function_name) {
            Ok(source) => {
                debug!(path = %file.path, class_name, function_name, "declaration extracted");
                frame.verbatim(&source)?;
                return Ok(Ok(()));
            }
            Err(QueryMiss::TypeNotFound(_)) => continue,
            Err(miss) => return Ok(Err(miss)),
        }
    }
    Ok(Err(QueryMiss::TypeNotFound(class_name.to_string())))
}
