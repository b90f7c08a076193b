use anyhow::{Result, bail};
use async_trait::async_trait;
use repoquery::customization::{ErrorCollector, dispatch_report};
use repoquery::report::parse_sections;
use repoquery::summary::StaticSummaries;
use repoquery::{FileListing, IndexLoadError, RepositoryFile, RepositoryFileIndex, RepositoryQuerySession};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

struct FixedListing(Vec<RepositoryFile>);

#[async_trait]
impl FileListing for FixedListing {
    async fn list_files(&self, _repo_root: &Path) -> Result<Vec<RepositoryFile>> {
        Ok(self.0.clone())
    }
}

struct BrokenListing;

#[async_trait]
impl FileListing for BrokenListing {
    async fn list_files(&self, _repo_root: &Path) -> Result<Vec<RepositoryFile>> {
        bail!("listing unavailable")
    }
}

const JOB_RUNNER: &str = "\
namespace Acme.Jobs
{
    public class JobRunner
    {
        // Runs one job.
        public void Run(Job job)
        {
            job.Start();
        }
    }
}
";

fn session() -> RepositoryQuerySession<Vec<u8>> {
    let files = vec![
        RepositoryFile::new("/repo/src/Program.cs", "var runner = new JobRunner();\nrunner.Run(job);\n"),
        RepositoryFile::new("/repo/src/Jobs/JobRunner.cs", JOB_RUNNER),
        RepositoryFile::new("/repo/docs/JobRunner.md", "class JobRunner is documented here\n"),
    ];
    let index = Arc::new(RepositoryFileIndex::new("/repo", Arc::new(FixedListing(files))));
    RepositoryQuerySession::new(index, Vec::new()).unwrap()
}

fn output(session: RepositoryQuerySession<Vec<u8>>) -> String {
    String::from_utf8(session.into_report()).unwrap()
}

#[tokio::test]
async fn matching_source_lines_report() {
    let mut session = session();
    session
        .print_matching_source_lines("*.cs", "JobRunner", false, true)
        .await
        .unwrap();
    assert_eq!(
        output(session),
        "BEGIN OUTPUT from PrintMatchingSourceLines(fileMatchingPattern = *.cs, text = JobRunner, caseSensitive = false, matchWholeWord = true):\n\
         src/Program.cs(1): var runner = new JobRunner();\n\
         src/Jobs/JobRunner.cs(3):     public class JobRunner\n\
         END OUTPUT\n\n"
    );
}

#[tokio::test]
async fn file_contents_are_numbered() {
    let mut session = session();
    session.print_file_contents("Program.cs").await.unwrap();
    assert_eq!(
        output(session),
        "BEGIN OUTPUT from PrintFileContents(fileName = Program.cs):\n\
         1: var runner = new JobRunner();\n\
         2: runner.Run(job);\n\
         3: \n\
         END OUTPUT\n\n"
    );
}

#[tokio::test]
async fn file_contents_around_line_clamps_window() {
    let mut session = session();
    session
        .print_file_contents_around_line("JobRunner.cs", 2, 2)
        .await
        .unwrap();
    session
        .print_file_contents_around_line("Program.cs", 40, 3)
        .await
        .unwrap();
    let sections = parse_sections(&output(session));
    assert_eq!(sections.len(), 2);
    assert_eq!(
        sections[0].lines,
        vec!["1: namespace Acme.Jobs", "2: {", "3:     public class JobRunner", "4:     {"]
    );
    assert!(sections[1].lines.is_empty());
    assert_eq!(sections[1].error, None);
}

#[tokio::test]
async fn file_contents_around_extreme_lines_print_nothing() {
    let mut session = session();
    session
        .print_file_contents_around_line("JobRunner.cs", i64::MAX, 1)
        .await
        .unwrap();
    session
        .print_file_contents_around_line("JobRunner.cs", i64::MIN, 2)
        .await
        .unwrap();
    session
        .print_file_contents_around_line("Program.cs", 1, i64::MAX)
        .await
        .unwrap();
    let sections = parse_sections(&output(session));
    assert_eq!(sections.len(), 3);
    assert!(sections[0].lines.is_empty());
    assert!(sections[1].lines.is_empty());
    assert_eq!(
        sections[2].lines,
        vec!["1: var runner = new JobRunner();", "2: runner.Run(job);", "3: "]
    );
    assert!(sections.iter().all(|section| section.error.is_none()));
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn find_file_logs_only_requested_misses() {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let session = session();
    let hit = session.find_file("JobRunner.cs", true).await.unwrap().unwrap();
    assert_eq!(hit.path, "/repo/src/Jobs/JobRunner.cs");
    assert!(!log.text().contains("file not found"));

    assert!(session.find_file("Quiet.cs", false).await.unwrap().is_none());
    assert!(!log.text().contains("Quiet.cs"));

    assert!(session.find_file("Missing.cs", true).await.unwrap().is_none());
    let text = log.text();
    assert!(text.contains("file not found in repository"));
    assert!(text.contains("Missing.cs"));

    assert!(session.into_report().is_empty());
}

#[tokio::test]
async fn function_source_is_verbatim() {
    let mut session = session();
    session
        .print_function_source_code("JobRunner", "Run")
        .await
        .unwrap();
    assert_eq!(
        output(session),
        "BEGIN OUTPUT from PrintFunctionSourceCode(className = JobRunner, functionName = Run):\n        // Runs one job.\n        public void Run(Job job)\n        {\n            job.Start();\n        }\nEND OUTPUT\n\n"
    );
}

#[tokio::test]
async fn soft_misses_emit_exactly_one_error_line() {
    let mut session = session();
    session.print_file_contents("Missing.cs").await.unwrap();
    session
        .print_function_source_code("Scheduler", "Run")
        .await
        .unwrap();
    session
        .print_function_source_code("JobRunner", "Stop")
        .await
        .unwrap();
    session.print_repository_path_summary("src").await.unwrap();

    let report = output(session);
    assert_eq!(report.matches("BEGIN OUTPUT from ").count(), 4);
    assert_eq!(report.matches("END OUTPUT\n\n").count(), 4);
    assert_eq!(report.matches("ERROR: ").count(), 4);

    let sections = parse_sections(&report);
    let errors: Vec<_> = sections.iter().map(|s| s.error.as_deref().unwrap()).collect();
    assert_eq!(
        errors,
        vec![
            "Could not find file in repository named 'Missing.cs'",
            "Could not find class 'Scheduler' in any repository file.",
            "Could not find function 'Stop' in class 'JobRunner'.",
            "No summary available for 'src'",
        ]
    );
    assert!(sections.iter().all(|s| s.lines.is_empty()));
}

#[tokio::test]
async fn function_lookup_ignores_non_source_files() {
    let files = vec![
        RepositoryFile::new("/repo/README.md", "class JobRunner { void Run() {} }"),
        RepositoryFile::new("/repo/JobRunner.cs", JOB_RUNNER),
    ];
    let index = Arc::new(RepositoryFileIndex::new("/repo", Arc::new(FixedListing(files))));
    let mut session = RepositoryQuerySession::new(index, Vec::new()).unwrap();
    session
        .print_function_source_code("JobRunner", "Run")
        .await
        .unwrap();
    let report = output(session);
    assert!(report.contains("job.Start();"));
}

#[tokio::test]
async fn repository_files_and_summary() {
    let mut summaries = StaticSummaries::new();
    summaries.insert("", "Job scheduling service.");
    let mut session = session().with_summaries(Arc::new(summaries));
    session.print_repository_files().await.unwrap();
    session.print_repository_path_summary("").await.unwrap();
    assert_eq!(
        output(session),
        "BEGIN OUTPUT from PrintRepositoryFiles():\n\
         src/Program.cs\n\
         src/Jobs/JobRunner.cs\n\
         docs/JobRunner.md\n\
         END OUTPUT\n\
         \n\
         BEGIN OUTPUT from PrintRepositoryPathSummary(path = ):\n\
         Job scheduling service.\n\
         END OUTPUT\n\n"
    );
}

#[tokio::test]
async fn listing_failure_propagates_after_closing_block() {
    let index = Arc::new(RepositoryFileIndex::new("/repo", Arc::new(BrokenListing)));
    let mut session = RepositoryQuerySession::new(index, Vec::new()).unwrap();
    let err = session
        .print_matching_source_lines("*.cs", "Job", false, false)
        .await
        .unwrap_err();
    assert!(err.downcast_ref::<IndexLoadError>().is_some());
    let report = output(session);
    assert!(report.starts_with("BEGIN OUTPUT from PrintMatchingSourceLines("));
    assert!(report.ends_with("END OUTPUT\n\n"));
    assert!(!report.contains("ERROR: "));
}

#[tokio::test]
async fn report_consumer_sees_each_block() {
    let mut session = session();
    session.print_file_contents("Program.cs").await.unwrap();
    session.print_file_contents("Nope.cs").await.unwrap();
    let report = output(session);

    let mut collector = ErrorCollector::default();
    let delivered = dispatch_report(&report, &mut collector).unwrap();
    assert_eq!(delivered, 2);
    assert_eq!(
        collector.errors,
        vec![(
            "PrintFileContents".to_string(),
            "Could not find file in repository named 'Nope.cs'".to_string()
        )]
    );
}
