use anyhow::Result;
use clap::Parser;
use repoquery::cli::{self, Command};
use repoquery::config::Config;
use repoquery::summary::StaticSummaries;
use repoquery::{RepositoryFileIndex, RepositoryQuerySession, WalkListing, WalkOptions};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();
    let mut config = Config::get().clone();
    if args.no_ignore {
        config.no_ignore = true;
    }
    let listing = Arc::new(WalkListing::new(WalkOptions::from_config(&config)));
    let index = Arc::new(RepositoryFileIndex::new(args.repo.clone(), listing));
    let mut session = RepositoryQuerySession::new(index, std::io::stdout())?.with_config(config);

    match args.command {
        Command::Files => session.print_repository_files().await,
        Command::Cat { file } => session.print_file_contents(&file).await,
        Command::Around {
            file,
            line,
            context,
        } => {
            session
                .print_file_contents_around_line(&file, line, context)
                .await
        }
        Command::Grep {
            text,
            glob,
            case_sensitive,
            whole_word,
        } => {
            session
                .print_matching_source_lines(&glob, &text, case_sensitive, whole_word)
                .await
        }
        Command::Function { class, function } => {
            session.print_function_source_code(&class, &function).await
        }
        Command::Summary { path, summaries } => {
            if let Some(file) = summaries {
                let store = StaticSummaries::from_json_file(&file)?;
                session = session.with_summaries(Arc::new(store));
            }
            session.print_repository_path_summary(&path).await
        }
    }
}
