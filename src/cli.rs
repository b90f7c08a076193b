use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "repoquery",
    version,
    about = "Query a repository's files, text and C# declarations",
    after_help = r#"Examples:
  repoquery --repo . files
  repoquery --repo . cat Program.cs
  repoquery --repo . around Program.cs --line 40 --context 5
  repoquery --repo . grep --glob '*.cs' --whole-word JobRunner
  repoquery --repo . function RepositoryQuerySession GetAllRepoFiles
  repoquery --repo . summary src --summaries summaries.json
"#
)]
pub struct Args {
    /// Repository root to query.
    #[arg(long, default_value = ".", global = true)]
    pub repo: PathBuf,
    /// Include files ignored by .gitignore.
    #[arg(long, global = true)]
    pub no_ignore: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List every indexed file.
    Files,
    /// Print a file with line numbers.
    Cat {
        /// File name; only the base name is compared.
        file: String,
    },
    /// Print the lines around a line of a file.
    Around {
        file: String,
        #[arg(long)]
        line: i64,
        /// Lines to include above and below.
        #[arg(long, default_value_t = 10)]
        context: i64,
    },
    /// Find lines containing text in files matching a glob.
    Grep {
        text: String,
        /// File name glob (`*` and `?`).
        #[arg(long, default_value = "*")]
        glob: String,
        #[arg(long)]
        case_sensitive: bool,
        #[arg(long)]
        whole_word: bool,
    },
    /// Print the source of a method declared in a type.
    Function { class: String, function: String },
    /// Print the stored summary of a path ("" for the whole repository).
    Summary {
        #[arg(default_value = "")]
        path: String,
        /// JSON object mapping repo-relative paths to summaries.
        #[arg(long, value_name = "PATH")]
        summaries: Option<PathBuf>,
    },
}
