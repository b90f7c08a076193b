pub mod cli;
pub mod config;
pub mod customization;
pub mod error;
pub mod extract;
pub mod index;
pub mod lines;
pub mod listing;
pub mod model;
pub mod report;
pub mod search;
pub mod session;
pub mod summary;
pub mod util;

pub use error::{IndexLoadError, QueryMiss};
pub use index::RepositoryFileIndex;
pub use listing::{FileListing, WalkListing, WalkOptions};
pub use model::RepositoryFile;
pub use session::RepositoryQuerySession;
