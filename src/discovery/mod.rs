mod file_finder;

pub use file_finder::{EntryKind, FileFinder, FileStats, ProjectEntry};
