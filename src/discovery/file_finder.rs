use crate::project::ProjectError;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Kind of entry found under the content root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A content file
    Asset,
    /// A directory, which is an asset of its own
    Folder,
    /// The importer sidecar of a file or folder
    Meta,
}

impl EntryKind {
    fn from_path(path: &Path, is_dir: bool) -> Self {
        if is_dir {
            EntryKind::Folder
        } else if path.extension().and_then(|e| e.to_str()) == Some("meta") {
            EntryKind::Meta
        } else {
            EntryKind::Asset
        }
    }
}

/// A discovered entry with its project-relative id
#[derive(Debug, Clone)]
pub struct ProjectEntry {
    /// Absolute path on disk
    pub path: PathBuf,

    /// Project-relative path with `/` separators
    pub relative: String,

    pub kind: EntryKind,
}

/// Walks the content directory of a project
pub struct FileFinder {
    content_dir: String,
}

impl FileFinder {
    pub fn new() -> Self {
        Self {
            content_dir: "Assets".to_string(),
        }
    }

    /// Find every file, folder and `.meta` sidecar under the content directory
    pub fn find_entries(&self, project_root: &Path) -> Result<Vec<ProjectEntry>, ProjectError> {
        let content_root = project_root.join(&self.content_dir);
        if !content_root.is_dir() {
            return Err(ProjectError::NotAProject(project_root.to_path_buf()));
        }

        debug!("Scanning for assets in: {}", content_root.display());

        let walker = WalkBuilder::new(&content_root)
            .hidden(true)           // Skip hidden files, the engine ignores them too
            .git_ignore(true)       // Respect .gitignore
            .git_global(false)
            .git_exclude(true)      // Respect .git/info/exclude
            .ignore(true)           // Respect .ignore files
            .parents(true)          // Check parent directories for ignore files
            .follow_links(false)    // Don't follow symlinks
            .filter_entry(|entry| !is_engine_ignored(entry.file_name().to_string_lossy().as_ref()))
            .build();

        let mut entries: Vec<ProjectEntry> = walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.depth() > 0)
            .filter_map(|entry| {
                let path = entry.path();
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                let relative = relative_id(project_root, path)?;
                let kind = EntryKind::from_path(path, is_dir);

                trace!("Found {:?}: {}", kind, relative);
                Some(ProjectEntry {
                    path: path.to_path_buf(),
                    relative,
                    kind,
                })
            })
            .collect();

        entries.sort_by(|a, b| a.relative.cmp(&b.relative));
        debug!("Found {} entries", entries.len());
        Ok(entries)
    }
}

impl Default for FileFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Names the engine's importer skips: `foo~`, `cvs`, `*.tmp`
fn is_engine_ignored(name: &str) -> bool {
    name.ends_with('~') || name.eq_ignore_ascii_case("cvs") || name.ends_with(".tmp")
}

fn relative_id(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Statistics about discovered entries
#[derive(Debug, Default)]
pub struct FileStats {
    pub assets: usize,
    pub folders: usize,
    pub meta_files: usize,
}

impl FileStats {
    pub fn from_entries(entries: &[ProjectEntry]) -> Self {
        let mut stats = Self::default();
        for entry in entries {
            match entry.kind {
                EntryKind::Asset => stats.assets += 1,
                EntryKind::Folder => stats.folders += 1,
                EntryKind::Meta => stats.meta_files += 1,
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.assets + self.folders + self.meta_files
    }
}
