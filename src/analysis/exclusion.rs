use crate::config::{Config, ExclusionConfig};
use crate::project::{AssetKind, AssetRecord, ProjectSource};
use tracing::trace;

/// Predicates that keep non-content files out of the unused report.
///
/// Exclusion never changes a verdict; it only decides whether a
/// potentially unused asset is emitted.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    tables: ExclusionConfig,
    user_patterns: Vec<String>,
}

impl ExclusionRules {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tables: config.exclusions.clone(),
            user_patterns: config.exclude.clone(),
        }
    }

    /// Whether the asset may never be reported as unused
    pub fn is_excluded(&self, record: &AssetRecord, source: &dyn ProjectSource) -> bool {
        if self.matches_path_rules(record) {
            return true;
        }

        if self.tables.sdk_heuristic && source.is_possible_sdk_folder(record.id.directory()) {
            trace!("{} sits in a third-party package folder", record.id);
            return true;
        }

        false
    }

    /// Path-only rules: kind, prefixes, extensions, fragments, suffixes,
    /// skipped directories and user patterns
    pub fn matches_path_rules(&self, record: &AssetRecord) -> bool {
        if record.kind == AssetKind::Folder {
            return true;
        }

        let path = record.id.as_str();
        let tables = &self.tables;

        if tables.ignored_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return true;
        }

        if !record.extension.is_empty() {
            let dotted = format!(".{}", record.extension);
            if tables
                .ignored_extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(&dotted))
            {
                return true;
            }
        }

        if tables.ignored_fragments.iter().any(|f| path.contains(f.as_str())) {
            return true;
        }

        if tables.ignored_suffixes.iter().any(|s| path.ends_with(s.as_str())) {
            return true;
        }

        let directory = format!("/{}/", record.id.directory());
        if tables
            .skipped_directories
            .iter()
            .any(|d| directory.contains(d.as_str()))
        {
            return true;
        }

        self.user_patterns
            .iter()
            .any(|pattern| crate::config::glob_match(pattern, path))
    }
}
