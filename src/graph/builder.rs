use super::DependencyIndex;
use crate::progress::Progress;
use crate::project::{AssetKind, ProjectSnapshot, ProjectSource};
use tracing::{debug, info, warn};

/// Builds the dependency index for a snapshot by asking the host for every
/// asset's one-hop references
pub struct IndexBuilder<'a> {
    source: &'a dyn ProjectSource,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(source: &'a dyn ProjectSource) -> Self {
        Self { source }
    }

    /// A failing asset contributes no edges; the build itself never fails
    pub fn build(
        &self,
        snapshot: &ProjectSnapshot,
        progress: &mut Progress<'_>,
    ) -> DependencyIndex {
        let mut index = DependencyIndex::new();
        let total = snapshot.len();
        let mut failures = 0usize;

        info!("Building dependency index for {} assets...", total);

        for (i, record) in snapshot.assets().iter().enumerate() {
            progress.tick(i, total, || format!("Indexing {}", record.id));

            index.add_asset(&record.id);
            if record.kind == AssetKind::Folder {
                continue;
            }

            match self.source.get_dependencies(&record.id) {
                Ok(dependencies) => {
                    for dependency in &dependencies {
                        index.add_dependency(&record.id, dependency);
                    }
                }
                Err(e) => {
                    debug!("Skipping dependencies of {}: {}", record.id, e);
                    index.mark_unreadable(&record.id);
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            warn!("{} assets had unreadable dependencies", failures);
        }

        info!(
            "Dependency index: {} assets, {} references",
            index.asset_count(),
            index.edge_count()
        );
        progress.finish("Dependency index ready");

        index
    }
}
