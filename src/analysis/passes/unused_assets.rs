use super::{emit, Analyzer};
use crate::analysis::{AnalysisContext, AnalysisError, Finding, PassKind, RunReport};
use crate::progress::Progress;

/// Reports every potentially unused asset of the project
pub struct UnusedAssetsPass;

impl UnusedAssetsPass {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnusedAssetsPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for UnusedAssetsPass {
    fn kind(&self) -> PassKind {
        PassKind::UnusedAssets
    }

    fn run(
        &self,
        ctx: &AnalysisContext<'_>,
        progress: &mut Progress<'_>,
    ) -> Result<RunReport, AnalysisError> {
        let mut report = RunReport::new(self.kind(), "No unused assets found");

        progress.report(0.0, "Classifying asset usage...");
        let classification = ctx.classification();
        let unused = classification.potentially_unused();

        for (i, asset) in unused.iter().enumerate() {
            progress.tick(i, unused.len(), || format!("Reporting {}", asset));

            let kind = ctx
                .snapshot
                .get(asset)
                .map(|r| r.kind.display_name())
                .unwrap_or("asset");
            emit(
                &mut report,
                Finding::warning(
                    Some(asset.clone()),
                    format!("Potentially unused {}", kind),
                ),
            );
            report.flag(asset);
        }

        progress.finish("Unused asset analysis complete");
        Ok(report)
    }
}
