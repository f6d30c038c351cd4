use super::{emit, Analyzer};
use crate::analysis::{AnalysisContext, AnalysisError, Finding, PassKind, RunReport};
use crate::progress::Progress;

/// Reports resources-directory assets that nothing loads or references
pub struct ResourcesPass;

impl ResourcesPass {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ResourcesPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for ResourcesPass {
    fn kind(&self) -> PassKind {
        PassKind::Resources
    }

    fn run(
        &self,
        ctx: &AnalysisContext<'_>,
        progress: &mut Progress<'_>,
    ) -> Result<RunReport, AnalysisError> {
        let mut report =
            RunReport::new(self.kind(), "Every resources asset is loaded or referenced");

        progress.report(0.0, "Classifying asset usage...");
        let unused: Vec<_> = ctx
            .classification()
            .potentially_unused()
            .iter()
            .filter(|asset| ctx.resources_relative(asset).is_some())
            .collect();

        for (i, asset) in unused.iter().enumerate() {
            progress.tick(i, unused.len(), || format!("Reporting {}", asset));
            emit(
                &mut report,
                Finding::warning(
                    Some((*asset).clone()),
                    "Resources asset is neither loaded from code nor referenced",
                ),
            );
            report.flag(asset);
        }

        progress.finish("Resources analysis complete");
        Ok(report)
    }
}
