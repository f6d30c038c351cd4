use super::{emit, Analyzer};
use crate::analysis::{AnalysisContext, AnalysisError, Finding, PassKind, RunReport};
use crate::progress::Progress;
use crate::project::AssetKind;
use tracing::debug;

/// Used materials with nothing in their main texture slot
pub struct MaterialsPass;

impl MaterialsPass {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MaterialsPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for MaterialsPass {
    fn kind(&self) -> PassKind {
        PassKind::Materials
    }

    fn run(
        &self,
        ctx: &AnalysisContext<'_>,
        progress: &mut Progress<'_>,
    ) -> Result<RunReport, AnalysisError> {
        let mut report = RunReport::new(self.kind(), "No material problems found");
        let materials: Vec<_> = ctx
            .snapshot
            .assets_of_kind(AssetKind::Material)
            .filter(|r| ctx.has_usage_evidence(&r.id))
            .collect();

        for (i, record) in materials.iter().enumerate() {
            progress.tick(i, materials.len(), || format!("Analyzing material {}", record.id));

            match ctx.source.material_info(&record.id) {
                Ok(info) if !info.has_main_texture => emit(
                    &mut report,
                    Finding::warning(Some(record.id.clone()), "Material has no main texture assigned"),
                ),
                Ok(_) => {}
                Err(e) => debug!("Skipping material {}: {}", record.id, e),
            }
        }

        progress.finish("Material analysis complete");
        Ok(report)
    }
}
