mod inactive_objects;
mod materials;
mod resources;
mod scenes;
mod scripts;
mod textures;
mod unused_assets;

pub use inactive_objects::InactiveObjectsPass;
pub use materials::MaterialsPass;
pub use resources::ResourcesPass;
pub use scenes::ScenesPass;
pub use scripts::ScriptsPass;
pub use textures::TexturesPass;
pub use unused_assets::UnusedAssetsPass;

use super::{AnalysisContext, AnalysisError, Finding, PassKind, RunReport, Severity};
use crate::progress::Progress;
use tracing::{info, warn};

/// One audit pass
///
/// Passes are stateless; everything they read comes from the context and
/// everything they produce goes into the returned report.
pub trait Analyzer {
    fn kind(&self) -> PassKind;

    fn run(
        &self,
        ctx: &AnalysisContext<'_>,
        progress: &mut Progress<'_>,
    ) -> Result<RunReport, AnalysisError>;
}

/// The built-in pass for a kind
pub fn analyzer_for(kind: PassKind) -> Box<dyn Analyzer> {
    match kind {
        PassKind::Materials => Box::new(MaterialsPass::new()),
        PassKind::Textures => Box::new(TexturesPass::new()),
        PassKind::UnusedAssets => Box::new(UnusedAssetsPass::new()),
        PassKind::InactiveObjects => Box::new(InactiveObjectsPass::new()),
        PassKind::Scripts => Box::new(ScriptsPass::new()),
        PassKind::Scenes => Box::new(ScenesPass::new()),
        PassKind::Resources => Box::new(ResourcesPass::new()),
    }
}

/// Log a finding the way the editor console would show it, then record it
fn emit(report: &mut RunReport, finding: Finding) {
    let location = finding.location().unwrap_or_default();
    match finding.severity {
        Severity::Warning => warn!("[{}] {} {}", report.pass, finding.message, location),
        Severity::Info => info!("[{}] {} {}", report.pass, finding.message, location),
    }
    report.push(finding);
}
