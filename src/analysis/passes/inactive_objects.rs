use super::{emit, Analyzer};
use crate::analysis::{AnalysisContext, AnalysisError, Finding, PassKind, RunReport};
use crate::progress::Progress;
use crate::project::{AssetId, SceneObject};
use tracing::warn;

/// Objects that start disabled and that no script ever switches on.
///
/// "Switched on" is the textual activation heuristic of the code scanner, so
/// an object toggled through a computed name is still reported.
pub struct InactiveObjectsPass;

impl InactiveObjectsPass {
    pub fn new() -> Self {
        Self
    }

    fn scene_object_is_dead(&self, ctx: &AnalysisContext<'_>, object: &SceneObject) -> bool {
        !object.active_in_hierarchy
            && !ctx.scanner.is_activated_in_code(&object.name)
            && !object
                .ancestors
                .iter()
                .any(|ancestor| ctx.scanner.is_activated_in_code(ancestor))
    }

    fn prefab_object_is_dead(&self, ctx: &AnalysisContext<'_>, object: &SceneObject) -> bool {
        !object.active_in_hierarchy && !ctx.scanner.is_activated_in_code(&object.name)
    }

    fn objects_of(
        &self,
        ctx: &AnalysisContext<'_>,
        container: &AssetId,
    ) -> Option<Vec<SceneObject>> {
        match ctx.source.scene_objects(container) {
            Ok(objects) => Some(objects),
            Err(e) => {
                warn!("Skipping {}: {}", container, e);
                None
            }
        }
    }
}

impl Default for InactiveObjectsPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for InactiveObjectsPass {
    fn kind(&self) -> PassKind {
        PassKind::InactiveObjects
    }

    fn run(
        &self,
        ctx: &AnalysisContext<'_>,
        progress: &mut Progress<'_>,
    ) -> Result<RunReport, AnalysisError> {
        let mut report = RunReport::new(self.kind(), "No inactive objects found");

        let scenes = ctx.snapshot.enabled_scenes();
        let prefabs = ctx.snapshot.prefabs();
        let total = scenes.len() + prefabs.len();

        for (i, scene) in scenes.iter().enumerate() {
            progress.tick(i, total, || format!("Checking inactive objects in scene {}", scene));

            let Some(objects) = self.objects_of(ctx, scene) else {
                continue;
            };
            for object in objects.iter().filter(|o| self.scene_object_is_dead(ctx, o)) {
                emit(
                    &mut report,
                    Finding::warning(
                        Some(scene.clone()),
                        format!("Inactive object '{}' is never activated in code", object.name),
                    ),
                );
            }
        }

        for (i, prefab) in prefabs.iter().enumerate() {
            progress.tick(scenes.len() + i, total, || {
                format!("Checking inactive objects in prefab {}", prefab)
            });

            let Some(objects) = self.objects_of(ctx, prefab) else {
                continue;
            };
            for object in objects.iter().filter(|o| self.prefab_object_is_dead(ctx, o)) {
                emit(
                    &mut report,
                    Finding::warning(
                        Some(prefab.clone()),
                        format!("Inactive object '{}' is never activated in code", object.name),
                    ),
                );
            }
        }

        progress.finish("Inactive object analysis complete");
        Ok(report)
    }
}
