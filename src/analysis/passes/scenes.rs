use super::{emit, Analyzer};
use crate::analysis::{AnalysisContext, AnalysisError, Finding, PassKind, RunReport};
use crate::config::Thresholds;
use crate::progress::Progress;
use crate::project::{AssetId, RendererInfo};
use tracing::warn;

fn check_renderer(
    report: &mut RunReport,
    scene: &AssetId,
    name: &str,
    renderer: &RendererInfo,
    limits: &Thresholds,
) {
    if !renderer.dynamic_occludee {
        emit(
            report,
            Finding::warning(
                Some(scene.clone()),
                format!(
                    "Renderer on object '{}' has 'Allow Occlusion When Dynamic' turned off, which can prevent batching",
                    name
                ),
            ),
        );
    }
    if renderer.receive_shadows {
        emit(
            report,
            Finding::warning(
                Some(scene.clone()),
                format!(
                    "Renderer on object '{}' receives shadows, complex shadow receivers can prevent batching",
                    name
                ),
            ),
        );
    }
    if renderer.material_slots > limits.materials_per_renderer as usize {
        emit(
            report,
            Finding::warning(
                Some(scene.clone()),
                format!(
                    "Object '{}' uses {} materials, which increases draw calls",
                    name, renderer.material_slots
                ),
            ),
        );
    }
}

/// Object count, realtime shadow lights and renderer settings that break
/// batching, for every enabled scene
pub struct ScenesPass;

impl ScenesPass {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScenesPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for ScenesPass {
    fn kind(&self) -> PassKind {
        PassKind::Scenes
    }

    fn run(
        &self,
        ctx: &AnalysisContext<'_>,
        progress: &mut Progress<'_>,
    ) -> Result<RunReport, AnalysisError> {
        let mut report = RunReport::new(self.kind(), "No scene problems found");
        let limits = &ctx.config.thresholds;
        let scenes = ctx.snapshot.enabled_scenes();

        for (i, scene) in scenes.iter().enumerate() {
            progress.tick(i, scenes.len(), || format!("Analyzing scene {}", scene));

            match ctx.source.scene_stats(scene) {
                Ok(stats) => {
                    if stats.object_count > limits.scene_object_count as usize {
                        emit(
                            &mut report,
                            Finding::warning(
                                Some(scene.clone()),
                                format!(
                                    "Scene contains {} objects, more than {}",
                                    stats.object_count, limits.scene_object_count
                                ),
                            ),
                        );
                    }
                    if stats.realtime_shadow_lights > limits.realtime_shadow_lights as usize {
                        emit(
                            &mut report,
                            Finding::warning(
                                Some(scene.clone()),
                                format!(
                                    "Scene contains {} realtime lights casting shadows",
                                    stats.realtime_shadow_lights
                                ),
                            ),
                        );
                    }
                }
                Err(e) => warn!("Skipping statistics of {}: {}", scene, e),
            }

            match ctx.source.scene_objects(scene) {
                Ok(objects) => {
                    // Disabled renderers are not drawn
                    for object in objects.iter().filter(|o| o.active_in_hierarchy) {
                        let Some(renderer) = object.renderer else {
                            continue;
                        };
                        check_renderer(&mut report, scene, &object.name, &renderer, limits);
                    }
                }
                Err(e) => warn!("Skipping renderers of {}: {}", scene, e),
            }
        }

        progress.finish("Scene analysis complete");
        Ok(report)
    }
}
