use super::{emit, Analyzer};
use crate::analysis::{AnalysisContext, AnalysisError, Finding, LumaGrid, PassKind, RunReport};
use crate::config::TextureScope;
use crate::progress::Progress;
use crate::project::{AssetId, AssetKind, TextureCompression, TextureInfo};
use tracing::debug;

/// Extensions the similarity scan can decode
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tga", "bmp"];

/// Size, compression and mipmap checks plus the near-duplicate scan
pub struct TexturesPass;

impl TexturesPass {
    pub fn new() -> Self {
        Self
    }

    fn candidates(&self, ctx: &AnalysisContext<'_>) -> Vec<AssetId> {
        ctx.snapshot
            .assets_of_kind(AssetKind::Texture)
            .filter(|r| IMAGE_EXTENSIONS.contains(&r.extension.as_str()))
            .filter(|r| match ctx.config.textures.scope {
                TextureScope::All => true,
                TextureScope::Used => ctx.has_usage_evidence(&r.id),
            })
            .map(|r| r.id.clone())
            .collect()
    }

    fn check_metadata(
        &self,
        ctx: &AnalysisContext<'_>,
        asset: &AssetId,
        info: &TextureInfo,
        report: &mut RunReport,
    ) {
        let limits = &ctx.config.thresholds;
        let (width, height) = (info.width, info.height);

        if width > limits.texture_oversized || height > limits.texture_oversized {
            emit(
                report,
                Finding::warning(
                    Some(asset.clone()),
                    format!(
                        "Oversized texture ({}x{}), consider reducing its resolution",
                        width, height
                    ),
                ),
            );
        } else if width > limits.texture_large || height > limits.texture_large {
            emit(
                report,
                Finding::info(Some(asset.clone()), format!("Large texture ({}x{})", width, height)),
            );
        }

        if info.compression == TextureCompression::Uncompressed {
            emit(report, Finding::warning(Some(asset.clone()), "Texture is uncompressed"));

            if width > limits.texture_mipmap_min && !info.mipmaps {
                emit(
                    report,
                    Finding::warning(
                        Some(asset.clone()),
                        format!(
                            "Uncompressed texture wider than {} has no mipmaps",
                            limits.texture_mipmap_min
                        ),
                    ),
                );
            }
            if width < limits.texture_mipmap_max_small && info.mipmaps {
                emit(
                    report,
                    Finding::warning(
                        Some(asset.clone()),
                        format!(
                            "Uncompressed texture narrower than {} has mipmaps enabled",
                            limits.texture_mipmap_max_small
                        ),
                    ),
                );
            }
        }

        if info.compression == TextureCompression::CompressedLowQuality {
            emit(
                report,
                Finding::warning(Some(asset.clone()), "Texture uses low-quality compression"),
            );
        }

        let difference = (width as f64 - height as f64).abs();
        if difference > 0.1 * width as f64 {
            emit(
                report,
                Finding::warning(
                    Some(asset.clone()),
                    format!("Non-square texture ({}x{}) may compress poorly", width, height),
                ),
            );
        }
    }
}

impl Default for TexturesPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for TexturesPass {
    fn kind(&self) -> PassKind {
        PassKind::Textures
    }

    fn run(
        &self,
        ctx: &AnalysisContext<'_>,
        progress: &mut Progress<'_>,
    ) -> Result<RunReport, AnalysisError> {
        let mut report = RunReport::new(self.kind(), "No texture problems found");
        let textures = self.candidates(ctx);
        let total = textures.len();
        // Metadata checks fill the first half of the bar, similarity the second
        let steps = total * 2;

        let mut grids: Vec<(&AssetId, LumaGrid)> = Vec::with_capacity(total);

        for (i, asset) in textures.iter().enumerate() {
            progress.tick(i, steps, || format!("Checking texture {} of {}", i + 1, total));

            match ctx.source.texture_info(asset) {
                Ok(info) => self.check_metadata(ctx, asset, &info, &mut report),
                Err(e) => debug!("No texture metadata for {}: {}", asset, e),
            }

            // Undecodable images stay out of the comparison
            match ctx.source.load_image(asset) {
                Ok(image) => match LumaGrid::from_image(&image) {
                    Some(grid) => grids.push((asset, grid)),
                    None => debug!("Empty image skipped: {}", asset),
                },
                Err(e) => debug!("Skipping similarity for {}: {}", asset, e),
            }
        }

        for i in 0..grids.len() {
            progress.tick(total + i, steps, || {
                format!("Comparing texture {} of {}", i + 1, grids.len())
            });

            let (first, first_grid) = &grids[i];
            for (second, second_grid) in &grids[i + 1..] {
                if first_grid.is_similar(second_grid) {
                    emit(
                        &mut report,
                        Finding::warning(
                            Some((*first).clone()),
                            format!("Might be similar to {}", second),
                        ),
                    );
                    report.flag(first);
                    report.flag(second);
                }
            }
        }

        progress.finish("Texture analysis complete");
        Ok(report)
    }
}
