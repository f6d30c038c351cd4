use super::{
    AssetId, AssetKind, AssetRecord, MaterialInfo, ProjectError, ProjectSource, SceneObject,
    SceneStats, ScriptCapabilities, TextureInfo,
};
use image::DynamicImage;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Project host backed by data supplied in-process
///
/// Useful when the asset database lives elsewhere (an editor plugin, a build
/// server) and only its answers are handed over.
#[derive(Debug, Default, Clone)]
pub struct MemoryProject {
    assets: BTreeMap<AssetId, AssetRecord>,
    enabled_scenes: Vec<AssetId>,
    dependencies: HashMap<AssetId, Vec<AssetId>>,
    unreadable: HashSet<AssetId>,
    sources: BTreeMap<AssetId, Option<String>>,
    images: HashMap<AssetId, DynamicImage>,
    textures: HashMap<AssetId, TextureInfo>,
    objects: HashMap<AssetId, Vec<SceneObject>>,
    stats: HashMap<AssetId, SceneStats>,
    materials: HashMap<AssetId, MaterialInfo>,
    capabilities: Vec<ScriptCapabilities>,
    sdk_folders: HashSet<String>,
}

impl MemoryProject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset whose kind follows from its extension
    pub fn with_asset(mut self, path: &str) -> Self {
        let record = AssetRecord::from_path(path);
        self.assets.insert(record.id.clone(), record);
        self
    }

    pub fn with_record(mut self, record: AssetRecord) -> Self {
        self.assets.insert(record.id.clone(), record);
        self
    }

    /// Add a scene; `enabled` puts it in the shipping build list
    pub fn with_scene(mut self, path: &str, enabled: bool) -> Self {
        let record = AssetRecord::new(AssetId::new(path), AssetKind::Scene);
        if enabled {
            self.enabled_scenes.push(record.id.clone());
        }
        self.assets.insert(record.id.clone(), record);
        self
    }

    /// Record that `from` structurally references `to`
    pub fn with_dependency(mut self, from: &str, to: &str) -> Self {
        self.dependencies
            .entry(AssetId::new(from))
            .or_default()
            .push(AssetId::new(to));
        self
    }

    /// Make dependency lookups for an asset fail
    pub fn with_unreadable(mut self, path: &str) -> Self {
        self.unreadable.insert(AssetId::new(path));
        self
    }

    pub fn with_source(mut self, path: &str, text: &str) -> Self {
        self.sources.insert(AssetId::new(path), Some(text.to_string()));
        self
    }

    /// A source file that is listed but cannot be read
    pub fn with_unreadable_source(mut self, path: &str) -> Self {
        self.sources.insert(AssetId::new(path), None);
        self
    }

    pub fn with_image(mut self, path: &str, image: DynamicImage) -> Self {
        self.images.insert(AssetId::new(path), image);
        self
    }

    pub fn with_texture_info(mut self, path: &str, info: TextureInfo) -> Self {
        self.textures.insert(AssetId::new(path), info);
        self
    }

    pub fn with_objects(mut self, container: &str, objects: Vec<SceneObject>) -> Self {
        self.objects.insert(AssetId::new(container), objects);
        self
    }

    pub fn with_scene_stats(mut self, scene: &str, stats: SceneStats) -> Self {
        self.stats.insert(AssetId::new(scene), stats);
        self
    }

    /// Add a material asset with what its main texture slot holds
    pub fn with_material(mut self, path: &str, info: MaterialInfo) -> Self {
        let record = AssetRecord::new(AssetId::new(path), AssetKind::Material);
        self.materials.insert(record.id.clone(), info);
        self.assets.insert(record.id.clone(), record);
        self
    }

    pub fn with_capabilities(mut self, capabilities: ScriptCapabilities) -> Self {
        self.capabilities.push(capabilities);
        self
    }

    pub fn with_sdk_folder(mut self, folder: &str) -> Self {
        self.sdk_folders.insert(folder.to_string());
        self
    }
}

impl ProjectSource for MemoryProject {
    fn list_all_assets(&self) -> Result<Vec<AssetRecord>, ProjectError> {
        Ok(self.assets.values().cloned().collect())
    }

    fn list_enabled_scenes(&self) -> Vec<AssetId> {
        self.enabled_scenes.clone()
    }

    fn list_prefabs(&self) -> Vec<AssetId> {
        self.assets
            .values()
            .filter(|a| a.kind == AssetKind::Prefab)
            .map(|a| a.id.clone())
            .collect()
    }

    fn get_dependencies(&self, asset: &AssetId) -> Result<Vec<AssetId>, ProjectError> {
        if self.unreadable.contains(asset) {
            return Err(ProjectError::Missing(asset.clone()));
        }
        Ok(self.dependencies.get(asset).cloned().unwrap_or_default())
    }

    fn source_files(&self) -> Vec<AssetId> {
        self.sources.keys().cloned().collect()
    }

    fn read_source(&self, file: &AssetId) -> Result<String, ProjectError> {
        match self.sources.get(file) {
            Some(Some(text)) => Ok(text.clone()),
            _ => Err(ProjectError::Missing(file.clone())),
        }
    }

    fn load_image(&self, asset: &AssetId) -> Result<DynamicImage, ProjectError> {
        self.images
            .get(asset)
            .cloned()
            .ok_or_else(|| ProjectError::Decode {
                asset: asset.clone(),
                message: "no image data".to_string(),
            })
    }

    fn texture_info(&self, asset: &AssetId) -> Result<TextureInfo, ProjectError> {
        if let Some(info) = self.textures.get(asset) {
            return Ok(*info);
        }
        // Fall back to the dimensions of a supplied image
        self.images
            .get(asset)
            .map(|img| TextureInfo {
                width: img.width(),
                height: img.height(),
                compression: Default::default(),
                mipmaps: true,
            })
            .ok_or_else(|| ProjectError::Missing(asset.clone()))
    }

    fn scene_objects(&self, container: &AssetId) -> Result<Vec<SceneObject>, ProjectError> {
        Ok(self.objects.get(container).cloned().unwrap_or_default())
    }

    fn scene_stats(&self, scene: &AssetId) -> Result<SceneStats, ProjectError> {
        if let Some(stats) = self.stats.get(scene) {
            return Ok(*stats);
        }
        let object_count = self.objects.get(scene).map(|o| o.len()).unwrap_or(0);
        Ok(SceneStats {
            object_count,
            realtime_shadow_lights: 0,
        })
    }

    fn material_info(&self, material: &AssetId) -> Result<MaterialInfo, ProjectError> {
        self.materials
            .get(material)
            .copied()
            .ok_or_else(|| ProjectError::Missing(material.clone()))
    }

    fn script_capabilities(&self) -> Vec<ScriptCapabilities> {
        self.capabilities.clone()
    }

    fn is_possible_sdk_folder(&self, folder: &str) -> bool {
        self.sdk_folders
            .iter()
            .any(|sdk| folder == sdk || folder.starts_with(&format!("{}/", sdk)))
    }
}
