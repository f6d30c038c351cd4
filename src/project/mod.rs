//! Project data model and the host interface the audit consumes.
//!
//! Everything the analysis needs from the outside world goes through
//! [`ProjectSource`]: the asset inventory, the shipped scenes, one-hop
//! dependencies, the script corpus and decoded images. Two hosts ship with the
//! crate: [`UnityProject`] reads a project directory on disk, and
//! [`MemoryProject`] holds data handed to it in-process.

mod memory;
pub mod unity;

pub use memory::MemoryProject;
pub use unity::UnityProject;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised by a project host
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Asset not found: {0}")]
    Missing(AssetId),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode image {asset}: {message}")]
    Decode { asset: AssetId, message: String },
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("No assets found in project")]
    NoAssets,
    #[error("Not a Unity project (no Assets directory): {0}")]
    NotAProject(PathBuf),
}

/// Stable identifier of an asset: its project-relative path with `/` separators
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(path: impl Into<String>) -> Self {
        let path: String = path.into();
        Self(path.replace('\\', "/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased extension without the dot, empty if there is none
    pub fn extension(&self) -> String {
        let file_name = self.file_name();
        match file_name.rfind('.') {
            Some(idx) if idx > 0 => file_name[idx + 1..].to_ascii_lowercase(),
            _ => String::new(),
        }
    }

    /// Last path segment
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Containing directory, empty for top-level entries
    pub fn directory(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetId {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Kind of content asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Texture,
    Mesh,
    Material,
    Script,
    Scene,
    Prefab,
    ScriptableObject,
    Folder,
    Other,
}

impl AssetKind {
    /// Best guess from a lowercased file extension
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            "png" | "jpg" | "jpeg" | "tga" | "bmp" | "psd" | "tif" | "tiff" | "gif" | "exr"
            | "hdr" | "iff" | "pict" => AssetKind::Texture,
            "fbx" | "obj" | "blend" | "dae" | "3ds" | "max" | "ma" | "mb" | "mesh" => {
                AssetKind::Mesh
            }
            "mat" => AssetKind::Material,
            "cs" | "js" | "boo" => AssetKind::Script,
            "unity" => AssetKind::Scene,
            "prefab" => AssetKind::Prefab,
            "asset" => AssetKind::ScriptableObject,
            _ => AssetKind::Other,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AssetKind::Texture => "texture",
            AssetKind::Mesh => "mesh",
            AssetKind::Material => "material",
            AssetKind::Script => "script",
            AssetKind::Scene => "scene",
            AssetKind::Prefab => "prefab",
            AssetKind::ScriptableObject => "scriptable object",
            AssetKind::Folder => "folder",
            AssetKind::Other => "asset",
        }
    }
}

/// One entry of the project asset inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    pub kind: AssetKind,
    /// Lowercased, without the dot
    pub extension: String,
}

impl AssetRecord {
    pub fn new(id: AssetId, kind: AssetKind) -> Self {
        let extension = id.extension();
        Self { id, kind, extension }
    }

    /// Record with the kind derived from the extension
    pub fn from_path(path: &str) -> Self {
        let id = AssetId::new(path);
        let kind = AssetKind::from_extension(&id.extension());
        Self::new(id, kind)
    }

    pub fn folder(path: &str) -> Self {
        Self {
            id: AssetId::new(path),
            kind: AssetKind::Folder,
            extension: String::new(),
        }
    }
}

/// Importer compression setting of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextureCompression {
    Uncompressed,
    #[default]
    Compressed,
    CompressedHighQuality,
    CompressedLowQuality,
}

impl TextureCompression {
    /// Map the importer's numeric `textureCompression` value
    pub fn from_importer_value(value: u32) -> Self {
        match value {
            0 => TextureCompression::Uncompressed,
            2 => TextureCompression::CompressedHighQuality,
            3 => TextureCompression::CompressedLowQuality,
            _ => TextureCompression::Compressed,
        }
    }
}

/// Metadata of a texture asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub compression: TextureCompression,
    pub mipmaps: bool,
}

/// Serialized settings of a renderer component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererInfo {
    pub material_slots: usize,
    /// `m_ReceiveShadows`
    pub receive_shadows: bool,
    /// `m_DynamicOccludee`, shown as "Allow Occlusion When Dynamic"
    pub dynamic_occludee: bool,
}

impl RendererInfo {
    /// A renderer that neither receives shadows nor opts out of occlusion
    pub fn new(material_slots: usize) -> Self {
        Self {
            material_slots,
            receive_shadows: false,
            dynamic_occludee: true,
        }
    }

    pub fn receiving_shadows(mut self) -> Self {
        self.receive_shadows = true;
        self
    }

    pub fn without_dynamic_occlusion(mut self) -> Self {
        self.dynamic_occludee = false;
        self
    }
}

/// A GameObject inside a scene or prefab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneObject {
    pub name: String,
    /// Names of the parents, nearest first
    pub ancestors: Vec<String>,
    pub active_self: bool,
    /// Active itself and every ancestor active
    pub active_in_hierarchy: bool,
    pub renderer: Option<RendererInfo>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ancestors: Vec::new(),
            active_self: true,
            active_in_hierarchy: true,
            renderer: None,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active_self = false;
        self.active_in_hierarchy = false;
        self
    }

    pub fn with_ancestors(mut self, ancestors: Vec<String>) -> Self {
        self.ancestors = ancestors;
        self
    }

    pub fn with_renderer(mut self, renderer: RendererInfo) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Shorthand for a plain renderer with `slots` materials
    pub fn with_material_slots(self, slots: usize) -> Self {
        self.with_renderer(RendererInfo::new(slots))
    }

    /// Material slots of the renderer, zero without one
    pub fn material_slots(&self) -> usize {
        self.renderer.map(|r| r.material_slots).unwrap_or(0)
    }
}

/// What the material checks read from a material asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialInfo {
    /// A texture is assigned to the main texture slot
    pub has_main_texture: bool,
}

/// Aggregate counts for one scene
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub object_count: usize,
    pub realtime_shadow_lights: usize,
}

/// Per-frame engine callbacks a script can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrameCallback {
    Update,
    FixedUpdate,
    LateUpdate,
}

impl FrameCallback {
    pub const ALL: [FrameCallback; 3] = [
        FrameCallback::Update,
        FrameCallback::FixedUpdate,
        FrameCallback::LateUpdate,
    ];

    pub fn method_name(&self) -> &'static str {
        match self {
            FrameCallback::Update => "Update",
            FrameCallback::FixedUpdate => "FixedUpdate",
            FrameCallback::LateUpdate => "LateUpdate",
        }
    }
}

/// Declared capabilities of one script, supplied by the host's component model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCapabilities {
    pub script: AssetId,
    pub callbacks: Vec<FrameCallback>,
    pub uses_raycast: bool,
}

/// The host environment the audit runs against
pub trait ProjectSource {
    /// Full asset inventory, order irrelevant
    fn list_all_assets(&self) -> Result<Vec<AssetRecord>, ProjectError>;

    /// Scenes enabled in the shipping build list
    fn list_enabled_scenes(&self) -> Vec<AssetId>;

    /// Every prefab asset in the project
    fn list_prefabs(&self) -> Vec<AssetId>;

    /// Direct, one-hop structural references of an asset
    fn get_dependencies(&self, asset: &AssetId) -> Result<Vec<AssetId>, ProjectError>;

    /// Source files making up the script corpus
    fn source_files(&self) -> Vec<AssetId>;

    /// Full text of one source file
    fn read_source(&self, file: &AssetId) -> Result<String, ProjectError>;

    fn load_image(&self, asset: &AssetId) -> Result<DynamicImage, ProjectError>;

    fn texture_info(&self, asset: &AssetId) -> Result<TextureInfo, ProjectError>;

    /// GameObjects of a scene or prefab
    fn scene_objects(&self, container: &AssetId) -> Result<Vec<SceneObject>, ProjectError>;

    fn scene_stats(&self, scene: &AssetId) -> Result<SceneStats, ProjectError>;

    fn material_info(&self, material: &AssetId) -> Result<MaterialInfo, ProjectError>;

    /// Declared-capability table for every script
    fn script_capabilities(&self) -> Vec<ScriptCapabilities>;

    /// Third-party SDK heuristic for a folder
    fn is_possible_sdk_folder(&self, _folder: &str) -> bool {
        false
    }
}

/// Immutable view of the project taken once at the start of a run
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    assets: Vec<AssetRecord>,
    by_id: HashMap<AssetId, usize>,
    enabled_scenes: Vec<AssetId>,
    prefabs: Vec<AssetId>,
}

impl ProjectSnapshot {
    /// Enumerate the project. An empty inventory is the one fatal failure.
    pub fn capture(source: &dyn ProjectSource) -> Result<Self, ProjectError> {
        let assets = source.list_all_assets()?;
        if assets.is_empty() {
            return Err(ProjectError::NoAssets);
        }

        let enabled_scenes = source.list_enabled_scenes();
        let prefabs = source.list_prefabs();

        info!(
            "Snapshot: {} assets, {} enabled scenes, {} prefabs",
            assets.len(),
            enabled_scenes.len(),
            prefabs.len()
        );

        Ok(Self::from_parts(assets, enabled_scenes, prefabs))
    }

    pub fn from_parts(
        assets: Vec<AssetRecord>,
        enabled_scenes: Vec<AssetId>,
        prefabs: Vec<AssetId>,
    ) -> Self {
        let mut by_id = HashMap::with_capacity(assets.len());
        let mut unique = Vec::with_capacity(assets.len());
        for record in assets {
            if record.id.as_str().trim().is_empty() || record.id.as_str() == "." {
                continue;
            }
            if by_id.contains_key(&record.id) {
                debug!("Duplicate asset record ignored: {}", record.id);
                continue;
            }
            by_id.insert(record.id.clone(), unique.len());
            unique.push(record);
        }

        Self {
            assets: unique,
            by_id,
            enabled_scenes,
            prefabs,
        }
    }

    pub fn assets(&self) -> &[AssetRecord] {
        &self.assets
    }

    pub fn get(&self, id: &AssetId) -> Option<&AssetRecord> {
        self.by_id.get(id).map(|&idx| &self.assets[idx])
    }

    pub fn enabled_scenes(&self) -> &[AssetId] {
        &self.enabled_scenes
    }

    pub fn prefabs(&self) -> &[AssetId] {
        &self.prefabs
    }

    pub fn assets_of_kind(&self, kind: AssetKind) -> impl Iterator<Item = &AssetRecord> {
        self.assets.iter().filter(move |a| a.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
