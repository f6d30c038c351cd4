//! Filesystem host for a project directory laid out the engine's way:
//! content under `Assets/`, one `.meta` sidecar per file and folder, and the
//! build scene list in `ProjectSettings/EditorBuildSettings.asset`.

mod meta;
mod yaml;

pub use meta::MetaInfo;

use super::{
    AssetId, AssetKind, AssetRecord, FrameCallback, MaterialInfo, ProjectError, ProjectSource,
    SceneObject, SceneStats, ScriptCapabilities, TextureCompression, TextureInfo,
};
use crate::discovery::{EntryKind, FileFinder, FileStats};
use image::DynamicImage;
use rayon::prelude::*;
use regex::Regex;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::OnceLock;
use tracing::{debug, info, trace, warn};

const BUILD_SETTINGS: &str = "ProjectSettings/EditorBuildSettings.asset";

/// Extensions stored as text-serialized YAML by the editor
const YAML_EXTENSIONS: &[&str] = &[
    "unity", "prefab", "mat", "asset", "controller", "overridecontroller", "anim", "mask",
    "physicmaterial", "physicsmaterial2d", "guiskin", "fontsettings", "mixer", "rendertexture",
    "flare", "cubemap", "spriteatlas", "playable", "signal", "terrainlayer", "brush", "preset",
    "lighting", "shadervariants",
];

/// File names that mark a folder as a bundled third-party package
const SDK_MARKER_FILES: &[&str] = &[
    "readme.txt",
    "readme.md",
    "documentation.txt",
    "documentation.pdf",
    "license.txt",
    "license.md",
    "changelog.txt",
    "changelog.md",
];

/// Subfolder name endings that mark a bundled third-party package
const SDK_MARKER_FOLDERS: &[&str] = &["examples", "demos"];

fn callback_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bvoid\s+(Update|FixedUpdate|LateUpdate)\s*\(\s*\)")
            .expect("callback pattern is valid")
    })
}

/// A project directory on disk
pub struct UnityProject {
    root: PathBuf,
    records: Vec<AssetRecord>,
    paths: HashMap<AssetId, PathBuf>,
    metas: HashMap<AssetId, MetaInfo>,
    guid_map: HashMap<String, AssetId>,
    enabled_scenes: Vec<AssetId>,
    sdk_folders: RefCell<HashMap<String, bool>>,
    /// Parsed scenes and prefabs, shared by every pass of a run
    hierarchies: RefCell<HashMap<AssetId, Rc<yaml::Hierarchy>>>,
}

impl UnityProject {
    /// Index the project at `root`: walk the content tree and read every
    /// `.meta` file. Asset contents are read lazily.
    pub fn open(root: &Path) -> Result<Self, ProjectError> {
        let entries = FileFinder::new().find_entries(root)?;
        let stats = FileStats::from_entries(&entries);
        info!(
            "Discovered {} files, {} folders, {} meta files",
            stats.assets, stats.folders, stats.meta_files
        );

        let mut paths = HashMap::new();
        let mut records = Vec::new();
        let mut meta_files = Vec::new();

        for entry in entries {
            match entry.kind {
                EntryKind::Meta => {
                    let owner = entry
                        .relative
                        .strip_suffix(".meta")
                        .unwrap_or(&entry.relative)
                        .to_string();
                    meta_files.push((AssetId::new(owner), entry.path));
                }
                EntryKind::Folder => {
                    records.push(AssetRecord::folder(&entry.relative));
                    paths.insert(AssetId::new(entry.relative), entry.path);
                }
                EntryKind::Asset => {
                    let record = classify(&entry.relative, &entry.path);
                    paths.insert(record.id.clone(), entry.path);
                    records.push(record);
                }
            }
        }

        let metas: HashMap<AssetId, MetaInfo> = meta_files
            .par_iter()
            .filter_map(|(owner, path)| match std::fs::read_to_string(path) {
                Ok(text) => Some((owner.clone(), MetaInfo::parse(&text))),
                Err(e) => {
                    warn!("Skipping unreadable meta file {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        let mut guid_map = HashMap::with_capacity(metas.len());
        for (owner, meta) in &metas {
            if let Some(guid) = &meta.guid {
                if let Some(previous) = guid_map.insert(guid.clone(), owner.clone()) {
                    warn!("Duplicate guid {} on {} and {}", guid, previous, owner);
                }
            }
        }

        let enabled_scenes = read_build_scenes(root)
            .into_iter()
            .filter(|scene| {
                let known = paths.contains_key(scene);
                if !known {
                    debug!("Build scene not found in project: {}", scene);
                }
                known
            })
            .collect();

        debug!("Resolved {} guids", guid_map.len());

        Ok(Self {
            root: root.to_path_buf(),
            records,
            paths,
            metas,
            guid_map,
            enabled_scenes,
            sdk_folders: RefCell::new(HashMap::new()),
            hierarchies: RefCell::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Asset that owns a GUID, if any
    pub fn resolve_guid(&self, guid: &str) -> Option<&AssetId> {
        self.guid_map.get(&guid.to_ascii_lowercase())
    }

    fn path_of(&self, asset: &AssetId) -> Result<&PathBuf, ProjectError> {
        self.paths
            .get(asset)
            .ok_or_else(|| ProjectError::Missing(asset.clone()))
    }

    fn read_text(&self, asset: &AssetId) -> Result<String, ProjectError> {
        let path = self.path_of(asset)?;
        let bytes = std::fs::read(path).map_err(|source| ProjectError::Io {
            path: path.clone(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }

    /// Text of a file the editor serialized as YAML
    fn read_yaml(&self, asset: &AssetId) -> Result<String, ProjectError> {
        let text = self.read_text(asset)?;
        if !text.starts_with("%YAML") {
            return Err(ProjectError::Parse {
                path: self.root.join(asset.as_str()),
                message: "not a text-serialized file".to_string(),
            });
        }
        Ok(text)
    }

    /// Object tree of a scene or prefab, parsed on first request
    fn hierarchy(&self, container: &AssetId) -> Result<Rc<yaml::Hierarchy>, ProjectError> {
        if let Some(cached) = self.hierarchies.borrow().get(container) {
            return Ok(Rc::clone(cached));
        }

        let hierarchy = Rc::new(yaml::parse_hierarchy(&self.read_yaml(container)?));
        trace!("Parsed {} objects from {}", hierarchy.objects.len(), container);
        self.hierarchies
            .borrow_mut()
            .insert(container.clone(), Rc::clone(&hierarchy));
        Ok(hierarchy)
    }

    fn compute_sdk_folder(&self, folder: &str) -> bool {
        let prefix = format!("{}/", folder);

        let has_marker_file = self.records.iter().any(|record| {
            record.kind != AssetKind::Folder
                && record.id.as_str().starts_with(&prefix)
                && {
                    let name = record.id.file_name().to_ascii_lowercase();
                    SDK_MARKER_FILES.iter().any(|marker| name.ends_with(marker))
                }
        });
        if has_marker_file {
            return true;
        }

        self.records.iter().any(|record| {
            record.kind == AssetKind::Folder
                && record.id.directory() == folder
                && {
                    let name = record.id.file_name().to_ascii_lowercase();
                    SDK_MARKER_FOLDERS.iter().any(|marker| name.ends_with(marker))
                }
        })
    }
}

/// Kind from the extension, refined by content for `.asset` files
fn classify(relative: &str, path: &Path) -> AssetRecord {
    let record = AssetRecord::from_path(relative);
    if record.kind != AssetKind::ScriptableObject {
        return record;
    }

    // Only MonoBehaviour-backed .asset files are scriptable objects
    let is_scriptable = std::fs::read(path)
        .ok()
        .map(|bytes| {
            let head = &bytes[..bytes.len().min(4096)];
            yaml::first_class_id(&String::from_utf8_lossy(head)) == Some(yaml::CLASS_MONO_BEHAVIOUR)
        })
        .unwrap_or(false);

    if is_scriptable {
        record
    } else {
        trace!("{} is a native asset", relative);
        AssetRecord::new(record.id, AssetKind::Other)
    }
}

/// Enabled entries of the build scene list, missing file means none
fn read_build_scenes(root: &Path) -> Vec<AssetId> {
    let path = root.join(BUILD_SETTINGS);
    let Ok(text) = std::fs::read_to_string(&path) else {
        debug!("No build settings at {}", path.display());
        return Vec::new();
    };

    let mut scenes = Vec::new();
    let mut enabled = false;
    for line in text.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("- enabled:") {
            enabled = value.trim() == "1";
        } else if let Some(value) = line.strip_prefix("path:") {
            let value = value.trim();
            if enabled && !value.is_empty() {
                scenes.push(AssetId::new(value));
            }
        }
    }

    info!("Build settings list {} enabled scenes", scenes.len());
    scenes
}

impl ProjectSource for UnityProject {
    fn list_all_assets(&self) -> Result<Vec<AssetRecord>, ProjectError> {
        Ok(self.records.clone())
    }

    fn list_enabled_scenes(&self) -> Vec<AssetId> {
        self.enabled_scenes.clone()
    }

    fn list_prefabs(&self) -> Vec<AssetId> {
        self.records
            .iter()
            .filter(|r| r.kind == AssetKind::Prefab)
            .map(|r| r.id.clone())
            .collect()
    }

    fn get_dependencies(&self, asset: &AssetId) -> Result<Vec<AssetId>, ProjectError> {
        self.path_of(asset)?;

        let mut guids: Vec<String> = Vec::new();
        if YAML_EXTENSIONS.contains(&asset.extension().as_str()) {
            let text = self.read_text(asset)?;
            guids.extend(meta::guid_references(&text));
        }
        if let Some(meta) = self.metas.get(asset) {
            guids.extend(meta.references.iter().cloned());
        }

        let dependencies: BTreeSet<AssetId> = guids
            .iter()
            .filter_map(|guid| self.guid_map.get(guid))
            .filter(|id| *id != asset)
            .cloned()
            .collect();

        Ok(dependencies.into_iter().collect())
    }

    fn source_files(&self) -> Vec<AssetId> {
        self.records
            .iter()
            .filter(|r| r.extension == "cs")
            .map(|r| r.id.clone())
            .collect()
    }

    fn read_source(&self, file: &AssetId) -> Result<String, ProjectError> {
        self.read_text(file)
    }

    fn load_image(&self, asset: &AssetId) -> Result<DynamicImage, ProjectError> {
        let path = self.path_of(asset)?;
        image::open(path).map_err(|e| ProjectError::Decode {
            asset: asset.clone(),
            message: e.to_string(),
        })
    }

    fn texture_info(&self, asset: &AssetId) -> Result<TextureInfo, ProjectError> {
        let path = self.path_of(asset)?;
        let (width, height) = image::image_dimensions(path).map_err(|e| ProjectError::Decode {
            asset: asset.clone(),
            message: e.to_string(),
        })?;

        let meta = self.metas.get(asset);
        let compression = meta
            .and_then(|m| m.texture_compression)
            .map(TextureCompression::from_importer_value)
            .unwrap_or_default();
        let mipmaps = meta.and_then(|m| m.mipmaps).unwrap_or(true);

        Ok(TextureInfo {
            width,
            height,
            compression,
            mipmaps,
        })
    }

    fn scene_objects(&self, container: &AssetId) -> Result<Vec<SceneObject>, ProjectError> {
        Ok(self.hierarchy(container)?.objects.clone())
    }

    fn scene_stats(&self, scene: &AssetId) -> Result<SceneStats, ProjectError> {
        Ok(self.hierarchy(scene)?.stats)
    }

    fn material_info(&self, material: &AssetId) -> Result<MaterialInfo, ProjectError> {
        let text = self.read_yaml(material)?;
        Ok(MaterialInfo {
            has_main_texture: yaml::main_texture_assigned(&text),
        })
    }

    fn script_capabilities(&self) -> Vec<ScriptCapabilities> {
        self.source_files()
            .into_iter()
            .filter_map(|script| {
                let text = match self.read_text(&script) {
                    Ok(text) => text,
                    Err(e) => {
                        debug!("Skipping capabilities of {}: {}", script, e);
                        return None;
                    }
                };

                let mut callbacks: Vec<FrameCallback> = callback_regex()
                    .captures_iter(&text)
                    .filter_map(|cap| {
                        FrameCallback::ALL
                            .iter()
                            .copied()
                            .find(|c| c.method_name() == &cap[1])
                    })
                    .collect();
                callbacks.sort();
                callbacks.dedup();

                let uses_raycast = text.contains("RaycastHit") || text.contains("Physics.Raycast");

                Some(ScriptCapabilities {
                    script,
                    callbacks,
                    uses_raycast,
                })
            })
            .collect()
    }

    fn is_possible_sdk_folder(&self, folder: &str) -> bool {
        if folder.is_empty() {
            return false;
        }
        if let Some(&cached) = self.sdk_folders.borrow().get(folder) {
            return cached;
        }
        let result = self.compute_sdk_folder(folder);
        if result {
            debug!("{} looks like a third-party package", folder);
        }
        self.sdk_folders
            .borrow_mut()
            .insert(folder.to_string(), result);
        result
    }
}
