//! Just enough of the engine's text serialization to rebuild object
//! hierarchies. Each object is a YAML document introduced by
//! `--- !u!<class> &<fileID>`; fields of interest sit two spaces deep.

use crate::project::{RendererInfo, SceneObject, SceneStats};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

pub const CLASS_GAME_OBJECT: u32 = 1;
pub const CLASS_TRANSFORM: u32 = 4;
pub const CLASS_MATERIAL: u32 = 21;
pub const CLASS_LIGHT: u32 = 108;
pub const CLASS_MONO_BEHAVIOUR: u32 = 114;
pub const CLASS_RECT_TRANSFORM: u32 = 224;

/// Renderer classes that carry a material list
const RENDERER_CLASSES: &[u32] = &[
    23,  // MeshRenderer
    96,  // TrailRenderer
    120, // LineRenderer
    137, // SkinnedMeshRenderer
    199, // ParticleSystemRenderer
    212, // SpriteRenderer
];

/// `m_Lightmapping` value of a realtime light
const LIGHTMAP_REALTIME: u32 = 4;

/// Texture properties the editor treats as a material's main texture
const MAIN_TEXTURE_PROPERTIES: &[&str] = &["_MainTex", "_BaseMap"];

fn file_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"fileID:\s*(-?\d+)").expect("fileID pattern is valid"))
}

/// One serialized object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document<'a> {
    pub class_id: u32,
    pub file_id: i64,
    /// Placeholder for an object owned by a nested prefab
    pub stripped: bool,
    pub body: &'a str,
}

impl<'a> Document<'a> {
    /// Value of a top-level field, `  key: value`
    pub fn field(&self, key: &str) -> Option<&'a str> {
        self.body.lines().find_map(|line| top_level_value(line, key))
    }

    /// First `fileID` of a top-level reference field
    pub fn reference(&self, key: &str) -> Option<i64> {
        let value = self.field(key)?;
        file_id_regex()
            .captures(value)
            .and_then(|cap| cap[1].parse().ok())
    }

    /// Value of `key` nested one level under the top-level `parent` field
    pub fn nested_field(&self, parent: &str, key: &str) -> Option<&'a str> {
        let mut lines = self.body.lines();
        lines.find(|line| top_level_value(line, parent).is_some())?;
        lines
            .take_while(|line| line.starts_with("    ") || line.trim().is_empty())
            .find_map(|line| {
                let rest = line.trim_start().strip_prefix(key)?;
                rest.strip_prefix(':').map(str::trim)
            })
    }

    /// Number of entries of a top-level sequence field
    pub fn sequence_len(&self, key: &str) -> usize {
        let mut lines = self.body.lines();
        let Some(header) = lines.find(|line| top_level_value(line, key).is_some()) else {
            return 0;
        };
        if header.trim_end().ends_with("[]") {
            return 0;
        }
        lines.take_while(|line| line.starts_with("  - ")).count()
    }
}

fn top_level_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.strip_prefix("  ")?;
    if rest.starts_with(' ') {
        return None;
    }
    rest.strip_prefix(key)?.strip_prefix(':').map(str::trim)
}

/// Split a serialized file into its object documents
pub fn documents(text: &str) -> Vec<Document<'_>> {
    let mut docs = Vec::new();
    let mut current: Option<(u32, i64, bool, usize)> = None;
    let mut offset = 0usize;

    for line in text.split_inclusive('\n') {
        if let Some(header) = line.strip_prefix("--- !u!") {
            if let Some((class_id, file_id, stripped, start)) = current.take() {
                docs.push(Document {
                    class_id,
                    file_id,
                    stripped,
                    body: &text[start..offset],
                });
            }
            current = parse_header(header).map(|(c, f, s)| (c, f, s, offset + line.len()));
        }
        offset += line.len();
    }

    if let Some((class_id, file_id, stripped, start)) = current {
        docs.push(Document {
            class_id,
            file_id,
            stripped,
            body: &text[start..],
        });
    }

    docs
}

fn parse_header(header: &str) -> Option<(u32, i64, bool)> {
    let mut parts = header.split_whitespace();
    let class_id = parts.next()?.parse().ok()?;
    let file_id = parts.next()?.strip_prefix('&')?.parse().ok()?;
    let stripped = parts.any(|p| p == "stripped");
    Some((class_id, file_id, stripped))
}

/// Class id of the first object in the file
pub fn first_class_id(text: &str) -> Option<u32> {
    text.lines()
        .find_map(|line| line.strip_prefix("--- !u!"))
        .and_then(parse_header)
        .map(|(class_id, _, _)| class_id)
}

/// Object hierarchy of a scene or prefab
#[derive(Debug, Default)]
pub struct Hierarchy {
    pub objects: Vec<SceneObject>,
    pub stats: SceneStats,
}

struct GameObjectEntry {
    name: String,
    active: bool,
}

/// Rebuild the object tree from the serialized documents.
///
/// Objects owned by nested prefab instances are not serialized in the
/// containing file and therefore do not appear.
pub fn parse_hierarchy(text: &str) -> Hierarchy {
    let docs = documents(text);

    let mut game_objects: HashMap<i64, GameObjectEntry> = HashMap::new();
    // transform fileID -> (owning GameObject, parent transform)
    let mut transforms: HashMap<i64, (i64, i64)> = HashMap::new();
    let mut transform_of: HashMap<i64, i64> = HashMap::new();
    let mut renderers: HashMap<i64, RendererInfo> = HashMap::new();
    let mut lights: Vec<i64> = Vec::new();

    for doc in docs.iter().filter(|d| !d.stripped) {
        match doc.class_id {
            CLASS_GAME_OBJECT => {
                let name = doc.field("m_Name").unwrap_or_default().to_string();
                let active = doc.field("m_IsActive") != Some("0");
                game_objects.insert(doc.file_id, GameObjectEntry { name, active });
            }
            CLASS_TRANSFORM | CLASS_RECT_TRANSFORM => {
                let owner = doc.reference("m_GameObject").unwrap_or(0);
                let father = doc.reference("m_Father").unwrap_or(0);
                transforms.insert(doc.file_id, (owner, father));
                transform_of.insert(owner, doc.file_id);
            }
            CLASS_LIGHT => {
                let shadows = doc.nested_field("m_Shadows", "m_Type").unwrap_or("0");
                let bake = doc
                    .field("m_Lightmapping")
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(LIGHTMAP_REALTIME);
                if shadows != "0" && bake == LIGHTMAP_REALTIME {
                    lights.push(doc.reference("m_GameObject").unwrap_or(0));
                }
            }
            class if RENDERER_CLASSES.contains(&class) => {
                if let Some(owner) = doc.reference("m_GameObject") {
                    let renderer = RendererInfo {
                        material_slots: doc.sequence_len("m_Materials"),
                        receive_shadows: doc.field("m_ReceiveShadows") == Some("1"),
                        dynamic_occludee: doc.field("m_DynamicOccludee") != Some("0"),
                    };
                    // One renderer per object; keep the widest if a file has more
                    renderers
                        .entry(owner)
                        .and_modify(|r| {
                            if renderer.material_slots > r.material_slots {
                                *r = renderer;
                            }
                        })
                        .or_insert(renderer);
                }
            }
            _ => {}
        }
    }

    // Walk up the transform chain, nearest parent first
    let ancestors_of = |go_id: i64| -> Vec<i64> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = transform_of.get(&go_id).copied();
        while let Some(transform) = current {
            if !seen.insert(transform) {
                break;
            }
            let Some(&(_, father)) = transforms.get(&transform) else {
                break;
            };
            if father == 0 {
                break;
            }
            if let Some(&(parent_go, _)) = transforms.get(&father) {
                chain.push(parent_go);
            }
            current = Some(father);
        }
        chain
    };

    let is_active_in_hierarchy = |go_id: i64| -> bool {
        let self_active = game_objects.get(&go_id).map(|g| g.active).unwrap_or(true);
        self_active
            && ancestors_of(go_id)
                .iter()
                .all(|id| game_objects.get(id).map(|g| g.active).unwrap_or(true))
    };

    let mut ids: Vec<i64> = game_objects.keys().copied().collect();
    ids.sort_unstable();

    let objects = ids
        .iter()
        .map(|&id| {
            let entry = &game_objects[&id];
            let ancestors = ancestors_of(id)
                .iter()
                .filter_map(|a| game_objects.get(a).map(|g| g.name.clone()))
                .collect();
            SceneObject {
                name: entry.name.clone(),
                ancestors,
                active_self: entry.active,
                active_in_hierarchy: is_active_in_hierarchy(id),
                renderer: renderers.get(&id).copied(),
            }
        })
        .collect();

    // Disabled objects are invisible to the engine's object queries
    let object_count = transforms
        .values()
        .filter(|(owner, _)| is_active_in_hierarchy(*owner))
        .count();
    let realtime_shadow_lights = lights
        .iter()
        .filter(|owner| is_active_in_hierarchy(**owner))
        .count();

    Hierarchy {
        objects,
        stats: SceneStats {
            object_count,
            realtime_shadow_lights,
        },
    }
}

/// Whether the first material in the file has a texture in its main slot.
///
/// An absent slot counts as unassigned.
pub fn main_texture_assigned(text: &str) -> bool {
    let Some(material) = documents(text)
        .into_iter()
        .find(|d| d.class_id == CLASS_MATERIAL)
    else {
        return false;
    };

    let lines: Vec<&str> = material.body.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        let Some(property) = line.trim_start().strip_prefix("- ") else {
            continue;
        };
        let property = property.trim_end().trim_end_matches(':');
        if !MAIN_TEXTURE_PROPERTIES.contains(&property) {
            continue;
        }

        let texture = lines[i + 1..]
            .iter()
            .take_while(|l| !l.trim_start().starts_with("- "))
            .find_map(|l| l.trim_start().strip_prefix("m_Texture:"));
        let assigned = texture
            .and_then(|value| file_id_regex().captures(value))
            .and_then(|cap| cap[1].parse::<i64>().ok())
            .map(|file_id| file_id != 0)
            .unwrap_or(false);
        if assigned {
            return true;
        }
    }

    false
}
