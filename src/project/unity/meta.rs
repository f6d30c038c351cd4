//! `.meta` importer sidecars: the asset's GUID plus the few importer
//! settings the texture checks read.

use regex::Regex;
use std::sync::OnceLock;

fn own_guid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^guid:\s*([0-9a-fA-F]{32})\s*$").expect("guid pattern is valid")
    })
}

fn guid_reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"guid:\s*([0-9a-fA-F]{32})").expect("guid pattern is valid"))
}

fn importer_setting_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s+(textureCompression|enableMipMap):\s*(\d+)\s*$")
            .expect("importer setting pattern is valid")
    })
}

/// Every GUID referenced anywhere in a text-serialized file, lowercased
pub fn guid_references(text: &str) -> Vec<String> {
    guid_reference_regex()
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect()
}

/// Parsed contents of one `.meta` file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaInfo {
    pub guid: Option<String>,
    /// GUIDs the importer settings point at (external materials, atlases)
    pub references: Vec<String>,
    pub texture_compression: Option<u32>,
    pub mipmaps: Option<bool>,
}

impl MetaInfo {
    pub fn parse(text: &str) -> Self {
        let guid = own_guid_regex()
            .captures(text)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_ascii_lowercase());

        let references = guid_references(text)
            .into_iter()
            .filter(|g| Some(g) != guid.as_ref())
            .collect();

        let mut info = Self {
            guid,
            references,
            ..Self::default()
        };

        // The first occurrence wins; platform overrides come later in the file
        for cap in importer_setting_regex().captures_iter(text) {
            let value: u32 = match cap[2].parse() {
                Ok(v) => v,
                Err(_) => continue,
            };
            match &cap[1] {
                "textureCompression" if info.texture_compression.is_none() => {
                    info.texture_compression = Some(value)
                }
                "enableMipMap" if info.mipmaps.is_none() => info.mipmaps = Some(value != 0),
                _ => {}
            }
        }

        info
    }
}
