use crate::analysis::PassKind;
use crate::project::AssetId;
use crate::report::ReportFormat;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for an audit run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Passes to run, all of them when empty
    pub passes: Vec<PassKind>,

    /// Patterns of assets never reported
    pub exclude: Vec<String>,

    /// Patterns of assets always treated as used
    pub retain_patterns: Vec<String>,

    pub resources: ResourcesConfig,

    pub exclusions: ExclusionConfig,

    pub thresholds: Thresholds,

    pub textures: TextureConfig,

    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// Directories whose content is loaded by path at runtime
    pub prefixes: Vec<String>,
}

/// Built-in rules removing non-content files from the unused report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionConfig {
    /// Path prefixes never considered
    pub ignored_prefixes: Vec<String>,

    /// Extensions (with the dot) never considered
    pub ignored_extensions: Vec<String>,

    /// Fragments that exclude any path containing them
    pub ignored_fragments: Vec<String>,

    /// Suffixes that exclude any path ending with them
    pub ignored_suffixes: Vec<String>,

    /// Directory fragments, matched against the asset's folder
    pub skipped_directories: Vec<String>,

    /// Skip folders that look like a bundled third-party SDK
    pub sdk_heuristic: bool,
}

/// Numeric limits of the metadata checks
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub scene_object_count: u32,
    pub realtime_shadow_lights: u32,
    pub materials_per_renderer: u32,
    pub texture_oversized: u32,
    pub texture_large: u32,
    /// Uncompressed textures wider than this should have mipmaps
    pub texture_mipmap_min: u32,
    /// Uncompressed textures narrower than this should not have mipmaps
    pub texture_mipmap_max_small: u32,
}

/// Which textures the texture pass looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TextureScope {
    #[default]
    All,
    Used,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub scope: TextureScope,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json
    pub format: ReportFormat,

    /// Print a line for passes that found nothing
    pub show_success: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            passes: vec![],
            exclude: vec![],
            retain_patterns: vec![],
            resources: ResourcesConfig::default(),
            exclusions: ExclusionConfig::default(),
            thresholds: Thresholds::default(),
            textures: TextureConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            prefixes: vec!["Assets/Resources/".to_string()],
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            ignored_prefixes: strings(&[
                "ProjectSettings/",
                "Packages/",
                "Library/",
                "Assets/Editor/",
                "Assets/Plugins/",
                "Assets/Samples/",
            ]),
            ignored_extensions: strings(&[
                ".cs", ".dll", ".unity", ".pdb", ".asmdef", ".swift", ".h", ".bundle", ".bzl",
                ".md", ".m", ".mm", ".so", ".aar",
            ]),
            ignored_fragments: strings(&[
                ".srcaar",
                "m2repository",
                "/GooglePlay/",
                "GooglePlayServices",
                "google-play-",
            ]),
            ignored_suffixes: strings(&["Dependencies.xml"]),
            skipped_directories: strings(&[
                "/Library/",
                "/m2repository/",
                "/Samples/",
                "/Temp/",
                "/Obj/",
            ]),
            sdk_heuristic: true,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            scene_object_count: 1000,
            realtime_shadow_lights: 10,
            materials_per_renderer: 1,
            texture_oversized: 4096,
            texture_large: 2048,
            texture_mipmap_min: 512,
            texture_mipmap_max_small: 128,
        }
    }
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            scope: TextureScope::All,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Terminal,
            show_success: true,
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".assetaudit.yml",
            ".assetaudit.yaml",
            ".assetaudit.toml",
            "assetaudit.yml",
            "assetaudit.yaml",
            "assetaudit.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    /// Passes to run, in execution order
    pub fn selected_passes(&self) -> Vec<PassKind> {
        PassKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.passes.is_empty() || self.passes.contains(kind))
            .collect()
    }

    /// Whether a user pattern makes this asset a root
    pub fn should_retain(&self, asset: &AssetId) -> bool {
        self.retain_patterns
            .iter()
            .any(|pattern| glob_match(pattern, asset.as_str()))
    }
}

/// Glob matching over `/`-separated paths.
///
/// `**` spans directories, `*` stays within one segment and `?` matches a
/// single character. A pattern without `/` is matched against the file name
/// only, so `*.psd` matches `Assets/Art/a.psd`.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('/') {
        let file_name = text.rsplit('/').next().unwrap_or(text);
        return wildcard(pattern.as_bytes(), file_name.as_bytes());
    }

    // "**/build/**" matches a complete directory name anywhere
    if let Some(dir) = pattern
        .strip_prefix("**/")
        .and_then(|rest| rest.strip_suffix("/**"))
    {
        if !dir.contains('*') && !dir.contains('?') {
            return text.starts_with(&format!("{}/", dir))
                || text.contains(&format!("/{}/", dir));
        }
    }

    wildcard(pattern.as_bytes(), text.as_bytes())
}

fn wildcard(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some(b'*') if pattern.get(1) == Some(&b'*') => {
            let rest = &pattern[2..];
            // "**/" also matches zero directories
            if rest.first() == Some(&b'/') && wildcard(&rest[1..], text) {
                return true;
            }
            (0..=text.len()).any(|i| wildcard(rest, &text[i..]))
        }
        Some(b'*') => {
            let rest = &pattern[1..];
            for i in 0..=text.len() {
                if wildcard(rest, &text[i..]) {
                    return true;
                }
                if i < text.len() && text[i] == b'/' {
                    break;
                }
            }
            false
        }
        Some(b'?') => !text.is_empty() && text[0] != b'/' && wildcard(&pattern[1..], &text[1..]),
        Some(&c) => text.first() == Some(&c) && wildcard(&pattern[1..], &text[1..]),
    }
}
