//! Filesystem project host integration tests
//!
//! These tests build small Unity project trees in a temporary directory and
//! check what the host reads from them.

use assetaudit::analysis::{Orchestrator, PassKind, PassStatus};
use assetaudit::config::Config;
use assetaudit::project::{
    AssetId, AssetKind, FrameCallback, ProjectError, ProjectSource, TextureCompression,
    UnityProject,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SCENE_GUID: &str = "5a1f0000000000000000000000000001";
const MATERIAL_GUID: &str = "5a1f0000000000000000000000000002";
const HERO_GUID: &str = "5a1f0000000000000000000000000003";
const ORPHAN_GUID: &str = "5a1f0000000000000000000000000004";
const ICON_GUID: &str = "5a1f0000000000000000000000000005";
const SCRIPT_GUID: &str = "5a1f0000000000000000000000000006";
const CONFIG_GUID: &str = "5a1f0000000000000000000000000007";

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn write_meta(root: &Path, relative: &str, guid: &str, importer: &str) {
    write(
        root,
        &format!("{}.meta", relative),
        &format!("fileFormatVersion: 2\nguid: {}\n{}", guid, importer),
    );
}

fn write_png(root: &Path, relative: &str, width: u32, height: u32) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    image::RgbImage::from_pixel(width, height, image::Rgb([120, 60, 30]))
        .save(&path)
        .unwrap();
}

fn scene_yaml() -> String {
    format!(
        "%YAML 1.1
%TAG !u! tag:unity3d.com,2011:
--- !u!1 &100
GameObject:
  m_Name: Hero
  m_IsActive: 1
--- !u!4 &101
Transform:
  m_GameObject: {{fileID: 100}}
  m_Father: {{fileID: 0}}
--- !u!23 &102
MeshRenderer:
  m_GameObject: {{fileID: 100}}
  m_DynamicOccludee: 1
  m_ReceiveShadows: 1
  m_Materials:
  - {{fileID: 2100000, guid: {material}, type: 2}}
--- !u!1 &200
GameObject:
  m_Name: PauseMenu
  m_IsActive: 0
--- !u!4 &201
Transform:
  m_GameObject: {{fileID: 200}}
  m_Father: {{fileID: 0}}
--- !u!114 &300
MonoBehaviour:
  m_GameObject: {{fileID: 100}}
  m_Script: {{fileID: 11500000, guid: {script}, type: 3}}
",
        material = MATERIAL_GUID,
        script = SCRIPT_GUID
    )
}

/// A small project: one enabled scene using a material and a texture, an
/// orphan texture, a resources icon loaded from code and one script
fn sample_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(root, "Assets/Scenes/Main.unity", &scene_yaml());
    write_meta(root, "Assets/Scenes/Main.unity", SCENE_GUID, "DefaultImporter:\n");

    write(
        root,
        "Assets/Materials/Hero.mat",
        &format!(
            "%YAML 1.1\n%TAG !u! tag:unity3d.com,2011:\n--- !u!21 &2100000\nMaterial:\n  m_Name: Hero\n  m_SavedProperties:\n    m_TexEnvs:\n    - _MainTex:\n        m_Texture: {{fileID: 2800000, guid: {}, type: 3}}\n",
            HERO_GUID
        ),
    );
    write_meta(root, "Assets/Materials/Hero.mat", MATERIAL_GUID, "NativeFormatImporter:\n");

    write_png(root, "Assets/Textures/hero.png", 64, 32);
    write_meta(
        root,
        "Assets/Textures/hero.png",
        HERO_GUID,
        "TextureImporter:\n  mipmaps:\n    enableMipMap: 0\n  textureCompression: 0\n",
    );

    write_png(root, "Assets/Textures/orphan.png", 16, 16);
    write_meta(root, "Assets/Textures/orphan.png", ORPHAN_GUID, "TextureImporter:\n");

    write_png(root, "Assets/Resources/icons/a.png", 16, 16);
    write_meta(root, "Assets/Resources/icons/a.png", ICON_GUID, "TextureImporter:\n");

    write(
        root,
        "Assets/Scripts/HeroController.cs",
        "using UnityEngine;\n\npublic class HeroController : MonoBehaviour\n{\n    void Start()\n    {\n        var icon = Resources.Load<Sprite>(\"icons/a\");\n    }\n\n    void Update()\n    {\n        var label = \"HP: \" + hp;\n    }\n\n    void FixedUpdate()\n    {\n        RaycastHit hit;\n    }\n}\n",
    );
    write_meta(root, "Assets/Scripts/HeroController.cs", SCRIPT_GUID, "MonoImporter:\n");

    write(
        root,
        "Assets/Data/Balance.asset",
        "%YAML 1.1\n%TAG !u! tag:unity3d.com,2011:\n--- !u!114 &11400000\nMonoBehaviour:\n  m_Name: Balance\n",
    );
    write_meta(root, "Assets/Data/Balance.asset", CONFIG_GUID, "NativeFormatImporter:\n");

    write(
        root,
        "ProjectSettings/EditorBuildSettings.asset",
        "EditorBuildSettings:\n  m_Scenes:\n  - enabled: 1\n    path: Assets/Scenes/Main.unity\n    guid: 5a1f0000000000000000000000000001\n",
    );

    dir
}

fn id(path: &str) -> AssetId {
    AssetId::new(path)
}

// ============================================================================
// Inventory Tests
// ============================================================================

mod inventory_tests {
    use super::*;

    #[test]
    fn test_missing_assets_directory() {
        let dir = TempDir::new().unwrap();
        let result = UnityProject::open(dir.path());
        assert!(matches!(result, Err(ProjectError::NotAProject(_))));
    }

    #[test]
    fn test_lists_files_and_folders_without_meta() {
        let dir = sample_project();
        let project = UnityProject::open(dir.path()).unwrap();
        let assets = project.list_all_assets().unwrap();

        assert!(assets
            .iter()
            .any(|a| a.id == id("Assets/Textures") && a.kind == AssetKind::Folder));
        assert!(assets
            .iter()
            .any(|a| a.id == id("Assets/Textures/hero.png") && a.kind == AssetKind::Texture));
        assert!(!assets.iter().any(|a| a.id.as_str().ends_with(".meta")));
    }

    #[test]
    fn test_scriptable_object_detection() {
        let dir = sample_project();
        write(
            dir.path(),
            "Assets/Settings/Lighting.asset",
            "%YAML 1.1\n%TAG !u! tag:unity3d.com,2011:\n--- !u!850595691 &4890085278179872738\nLightingSettings:\n  m_Name: Lighting\n",
        );
        let project = UnityProject::open(dir.path()).unwrap();
        let assets = project.list_all_assets().unwrap();

        let kind_of = |path: &str| assets.iter().find(|a| a.id == id(path)).map(|a| a.kind);
        assert_eq!(kind_of("Assets/Data/Balance.asset"), Some(AssetKind::ScriptableObject));
        assert_eq!(kind_of("Assets/Settings/Lighting.asset"), Some(AssetKind::Other));
    }

    #[test]
    fn test_enabled_scenes_and_prefabs() {
        let dir = sample_project();
        write(dir.path(), "Assets/Prefabs/Enemy.prefab", "%YAML 1.1\n");
        let project = UnityProject::open(dir.path()).unwrap();

        assert_eq!(project.list_enabled_scenes(), vec![id("Assets/Scenes/Main.unity")]);
        assert_eq!(project.list_prefabs(), vec![id("Assets/Prefabs/Enemy.prefab")]);
    }
}

// ============================================================================
// Dependency Tests
// ============================================================================

mod dependency_tests {
    use super::*;

    #[test]
    fn test_guid_references_resolve() {
        let dir = sample_project();
        let project = UnityProject::open(dir.path()).unwrap();

        assert_eq!(project.resolve_guid(HERO_GUID), Some(&id("Assets/Textures/hero.png")));
        assert_eq!(
            project.get_dependencies(&id("Assets/Scenes/Main.unity")).unwrap(),
            vec![id("Assets/Materials/Hero.mat"), id("Assets/Scripts/HeroController.cs")]
        );
        assert_eq!(
            project.get_dependencies(&id("Assets/Materials/Hero.mat")).unwrap(),
            vec![id("Assets/Textures/hero.png")]
        );
    }

    #[test]
    fn test_binary_assets_have_no_text_references() {
        let dir = sample_project();
        let project = UnityProject::open(dir.path()).unwrap();
        assert!(project
            .get_dependencies(&id("Assets/Textures/hero.png"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unknown_asset_is_an_error() {
        let dir = sample_project();
        let project = UnityProject::open(dir.path()).unwrap();
        assert!(matches!(
            project.get_dependencies(&id("Assets/Nope.mat")),
            Err(ProjectError::Missing(_))
        ));
    }
}

// ============================================================================
// Metadata Tests
// ============================================================================

mod metadata_tests {
    use super::*;

    #[test]
    fn test_texture_info_from_header_and_meta() {
        let dir = sample_project();
        let project = UnityProject::open(dir.path()).unwrap();

        let info = project.texture_info(&id("Assets/Textures/hero.png")).unwrap();
        assert_eq!((info.width, info.height), (64, 32));
        assert_eq!(info.compression, TextureCompression::Uncompressed);
        assert!(!info.mipmaps);

        let info = project.texture_info(&id("Assets/Textures/orphan.png")).unwrap();
        assert_eq!(info.compression, TextureCompression::Compressed);
        assert!(info.mipmaps);
    }

    #[test]
    fn test_corrupt_image_fails_to_decode() {
        let dir = sample_project();
        write(dir.path(), "Assets/Textures/broken.png", "not a png");
        let project = UnityProject::open(dir.path()).unwrap();
        assert!(matches!(
            project.load_image(&id("Assets/Textures/broken.png")),
            Err(ProjectError::Decode { .. })
        ));
    }

    #[test]
    fn test_scene_objects() {
        let dir = sample_project();
        let project = UnityProject::open(dir.path()).unwrap();

        let objects = project.scene_objects(&id("Assets/Scenes/Main.unity")).unwrap();
        assert_eq!(objects.len(), 2);
        let pause = objects.iter().find(|o| o.name == "PauseMenu").unwrap();
        assert!(!pause.active_in_hierarchy);
        let hero = objects.iter().find(|o| o.name == "Hero").unwrap();
        let renderer = hero.renderer.unwrap();
        assert_eq!(renderer.material_slots, 1);
        assert!(renderer.receive_shadows);
        assert!(renderer.dynamic_occludee);
        assert!(pause.renderer.is_none());

        let stats = project.scene_stats(&id("Assets/Scenes/Main.unity")).unwrap();
        assert_eq!(stats.object_count, 1);
        assert_eq!(stats.realtime_shadow_lights, 0);
    }

    #[test]
    fn test_scene_is_parsed_once_per_run() {
        let dir = sample_project();
        let project = UnityProject::open(dir.path()).unwrap();
        let scene = id("Assets/Scenes/Main.unity");

        let stats = project.scene_stats(&scene).unwrap();
        // Later lookups are served from the parsed tree, not the file
        fs::remove_file(dir.path().join("Assets/Scenes/Main.unity")).unwrap();
        assert_eq!(project.scene_stats(&scene).unwrap(), stats);
        assert_eq!(project.scene_objects(&scene).unwrap().len(), 2);
    }

    #[test]
    fn test_material_main_texture() {
        let dir = sample_project();
        write(
            dir.path(),
            "Assets/Materials/Flat.mat",
            "%YAML 1.1\n%TAG !u! tag:unity3d.com,2011:\n--- !u!21 &2100000\nMaterial:\n  m_Name: Flat\n  m_SavedProperties:\n    m_TexEnvs:\n    - _MainTex:\n        m_Texture: {fileID: 0}\n",
        );
        let project = UnityProject::open(dir.path()).unwrap();

        assert!(project
            .material_info(&id("Assets/Materials/Hero.mat"))
            .unwrap()
            .has_main_texture);
        assert!(!project
            .material_info(&id("Assets/Materials/Flat.mat"))
            .unwrap()
            .has_main_texture);
        assert!(matches!(
            project.material_info(&id("Assets/Textures/hero.png")),
            Err(ProjectError::Parse { .. })
        ));
    }

    #[test]
    fn test_script_capabilities() {
        let dir = sample_project();
        let project = UnityProject::open(dir.path()).unwrap();

        let capabilities = project.script_capabilities();
        assert_eq!(capabilities.len(), 1);
        assert_eq!(
            capabilities[0].callbacks,
            vec![FrameCallback::Update, FrameCallback::FixedUpdate]
        );
        assert!(capabilities[0].uses_raycast);
    }

    #[test]
    fn test_sdk_folder_heuristic() {
        let dir = sample_project();
        write(dir.path(), "Assets/VendorSdk/README.md", "# Vendor");
        write(dir.path(), "Assets/VendorSdk/Runtime/logo.png", "");
        fs::create_dir_all(dir.path().join("Assets/OtherKit/Demos")).unwrap();
        let project = UnityProject::open(dir.path()).unwrap();

        assert!(project.is_possible_sdk_folder("Assets/VendorSdk"));
        assert!(project.is_possible_sdk_folder("Assets/OtherKit"));
        assert!(!project.is_possible_sdk_folder("Assets/Textures"));
    }
}

// ============================================================================
// End to End Tests
// ============================================================================

mod end_to_end_tests {
    use super::*;

    #[test]
    fn test_unused_assets_on_disk() {
        let dir = sample_project();
        let project = UnityProject::open(dir.path()).unwrap();

        let config = Config {
            passes: vec![PassKind::UnusedAssets, PassKind::Resources],
            ..Config::default()
        };
        let report = Orchestrator::from_config(&config)
            .run(&project, |_, _, _| {})
            .unwrap();

        assert_eq!(report.flagged, vec![id("Assets/Textures/orphan.png")]);
        assert_eq!(
            report.outcome(PassKind::Resources).unwrap().status,
            PassStatus::Passed
        );
    }
}
