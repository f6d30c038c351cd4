//! Audit pass integration tests
//!
//! Each test runs the orchestrator with a single pass against an in-memory
//! project and checks the findings it produces.

use assetaudit::analysis::{Orchestrator, PassKind, PassStatus, RunReport, Severity};
use assetaudit::config::{Config, TextureScope};
use assetaudit::project::{
    AssetId, FrameCallback, MaterialInfo, MemoryProject, RendererInfo, SceneObject, SceneStats,
    ScriptCapabilities, TextureCompression, TextureInfo,
};
use image::{DynamicImage, Rgb, RgbImage};

/// Run one pass and return its report
fn run_pass(project: &MemoryProject, config: Config, kind: PassKind) -> RunReport {
    let config = Config {
        passes: vec![kind],
        ..config
    };
    let audit = Orchestrator::from_config(&config)
        .run(project, |_, _, _| {})
        .expect("project has assets");
    audit
        .outcome(kind)
        .and_then(|o| o.report.clone())
        .expect("pass ran to completion")
}

fn messages(report: &RunReport) -> Vec<String> {
    report.findings.iter().map(|f| f.message.clone()).collect()
}

fn solid(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value, value, value])))
}

fn texture(width: u32, height: u32) -> TextureInfo {
    TextureInfo {
        width,
        height,
        compression: TextureCompression::Compressed,
        mipmaps: true,
    }
}

fn id(path: &str) -> AssetId {
    AssetId::new(path)
}

// ============================================================================
// Texture Pass Tests
// ============================================================================

mod texture_tests {
    use super::*;

    #[test]
    fn test_metadata_checks() {
        let project = MemoryProject::new()
            .with_asset("Assets/Textures/huge.png")
            .with_asset("Assets/Textures/big.png")
            .with_asset("Assets/Textures/raw.png")
            .with_asset("Assets/Textures/banner.png")
            .with_texture_info("Assets/Textures/huge.png", texture(8192, 8192))
            .with_texture_info("Assets/Textures/big.png", texture(4096, 4096))
            .with_texture_info(
                "Assets/Textures/raw.png",
                TextureInfo {
                    width: 1024,
                    height: 1024,
                    compression: TextureCompression::Uncompressed,
                    mipmaps: false,
                },
            )
            .with_texture_info("Assets/Textures/banner.png", texture(1024, 256));

        let report = run_pass(&project, Config::default(), PassKind::Textures);
        let messages = messages(&report);

        assert!(messages.iter().any(|m| m.starts_with("Oversized texture (8192x8192)")));
        assert!(messages.contains(&"Large texture (4096x4096)".to_string()));
        assert!(messages.contains(&"Texture is uncompressed".to_string()));
        assert!(messages
            .iter()
            .any(|m| m.starts_with("Uncompressed texture wider than 512")));
        assert!(messages.iter().any(|m| m.starts_with("Non-square texture (1024x256)")));
        assert!(report.problems_found);
    }

    #[test]
    fn test_large_texture_is_only_info() {
        let project = MemoryProject::new()
            .with_asset("Assets/Textures/big.png")
            .with_texture_info("Assets/Textures/big.png", texture(4096, 4096));

        let report = run_pass(&project, Config::default(), PassKind::Textures);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity, Severity::Info);
        assert!(!report.problems_found);
    }

    #[test]
    fn test_similar_textures_are_flagged() {
        let project = MemoryProject::new()
            .with_asset("Assets/Textures/a.png")
            .with_asset("Assets/Textures/a_copy.png")
            .with_asset("Assets/Textures/dark.png")
            .with_image("Assets/Textures/a.png", solid(64, 64, 200))
            .with_image("Assets/Textures/a_copy.png", solid(32, 32, 205))
            .with_image("Assets/Textures/dark.png", solid(64, 64, 10));

        let report = run_pass(&project, Config::default(), PassKind::Textures);

        let similar: Vec<_> = report
            .findings
            .iter()
            .filter(|f| f.message.starts_with("Might be similar to"))
            .collect();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].asset, Some(id("Assets/Textures/a.png")));
        assert_eq!(similar[0].message, "Might be similar to Assets/Textures/a_copy.png");
        assert_eq!(
            report.flagged,
            vec![id("Assets/Textures/a.png"), id("Assets/Textures/a_copy.png")]
        );
    }

    #[test]
    fn test_undecodable_texture_is_not_compared() {
        // a.png has no image, so it can never be reported as a duplicate
        let project = MemoryProject::new()
            .with_asset("Assets/Textures/a.png")
            .with_asset("Assets/Textures/b.png")
            .with_image("Assets/Textures/b.png", solid(8, 8, 0));

        let report = run_pass(&project, Config::default(), PassKind::Textures);
        assert!(report.findings.is_empty());
        assert!(report.flagged.is_empty());
    }

    #[test]
    fn test_used_scope_skips_isolated_textures() {
        let project = MemoryProject::new()
            .with_asset("Assets/Materials/a.mat")
            .with_asset("Assets/Textures/used.png")
            .with_asset("Assets/Textures/isolated.png")
            .with_dependency("Assets/Materials/a.mat", "Assets/Textures/used.png")
            .with_texture_info("Assets/Textures/used.png", texture(1024, 128))
            .with_texture_info("Assets/Textures/isolated.png", texture(1024, 128));

        let mut config = Config::default();
        config.textures.scope = TextureScope::Used;
        let report = run_pass(&project, config, PassKind::Textures);

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].asset, Some(id("Assets/Textures/used.png")));
    }
}

// ============================================================================
// Unused And Resources Pass Tests
// ============================================================================

mod unused_tests {
    use super::*;

    fn project() -> MemoryProject {
        MemoryProject::new()
            .with_scene("Assets/Scenes/Main.unity", true)
            .with_asset("Assets/Textures/used.png")
            .with_asset("Assets/Textures/orphan.png")
            .with_asset("Assets/Resources/icons/a.png")
            .with_asset("Assets/Resources/icons/b.png")
            .with_dependency("Assets/Scenes/Main.unity", "Assets/Textures/used.png")
            .with_source("Assets/Scripts/Icons.cs", r#"Resources.Load("icons/a")"#)
    }

    #[test]
    fn test_unused_assets_pass() {
        let report = run_pass(&project(), Config::default(), PassKind::UnusedAssets);
        assert_eq!(
            report.flagged,
            vec![id("Assets/Resources/icons/b.png"), id("Assets/Textures/orphan.png")]
        );
        assert_eq!(
            messages(&report),
            vec!["Potentially unused texture", "Potentially unused texture"]
        );
    }

    #[test]
    fn test_resources_pass_only_reports_resources() {
        let report = run_pass(&project(), Config::default(), PassKind::Resources);
        assert_eq!(report.flagged, vec![id("Assets/Resources/icons/b.png")]);
        assert_eq!(
            report.findings[0].message,
            "Resources asset is neither loaded from code nor referenced"
        );
    }

    #[test]
    fn test_clean_project_passes() {
        let project = MemoryProject::new()
            .with_scene("Assets/Scenes/Main.unity", true)
            .with_asset("Assets/Textures/used.png")
            .with_dependency("Assets/Scenes/Main.unity", "Assets/Textures/used.png");

        let config = Config {
            passes: vec![PassKind::UnusedAssets, PassKind::Resources],
            ..Config::default()
        };
        let audit = Orchestrator::from_config(&config)
            .run(&project, |_, _, _| {})
            .unwrap();
        assert!(audit.passes.iter().all(|p| p.status == PassStatus::Passed));
        assert!(audit.is_clean());
    }
}

// ============================================================================
// Inactive Object Pass Tests
// ============================================================================

mod inactive_object_tests {
    use super::*;

    fn child_of_inactive(name: &str, parent: &str) -> SceneObject {
        let mut object = SceneObject::new(name).with_ancestors(vec![parent.to_string()]);
        object.active_in_hierarchy = false;
        object
    }

    #[test]
    fn test_scene_objects() {
        let project = MemoryProject::new()
            .with_scene("Assets/Scenes/Main.unity", true)
            .with_objects(
                "Assets/Scenes/Main.unity",
                vec![
                    SceneObject::new("Player"),
                    SceneObject::new("PauseMenu").inactive(),
                    SceneObject::new("Credits").inactive(),
                    child_of_inactive("ResumeButton", "PauseMenu"),
                    child_of_inactive("CreditsText", "Credits"),
                ],
            )
            .with_source(
                "Assets/Scripts/Menu.cs",
                "void OnPause() { pauseMenu.SetActive(true); PauseMenu.SetActive(true); }",
            );

        let report = run_pass(&project, Config::default(), PassKind::InactiveObjects);
        assert_eq!(
            messages(&report),
            vec![
                "Inactive object 'Credits' is never activated in code",
                "Inactive object 'CreditsText' is never activated in code",
            ]
        );
        assert!(report
            .findings
            .iter()
            .all(|f| f.asset == Some(id("Assets/Scenes/Main.unity"))));
        assert!(report.flagged.is_empty());
    }

    #[test]
    fn test_prefab_objects_check_own_name_only() {
        let project = MemoryProject::new()
            .with_asset("Assets/Prefabs/Shop.prefab")
            .with_objects(
                "Assets/Prefabs/Shop.prefab",
                vec![
                    SceneObject::new("Shop").inactive(),
                    child_of_inactive("BuyButton", "Shop"),
                ],
            )
            .with_source("Assets/Scripts/Shop.cs", "Shop.SetActive(true);");

        let report = run_pass(&project, Config::default(), PassKind::InactiveObjects);
        assert_eq!(
            messages(&report),
            vec!["Inactive object 'BuyButton' is never activated in code"]
        );
    }

    #[test]
    fn test_disabled_scene_and_unreadable_container_are_skipped() {
        let project = MemoryProject::new()
            .with_scene("Assets/Scenes/Test.unity", false)
            .with_scene("Assets/Scenes/Main.unity", true)
            .with_objects(
                "Assets/Scenes/Test.unity",
                vec![SceneObject::new("Debug").inactive()],
            );

        let report = run_pass(&project, Config::default(), PassKind::InactiveObjects);
        assert!(report.findings.is_empty());
        assert!(!report.problems_found);
    }
}

// ============================================================================
// Script Pass Tests
// ============================================================================

mod script_tests {
    use super::*;

    #[test]
    fn test_callback_census() {
        let project = MemoryProject::new()
            .with_asset("Assets/Scripts/A.cs")
            .with_capabilities(ScriptCapabilities {
                script: id("Assets/Scripts/A.cs"),
                callbacks: vec![FrameCallback::Update, FrameCallback::LateUpdate],
                uses_raycast: true,
            })
            .with_capabilities(ScriptCapabilities {
                script: id("Assets/Scripts/B.cs"),
                callbacks: vec![FrameCallback::Update],
                uses_raycast: false,
            });

        let report = run_pass(&project, Config::default(), PassKind::Scripts);
        assert_eq!(
            messages(&report),
            vec![
                "Number of scripts using Update: 2",
                "Number of scripts using FixedUpdate: 0",
                "Number of scripts using LateUpdate: 1",
                "Number of scripts potentially using raycasts: 1",
            ]
        );
        assert!(!report.problems_found);
    }

    #[test]
    fn test_update_allocations() {
        let source = "using System.Linq;\nusing UnityEngine;\n\npublic class Hud : MonoBehaviour\n{\n    void Update()\n    {\n        label.text = \"Score: \" + score;\n        var alive = enemies.Where(IsAlive);\n    }\n}\n";
        let project = MemoryProject::new()
            .with_asset("Assets/Scripts/Hud.cs")
            .with_source("Assets/Scripts/Hud.cs", source);

        let report = run_pass(&project, Config::default(), PassKind::Scripts);
        let warnings: Vec<_> = report
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .collect();

        assert_eq!(warnings.len(), 2);
        assert_eq!(
            warnings[0].message,
            "Potential string concatenation detected in Update method"
        );
        assert_eq!(warnings[1].message, "Potential LINQ usage detected in Update method");
        assert!(warnings.iter().all(|w| w.line == Some(6)));
        assert_eq!(
            warnings[0].location(),
            Some("Assets/Scripts/Hud.cs:6".to_string())
        );
    }

    #[test]
    fn test_allocation_free_update() {
        let project = MemoryProject::new()
            .with_asset("Assets/Scripts/Mover.cs")
            .with_source(
                "Assets/Scripts/Mover.cs",
                "void Update()\n{\n    transform.position += velocity * Time.deltaTime;\n}\n",
            );

        let report = run_pass(&project, Config::default(), PassKind::Scripts);
        assert!(!report.problems_found);
    }
}

// ============================================================================
// Scene Pass Tests
// ============================================================================

mod scene_tests {
    use super::*;

    #[test]
    fn test_scene_thresholds() {
        let project = MemoryProject::new()
            .with_scene("Assets/Scenes/Main.unity", true)
            .with_scene_stats(
                "Assets/Scenes/Main.unity",
                SceneStats {
                    object_count: 1500,
                    realtime_shadow_lights: 12,
                },
            )
            .with_objects(
                "Assets/Scenes/Main.unity",
                vec![
                    SceneObject::new("Car").with_material_slots(3),
                    SceneObject::new("Tree").with_material_slots(1),
                ],
            );

        let report = run_pass(&project, Config::default(), PassKind::Scenes);
        assert_eq!(
            messages(&report),
            vec![
                "Scene contains 1500 objects, more than 1000",
                "Scene contains 12 realtime lights casting shadows",
                "Object 'Car' uses 3 materials, which increases draw calls",
            ]
        );
    }

    #[test]
    fn test_configured_thresholds() {
        let project = MemoryProject::new()
            .with_scene("Assets/Scenes/Main.unity", true)
            .with_scene_stats(
                "Assets/Scenes/Main.unity",
                SceneStats {
                    object_count: 1500,
                    realtime_shadow_lights: 12,
                },
            )
            .with_objects(
                "Assets/Scenes/Main.unity",
                vec![SceneObject::new("Car").with_material_slots(3)],
            );

        let mut config = Config::default();
        config.thresholds.scene_object_count = 2000;
        config.thresholds.realtime_shadow_lights = 20;
        config.thresholds.materials_per_renderer = 4;

        let report = run_pass(&project, config, PassKind::Scenes);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_renderer_batching_flags() {
        let project = MemoryProject::new()
            .with_scene("Assets/Scenes/Main.unity", true)
            .with_objects(
                "Assets/Scenes/Main.unity",
                vec![
                    SceneObject::new("Rock").with_renderer(
                        RendererInfo::new(1)
                            .receiving_shadows()
                            .without_dynamic_occlusion(),
                    ),
                    SceneObject::new("Crate").with_renderer(RendererInfo::new(1)),
                    SceneObject::new("Hidden")
                        .inactive()
                        .with_renderer(RendererInfo::new(4).receiving_shadows()),
                    SceneObject::new("Empty"),
                ],
            );

        let report = run_pass(&project, Config::default(), PassKind::Scenes);
        assert_eq!(
            messages(&report),
            vec![
                "Renderer on object 'Rock' has 'Allow Occlusion When Dynamic' turned off, which can prevent batching",
                "Renderer on object 'Rock' receives shadows, complex shadow receivers can prevent batching",
            ]
        );
        assert!(report
            .findings
            .iter()
            .all(|f| f.asset == Some(id("Assets/Scenes/Main.unity"))));
    }
}

// ============================================================================
// Material Pass Tests
// ============================================================================

mod material_tests {
    use super::*;

    fn project() -> MemoryProject {
        MemoryProject::new()
            .with_scene("Assets/Scenes/Main.unity", true)
            .with_material("Assets/Materials/Textured.mat", MaterialInfo { has_main_texture: true })
            .with_material("Assets/Materials/Flat.mat", MaterialInfo { has_main_texture: false })
            .with_material("Assets/Materials/Spare.mat", MaterialInfo { has_main_texture: false })
            .with_dependency("Assets/Scenes/Main.unity", "Assets/Materials/Textured.mat")
            .with_dependency("Assets/Scenes/Main.unity", "Assets/Materials/Flat.mat")
    }

    #[test]
    fn test_used_material_without_main_texture() {
        let report = run_pass(&project(), Config::default(), PassKind::Materials);
        assert_eq!(messages(&report), vec!["Material has no main texture assigned"]);
        assert_eq!(report.findings[0].asset, Some(id("Assets/Materials/Flat.mat")));
        assert_eq!(report.findings[0].severity, Severity::Warning);
        // Materials only report, they are never selectable
        assert!(report.flagged.is_empty());
    }

    #[test]
    fn test_unreferenced_material_is_skipped() {
        let report = run_pass(&project(), Config::default(), PassKind::Materials);
        assert!(!report
            .findings
            .iter()
            .any(|f| f.asset == Some(id("Assets/Materials/Spare.mat"))));
    }

    #[test]
    fn test_code_loaded_material_is_checked() {
        let project = MemoryProject::new()
            .with_material("Assets/Resources/fx/Glow.mat", MaterialInfo { has_main_texture: false })
            .with_source(
                "Assets/Scripts/Fx.cs",
                r#"var glow = Resources.Load<Material>("fx/Glow");"#,
            );

        let report = run_pass(&project, Config::default(), PassKind::Materials);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].asset, Some(id("Assets/Resources/fx/Glow.mat")));
    }

    #[test]
    fn test_clean_materials_pass() {
        let project = MemoryProject::new()
            .with_scene("Assets/Scenes/Main.unity", true)
            .with_material("Assets/Materials/Textured.mat", MaterialInfo { has_main_texture: true })
            .with_dependency("Assets/Scenes/Main.unity", "Assets/Materials/Textured.mat");

        let config = Config {
            passes: vec![PassKind::Materials],
            ..Config::default()
        };
        let audit = Orchestrator::from_config(&config)
            .run(&project, |_, _, _| {})
            .unwrap();
        assert_eq!(
            audit.outcome(PassKind::Materials).unwrap().status,
            PassStatus::Passed
        );
    }
}
