//! assetaudit - Find unused, oversized and duplicate assets in Unity projects
//!
//! This library audits the content tree of a Unity project for optimization
//! problems: assets nothing uses, textures that are too large or badly
//! compressed, near-identical textures, objects that are never switched on,
//! scripts that allocate every frame, and materials or renderers that break
//! batching.
//!
//! # Architecture
//!
//! The audit pipeline consists of:
//! 1. **Snapshot** - Enumerate assets, shipped scenes and prefabs through a
//!    [`ProjectSource`] host
//! 2. **Dependency Index** - Build the asset reference graph
//! 3. **Code Scanning** - Extract load-by-path literals and activation calls
//!    from the script corpus
//! 4. **Passes** - Run the selected analyzers against the shared context
//! 5. **Reporting** - Output results in various formats

pub mod analysis;
pub mod config;
pub mod discovery;
pub mod graph;
pub mod progress;
pub mod project;
pub mod report;
pub mod scanner;

pub use analysis::{
    AuditReport, Classification, Finding, Orchestrator, PassKind, PassOutcome, PassStatus,
    ReachabilityClassifier, RunReport, Severity, Stage, UsageVerdict,
};
pub use config::Config;
pub use discovery::FileFinder;
pub use graph::{DependencyIndex, IndexBuilder};
pub use project::{
    AssetId, AssetKind, AssetRecord, MemoryProject, ProjectError, ProjectSource, UnityProject,
};
pub use report::{ReportFormat, Reporter};
pub use scanner::{CodeCorpus, CodeReferenceScanner};
