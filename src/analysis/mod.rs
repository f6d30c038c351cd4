//! Audit passes and the engine they share.
//!
//! Every pass implements [`passes::Analyzer`] and reads one immutable
//! [`AnalysisContext`]: the project snapshot, the dependency index and the
//! scanned script corpus are built once per run and never mutated by a pass.

mod exclusion;
mod orchestrator;
pub mod passes;
mod reachability;
mod similarity;

pub use exclusion::ExclusionRules;
pub use orchestrator::{AuditReport, Orchestrator, PassOutcome, PassStatus, Stage};
pub use reachability::{Classification, ReachabilityClassifier, UsageReason, UsageVerdict};
pub use similarity::{similar, LumaGrid, GRID_SIZE, TOLERANCE};

use crate::config::Config;
use crate::graph::DependencyIndex;
use crate::project::{AssetId, ProjectError, ProjectSnapshot, ProjectSource};
use crate::scanner::CodeReferenceScanner;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::HashSet;
use thiserror::Error;

/// Audit passes, in default execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PassKind {
    Materials,
    Textures,
    UnusedAssets,
    InactiveObjects,
    Scripts,
    Scenes,
    Resources,
}

impl PassKind {
    pub const ALL: [PassKind; 7] = [
        PassKind::Materials,
        PassKind::Textures,
        PassKind::UnusedAssets,
        PassKind::InactiveObjects,
        PassKind::Scripts,
        PassKind::Scenes,
        PassKind::Resources,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PassKind::Materials => "materials",
            PassKind::Textures => "textures",
            PassKind::UnusedAssets => "unused-assets",
            PassKind::InactiveObjects => "inactive-objects",
            PassKind::Scripts => "scripts",
            PassKind::Scenes => "scenes",
            PassKind::Resources => "resources",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PassKind::Materials => "Materials",
            PassKind::Textures => "Textures",
            PassKind::UnusedAssets => "Unused assets",
            PassKind::InactiveObjects => "Inactive objects",
            PassKind::Scripts => "Scripts",
            PassKind::Scenes => "Scenes",
            PassKind::Resources => "Resources folder",
        }
    }
}

impl std::fmt::Display for PassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One reported problem or observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// The asset concerned, absent for project-wide observations
    pub asset: Option<AssetId>,

    pub severity: Severity,

    pub message: String,

    /// Line inside the asset, for source findings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Finding {
    pub fn warning(asset: Option<AssetId>, message: impl Into<String>) -> Self {
        Self {
            asset,
            severity: Severity::Warning,
            message: message.into(),
            line: None,
        }
    }

    pub fn info(asset: Option<AssetId>, message: impl Into<String>) -> Self {
        Self {
            asset,
            severity: Severity::Info,
            message: message.into(),
            line: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// `path:line` or just the path
    pub fn location(&self) -> Option<String> {
        let asset = self.asset.as_ref()?;
        Some(match self.line {
            Some(line) => format!("{}:{}", asset, line),
            None => asset.to_string(),
        })
    }
}

/// Result of one pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub pass: PassKind,

    /// At least one warning was emitted
    pub problems_found: bool,

    pub findings: Vec<Finding>,

    /// Assets the reporting layer can select, in report order
    pub flagged: Vec<AssetId>,

    /// Line shown when the pass found nothing
    pub success_message: String,

    #[serde(skip)]
    flagged_set: HashSet<AssetId>,
}

impl RunReport {
    pub fn new(pass: PassKind, success_message: impl Into<String>) -> Self {
        Self {
            pass,
            problems_found: false,
            findings: Vec::new(),
            flagged: Vec::new(),
            success_message: success_message.into(),
            flagged_set: HashSet::new(),
        }
    }

    /// Record a finding; warnings mark the pass as having found problems
    pub fn push(&mut self, finding: Finding) {
        if finding.severity == Severity::Warning {
            self.problems_found = true;
        }
        self.findings.push(finding);
    }

    /// Mark an asset as selectable; repeats keep the first position
    pub fn flag(&mut self, asset: &AssetId) {
        if self.flagged_set.insert(asset.clone()) {
            self.flagged.push(asset.clone());
        }
    }

    pub fn warnings(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count()
    }
}

/// Errors that make a single pass fail
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("{pass} pass failed: {message}")]
    Pass { pass: PassKind, message: String },
}

/// Read-only state shared by every pass of one run
pub struct AnalysisContext<'a> {
    pub source: &'a dyn ProjectSource,
    pub snapshot: &'a ProjectSnapshot,
    pub index: &'a DependencyIndex,
    pub scanner: &'a CodeReferenceScanner,
    pub config: &'a Config,
    exclusions: ExclusionRules,
    classification: OnceCell<Classification>,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        source: &'a dyn ProjectSource,
        snapshot: &'a ProjectSnapshot,
        index: &'a DependencyIndex,
        scanner: &'a CodeReferenceScanner,
        config: &'a Config,
    ) -> Self {
        Self {
            source,
            snapshot,
            index,
            scanner,
            config,
            exclusions: ExclusionRules::from_config(config),
            classification: OnceCell::new(),
        }
    }

    pub fn exclusions(&self) -> &ExclusionRules {
        &self.exclusions
    }

    /// Path of the asset inside the first resources directory containing it
    pub fn resources_relative<'b>(&self, asset: &'b AssetId) -> Option<&'b str> {
        self.config
            .resources
            .prefixes
            .iter()
            .find_map(|prefix| {
                asset
                    .as_str()
                    .strip_prefix(prefix.trim_end_matches('/'))?
                    .strip_prefix('/')
            })
            .filter(|rest| !rest.is_empty())
    }

    /// Whether a load-by-path call in code names this resources asset
    pub fn is_loaded_from_code(&self, asset: &AssetId) -> bool {
        self.resources_relative(asset)
            .map(|relative| self.scanner.is_referenced(asset, relative))
            .unwrap_or(false)
    }

    /// Some structural reference or load call points at the asset, without
    /// requiring a path from a root
    pub fn has_usage_evidence(&self, asset: &AssetId) -> bool {
        self.index.has_edges(asset) || self.is_loaded_from_code(asset)
    }

    /// Usage classification of the whole project, computed on first use
    pub fn classification(&self) -> &Classification {
        self.classification
            .get_or_init(|| ReachabilityClassifier::new(self).classify())
    }
}
