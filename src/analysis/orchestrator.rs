use super::passes::{analyzer_for, Analyzer};
use super::{AnalysisContext, PassKind, RunReport};
use crate::config::Config;
use crate::graph::IndexBuilder;
use crate::progress::Progress;
use crate::project::{AssetId, AssetRecord, ProjectError, ProjectSnapshot, ProjectSource};
use crate::scanner::{CodeCorpus, CodeReferenceScanner};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What the progress callback is currently reporting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Building the dependency index
    Indexing,
    Pass(PassKind),
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Indexing => write!(f, "Dependency index"),
            Stage::Pass(kind) => write!(f, "{}", kind.display_name()),
        }
    }
}

/// How a pass ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassStatus {
    Passed,
    ProblemsFound,
    Failed(String),
    /// Not started because the run was cancelled
    Skipped,
}

/// One entry of the audit summary
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub kind: PassKind,
    pub status: PassStatus,
    /// Present when the pass ran to completion
    pub report: Option<RunReport>,
}

/// Everything the reporting layer gets back from one run
#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub passes: Vec<PassOutcome>,
    /// Assets flagged by the unused, resources and texture passes, in report order
    pub flagged: Vec<AssetId>,
    flagged_records: Vec<AssetRecord>,
}

impl AuditReport {
    /// The flagged set resolved against the snapshot of the run
    pub fn flagged_assets(&self) -> &[AssetRecord] {
        &self.flagged_records
    }

    pub fn outcome(&self, kind: PassKind) -> Option<&PassOutcome> {
        self.passes.iter().find(|p| p.kind == kind)
    }

    pub fn reports(&self) -> impl Iterator<Item = &RunReport> {
        self.passes.iter().filter_map(|p| p.report.as_ref())
    }

    /// No pass found problems or failed
    pub fn is_clean(&self) -> bool {
        self.passes
            .iter()
            .all(|p| matches!(p.status, PassStatus::Passed | PassStatus::Skipped))
    }
}

/// Runs the selected passes, in order, against one snapshot of a project
pub struct Orchestrator {
    config: Config,
    analyzers: Vec<Box<dyn Analyzer>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Orchestrator {
    /// The built-in passes the configuration selects
    pub fn from_config(config: &Config) -> Self {
        let analyzers = config
            .selected_passes()
            .into_iter()
            .map(analyzer_for)
            .collect();

        Self {
            config: config.clone(),
            analyzers,
            cancel: None,
        }
    }

    /// Append a pass after the configured ones
    pub fn with_analyzer(mut self, analyzer: Box<dyn Analyzer>) -> Self {
        self.analyzers.push(analyzer);
        self
    }

    /// Stop starting new passes once the flag is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn pass_kinds(&self) -> Vec<PassKind> {
        self.analyzers.iter().map(|a| a.kind()).collect()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Run every pass against the project.
    ///
    /// Only an unavailable snapshot is an error; a failing pass is recorded
    /// and the next one still runs.
    pub fn run<F>(
        &self,
        source: &dyn ProjectSource,
        mut on_progress: F,
    ) -> Result<AuditReport, ProjectError>
    where
        F: FnMut(Stage, f32, &str),
    {
        let start = Instant::now();

        let snapshot = ProjectSnapshot::capture(source)?;

        let index = {
            let mut progress = Progress::new(|f, s| on_progress(Stage::Indexing, f, s));
            IndexBuilder::new(source).build(&snapshot, &mut progress)
        };

        let scanner = CodeReferenceScanner::scan(CodeCorpus::load(source));
        let ctx = AnalysisContext::new(source, &snapshot, &index, &scanner, &self.config);

        let mut report = AuditReport::default();
        for analyzer in &self.analyzers {
            let kind = analyzer.kind();

            if self.is_cancelled() {
                debug!("Skipping {} pass, run cancelled", kind);
                report.passes.push(PassOutcome {
                    kind,
                    status: PassStatus::Skipped,
                    report: None,
                });
                continue;
            }

            info!("Running {} pass...", kind);
            let result = {
                let mut progress = Progress::new(|f, s| on_progress(Stage::Pass(kind), f, s));
                analyzer.run(&ctx, &mut progress)
            };

            let outcome = match result {
                Ok(run) => {
                    let status = if run.problems_found {
                        PassStatus::ProblemsFound
                    } else {
                        info!("[{}] {}", kind, run.success_message);
                        PassStatus::Passed
                    };
                    PassOutcome {
                        kind,
                        status,
                        report: Some(run),
                    }
                }
                Err(e) => {
                    warn!("{} pass failed: {}", kind, e);
                    PassOutcome {
                        kind,
                        status: PassStatus::Failed(e.to_string()),
                        report: None,
                    }
                }
            };
            report.passes.push(outcome);
        }

        report.flagged = collect_flagged(&report.passes);
        report.flagged_records = report
            .flagged
            .iter()
            .filter_map(|id| snapshot.get(id).cloned())
            .collect();

        info!(
            "Audit finished in {:.2?}: {} passes, {} flagged assets",
            start.elapsed(),
            report.passes.len(),
            report.flagged.len()
        );

        Ok(report)
    }
}

/// Flagged assets of the passes whose findings are selectable
fn collect_flagged(passes: &[PassOutcome]) -> Vec<AssetId> {
    let mut seen: HashSet<&AssetId> = HashSet::new();
    let mut flagged: Vec<AssetId> = Vec::new();
    for outcome in passes {
        if !matches!(
            outcome.kind,
            PassKind::UnusedAssets | PassKind::Resources | PassKind::Textures
        ) {
            continue;
        }
        let Some(run) = &outcome.report else {
            continue;
        };
        for asset in &run.flagged {
            if seen.insert(asset) {
                flagged.push(asset.clone());
            }
        }
    }
    flagged
}
