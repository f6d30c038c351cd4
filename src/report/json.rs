use crate::analysis::{AuditReport, PassStatus, Severity};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, audit: &AuditReport) -> Result<()> {
        let json = self.render(audit)?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }

    pub fn render(&self, audit: &AuditReport) -> Result<String> {
        let report = JsonReport::from_audit(audit);
        serde_json::to_string_pretty(&report).into_diagnostic()
    }
}

#[derive(Serialize)]
struct JsonReport {
    version: &'static str,
    passes: Vec<JsonPass>,
    flagged: Vec<JsonFlagged>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonPass {
    name: &'static str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    problems_found: bool,
    findings: Vec<JsonFinding>,
}

#[derive(Serialize)]
struct JsonFinding {
    severity: &'static str,
    message: String,
    asset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
}

#[derive(Serialize)]
struct JsonFlagged {
    asset: String,
    kind: &'static str,
}

#[derive(Serialize)]
struct JsonSummary {
    passes: usize,
    failed: usize,
    warnings: usize,
    infos: usize,
    flagged: usize,
}

impl JsonReport {
    fn from_audit(audit: &AuditReport) -> Self {
        let mut warnings = 0;
        let mut infos = 0;
        let mut failed = 0;

        let passes = audit
            .passes
            .iter()
            .map(|outcome| {
                let (status, error) = match &outcome.status {
                    PassStatus::Passed => ("passed", None),
                    PassStatus::ProblemsFound => ("problems_found", None),
                    PassStatus::Failed(message) => {
                        failed += 1;
                        ("failed", Some(message.clone()))
                    }
                    PassStatus::Skipped => ("skipped", None),
                };

                let findings = outcome
                    .report
                    .iter()
                    .flat_map(|r| r.findings.iter())
                    .map(|finding| {
                        match finding.severity {
                            Severity::Warning => warnings += 1,
                            Severity::Info => infos += 1,
                        }
                        JsonFinding {
                            severity: finding.severity.as_str(),
                            message: finding.message.clone(),
                            asset: finding.asset.as_ref().map(|a| a.to_string()),
                            line: finding.line,
                        }
                    })
                    .collect();

                JsonPass {
                    name: outcome.kind.as_str(),
                    status,
                    error,
                    problems_found: outcome.status == PassStatus::ProblemsFound,
                    findings,
                }
            })
            .collect();

        let flagged = audit
            .flagged_assets()
            .iter()
            .map(|record| JsonFlagged {
                asset: record.id.to_string(),
                kind: record.kind.display_name(),
            })
            .collect();

        Self {
            version: "1.0",
            passes,
            flagged,
            summary: JsonSummary {
                passes: audit.passes.len(),
                failed,
                warnings,
                infos,
                flagged: audit.flagged.len(),
            },
        }
    }
}
