mod json;
mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use crate::analysis::AuditReport;
use miette::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

/// Reporter for audit results
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
    show_success: bool,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
            show_success: true,
        }
    }

    pub fn with_success_lines(mut self, show: bool) -> Self {
        self.show_success = show;
        self
    }

    /// Report the outcome of every pass
    pub fn report(&self, audit: &AuditReport) -> Result<()> {
        match self.format {
            ReportFormat::Terminal => {
                let reporter = TerminalReporter::new().with_success_lines(self.show_success);
                reporter.report(audit)
            }
            ReportFormat::Json => {
                let reporter = JsonReporter::new(self.output_path.clone());
                reporter.report(audit)
            }
        }
    }
}
