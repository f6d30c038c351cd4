use crate::analysis::{AuditReport, Finding, PassOutcome, PassStatus, Severity};
use colored::Colorize;
use miette::Result;

/// Terminal reporter with colored output
pub struct TerminalReporter {
    /// Print a line for passes that found nothing
    show_success: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { show_success: true }
    }

    pub fn with_success_lines(mut self, show: bool) -> Self {
        self.show_success = show;
        self
    }

    pub fn report(&self, audit: &AuditReport) -> Result<()> {
        if audit.passes.is_empty() {
            println!("{}", "No passes selected.".yellow());
            return Ok(());
        }

        let warnings: usize = audit.reports().map(|r| r.warnings()).sum();

        println!();
        if warnings == 0 && audit.is_clean() {
            println!("{}", "No optimization problems found!".green().bold());
        } else {
            println!(
                "{}",
                format!("Found {} optimization issues:", warnings)
                    .yellow()
                    .bold()
            );
        }
        println!();

        for outcome in &audit.passes {
            self.print_pass(outcome);
        }

        self.print_summary(audit);

        Ok(())
    }

    fn print_pass(&self, outcome: &PassOutcome) {
        match &outcome.status {
            PassStatus::Skipped => {
                println!(
                    "{} {}",
                    outcome.kind.display_name().cyan().bold(),
                    "skipped".dimmed()
                );
                println!();
            }
            PassStatus::Failed(message) => {
                println!("{}", outcome.kind.display_name().cyan().bold());
                println!("  {} {}", "failed".red().bold(), message);
                println!();
            }
            PassStatus::Passed | PassStatus::ProblemsFound => {
                let Some(report) = &outcome.report else {
                    return;
                };
                if report.findings.is_empty() && !self.show_success {
                    return;
                }

                println!("{}", outcome.kind.display_name().cyan().bold());
                for finding in &report.findings {
                    self.print_finding(finding);
                }
                if outcome.status == PassStatus::Passed && self.show_success {
                    println!("  {} {}", "✓".green().bold(), report.success_message.green());
                }
                println!();
            }
        }
    }

    fn print_finding(&self, finding: &Finding) {
        let severity_str = match finding.severity {
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
        };

        match finding.location() {
            Some(location) => println!(
                "  {} {} {}",
                severity_str,
                finding.message,
                location.dimmed()
            ),
            None => println!("  {} {}", severity_str, finding.message),
        }
    }

    fn print_summary(&self, audit: &AuditReport) {
        let mut warnings = 0;
        let mut infos = 0;
        for finding in audit.reports().flat_map(|r| r.findings.iter()) {
            match finding.severity {
                Severity::Warning => warnings += 1,
                Severity::Info => infos += 1,
            }
        }

        let count = |status: fn(&PassStatus) -> bool| {
            audit.passes.iter().filter(|p| status(&p.status)).count()
        };
        let passed = count(|s| matches!(s, PassStatus::Passed));
        let problems = count(|s| matches!(s, PassStatus::ProblemsFound));
        let failed = count(|s| matches!(s, PassStatus::Failed(_)));
        let skipped = count(|s| matches!(s, PassStatus::Skipped));

        println!("{}", "─".repeat(60).dimmed());

        let mut pass_parts = vec![format!("{} passed", passed).green().to_string()];
        if problems > 0 {
            pass_parts.push(format!("{} with problems", problems).yellow().to_string());
        }
        if failed > 0 {
            pass_parts.push(format!("{} failed", failed).red().to_string());
        }
        if skipped > 0 {
            pass_parts.push(format!("{} skipped", skipped).dimmed().to_string());
        }
        println!("Passes: {}", pass_parts.join(", "));

        let mut finding_parts = Vec::new();
        if warnings > 0 {
            finding_parts.push(format!("{} warnings", warnings).yellow().to_string());
        }
        if infos > 0 {
            finding_parts.push(format!("{} info", infos).blue().to_string());
        }
        if !finding_parts.is_empty() {
            println!("Findings: {}", finding_parts.join(", "));
        }

        if !audit.flagged.is_empty() {
            println!();
            println!(
                "{}",
                format!("{} assets flagged for review", audit.flagged.len()).yellow()
            );
            println!(
                "{}",
                "Tip: Potentially unused assets may still be loaded by computed paths".dimmed()
            );
        }
        println!();
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}
