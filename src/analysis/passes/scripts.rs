use super::{emit, Analyzer};
use crate::analysis::{AnalysisContext, AnalysisError, Finding, PassKind, RunReport};
use crate::progress::Progress;
use crate::project::FrameCallback;
use regex::Regex;
use std::sync::OnceLock;

/// Kinds of per-frame garbage the allocation scan looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Allocation {
    Concatenation,
    Linq,
    New,
    Boxing,
    Delegate,
}

impl Allocation {
    const ALL: [Allocation; 5] = [
        Allocation::Concatenation,
        Allocation::Linq,
        Allocation::New,
        Allocation::Boxing,
        Allocation::Delegate,
    ];

    fn description(&self) -> &'static str {
        match self {
            Allocation::Concatenation => "string concatenation",
            Allocation::Linq => "LINQ usage",
            Allocation::New => "GC allocation",
            Allocation::Boxing => "boxing",
            Allocation::Delegate => "delegate allocation",
        }
    }

    fn patterns(&self) -> &'static [Regex] {
        static CONCAT: OnceLock<Vec<Regex>> = OnceLock::new();
        static LINQ: OnceLock<Vec<Regex>> = OnceLock::new();
        static NEW: OnceLock<Vec<Regex>> = OnceLock::new();
        static BOXING: OnceLock<Vec<Regex>> = OnceLock::new();
        static DELEGATE: OnceLock<Vec<Regex>> = OnceLock::new();

        let (cell, sources): (_, &[&str]) = match self {
            Allocation::Concatenation => (
                &CONCAT,
                &[r#"(".+?"\s*\+\s*.+?\b)|(\b.+?\s*\+\s*".+?")"#],
            ),
            Allocation::Linq => (
                &LINQ,
                &[r"\.(Where|Select|First|FirstOrDefault|Last|LastOrDefault|Any|All|Count|ToList|ToArray)\("],
            ),
            Allocation::New => (&NEW, &[r"(?:^|\s)new\s+[\w<>]+\s*(?:\(.*\))?(?:\s|;)"]),
            Allocation::Boxing => (
                &BOXING,
                &[
                    r"\bobject\s+\w+\s*=\s*\w+;",
                    r"\bArrayList\s+\w+\s*=\s*new\s+ArrayList\(\);",
                ],
            ),
            Allocation::Delegate => (
                &DELEGATE,
                &[
                    r"=>",
                    r"delegate\s*\(",
                    r"(\w+(\s*\+=\s*)(new\s+)?\s*[\w\.]+\s*\(\s*\)\s*;)|(event\s+\w+\s*\+=)",
                ],
            ),
        };

        cell.get_or_init(|| {
            sources
                .iter()
                .map(|source| Regex::new(source).expect("allocation pattern is valid"))
                .collect()
        })
    }

    fn matches(&self, body: &str) -> bool {
        self.patterns().iter().any(|re| re.is_match(body))
    }
}

fn comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)//.*$").expect("comment pattern is valid"))
}

fn update_body_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bvoid\s+Update\s*\(\s*\)\s*\{[^}]*\}").expect("update pattern is valid")
    })
}

/// First `Update()` body of a source text, up to its first closing brace,
/// with the 1-based line it starts on. Line comments are ignored.
fn update_body(text: &str) -> Option<(String, usize)> {
    let stripped = comment_regex().replace_all(text, "");
    let found = update_body_regex().find(&stripped)?;
    let line = stripped[..found.start()].matches('\n').count() + 1;
    Some((found.as_str().to_string(), line))
}

/// Allocation categories present in one `Update()` body, each at most once
fn allocations_in(body: &str, imports_linq: bool) -> Vec<Allocation> {
    Allocation::ALL
        .iter()
        .copied()
        .filter(|kind| *kind != Allocation::Linq || imports_linq)
        .filter(|kind| kind.matches(body))
        .collect()
}

/// Frame callback census and per-frame allocation scan of the script corpus
pub struct ScriptsPass;

impl ScriptsPass {
    pub fn new() -> Self {
        Self
    }

    fn census(&self, ctx: &AnalysisContext<'_>, report: &mut RunReport) {
        let capabilities = ctx.source.script_capabilities();

        for callback in FrameCallback::ALL {
            let count = capabilities
                .iter()
                .filter(|c| c.callbacks.contains(&callback))
                .count();
            emit(
                report,
                Finding::info(
                    None,
                    format!("Number of scripts using {}: {}", callback.method_name(), count),
                ),
            );
        }

        let raycasts = capabilities.iter().filter(|c| c.uses_raycast).count();
        emit(
            report,
            Finding::info(
                None,
                format!("Number of scripts potentially using raycasts: {}", raycasts),
            ),
        );
    }
}

impl Default for ScriptsPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for ScriptsPass {
    fn kind(&self) -> PassKind {
        PassKind::Scripts
    }

    fn run(
        &self,
        ctx: &AnalysisContext<'_>,
        progress: &mut Progress<'_>,
    ) -> Result<RunReport, AnalysisError> {
        let mut report = RunReport::new(self.kind(), "No GC problem detected");

        progress.report(0.0, "Analyzing frame callback usage...");
        self.census(ctx, &mut report);

        let files = ctx.scanner.corpus().files();
        for (i, file) in files.iter().enumerate() {
            progress.tick(i, files.len(), || format!("Checking {} for GC allocations", file.path));

            let Some((body, line)) = update_body(&file.text) else {
                continue;
            };
            let imports_linq = file.text.contains("using System.Linq;");

            for allocation in allocations_in(&body, imports_linq) {
                emit(
                    &mut report,
                    Finding::warning(
                        Some(file.path.clone()),
                        format!(
                            "Potential {} detected in Update method",
                            allocation.description()
                        ),
                    )
                    .with_line(line),
                );
            }
        }

        progress.finish("Script analysis complete");
        Ok(report)
    }
}
