//! Code reference scanner
//!
//! Static text scanning of the script corpus for the two things the
//! dependency graph cannot see:
//!
//! - assets loaded by path at runtime (`Resources.Load("icons/a")`,
//!   `Resources.LoadAll("icons")`), and
//! - objects switched on from code (`door.SetActive(true)` and friends).
//!
//! ## Known limitations
//!
//! This is a textual heuristic, not reference resolution. Paths built at
//! runtime (`Resources.Load("lvl" + n)`) are missed, so an asset loaded that
//! way can still be reported as unused. Activation matching is plain substring
//! search, so `backdoor.SetActive(true)` also counts as activating an object
//! named `door`, and any identically named object elsewhere is treated as
//! activated too. Files that cannot be read are skipped, which makes every
//! result a lower bound.

mod patterns;

pub use patterns::ACTIVATION_PATTERNS;

use crate::project::{AssetId, ProjectSource};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// One source file of the corpus
#[derive(Debug, Clone)]
pub struct SourceText {
    pub path: AssetId,
    pub text: String,
}

/// The script corpus, read once per run
#[derive(Debug, Default)]
pub struct CodeCorpus {
    files: Vec<SourceText>,
    unreadable: usize,
}

impl CodeCorpus {
    /// Read every source file the host lists, skipping the ones that fail
    pub fn load(source: &dyn ProjectSource) -> Self {
        let mut corpus = Self::default();

        for path in source.source_files() {
            match source.read_source(&path) {
                Ok(text) => corpus.files.push(SourceText { path, text }),
                Err(e) => {
                    warn!("Skipping unreadable source {}: {}", path, e);
                    corpus.unreadable += 1;
                }
            }
        }

        info!(
            "Loaded {} source files ({} unreadable)",
            corpus.files.len(),
            corpus.unreadable
        );
        corpus
    }

    pub fn from_texts<I, P, T>(texts: I) -> Self
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<String>,
        T: Into<String>,
    {
        Self {
            files: texts
                .into_iter()
                .map(|(path, text)| SourceText {
                    path: AssetId::new(path),
                    text: text.into(),
                })
                .collect(),
            unreadable: 0,
        }
    }

    pub fn files(&self) -> &[SourceText] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn unreadable_count(&self) -> usize {
        self.unreadable
    }
}

/// Load-by-path literals and activation lookups over a cached corpus
#[derive(Debug)]
pub struct CodeReferenceScanner {
    corpus: CodeCorpus,
    /// Literals passed to single-asset load calls
    loads: BTreeSet<String>,
    /// Literals passed to load-everything-under calls, matched as prefixes
    load_all: BTreeSet<String>,
    activation_cache: RefCell<HashMap<String, bool>>,
}

impl CodeReferenceScanner {
    /// Extract every load literal from the corpus in one pass
    pub fn scan(corpus: CodeCorpus) -> Self {
        let mut loads = BTreeSet::new();
        let mut load_all = BTreeSet::new();

        for file in corpus.files() {
            for literal in patterns::load_literals(&file.text) {
                debug!("{}: Resources.Load(\"{}\")", file.path, literal);
                loads.insert(literal);
            }
            for literal in patterns::load_all_literals(&file.text) {
                debug!("{}: Resources.LoadAll(\"{}\")", file.path, literal);
                load_all.insert(literal);
            }
        }

        info!(
            "Found {} load literals and {} load-all prefixes",
            loads.len(),
            load_all.len()
        );

        Self {
            corpus,
            loads,
            load_all,
            activation_cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn corpus(&self) -> &CodeCorpus {
        &self.corpus
    }

    pub fn load_literals(&self) -> impl Iterator<Item = &str> {
        self.loads.iter().map(String::as_str)
    }

    pub fn load_all_literals(&self) -> impl Iterator<Item = &str> {
        self.load_all.iter().map(String::as_str)
    }

    /// Whether some load call names this asset.
    ///
    /// `relative` is the asset path inside its resources directory, with
    /// extension (`icons/a.png`). Single loads match it exactly, with or
    /// without the extension, or the full project path. Load-all calls match
    /// every asset whose relative path starts with the literal.
    pub fn is_referenced(&self, asset: &AssetId, relative: &str) -> bool {
        let stem = strip_extension(relative);

        if self.loads.contains(stem)
            || self.loads.contains(relative)
            || self.loads.contains(asset.as_str())
        {
            return true;
        }

        self.load_all
            .iter()
            .any(|prefix| relative.starts_with(prefix.as_str()))
    }

    /// Whether any source file matches one of the activation patterns for
    /// this object name. See the module docs for the false positives and
    /// negatives this implies.
    pub fn is_activated_in_code(&self, name: &str) -> bool {
        if let Some(&cached) = self.activation_cache.borrow().get(name) {
            return cached;
        }

        let needles: Vec<String> = ACTIVATION_PATTERNS
            .iter()
            .map(|pattern| pattern.replace("{name}", name))
            .collect();

        let activated = self.corpus.files().iter().any(|file| {
            needles
                .iter()
                .any(|needle| file.text.contains(needle.as_str()))
        });

        self.activation_cache
            .borrow_mut()
            .insert(name.to_string(), activated);
        activated
    }
}

fn strip_extension(path: &str) -> &str {
    let name_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[name_start..].rfind('.') {
        Some(idx) if idx > 0 => &path[..name_start + idx],
        _ => path,
    }
}
