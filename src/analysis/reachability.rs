use super::AnalysisContext;
use crate::project::{AssetId, AssetKind, AssetRecord};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::{debug, info};

/// Usage verdict of one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UsageVerdict {
    Used,
    PotentiallyUnused,
}

/// First piece of evidence that made an asset used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UsageReason {
    /// In the closure of an enabled scene or a prefab
    Root,
    /// In the closure of a scriptable object
    ScriptableObject,
    /// Matched a retain pattern
    Retained,
    /// Reached from a used asset during propagation
    Reachable,
    /// Resources asset named by a load call in code
    CodeReference,
    /// Has at least one inbound or outbound reference
    HasEdges,
}

/// Outcome of one classification run
#[derive(Debug, Clone, Default)]
pub struct Classification {
    used: HashMap<AssetId, UsageReason>,
    /// Reported assets, sorted
    unused: Vec<AssetId>,
    /// Unused but kept out of the report by an exclusion rule
    excluded: BTreeSet<AssetId>,
}

impl Classification {
    pub fn verdict(&self, asset: &AssetId) -> UsageVerdict {
        if self.used.contains_key(asset) {
            UsageVerdict::Used
        } else {
            UsageVerdict::PotentiallyUnused
        }
    }

    pub fn reason(&self, asset: &AssetId) -> Option<UsageReason> {
        self.used.get(asset).copied()
    }

    pub fn is_used(&self, asset: &AssetId) -> bool {
        self.used.contains_key(asset)
    }

    /// Potentially unused assets that survived exclusion, sorted by id
    pub fn potentially_unused(&self) -> &[AssetId] {
        &self.unused
    }

    pub fn excluded(&self) -> impl Iterator<Item = &AssetId> {
        self.excluded.iter()
    }
}

/// Splits the project into used and potentially unused assets.
///
/// 1. Roots: the closure of every enabled scene and every prefab, plus the
///    closure of every scriptable object (including itself) and assets
///    matching a retain pattern.
/// 2. Worklist propagation along direct references to a fixpoint.
/// 3. Resources assets named by a load call in code become used, and their
///    references are propagated.
/// 4. Any other asset with an inbound or outbound reference becomes used.
///    This is weaker than reachability from a root.
/// 5. Exclusion rules filter what is left.
pub struct ReachabilityClassifier<'c, 'a> {
    ctx: &'c AnalysisContext<'a>,
    used: HashMap<AssetId, UsageReason>,
}

impl<'c, 'a> ReachabilityClassifier<'c, 'a> {
    pub fn new(ctx: &'c AnalysisContext<'a>) -> Self {
        Self {
            ctx,
            used: HashMap::new(),
        }
    }

    pub fn classify(mut self) -> Classification {
        let snapshot = self.ctx.snapshot;
        let index = self.ctx.index;

        // Step 1: root set
        let mut roots: Vec<AssetId> = Vec::new();
        let entry_units = snapshot
            .enabled_scenes()
            .iter()
            .chain(snapshot.prefabs().iter());
        for unit in entry_units {
            for member in index.closure(unit) {
                roots.push(member.clone());
                self.mark(member, UsageReason::Root);
            }
        }

        for record in snapshot.assets_of_kind(AssetKind::ScriptableObject) {
            for member in index.closure(&record.id) {
                roots.push(member.clone());
                self.mark(member, UsageReason::ScriptableObject);
            }
        }

        for record in snapshot.assets() {
            if self.ctx.config.should_retain(&record.id) {
                roots.push(record.id.clone());
                self.mark(record.id.clone(), UsageReason::Retained);
            }
        }

        debug!("Root set holds {} assets", self.used.len());

        // Step 2: fixpoint
        self.propagate(roots);

        // Step 3: resources assets named in code
        let loaded: Vec<AssetId> = snapshot
            .assets()
            .iter()
            .filter(|r| !self.used.contains_key(&r.id))
            .filter(|r| self.ctx.is_loaded_from_code(&r.id))
            .map(|r| r.id.clone())
            .collect();
        for id in &loaded {
            debug!("Loaded from code: {}", id);
            self.mark(id.clone(), UsageReason::CodeReference);
        }
        self.propagate(loaded);

        // Step 4: anything referenced or referencing
        let connected: Vec<AssetId> = snapshot
            .assets()
            .iter()
            .filter(|r| r.kind != AssetKind::Folder)
            .filter(|r| !self.used.contains_key(&r.id))
            .filter(|r| index.has_edges(&r.id))
            .map(|r| r.id.clone())
            .collect();
        for id in connected {
            self.mark(id, UsageReason::HasEdges);
        }

        // Step 5: exclusion
        let mut unused = Vec::new();
        let mut excluded = BTreeSet::new();
        for record in snapshot.assets() {
            if self.used.contains_key(&record.id) {
                continue;
            }
            if self.is_excluded(record) {
                excluded.insert(record.id.clone());
            } else {
                unused.push(record.id.clone());
            }
        }
        unused.sort();

        info!(
            "Classified {} assets: {} used, {} potentially unused, {} excluded",
            snapshot.len(),
            self.used.len(),
            unused.len(),
            excluded.len()
        );

        Classification {
            used: self.used,
            unused,
            excluded,
        }
    }

    /// Mark an asset used unless it already is; the first reason sticks
    fn mark(&mut self, id: AssetId, reason: UsageReason) -> bool {
        if self.used.contains_key(&id) {
            return false;
        }
        self.used.insert(id, reason);
        true
    }

    fn propagate(&mut self, seeds: Vec<AssetId>) {
        let index = self.ctx.index;
        let mut worklist: VecDeque<AssetId> = seeds.into();

        while let Some(id) = worklist.pop_front() {
            for dependency in index.direct_dependencies(&id) {
                if self.mark(dependency.clone(), UsageReason::Reachable) {
                    worklist.push_back(dependency.clone());
                }
            }
        }
    }

    fn is_excluded(&self, record: &AssetRecord) -> bool {
        self.ctx.exclusions().is_excluded(record, self.ctx.source)
    }
}
