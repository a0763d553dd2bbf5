use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::AddAssign;
use std::path::{Component, Path, PathBuf};

use crate::error::TreeError;

/// Byte, allocated-byte and file counters for a set of files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirStats {
    pub bytes: u64,
    pub allocated: u64,
    pub files: u64,
}

impl AddAssign for DirStats {
    fn add_assign(&mut self, rhs: Self) {
        self.bytes = self.bytes.saturating_add(rhs.bytes);
        self.allocated = self.allocated.saturating_add(rhs.allocated);
        self.files = self.files.saturating_add(rhs.files);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LargestFile {
    pub name: String,
    pub size: u64,
}

/// File with the smallest timestamp, in fractional seconds since the epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct OldestFile {
    pub name: String,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Pending,
    Recorded,
    // Files and subtrees folded in one at a time; totals are already complete.
    Live,
    Aggregated,
}

/// One directory in the aggregated tree.
///
/// The root carries the scanned path as its name, descendants only their
/// final path component. `own` covers files directly inside the directory,
/// `total` the whole subtree. `folders` counts this directory plus every
/// descendant directory.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub own: DirStats,
    pub total: DirStats,
    pub folders: u64,
    pub largest: Option<LargestFile>,
    pub oldest: Option<OldestFile>,
    pub children: BTreeMap<String, TreeNode>,
    phase: Phase,
}

impl TreeNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            own: DirStats::default(),
            total: DirStats::default(),
            folders: 1,
            largest: None,
            oldest: None,
            children: BTreeMap::new(),
            phase: Phase::Pending,
        }
    }

    pub fn is_aggregated(&self) -> bool {
        self.phase == Phase::Aggregated
    }

    pub(crate) fn is_live(&self) -> bool {
        self.phase == Phase::Live
    }

    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.children.get(name)
    }

    /// Looks up a descendant by a path relative to this node.
    pub fn get(&self, rel: impl AsRef<Path>) -> Option<&TreeNode> {
        rel.as_ref()
            .components()
            .try_fold(self, |node, c| match c {
                Component::Normal(part) => node.children.get(part.to_str()?),
                Component::CurDir => Some(node),
                _ => None,
            })
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.values().map(TreeNode::node_count).sum::<usize>()
    }

    /// Walks from this node along `full_path`, which must lie at or below
    /// this node's name, creating any missing nodes on the way.
    pub fn insert_path(&mut self, full_path: &Path) -> Result<&mut TreeNode, TreeError> {
        match self.phase {
            Phase::Aggregated => return Err(TreeError::AlreadyAggregated(self.name.clone())),
            Phase::Live => return Err(TreeError::TotalsAlreadyFolded(self.name.clone())),
            Phase::Pending | Phase::Recorded => {}
        }
        let outside = || TreeError::OutsideRoot {
            path: full_path.to_path_buf(),
            root: PathBuf::from(&self.name),
        };
        let rel = full_path
            .strip_prefix(Path::new(&self.name))
            .map_err(|_| outside())?;
        let mut parts = Vec::new();
        for c in rel.components() {
            match c {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return Err(outside()),
            }
        }

        let mut cursor = self;
        for part in parts {
            cursor = cursor
                .children
                .entry(part.clone())
                .or_insert_with(move || TreeNode::new(part));
        }
        Ok(cursor)
    }

    /// Sets the statistics of files directly in this directory. Totals start
    /// out equal to them until the tree is aggregated.
    pub fn record_own(
        &mut self,
        own: DirStats,
        largest: Option<LargestFile>,
        oldest: Option<OldestFile>,
    ) -> Result<(), TreeError> {
        if self.phase != Phase::Pending {
            return Err(TreeError::OwnStatsAlreadySet(self.name.clone()));
        }
        self.own = own;
        self.total = own;
        self.largest = largest;
        self.oldest = oldest;
        self.phase = Phase::Recorded;
        Ok(())
    }

    /// Folds one file found directly in this directory into both own and
    /// total statistics. Afterwards `record_own` and `accumulate` refuse the
    /// node.
    pub fn add_file(&mut self, name: &str, stats: DirStats, timestamp: Option<f64>) {
        debug_assert!(!self.is_aggregated());
        self.phase = Phase::Live;
        self.own += stats;
        self.total += stats;
        self.offer_largest(&LargestFile {
            name: name.to_string(),
            size: stats.bytes,
        });
        if let Some(timestamp) = timestamp {
            self.offer_oldest(&OldestFile {
                name: name.to_string(),
                timestamp,
            });
        }
    }

    /// Attaches a fully built subtree, folding its totals into this node.
    /// A child whose name is already taken is merged into the existing one.
    pub fn add_dir(&mut self, child: TreeNode) {
        debug_assert!(!self.is_aggregated());
        self.phase = Phase::Live;
        self.absorb(&child);
        self.attach(child);
    }

    fn attach(&mut self, child: TreeNode) {
        match self.children.entry(child.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(child);
            }
            Entry::Occupied(mut slot) => slot.get_mut().merge(child),
        }
    }

    // Keeps `total == own + sum of child totals` on both levels. `folders`
    // keeps counting both directories.
    fn merge(&mut self, other: TreeNode) {
        self.own += other.own;
        self.absorb(&other);
        for (_, grandchild) in other.children {
            self.attach(grandchild);
        }
    }

    pub(crate) fn absorb(&mut self, child: &TreeNode) {
        self.total += child.total;
        self.folders = self.folders.saturating_add(child.folders);
        if let Some(largest) = &child.largest {
            self.offer_largest(largest);
        }
        if let Some(oldest) = &child.oldest {
            self.offer_oldest(oldest);
        }
    }

    pub(crate) fn mark_aggregated(&mut self) {
        self.phase = Phase::Aggregated;
    }

    // Strict comparisons: on ties the first candidate seen stays.
    fn offer_largest(&mut self, candidate: &LargestFile) {
        if self.largest.as_ref().map_or(true, |cur| candidate.size > cur.size) {
            self.largest = Some(candidate.clone());
        }
    }

    fn offer_oldest(&mut self, candidate: &OldestFile) {
        if self
            .oldest
            .as_ref()
            .map_or(true, |cur| candidate.timestamp < cur.timestamp)
        {
            self.oldest = Some(candidate.clone());
        }
    }
}
