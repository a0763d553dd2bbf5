use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::ScanOptions;
use crate::error::{Result, ScanError};
use crate::lister::{DirectoryLister, EntryKind, FsLister};
use crate::model::TreeNode;
use crate::progress::{Feedback, NoFeedback};

/// Anything that produces a complete, aggregated tree.
pub trait TreeSource {
    fn build(self) -> Result<TreeNode>;
}

/// Builds a tree straight from a directory walk, depth first.
///
/// Totals are complete as soon as each directory's recursion unwinds, so no
/// separate aggregation pass is needed for trees built this way.
pub struct Scanner<L = FsLister, F = NoFeedback> {
    root: PathBuf,
    lister: L,
    feedback: F,
    options: ScanOptions,
    dirs: u64,
    skipped: u64,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>, options: ScanOptions) -> Self {
        Self {
            root: root.into(),
            lister: FsLister::new().one_file_system(options.one_file_system),
            feedback: NoFeedback,
            options,
            dirs: 0,
            skipped: 0,
        }
    }
}

impl<L: DirectoryLister, F: Feedback> Scanner<L, F> {
    pub fn with_lister<L2: DirectoryLister>(self, lister: L2) -> Scanner<L2, F> {
        Scanner {
            root: self.root,
            lister,
            feedback: self.feedback,
            options: self.options,
            dirs: self.dirs,
            skipped: self.skipped,
        }
    }

    pub fn with_feedback<F2: Feedback>(self, feedback: F2) -> Scanner<L, F2> {
        Scanner {
            root: self.root,
            lister: self.lister,
            feedback,
            options: self.options,
            dirs: self.dirs,
            skipped: self.skipped,
        }
    }

    fn scan_dir(&mut self, dir: &Path, name: String) -> Result<TreeNode> {
        let every = self.options.progress_every;
        if every > 0 && self.dirs % every == 0 {
            self.feedback.scanning(self.dirs, dir);
        }
        self.dirs += 1;
        debug!(path = %dir.display(), "scanning directory");

        let mut node = TreeNode::new(name);
        for entry in self.lister.list(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    self.skipped += 1;
                    continue;
                }
            };
            match entry.kind {
                EntryKind::File { size, times } => node.add_file(
                    &entry.name,
                    self.options.size_policy.file_stats(size),
                    times.pick(self.options.time_metric),
                ),
                EntryKind::Dir => match self.scan_dir(&entry.path, entry.name) {
                    Ok(child) => {
                        if node.child(&child.name).is_some() {
                            warn!(path = %entry.path.display(), "directory name collides with a sibling, merging");
                        }
                        node.add_dir(child)
                    }
                    Err(e) => {
                        warn!(error = %e, "skipping unreadable directory");
                        self.skipped += 1;
                    }
                },
            }
        }
        node.mark_aggregated();
        Ok(node)
    }
}

impl<L: DirectoryLister, F: Feedback> TreeSource for Scanner<L, F> {
    fn build(mut self) -> Result<TreeNode> {
        let root = self
            .root
            .canonicalize()
            .map_err(|source| ScanError::Io {
                path: self.root.clone(),
                source,
            })?;
        let name = root.to_string_lossy().into_owned();
        let tree = self.scan_dir(&root, name)?;
        info!(
            root = %root.display(),
            dirs = self.dirs,
            skipped = self.skipped,
            bytes = tree.total.bytes,
            "scan complete"
        );
        Ok(tree)
    }
}
