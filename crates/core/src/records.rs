//! Flat per-directory records and the tree builder that ingests them.
//!
//! A record is one line of eight `|`-separated fields:
//!
//! ```text
//! files|bytes|allocated|largest name|largest size|oldest name|oldest timestamp|path
//! ```
//!
//! Sizes are integers, the timestamp is fractional epoch seconds and the path
//! is absolute. An empty largest/oldest name means the directory holds no
//! files; the matching size/timestamp field is then ignored.

use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::accumulate;
use crate::config::ScanOptions;
use crate::error::{RecordError, Result, ScanError, TreeError};
use crate::lister::{DirectoryLister, EntryKind};
use crate::model::{DirStats, LargestFile, OldestFile, TreeNode};
use crate::scanner::TreeSource;

pub const FIELD_COUNT: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirRecord {
    pub files: u64,
    pub bytes: u64,
    pub allocated: u64,
    pub largest_name: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub largest_size: Option<u64>,
    pub oldest_name: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub oldest_timestamp: Option<f64>,
    pub path: String,
}

impl DirRecord {
    /// Record for the directory `node` was built from, using its own
    /// statistics and extremes.
    pub fn from_node(node: &TreeNode, path: &Path) -> Self {
        Self {
            files: node.own.files,
            bytes: node.own.bytes,
            allocated: node.own.allocated,
            largest_name: node.largest.as_ref().map(|f| f.name.clone()).unwrap_or_default(),
            largest_size: node.largest.as_ref().map(|f| f.size),
            oldest_name: node.oldest.as_ref().map(|f| f.name.clone()).unwrap_or_default(),
            oldest_timestamp: node.oldest.as_ref().map(|f| f.timestamp),
            path: path.to_string_lossy().into_owned(),
        }
    }

    pub fn own(&self) -> DirStats {
        DirStats {
            bytes: self.bytes,
            allocated: self.allocated,
            files: self.files,
        }
    }

    pub fn largest(&self) -> Option<LargestFile> {
        match (self.largest_name.is_empty(), self.largest_size) {
            (false, Some(size)) => Some(LargestFile {
                name: self.largest_name.clone(),
                size,
            }),
            _ => None,
        }
    }

    pub fn oldest(&self) -> Option<OldestFile> {
        match (self.oldest_name.is_empty(), self.oldest_timestamp) {
            (false, Some(timestamp)) => Some(OldestFile {
                name: self.oldest_name.clone(),
                timestamp,
            }),
            _ => None,
        }
    }
}

impl FromStr for DirRecord {
    type Err = RecordError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        RecordReader::new(line.as_bytes())
            .next()
            .unwrap_or(Err(RecordError::FieldCount { found: 0 }))
    }
}

/// Reads records one at a time. A bad record yields an error for that record
/// only; iteration continues with the next line.
pub struct RecordReader<R> {
    inner: csv::Reader<R>,
    record: csv::StringRecord,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(rdr: R) -> Self {
        let inner = csv::ReaderBuilder::new()
            .delimiter(b'|')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(rdr);
        Self {
            inner,
            record: csv::StringRecord::new(),
            done: false,
        }
    }

    /// Line of the most recently read record.
    pub fn line(&self) -> u64 {
        self.record.position().map_or(0, |p| p.line())
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = std::result::Result<DirRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.inner.read_record(&mut self.record) {
            Ok(false) => {
                self.done = true;
                None
            }
            Ok(true) if self.record.len() != FIELD_COUNT => Some(Err(RecordError::FieldCount {
                found: self.record.len(),
            })),
            Ok(true) => Some(self.record.deserialize(None).map_err(RecordError::from)),
            Err(e) => {
                // Nothing sensible can follow a failed read.
                if e.is_io_error() {
                    self.done = true;
                }
                Some(Err(e.into()))
            }
        }
    }
}

pub struct RecordWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(w: W) -> Self {
        let inner = csv::WriterBuilder::new()
            .delimiter(b'|')
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(w);
        Self { inner }
    }

    pub fn write(&mut self, record: &DirRecord) -> csv::Result<()> {
        self.inner.serialize(record)
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Walks `root` top-down and returns one record per readable directory,
/// parents before their children.
pub fn collect_records<L: DirectoryLister>(
    root: &Path,
    lister: &L,
    options: &ScanOptions,
) -> Result<Vec<DirRecord>> {
    let root = root.canonicalize().map_err(|source| ScanError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    let mut out = Vec::new();
    let subdirs = collect_dir(&root, lister, options, &mut out)?;
    for dir in subdirs {
        collect_tree(&dir, lister, options, &mut out);
    }
    info!(root = %root.display(), records = out.len(), "records collected");
    Ok(out)
}

fn collect_tree<L: DirectoryLister>(
    dir: &Path,
    lister: &L,
    options: &ScanOptions,
    out: &mut Vec<DirRecord>,
) {
    match collect_dir(dir, lister, options, out) {
        Ok(subdirs) => {
            for sub in subdirs {
                collect_tree(&sub, lister, options, out);
            }
        }
        Err(e) => warn!(error = %e, "skipping unreadable directory"),
    }
}

fn collect_dir<L: DirectoryLister>(
    dir: &Path,
    lister: &L,
    options: &ScanOptions,
    out: &mut Vec<DirRecord>,
) -> Result<Vec<PathBuf>> {
    let mut node = TreeNode::new(dir.to_string_lossy());
    let mut subdirs = Vec::new();
    for entry in lister.list(dir)? {
        match entry {
            Ok(entry) => match entry.kind {
                EntryKind::File { size, times } => node.add_file(
                    &entry.name,
                    options.size_policy.file_stats(size),
                    times.pick(options.time_metric),
                ),
                EntryKind::Dir => subdirs.push(entry.path),
            },
            Err(e) => warn!(error = %e, "skipping unreadable entry"),
        }
    }
    let record = DirRecord::from_node(&node, dir);
    if record.path.contains('|') || record.largest_name.contains('|') || record.oldest_name.contains('|') {
        warn!(path = %dir.display(), "cannot encode a '|' in a record, skipping directory");
    } else {
        out.push(record);
    }
    Ok(subdirs)
}

/// Builds a tree from records arriving in any order.
///
/// The root is either given up front or inferred: it starts at the first
/// record and moves up to the deepest common ancestor whenever a record
/// lands above it. Malformed records are skipped; records that contradict
/// the tree shape (outside a given root, or a directory seen twice) abort
/// the build.
#[derive(Debug, Default)]
pub struct RecordTreeBuilder {
    root: Option<TreeNode>,
    fixed_base: bool,
    inserted: u64,
    skipped: u64,
}

impl RecordTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            root: Some(TreeNode::new(base)),
            fixed_base: true,
            ..Self::default()
        }
    }

    pub fn inserted(&self) -> u64 {
        self.inserted
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn insert(&mut self, record: &DirRecord) -> std::result::Result<(), TreeError> {
        let path = Path::new(&record.path);
        let root = self
            .root
            .get_or_insert_with(|| TreeNode::new(record.path.clone()));
        if !self.fixed_base && !path.starts_with(&root.name) {
            reroot(root, path)?;
        }
        root.insert_path(path)?
            .record_own(record.own(), record.largest(), record.oldest())?;
        self.inserted += 1;
        Ok(())
    }

    /// Ingests every record from `rdr`.
    pub fn ingest<R: Read>(&mut self, rdr: R) -> Result<()> {
        let mut records = RecordReader::new(rdr);
        while let Some(next) = records.next() {
            match next {
                Ok(record) => self.insert(&record)?,
                Err(e) => {
                    warn!(line = records.line(), error = %e, "skipping malformed record");
                    self.skipped += 1;
                }
            }
        }
        debug!(inserted = self.inserted, skipped = self.skipped, "records ingested");
        Ok(())
    }
}

/// Replaces `root` by a node for the deepest directory containing both the
/// old root and `path`, keeping the old root as a descendant.
fn reroot(root: &mut TreeNode, path: &Path) -> std::result::Result<(), TreeError> {
    let old_path = PathBuf::from(&root.name);
    let outside = || TreeError::OutsideRoot {
        path: path.to_path_buf(),
        root: old_path.clone(),
    };
    if old_path.components().any(|c| c == Component::ParentDir) {
        return Err(outside());
    }
    let base: PathBuf = old_path
        .components()
        .zip(path.components())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a)
        .collect();
    let (Some(parent), Some(name)) = (old_path.parent(), old_path.file_name()) else {
        return Err(outside());
    };
    if base.as_os_str().is_empty() {
        return Err(outside());
    }
    debug!(from = %old_path.display(), to = %base.display(), "moving record root up");

    let mut old = std::mem::replace(root, TreeNode::new(base.to_string_lossy()));
    old.name = name.to_string_lossy().into_owned();
    root.insert_path(parent)?
        .children
        .insert(old.name.clone(), old);
    Ok(())
}

impl TreeSource for RecordTreeBuilder {
    fn build(self) -> Result<TreeNode> {
        let mut root = self.root.unwrap_or_else(|| TreeNode::new(""));
        accumulate(&mut root)?;
        info!(
            root = %root.name,
            records = self.inserted,
            skipped = self.skipped,
            "record tree built"
        );
        Ok(root)
    }
}
