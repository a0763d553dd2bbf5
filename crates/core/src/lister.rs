//! Directory enumeration used by both the live scanner and the record producer.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use walkdir::WalkDir;

use crate::error::ScanError;

/// Which file timestamp decides the "oldest file".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeMetric {
    #[default]
    Modified,
    Accessed,
    Created,
}

/// Timestamps of one file in fractional seconds since the epoch. Missing
/// values are ones the platform could not provide.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FileTimes {
    pub modified: Option<f64>,
    pub accessed: Option<f64>,
    pub created: Option<f64>,
}

impl FileTimes {
    pub fn pick(&self, metric: TimeMetric) -> Option<f64> {
        match metric {
            TimeMetric::Modified => self.modified,
            TimeMetric::Accessed => self.accessed,
            TimeMetric::Created => self.created,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryKind {
    File { size: u64, times: FileTimes },
    Dir,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Enumerates the direct entries of a directory.
///
/// The outer error means `dir` itself could not be read. Inner errors
/// belong to single entries; callers skip those and carry on.
pub trait DirectoryLister {
    fn list(&self, dir: &Path) -> Result<Vec<Result<Entry, ScanError>>, ScanError>;
}

/// Lists real directories through `walkdir`, one level at a time, in
/// file name order. Symbolic links are reported as files and never followed.
#[derive(Debug, Clone, Default)]
pub struct FsLister {
    one_file_system: bool,
}

impl FsLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip directories that live on a different device than their parent.
    pub fn one_file_system(mut self, yes: bool) -> Self {
        self.one_file_system = yes;
        self
    }
}

impl DirectoryLister for FsLister {
    fn list(&self, dir: &Path) -> Result<Vec<Result<Entry, ScanError>>, ScanError> {
        let md = std::fs::metadata(dir).map_err(|source| ScanError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        if !md.is_dir() {
            return Err(ScanError::NotADirectory(dir.to_path_buf()));
        }

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .same_file_system(self.one_file_system);

        let mut entries = Vec::new();
        for next in walker {
            let ent = match next {
                Ok(ent) => ent,
                // Depth 0 is the directory itself: unreadable means fatal.
                Err(e) if e.depth() == 0 => {
                    let path = e.path().unwrap_or(dir).to_path_buf();
                    return Err(ScanError::Io {
                        path,
                        source: e.into(),
                    });
                }
                Err(e) => {
                    let path = e.path().unwrap_or(dir).to_path_buf();
                    entries.push(Err(ScanError::Io {
                        path,
                        source: e.into(),
                    }));
                    continue;
                }
            };
            let name = ent.file_name().to_string_lossy().into_owned();
            let path = ent.path().to_path_buf();
            if ent.file_type().is_dir() {
                entries.push(Ok(Entry {
                    name,
                    path,
                    kind: EntryKind::Dir,
                }));
                continue;
            }
            match ent.metadata() {
                Ok(md) => entries.push(Ok(Entry {
                    name,
                    path,
                    kind: EntryKind::File {
                        size: md.len(),
                        times: FileTimes {
                            modified: md.modified().ok().map(epoch_seconds),
                            accessed: md.accessed().ok().map(epoch_seconds),
                            created: md.created().ok().map(epoch_seconds),
                        },
                    },
                })),
                Err(e) => entries.push(Err(ScanError::Io {
                    path,
                    source: e.into(),
                })),
            }
        }
        Ok(entries)
    }
}

fn epoch_seconds(t: SystemTime) -> f64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(before) => -before.duration().as_secs_f64(),
    }
}
