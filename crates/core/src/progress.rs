use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;

use crate::model::TreeNode;

/// Messages from a scan running on a worker thread.
#[derive(Debug)]
pub enum ScanMsg {
    Progress { dirs: u64, path: PathBuf },
    Done(TreeNode),
    Error(String),
}

/// Side channel for scan status. Never influences the scan result.
pub trait Feedback {
    fn scanning(&self, dirs: u64, path: &Path);
}

/// Discards all feedback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeedback;

impl Feedback for NoFeedback {
    fn scanning(&self, _dirs: u64, _path: &Path) {}
}

/// Forwards feedback as [`ScanMsg::Progress`] messages.
#[derive(Debug, Clone)]
pub struct ChannelFeedback {
    tx: Sender<ScanMsg>,
}

impl ChannelFeedback {
    pub fn new(tx: Sender<ScanMsg>) -> Self {
        Self { tx }
    }
}

impl Feedback for ChannelFeedback {
    fn scanning(&self, dirs: u64, path: &Path) {
        // A dropped receiver only means nobody is watching.
        let _ = self.tx.send(ScanMsg::Progress {
            dirs,
            path: path.to_path_buf(),
        });
    }
}
