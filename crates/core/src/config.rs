//! Scan and render settings with their defaults.

use crate::lister::TimeMetric;
use crate::policy::SizePolicy;

pub const DEFAULT_WIDTH: usize = 80;
pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_PROGRESS_EVERY: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub size_policy: SizePolicy,
    pub time_metric: TimeMetric,
    pub one_file_system: bool,
    /// Report progress every this many directories; 0 turns reporting off.
    pub progress_every: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            size_policy: SizePolicy::disabled(),
            time_metric: TimeMetric::Modified,
            one_file_system: false,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    /// Nested proportional bar chart.
    #[default]
    Blocks,
    /// Node plus its direct children, largest first.
    Summary,
    /// Per-node details including largest and oldest file.
    Dump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub width: usize,
    pub max_depth: usize,
    pub view: View,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            max_depth: DEFAULT_MAX_DEPTH,
            view: View::Blocks,
        }
    }
}
