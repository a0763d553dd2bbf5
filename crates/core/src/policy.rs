use std::path::Path;

use crate::model::DirStats;

/// Rounds logical file sizes up to whole allocation units.
///
/// A unit of 0 disables allocation tracking; the allocated size is then
/// reported equal to the logical size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizePolicy {
    unit: u64,
}

impl SizePolicy {
    pub fn new(unit: u64) -> Self {
        Self { unit }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn unit(&self) -> u64 {
        self.unit
    }

    pub fn allocated(&self, size: u64) -> u64 {
        if self.unit == 0 {
            return size;
        }
        size.div_ceil(self.unit).saturating_mul(self.unit)
    }

    /// Contribution of a single file of `size` bytes.
    pub fn file_stats(&self, size: u64) -> DirStats {
        DirStats {
            bytes: size,
            allocated: self.allocated(size),
            files: 1,
        }
    }
}

/// Looks up the block size of the filesystem holding `path`.
#[cfg(unix)]
pub fn detect_allocation_unit(path: &Path) -> std::io::Result<SizePolicy> {
    use std::os::unix::fs::MetadataExt;
    let md = std::fs::metadata(path)?;
    Ok(SizePolicy::new(md.blksize()))
}

#[cfg(not(unix))]
pub fn detect_allocation_unit(path: &Path) -> std::io::Result<SizePolicy> {
    std::fs::metadata(path)?;
    tracing::warn!("allocation unit detection is unsupported here, tracking disabled");
    Ok(SizePolicy::disabled())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up_to_unit() {
        let p = SizePolicy::new(4096);
        assert_eq!(p.allocated(0), 0);
        assert_eq!(p.allocated(1), 4096);
        assert_eq!(p.allocated(4096), 4096);
        assert_eq!(p.allocated(4097), 8192);
    }

    #[test]
    fn disabled_reports_logical_size() {
        let p = SizePolicy::disabled();
        assert_eq!(p.allocated(123), 123);
        assert_eq!(p.file_stats(10), DirStats { bytes: 10, allocated: 10, files: 1 });
    }
}
