//! Disk usage trees: scanning, aggregation and text rendering.
//!
//! A tree comes from one of two [`TreeSource`]s: a live [`Scanner`] walk, or a
//! [`RecordTreeBuilder`] fed with per-directory records in any order. Either
//! way the result is an aggregated [`TreeNode`] that the [`render`] views
//! only read.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod human;
pub mod lister;
pub mod model;
pub mod policy;
pub mod progress;
pub mod records;
pub mod render;
pub mod scanner;
pub mod treemap;

pub use config::*;
pub use error::{RecordError, Result, ScanError, TreeError};
pub use model::*;
pub use policy::SizePolicy;
pub use progress::*;
pub use records::{DirRecord, RecordTreeBuilder};
pub use scanner::{Scanner, TreeSource};
