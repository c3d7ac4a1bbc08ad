// ============================================================================
// Heap Filler Check - Library Interface
// ============================================================================
//
// 读取 HPROF heap dump，检查 G1 的 filler int[] 是否泄露为可见对象。
// The main binary (main.rs) drives these modules through cli.rs.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod filler;
pub mod hprof;
pub mod snapshot;
pub mod verdict;

pub use analysis::{analyze, analyze_artifact, analyze_snapshot, AnalysisReport, DumpArtifact};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, SnapshotError};
pub use filler::{count_fillers, FillerClassifier, RegionConfig, SizeWindow};
pub use snapshot::{read_snapshot, ClassStats, HeapObject, HeapSnapshot, ObjectCatalog};
pub use verdict::{evaluate, Verdict};
