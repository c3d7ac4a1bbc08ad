// ============================================================================
// 分析流水线 - read -> resolve -> classify -> verdict
// ============================================================================

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::filler::{FillerClassifier, SizeWindow};
use crate::snapshot::{read_snapshot, HeapSnapshot};
use crate::verdict::{evaluate, Verdict};

/// A heap dump produced by an external process
#[derive(Debug, Clone)]
pub struct DumpArtifact {
    pub path: PathBuf,
    /// Exit status of the producer; `None` when the dump was taken elsewhere
    pub producer_exit_code: Option<i32>,
}

impl DumpArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            producer_exit_code: None,
        }
    }

    pub fn produced_with(mut self, exit_code: i32) -> Self {
        self.producer_exit_code = Some(exit_code);
        self
    }

    /// Producer must have succeeded and left a file behind
    pub fn check_ready(&self) -> Result<(), AnalysisError> {
        if let Some(code) = self.producer_exit_code {
            if code != 0 {
                return Err(AnalysisError::Precondition(format!(
                    "dump producer exited with status {code}"
                )));
            }
        }
        if !self.path.is_file() {
            return Err(AnalysisError::Precondition(format!(
                "heap dump file not found: {}",
                self.path.display()
            )));
        }
        Ok(())
    }
}

/// Verdict plus the context needed to audit it
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub verdict: Verdict,
    pub window: SizeWindow,
    pub filler_type_name: String,
    pub objects: usize,
    pub hprof_version: &'static str,
}

/// Check one dump for leaked filler arrays.
pub fn analyze(
    path: impl AsRef<Path>,
    region_size: u64,
    alloc_size: u64,
    tolerance: u64,
) -> Result<Verdict, AnalysisError> {
    let artifact = DumpArtifact::new(path.as_ref());
    let config = AnalysisConfig::new(region_size, alloc_size, tolerance);
    analyze_artifact(&artifact, &config).map(|report| report.verdict)
}

pub fn analyze_artifact(
    artifact: &DumpArtifact,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    // 配置和前置条件都在读文件之前检查
    let region = config.region_config()?;
    artifact.check_ready()?;

    let snapshot = read_snapshot(&artifact.path)?;
    Ok(analyze_snapshot(
        &snapshot,
        &FillerClassifier::new(&region),
        config.tolerance,
    ))
}

/// Classification and verdict over an already resolved snapshot
pub fn analyze_snapshot(
    snapshot: &HeapSnapshot,
    classifier: &FillerClassifier,
    tolerance: u64,
) -> AnalysisReport {
    let window = classifier.window();
    let filler_count = classifier.count_in(snapshot.catalog());
    let verdict = evaluate(filler_count, tolerance);

    info!(
        objects = snapshot.catalog().len(),
        min = window.min,
        max = window.max,
        filler_count,
        tolerance,
        "filler classification done"
    );
    if !verdict.passed {
        warn!(filler_count, tolerance, "filler arrays present in heap dump");
    }

    AnalysisReport {
        verdict,
        window,
        filler_type_name: classifier.filler_type_name().to_string(),
        objects: snapshot.catalog().len(),
        hprof_version: snapshot.header().version.as_str(),
    }
}
