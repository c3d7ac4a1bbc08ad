// ============================================================================
// 错误分类 - HPROF 解析与分析流水线
// ============================================================================
//
// 解析阶段的所有错误都是致命的：损坏的 dump 无法给出可信的 filler 计数，
// 所以不存在 "部分结果"。错误携带字节偏移或对象 ID，便于定位。

use thiserror::Error;

/// Errors raised while reading or resolving an HPROF heap dump.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Header magic or record structure does not match the HPROF layout
    #[error("malformed heap dump at offset {offset}: {reason}")]
    Format { offset: usize, reason: String },

    /// A record or field extends past the end of its buffer
    #[error("truncated heap dump at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Recognised HPROF magic with a version this reader does not understand
    #[error("unsupported heap dump version: {version}")]
    UnsupportedVersion { version: String },

    /// An object (or LOAD CLASS record) points at a class/string that was never defined
    #[error("unresolved class reference 0x{class_id:x} from object 0x{object_id:x}")]
    UnresolvedReference { object_id: u64, class_id: u64 },

    #[error("failed to read heap dump: {0}")]
    Io(#[from] std::io::Error),
}

impl SnapshotError {
    pub(crate) fn format(offset: usize, reason: impl Into<String>) -> Self {
        SnapshotError::Format {
            offset,
            reason: reason.into(),
        }
    }

    /// Short machine-readable kind, used in the `--json` error envelope
    pub fn kind(&self) -> &'static str {
        match self {
            SnapshotError::Format { .. } => "FormatError",
            SnapshotError::Truncated { .. } => "TruncatedError",
            SnapshotError::UnsupportedVersion { .. } => "UnsupportedVersionError",
            SnapshotError::UnresolvedReference { .. } => "UnresolvedReferenceError",
            SnapshotError::Io(_) => "IoError",
        }
    }
}

/// Errors raised by the end-to-end analysis entry points.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The dump producer failed or its artifact is missing
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("invalid analysis config: {0}")]
    Config(String),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl AnalysisError {
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Precondition(_) => "PreconditionError",
            AnalysisError::Config(_) => "ConfigError",
            AnalysisError::Snapshot(e) => e.kind(),
        }
    }
}
