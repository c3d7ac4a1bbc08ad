//! 分析配置
//!
//! 默认值对应 G1 humongous filler 回归场景：
//! 2MB region，每次分配半个 region + 1700 字节，容忍 3 个同尺寸的无关 int[]。
//!
//! 可从 YAML 加载 (字段均可省略):
//!
//! ```yaml
//! region_size: 4194304
//! alloc_size: 2098852
//! tolerance: 3
//! filler_type_name: "[I"
//! window_width: 128
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::filler::{RegionConfig, DEFAULT_FILLER_TYPE, DEFAULT_WINDOW_WIDTH};

pub const DEFAULT_REGION_SIZE: u64 = 2 * 1024 * 1024;
pub const DEFAULT_ALLOC_SIZE: u64 = DEFAULT_REGION_SIZE / 2 + 1700;
pub const DEFAULT_TOLERANCE: u64 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// G1 region size of the JVM that produced the dump
    pub region_size: u64,
    /// Size of each humongous allocation made before dumping
    pub alloc_size: u64,
    /// Filler-shaped objects allowed before the check fails
    pub tolerance: u64,
    pub filler_type_name: String,
    pub window_width: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            region_size: DEFAULT_REGION_SIZE,
            alloc_size: DEFAULT_ALLOC_SIZE,
            tolerance: DEFAULT_TOLERANCE,
            filler_type_name: DEFAULT_FILLER_TYPE.to_string(),
            window_width: DEFAULT_WINDOW_WIDTH,
        }
    }
}

impl AnalysisConfig {
    pub fn new(region_size: u64, alloc_size: u64, tolerance: u64) -> Self {
        Self {
            region_size,
            alloc_size,
            tolerance,
            ..Self::default()
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, AnalysisError> {
        serde_yaml::from_str(content).map_err(|e| AnalysisError::Config(e.to_string()))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AnalysisError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Region geometry for the classifier, validated
    pub fn region_config(&self) -> Result<RegionConfig, AnalysisError> {
        RegionConfig::new(self.region_size, self.alloc_size)?
            .with_filler_type(&self.filler_type_name)
            .with_window_width(self.window_width)
            .validated()
    }
}
