// ============================================================================
// Filler 分类器 - G1 region 填充数组识别
// ============================================================================
//
// G1 为 humongous 对象分配整块 region，region 剩余空间用一个 int[] 填满。
// 这种 filler 不应出现在 heap dump 中。
//
// 识别规则 (纯函数，只看类名和大小):
//   max = region_size - alloc_size
//   min = max - window_width          (默认宽 128 字节，吸收对齐/对象头差异)
//   min <= size <= max && class_name == filler_type_name
//
// ============================================================================

use serde::Serialize;

use crate::error::AnalysisError;
use crate::snapshot::{HeapObject, HeapSnapshot, ObjectCatalog};

/// JVM name of `int[]`, which HotSpot uses for filler objects
pub const DEFAULT_FILLER_TYPE: &str = "[I";

/// Width of the tolerance band below the theoretical filler size
pub const DEFAULT_WINDOW_WIDTH: u64 = 128;

/// Inclusive size range `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeWindow {
    pub min: u64,
    pub max: u64,
}

impl SizeWindow {
    pub fn contains(&self, size: u64) -> bool {
        self.min <= size && size <= self.max
    }
}

/// Region geometry of the dump-producing JVM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionConfig {
    pub region_size: u64,
    pub alloc_size: u64,
    pub filler_type_name: String,
    pub window_width: u64,
}

impl RegionConfig {
    pub fn new(region_size: u64, alloc_size: u64) -> Result<Self, AnalysisError> {
        Self {
            region_size,
            alloc_size,
            filler_type_name: DEFAULT_FILLER_TYPE.to_string(),
            window_width: DEFAULT_WINDOW_WIDTH,
        }
        .validated()
    }

    pub fn with_filler_type(mut self, name: &str) -> Self {
        self.filler_type_name = name.to_string();
        self
    }

    pub fn with_window_width(mut self, width: u64) -> Self {
        self.window_width = width;
        self
    }

    pub fn validated(self) -> Result<Self, AnalysisError> {
        if self.region_size == 0 {
            return Err(AnalysisError::Config("region_size must be positive".into()));
        }
        if self.alloc_size > self.region_size {
            return Err(AnalysisError::Config(format!(
                "alloc_size {} exceeds region_size {}",
                self.alloc_size, self.region_size
            )));
        }
        if self.filler_type_name.is_empty() {
            return Err(AnalysisError::Config("filler_type_name must not be empty".into()));
        }
        Ok(self)
    }

    /// Sizes a filler padding out one humongous allocation can have
    pub fn expected_filler_window(&self) -> SizeWindow {
        let max = self.region_size.saturating_sub(self.alloc_size);
        SizeWindow {
            min: max.saturating_sub(self.window_width),
            max,
        }
    }
}

/// Counts objects carrying the filler size/type signature
#[derive(Debug, Clone)]
pub struct FillerClassifier {
    window: SizeWindow,
    filler_type_name: String,
}

impl FillerClassifier {
    pub fn new(config: &RegionConfig) -> Self {
        Self {
            window: config.expected_filler_window(),
            filler_type_name: config.filler_type_name.clone(),
        }
    }

    pub fn window(&self) -> SizeWindow {
        self.window
    }

    pub fn filler_type_name(&self) -> &str {
        &self.filler_type_name
    }

    pub fn is_filler(&self, object: &HeapObject) -> bool {
        self.window.contains(object.size) && *object.class_name == *self.filler_type_name
    }

    pub fn count<'a>(&self, objects: impl IntoIterator<Item = &'a HeapObject>) -> u64 {
        objects.into_iter().filter(|o| self.is_filler(o)).count() as u64
    }

    pub fn count_in(&self, catalog: &ObjectCatalog) -> u64 {
        self.count(catalog.all_objects())
    }
}

/// Number of filler-shaped objects in a resolved snapshot
pub fn count_fillers(snapshot: &HeapSnapshot, config: &RegionConfig) -> u64 {
    FillerClassifier::new(config).count_in(snapshot.catalog())
}
