// ============================================================================
// Verdict - filler 计数与容忍度比较
// ============================================================================

use std::fmt;

use serde::Serialize;

/// Outcome of the filler-absence check.
///
/// Passes iff `filler_count <= tolerance`: fillers are expected to be absent,
/// and the tolerance absorbs unrelated `int[]` objects that happen to land in
/// the same size window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub filler_count: u64,
    pub tolerance: u64,
    pub passed: bool,
}

pub fn evaluate(filler_count: u64, tolerance: u64) -> Verdict {
    Verdict {
        filler_count,
        tolerance,
        passed: filler_count <= tolerance,
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed {
            write!(
                f,
                "PASS: {} filler-shaped arrays found (tolerance {})",
                self.filler_count, self.tolerance
            )
        } else {
            write!(
                f,
                "FAIL: {} filler-shaped arrays found, more than the tolerated {}",
                self.filler_count, self.tolerance
            )
        }
    }
}
