// ============================================================================
// HPROF Header - magic / version / identifier size / timestamp
// ============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::cursor::ByteCursor;
use crate::error::SnapshotError;

/// Every HPROF file starts with this prefix, followed by the version and a NUL
pub const MAGIC_PREFIX: &[u8] = b"JAVA PROFILE ";

/// Longest header string we are willing to scan for the NUL terminator
const MAX_HEADER_LEN: usize = 64;

/// HPROF format revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HprofVersion {
    /// 1.0.1 - single HEAP DUMP record
    V101,
    /// 1.0.2 - HEAP DUMP SEGMENT records (dumps > 4GB)
    V102,
}

impl HprofVersion {
    fn parse(version: &str) -> Option<Self> {
        match version {
            "1.0.1" => Some(HprofVersion::V101),
            "1.0.2" => Some(HprofVersion::V102),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HprofVersion::V101 => "1.0.1",
            HprofVersion::V102 => "1.0.2",
        }
    }
}

/// Parsed fixed header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HprofHeader {
    pub version: HprofVersion,
    /// Width of object/class identifiers: 4 or 8
    pub id_size: usize,
    /// Milliseconds since the epoch at which the dump was taken
    pub timestamp_ms: u64,
}

impl HprofHeader {
    /// Parse the header, leaving the cursor at the first record
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self, SnapshotError> {
        let start = cursor.offset();
        let head = cursor.rest();

        // 先比对前缀，避免把任意二进制当成截断的 header
        let prefix_len = head.len().min(MAGIC_PREFIX.len());
        if head[..prefix_len] != MAGIC_PREFIX[..prefix_len] {
            return Err(SnapshotError::format(start, "missing 'JAVA PROFILE' magic"));
        }
        if head.len() < MAGIC_PREFIX.len() {
            return Err(SnapshotError::Truncated {
                offset: start,
                needed: MAGIC_PREFIX.len(),
                available: head.len(),
            });
        }

        let window = &head[..head.len().min(MAX_HEADER_LEN)];
        let nul = match memchr::memchr(0, window) {
            Some(nul) => nul,
            // 文件在 NUL 之前就结束了：是截断，不是格式错误
            None if head.len() < MAX_HEADER_LEN => {
                return Err(SnapshotError::Truncated {
                    offset: start + head.len(),
                    needed: 1,
                    available: 0,
                });
            }
            None => {
                return Err(SnapshotError::format(start, "header string is not NUL-terminated"));
            }
        };

        let version_bytes = &head[MAGIC_PREFIX.len()..nul];
        let version_str = String::from_utf8_lossy(version_bytes);
        let version = HprofVersion::parse(&version_str).ok_or_else(|| {
            SnapshotError::UnsupportedVersion {
                version: version_str.to_string(),
            }
        })?;
        cursor.skip(nul + 1)?;

        let id_offset = cursor.offset();
        let id_size = cursor.u32()? as usize;
        if id_size != 4 && id_size != 8 {
            return Err(SnapshotError::format(
                id_offset,
                format!("identifier size must be 4 or 8, got {id_size}"),
            ));
        }

        // 时间戳在文件里是两个 u4 (高位, 低位)，合起来就是一个大端 u8
        let timestamp_ms = cursor.u64()?;

        Ok(Self {
            version,
            id_size,
            timestamp_ms,
        })
    }

    /// Dump time, if the timestamp is representable
    pub fn dumped_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp_ms)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(version: &str, id_size: u32, ts: u64) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC_PREFIX);
        out.extend_from_slice(version.as_bytes());
        out.push(0);
        out.extend_from_slice(&id_size.to_be_bytes());
        out.extend_from_slice(&ts.to_be_bytes());
        out
    }

    #[test]
    fn test_parse_v102_header() {
        let bytes = header_bytes("1.0.2", 8, 1_700_000_000_000);
        let mut cursor = ByteCursor::new(&bytes);
        let header = HprofHeader::parse(&mut cursor).unwrap();

        assert_eq!(header.version, HprofVersion::V102);
        assert_eq!(header.id_size, 8);
        assert_eq!(header.timestamp_ms, 1_700_000_000_000);
        assert!(cursor.is_empty());
        assert_eq!(header.dumped_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_bad_magic_is_format_error() {
        let mut bytes = header_bytes("1.0.2", 8, 0);
        bytes[0] = b'X';
        let err = HprofHeader::parse(&mut ByteCursor::new(&bytes)).unwrap_err();
        assert!(matches!(err, SnapshotError::Format { offset: 0, .. }));
    }

    #[test]
    fn test_unknown_version() {
        let bytes = header_bytes("2.0.0", 8, 0);
        let err = HprofHeader::parse(&mut ByteCursor::new(&bytes)).unwrap_err();
        match err {
            SnapshotError::UnsupportedVersion { version } => assert_eq!(version, "2.0.0"),
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_identifier_size() {
        let bytes = header_bytes("1.0.1", 6, 0);
        let err = HprofHeader::parse(&mut ByteCursor::new(&bytes)).unwrap_err();
        assert!(matches!(err, SnapshotError::Format { .. }));
    }

    #[test]
    fn test_header_cut_inside_timestamp() {
        let bytes = header_bytes("1.0.2", 4, 0);
        let cut = &bytes[..bytes.len() - 3];
        let err = HprofHeader::parse(&mut ByteCursor::new(cut)).unwrap_err();
        assert!(matches!(err, SnapshotError::Truncated { .. }));
    }

    #[test]
    fn test_header_cut_before_nul_is_truncation() {
        let err = HprofHeader::parse(&mut ByteCursor::new(b"JAVA PROFILE 1.0")).unwrap_err();
        match err {
            SnapshotError::Truncated { offset, .. } => assert_eq!(offset, 16),
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_long_header_is_format_error() {
        let mut bytes = MAGIC_PREFIX.to_vec();
        bytes.extend(std::iter::repeat(b'x').take(MAX_HEADER_LEN));
        let err = HprofHeader::parse(&mut ByteCursor::new(&bytes)).unwrap_err();
        assert!(matches!(err, SnapshotError::Format { offset: 0, .. }), "{err:?}");
    }

    #[test]
    fn test_short_prefix_is_truncation() {
        let err = HprofHeader::parse(&mut ByteCursor::new(b"JAVA")).unwrap_err();
        assert!(matches!(err, SnapshotError::Truncated { .. }));
    }
}
