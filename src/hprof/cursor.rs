// ============================================================================
// ByteCursor - 大端序读取 + 偏移追踪
// ============================================================================
//
// 解码交给 bytes::Buf；这里只负责两件事：
// - 每次读取前检查 remaining()，不足时返回 Truncated 而不是 panic
// - 维护绝对偏移，子切片上的错误也能报告文件内位置

use bytes::Buf;

use crate::error::SnapshotError;

/// Big-endian reader over a byte slice.
///
/// `base` is the absolute offset of the slice's first byte in the dump.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    len: usize,
    base: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_base(buf, 0)
    }

    pub fn with_base(buf: &'a [u8], base: usize) -> Self {
        Self {
            buf,
            len: buf.len(),
            base,
        }
    }

    /// Absolute offset of the next unread byte
    pub fn offset(&self) -> usize {
        self.base + (self.len - self.buf.remaining())
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    /// Unread part of the buffer
    pub fn rest(&self) -> &'a [u8] {
        self.buf
    }

    fn ensure(&self, needed: usize) -> Result<(), SnapshotError> {
        if needed > self.buf.remaining() {
            return Err(SnapshotError::Truncated {
                offset: self.offset(),
                needed,
                available: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], SnapshotError> {
        self.ensure(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// `count * width` bytes, with the multiplication checked so a hostile
    /// length cannot wrap around
    pub fn skip_elements(&mut self, count: u64, width: usize) -> Result<(), SnapshotError> {
        let len = usize::try_from(count)
            .ok()
            .and_then(|c| c.checked_mul(width))
            .unwrap_or(usize::MAX);
        self.skip(len)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), SnapshotError> {
        self.ensure(len)?;
        self.buf.advance(len);
        Ok(())
    }

    pub fn u8(&mut self) -> Result<u8, SnapshotError> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn u16(&mut self) -> Result<u16, SnapshotError> {
        self.ensure(2)?;
        Ok(self.buf.get_u16())
    }

    pub fn u32(&mut self) -> Result<u32, SnapshotError> {
        self.ensure(4)?;
        Ok(self.buf.get_u32())
    }

    pub fn u64(&mut self) -> Result<u64, SnapshotError> {
        self.ensure(8)?;
        Ok(self.buf.get_u64())
    }

    /// Object/class identifier, 4 or 8 bytes wide depending on the dump header
    pub fn id(&mut self, id_size: usize) -> Result<u64, SnapshotError> {
        match id_size {
            4 => self.u32().map(u64::from),
            8 => self.u64(),
            other => Err(SnapshotError::format(
                self.offset(),
                format!("unsupported identifier size {other}"),
            )),
        }
    }
}
