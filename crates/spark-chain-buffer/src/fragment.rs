use core::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::{error::BufferError, region::SharedRegion};

/// `Fragment` 是分片链的最小单元：共享内存区上一段经过裁剪的只读窗口。
///
/// # 设计动机（Why）
/// - 切片与拼接只需复制 `(region, offset, length)` 三元组，不触碰底层字节；
/// - 区域以 `Arc` 共享，分片析构只释放一次引用计数，最后一个分片释放时区域才真正销毁。
///
/// # 不变式（What）
/// - 始终满足 `offset + length <= region.len()`；
/// - 该不变式在每个构造点通过**裁剪**维护而非报错：起点越界则收缩为 `offset = 0, length = 0`，
///   长度越界则截断到区域剩余长度；
/// - 构造完成后不可变，`Clone` 仅复制描述符。
///
/// # 风险与取舍（Trade-offs）
/// - 裁剪是刻意的“防御式”策略，便于上层切片代码自由做算术而无需逐次校验范围；
///   代价是调用方拼错范围时不会得到任何报错，仅有 `trace` 级日志可供排查。
#[derive(Clone)]
pub struct Fragment {
    region: SharedRegion,
    offset: usize,
    length: usize,
}

impl Fragment {
    /// 在 `region` 上构造窗口 `[offset, offset + length)`，越界部分被静默裁剪。
    pub fn new(region: SharedRegion, offset: usize, length: usize) -> Self {
        let region_len = region.len();
        let (clipped_offset, clipped_length) = if offset >= region_len {
            (0, 0)
        } else {
            (offset, length.min(region_len - offset))
        };
        if clipped_offset != offset || clipped_length != length {
            trace!(
                requested_offset = offset,
                requested_length = length,
                region_len,
                offset = clipped_offset,
                length = clipped_length,
                "fragment window clipped to region"
            );
        }
        Self {
            region,
            offset: clipped_offset,
            length: clipped_length,
        }
    }

    /// 覆盖整个区域的窗口。
    pub fn whole(region: SharedRegion) -> Self {
        let length = region.len();
        Self {
            region,
            offset: 0,
            length,
        }
    }

    /// 以自身窗口为参照派生子窗口。
    ///
    /// # 契约说明（What）
    /// - 裁剪的边界是**本分片**的窗口而非原始区域，保证子窗口永远落在父窗口之内；
    /// - `rel_offset` 严格超出本窗口末尾时，结果为零长度且定位在本窗口起点；
    /// - `rel_offset + rel_length` 超出本窗口时，长度截断到窗口剩余部分。
    pub fn sub_fragment(&self, rel_offset: usize, rel_length: usize) -> Self {
        let (offset, length) = if rel_offset > self.length {
            (self.offset, 0)
        } else {
            (
                self.offset + rel_offset,
                rel_length.min(self.length - rel_offset),
            )
        };
        if length != rel_length {
            trace!(
                rel_offset,
                rel_length,
                window = self.length,
                length,
                "sub-fragment clipped to parent window"
            );
        }
        Self {
            region: Arc::clone(&self.region),
            offset,
            length,
        }
    }

    /// 读取窗口内 `local` 处的字节。
    ///
    /// # Errors
    /// `local >= len()` 时返回 [`BufferError::OutOfRange`]。
    pub fn byte_at(&self, local: usize) -> Result<u8, BufferError> {
        if local >= self.length {
            return Err(BufferError::OutOfRange {
                offset: local,
                length: self.length,
            });
        }
        Ok(self.region.byte_at(self.offset + local))
    }

    /// 从窗口内 `local` 处开始拷贝至多 `max_len` 字节，绝不越过窗口末尾。
    pub fn copy_out(&self, local: usize, max_len: usize, dest: &mut [u8]) -> usize {
        if local >= self.length {
            return 0;
        }
        let count = max_len.min(self.length - local);
        self.region.copy_out(self.offset + local, count, dest)
    }

    /// 将整个窗口拷出为 `Vec<u8>`。
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.length];
        let written = self.copy_out(0, self.length, &mut out);
        out.truncate(written);
        out
    }

    /// 窗口在区域中的起始偏移。
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 窗口长度。
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// 底层共享区域。
    pub fn region(&self) -> &SharedRegion {
        &self.region
    }

    /// 判断两个分片是否引用同一块区域。
    pub fn shares_region_with(&self, other: &Fragment) -> bool {
        Arc::ptr_eq(&self.region, &other.region)
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("offset", &self.offset)
            .field("length", &self.length)
            .field("region_len", &self.region.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::shared;
    use tracing_test::traced_test;

    fn digits() -> SharedRegion {
        shared("0123456789")
    }

    #[test]
    fn construction_clips_length_to_region() {
        let frag = Fragment::new(digits(), 7, 10);
        assert_eq!((frag.offset(), frag.len()), (7, 3));
        assert_eq!(frag.to_vec(), b"789");
    }

    #[test]
    fn construction_beyond_region_yields_empty_window() {
        let frag = Fragment::new(digits(), 10, 4);
        assert_eq!((frag.offset(), frag.len()), (0, 0));
        assert!(frag.is_empty());
    }

    #[test]
    fn sub_fragment_is_clipped_against_parent_window() {
        let parent = Fragment::new(digits(), 2, 5);
        let child = parent.sub_fragment(3, 10);
        assert_eq!((child.offset(), child.len()), (5, 2));
        assert_eq!(child.to_vec(), b"56");

        let beyond = parent.sub_fragment(6, 1);
        assert_eq!((beyond.offset(), beyond.len()), (2, 0));

        let at_end = parent.sub_fragment(5, 1);
        assert_eq!((at_end.offset(), at_end.len()), (7, 0));
        assert!(child.shares_region_with(&parent));
    }

    #[test]
    fn byte_at_rejects_positions_outside_window() {
        let frag = Fragment::new(digits(), 2, 3);
        assert_eq!(frag.byte_at(0), Ok(b'2'));
        assert_eq!(frag.byte_at(2), Ok(b'4'));
        assert_eq!(
            frag.byte_at(3),
            Err(BufferError::OutOfRange {
                offset: 3,
                length: 3
            })
        );
    }

    #[test]
    fn copy_out_never_reads_past_window() {
        let frag = Fragment::new(digits(), 2, 3);
        let mut dest = [0u8; 8];
        assert_eq!(frag.copy_out(1, 8, &mut dest), 2);
        assert_eq!(&dest[..2], b"34");
        assert_eq!(frag.copy_out(3, 8, &mut dest), 0);
    }

    #[traced_test]
    #[test]
    fn clipping_is_traced() {
        let _ = Fragment::new(digits(), 4, 100);
        assert!(logs_contain("fragment window clipped to region"));
    }
}
