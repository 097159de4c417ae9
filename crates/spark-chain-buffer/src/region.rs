//! 内存区能力契约与常用实现。
//!
//! # 模块定位（Why）
//! - 分片链本身不关心字节的物理存放方式（堆数组、内存映射文件、网络收包块……），
//!   只消费一个不可变、定长、可按下标读取与批量拷出的能力接口。
//! - 区域通过 [`SharedRegion`] 以引用计数共享，生命周期自动延长到最后一个引用它的分片释放为止。
//!
//! # 设计概要（How）
//! - [`MemoryRegion`] 仅包含读取侧方法，实现者必须保证构造完成后内容不再变化；
//! - `bytes::Bytes`、`Vec<u8>`、`Box<[u8]>`、`String`、`&'static [u8]`、`&'static str`
//!   均通过各自的连续切片实现该契约，开箱即可作为分片链的底座。

use core::fmt;
use std::sync::Arc;

use bytes::Bytes;

/// 被分片引用的共享内存区句柄。
pub type SharedRegion = Arc<dyn MemoryRegion>;

/// `MemoryRegion` 描述分片链所依赖的外部字节来源。
///
/// # 设计背景（Why）
/// - 分片只记录 `(offset, length)` 窗口，真正的字节读取全部委派给区域，
///   从而做到切片与拼接时零拷贝。
/// - 区域在多个缓冲、多个线程间只读共享，因此要求 `Send + Sync` 且内容不可变。
///
/// # 契约说明（What）
/// - `len`：区域总字节数，构造后保持不变；
/// - `byte_at(offset)`：调用方（[`Fragment`](crate::Fragment)）通过构造期裁剪保证 `offset < len()`；
/// - `copy_out(offset, length, dest)`：拷贝 `min(length, dest.len(), len() - offset)` 字节，
///   必须返回真实拷贝数量；`offset >= len()` 时返回 0；
/// - `as_contiguous`：若底层恰好是连续内存，可暴露整段切片，默认返回 `None`。
///
/// # 风险提示（Trade-offs）
/// - 返回值是分片判断“短拷贝”的唯一依据，实现者不得虚报拷贝数量。
pub trait MemoryRegion: Send + Sync + fmt::Debug + 'static {
    /// 区域总字节数。
    fn len(&self) -> usize;

    /// 读取 `offset` 处的字节。
    fn byte_at(&self, offset: usize) -> u8;

    /// 将 `[offset, offset + length)` 拷贝至 `dest`，返回实际拷贝的字节数。
    fn copy_out(&self, offset: usize, length: usize, dest: &mut [u8]) -> usize;

    /// 判断区域是否为空。
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 暴露连续内存视图（若存在）。
    fn as_contiguous(&self) -> Option<&[u8]> {
        None
    }
}

/// 将任意区域实现包装为共享句柄。
pub fn shared<R: MemoryRegion>(region: R) -> SharedRegion {
    Arc::new(region)
}

/// 基于连续切片的拷贝实现，供各内置区域复用。
fn copy_from_slice(src: &[u8], offset: usize, length: usize, dest: &mut [u8]) -> usize {
    if offset >= src.len() {
        return 0;
    }
    let count = length.min(dest.len()).min(src.len() - offset);
    dest[..count].copy_from_slice(&src[offset..offset + count]);
    count
}

macro_rules! slice_backed_region {
    ($($ty:ty => |$this:ident| $slice:expr;)+) => {
        $(
            impl MemoryRegion for $ty {
                fn len(&self) -> usize {
                    let $this = self;
                    $slice.len()
                }

                fn byte_at(&self, offset: usize) -> u8 {
                    let $this = self;
                    $slice[offset]
                }

                fn copy_out(&self, offset: usize, length: usize, dest: &mut [u8]) -> usize {
                    let $this = self;
                    copy_from_slice($slice, offset, length, dest)
                }

                fn as_contiguous(&self) -> Option<&[u8]> {
                    let $this = self;
                    Some($slice)
                }
            }
        )+
    };
}

slice_backed_region! {
    Bytes => |this| &this[..];
    Vec<u8> => |this| this.as_slice();
    Box<[u8]> => |this| &this[..];
    String => |this| this.as_bytes();
    &'static [u8] => |this| *this;
    &'static str => |this| this.as_bytes();
}
