//! 分片链上的随机访问游标。
//!
//! # 模块定位（Why）
//! - 逻辑字节分散在多个分片中，查找/比较算法却希望面对一条连续序列；
//!   游标以 `(分片下标, 分片内偏移)` 表示位置，在分片边界之间透明穿梭。
//! - [`RandomAccessCursor`] 把游标能力抽象成 trait，外部的泛型算法（见 [`crate::search`]）
//!   只依赖该契约，无需了解分片链的内部结构。
//!
//! # 状态约定（What）
//! - 规范位置：要么 `offset < 当前分片长度`，要么是末尾位置 `(分片数, 0)`；
//!   零长度分片在规范化时被跳过，因此每个逻辑偏移恰好对应一个规范位置，
//!   相等性与排序按 `(分片下标, 偏移)` 比较即与逻辑位置一致。
//! - 游标借用所遍历的链：在游标存活期间链不可被修改，这一约束由借用检查器静态保证。
//! - 越界的 `advance` 会夹紧到首/尾；越界的读取（`get`/`peek`）返回错误而非垃圾值。

use core::{
    cmp::Ordering,
    fmt,
    iter::FusedIterator,
    ops::{Add, AddAssign, Sub, SubAssign},
    ptr,
};

use tracing::debug;

use crate::{chain::FragmentChain, error::BufferError, fragment::Fragment};

/// 可被泛型查找/比较算法驱动的随机访问游标能力。
///
/// # 契约说明（What）
/// - `get`/`peek` 越界时返回 [`BufferError`]，不得返回无效字节；
/// - `step_forward` 在末尾、`step_back` 在起点时为空操作；
/// - `advance` 越界时夹紧到起点或末尾；
/// - `distance_from` 仅对同一底层序列上的游标有意义，否则返回 `InvalidOperation`；
/// - `PartialOrd` 必须与逻辑位置一致。
pub trait RandomAccessCursor: Clone + PartialEq + PartialOrd {
    /// 读取当前位置的字节。
    fn get(&self) -> Result<u8, BufferError>;

    /// 读取相对当前位置 `delta` 处的字节，不移动游标。
    fn peek(&self, delta: isize) -> Result<u8, BufferError>;

    /// 前进一个字节。
    fn step_forward(&mut self);

    /// 后退一个字节。
    fn step_back(&mut self);

    /// 前进（或后退）`delta` 个字节。
    fn advance(&mut self, delta: isize);

    /// 计算 `self - other` 的有符号距离。
    fn distance_from(&self, other: &Self) -> Result<isize, BufferError>;
}

/// [`FragmentChain`] 上的游标。
#[derive(Clone, Copy)]
pub struct ChainCursor<'a> {
    chain: &'a FragmentChain,
    fragment: usize,
    offset: usize,
}

impl<'a> ChainCursor<'a> {
    /// 指向首个逻辑字节；空链上与 [`ChainCursor::end`] 相等。
    pub fn begin(chain: &'a FragmentChain) -> Self {
        Self::at(chain, 0, 0)
    }

    /// 末尾之后的规范位置 `(分片数, 0)`。
    pub fn end(chain: &'a FragmentChain) -> Self {
        Self {
            chain,
            fragment: chain.fragment_count(),
            offset: 0,
        }
    }

    /// 构造并规范化：跨过 `offset` 已达分片长度的分片（包括零长度分片）。
    fn at(chain: &'a FragmentChain, mut fragment: usize, mut offset: usize) -> Self {
        let fragments = chain.fragments();
        while fragment < fragments.len() && offset >= fragments[fragment].len() {
            offset -= fragments[fragment].len();
            fragment += 1;
        }
        if fragment >= fragments.len() {
            fragment = fragments.len();
            offset = 0;
        }
        Self {
            chain,
            fragment,
            offset,
        }
    }

    fn fragments(&self) -> &'a [Fragment] {
        self.chain.fragments()
    }

    /// 游标所属的链。
    pub fn chain(&self) -> &'a FragmentChain {
        self.chain
    }

    /// 当前分片下标；末尾时等于分片数。
    pub fn fragment_index(&self) -> usize {
        self.fragment
    }

    /// 当前分片内偏移；末尾时为 0。
    pub fn fragment_offset(&self) -> usize {
        self.offset
    }

    /// 当前逻辑偏移。
    pub fn position(&self) -> usize {
        self.fragments()[..self.fragment]
            .iter()
            .map(Fragment::len)
            .sum::<usize>()
            + self.offset
    }

    pub fn is_end(&self) -> bool {
        self.fragment >= self.fragments().len()
    }

    pub fn is_begin(&self) -> bool {
        *self == Self::begin(self.chain)
    }

    /// 解引用当前位置。
    ///
    /// # Errors
    /// 位于末尾时返回 [`BufferError::CursorOutOfRange`]。
    pub fn get(&self) -> Result<u8, BufferError> {
        if self.is_end() {
            return Err(self.out_of_range(0));
        }
        self.fragments()[self.fragment].byte_at(self.offset)
    }

    /// 读取相对当前位置 `delta` 处的字节，游标本身不动。
    ///
    /// # Errors
    /// 目标位置在首字节之前或末字节之后时返回 [`BufferError::CursorOutOfRange`]。
    pub fn peek(&self, delta: isize) -> Result<u8, BufferError> {
        match self.seek(delta) {
            Ok((fragment, offset)) if fragment < self.fragments().len() => {
                self.fragments()[fragment].byte_at(offset)
            }
            _ => Err(self.out_of_range(delta)),
        }
    }

    /// 前进一个字节；末尾处为空操作。
    pub fn step_forward(&mut self) {
        if self.is_end() {
            return;
        }
        *self = Self::at(self.chain, self.fragment, self.offset + 1);
    }

    /// 后退一个字节；起点处为空操作。
    ///
    /// 分片内偏移为 0 时，落到前一个非空分片的最后一个字节。
    pub fn step_back(&mut self) {
        if self.offset > 0 {
            self.offset -= 1;
            return;
        }
        let fragments = self.fragments();
        let mut index = self.fragment;
        while index > 0 {
            index -= 1;
            let len = fragments[index].len();
            if len > 0 {
                self.fragment = index;
                self.offset = len - 1;
                return;
            }
        }
    }

    /// 移动 `delta` 个字节，越界时夹紧到起点或末尾。
    pub fn advance(&mut self, delta: isize) {
        let (fragment, offset) = match self.seek(delta) {
            Ok(landing) => landing,
            Err(clamped) => {
                debug!(
                    position = self.position(),
                    delta,
                    length = self.chain.len(),
                    "cursor advance clamped"
                );
                clamped
            }
        };
        self.fragment = fragment;
        self.offset = offset;
    }

    /// 返回移动 `delta` 后的新游标。
    #[must_use]
    pub fn offset_by(mut self, delta: isize) -> Self {
        self.advance(delta);
        self
    }

    /// 计算 `self - other`。
    ///
    /// 从较早的位置逐分片走到较晚的位置累加跨度。
    ///
    /// # Errors
    /// 两个游标属于不同链实例时返回 [`BufferError::InvalidOperation`]。
    pub fn distance_from(&self, other: &ChainCursor<'_>) -> Result<isize, BufferError> {
        if !ptr::eq(self.chain, other.chain) {
            return Err(BufferError::cross_chain("distance_from"));
        }
        let self_key = (self.fragment, self.offset);
        let other_key = (other.fragment, other.offset);
        let (earlier, later, sign) = if self_key >= other_key {
            (other_key, self_key, 1)
        } else {
            (self_key, other_key, -1)
        };
        let span = if earlier.0 == later.0 {
            later.1 - earlier.1
        } else {
            let fragments = self.fragments();
            fragments[earlier.0].len() - earlier.1
                + fragments[earlier.0 + 1..later.0]
                    .iter()
                    .map(Fragment::len)
                    .sum::<usize>()
                + later.1
        };
        Ok(sign * isize::try_from(span).unwrap_or(isize::MAX))
    }

    /// 计算从当前位置移动 `delta` 后的规范位置。
    ///
    /// 返回 `Err` 表示越界，携带的是夹紧后的位置（起点或末尾）。
    fn seek(&self, delta: isize) -> Result<(usize, usize), (usize, usize)> {
        let fragments = self.fragments();
        let count = fragments.len();
        let mut fragment = self.fragment;
        let mut offset = self.offset;
        let mut todo = delta.unsigned_abs();

        if delta >= 0 {
            while fragment < count {
                let available = fragments[fragment].len() - offset;
                if todo < available {
                    return Ok((fragment, offset + todo));
                }
                todo -= available;
                fragment += 1;
                offset = 0;
            }
            return if todo == 0 {
                Ok((count, 0))
            } else {
                Err((count, 0))
            };
        }

        loop {
            if todo <= offset {
                let landing = Self::at(self.chain, fragment, offset - todo);
                return Ok((landing.fragment, landing.offset));
            }
            todo -= offset;
            if fragment == 0 {
                let begin = Self::begin(self.chain);
                return Err((begin.fragment, begin.offset));
            }
            fragment -= 1;
            offset = fragments[fragment].len();
        }
    }

    fn out_of_range(&self, delta: isize) -> BufferError {
        BufferError::CursorOutOfRange {
            position: self.position(),
            delta,
            length: self.chain.len(),
        }
    }
}

impl RandomAccessCursor for ChainCursor<'_> {
    fn get(&self) -> Result<u8, BufferError> {
        Self::get(self)
    }

    fn peek(&self, delta: isize) -> Result<u8, BufferError> {
        Self::peek(self, delta)
    }

    fn step_forward(&mut self) {
        Self::step_forward(self);
    }

    fn step_back(&mut self) {
        Self::step_back(self);
    }

    fn advance(&mut self, delta: isize) {
        Self::advance(self, delta);
    }

    fn distance_from(&self, other: &Self) -> Result<isize, BufferError> {
        Self::distance_from(self, other)
    }
}

impl fmt::Debug for ChainCursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainCursor")
            .field("fragment", &self.fragment)
            .field("offset", &self.offset)
            .finish()
    }
}

impl PartialEq for ChainCursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.chain, other.chain)
            && self.fragment == other.fragment
            && self.offset == other.offset
    }
}

impl Eq for ChainCursor<'_> {}

impl PartialOrd for ChainCursor<'_> {
    /// 不同链上的游标不可比较，返回 `None`。
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if !ptr::eq(self.chain, other.chain) {
            return None;
        }
        Some((self.fragment, self.offset).cmp(&(other.fragment, other.offset)))
    }
}

impl AddAssign<isize> for ChainCursor<'_> {
    fn add_assign(&mut self, delta: isize) {
        self.advance(delta);
    }
}

impl SubAssign<isize> for ChainCursor<'_> {
    fn sub_assign(&mut self, delta: isize) {
        self.advance(delta.checked_neg().unwrap_or(isize::MAX));
    }
}

impl<'a> Add<isize> for ChainCursor<'a> {
    type Output = ChainCursor<'a>;

    fn add(self, delta: isize) -> ChainCursor<'a> {
        self.offset_by(delta)
    }
}

impl<'a> Sub<isize> for ChainCursor<'a> {
    type Output = ChainCursor<'a>;

    fn sub(mut self, delta: isize) -> ChainCursor<'a> {
        self -= delta;
        self
    }
}

/// 由一对游标驱动的逐字节迭代器，支持双端迭代。
#[derive(Clone, Debug)]
pub struct ChainBytes<'a> {
    front: ChainCursor<'a>,
    back: ChainCursor<'a>,
    remaining: usize,
}

impl<'a> ChainBytes<'a> {
    /// 覆盖整条链的迭代器，两端游标天然属于同一条链。
    pub(crate) fn over(chain: &'a FragmentChain) -> Self {
        Self {
            front: chain.begin(),
            back: chain.end(),
            remaining: chain.len(),
        }
    }
}

impl Iterator for ChainBytes<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.remaining == 0 {
            return None;
        }
        let byte = self.front.get().ok()?;
        self.front.step_forward();
        self.remaining -= 1;
        Some(byte)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for ChainBytes<'_> {
    fn next_back(&mut self) -> Option<u8> {
        if self.remaining == 0 {
            return None;
        }
        self.back.step_back();
        self.remaining -= 1;
        self.back.get().ok()
    }
}

impl ExactSizeIterator for ChainBytes<'_> {}

impl FusedIterator for ChainBytes<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    /// "0123456789" + "23456"，在逻辑偏移 10 处跨越分片边界。
    fn two_fragments() -> FragmentChain {
        let mut chain = FragmentChain::from("0123456789");
        let tail = chain.sub_buffer(2, 5);
        chain += &tail;
        chain
    }

    #[test]
    fn begin_and_end_positions() {
        let chain = two_fragments();
        let begin = chain.begin();
        let end = chain.end();
        assert_eq!((begin.fragment_index(), begin.fragment_offset()), (0, 0));
        assert_eq!((end.fragment_index(), end.fragment_offset()), (2, 0));
        assert!(begin.is_begin() && end.is_end());
        assert_eq!(end.position(), 15);
    }

    #[test]
    fn empty_fragments_collapse_begin_onto_end() {
        let chain = FragmentChain::from("") + FragmentChain::from("");
        assert_eq!(chain.begin(), chain.end());
        assert!(chain.begin().get().is_err());
    }

    #[test]
    fn step_forward_crosses_boundary_and_saturates() {
        let chain = two_fragments();
        let mut cursor = chain.begin().offset_by(9);
        assert_eq!(cursor.get(), Ok(b'9'));
        cursor.step_forward();
        assert_eq!((cursor.fragment_index(), cursor.fragment_offset()), (1, 0));
        assert_eq!(cursor.get(), Ok(b'2'));

        let mut end = chain.end();
        end.step_forward();
        assert_eq!(end, chain.end());
    }

    #[test]
    fn step_back_lands_on_last_byte_of_previous_fragment() {
        let chain = two_fragments();
        let mut cursor = chain.begin().offset_by(10);
        cursor.step_back();
        assert_eq!((cursor.fragment_index(), cursor.fragment_offset()), (0, 9));
        assert_eq!(cursor.get(), Ok(b'9'));

        let mut begin = chain.begin();
        begin.step_back();
        assert_eq!(begin, chain.begin());
    }

    #[test]
    fn step_back_skips_empty_fragments() {
        let chain = FragmentChain::from("ab") + FragmentChain::from("") + FragmentChain::from("c");
        let mut cursor = chain.begin().offset_by(2);
        assert_eq!(cursor.get(), Ok(b'c'));
        cursor.step_back();
        assert_eq!(cursor.get(), Ok(b'b'));
        assert_eq!(cursor.fragment_index(), 0);
    }

    #[test]
    fn peek_reads_both_directions_without_moving() {
        let chain = two_fragments();
        let cursor = chain.begin().offset_by(8);
        assert_eq!(cursor.peek(3), Ok(b'3'));
        assert_eq!(cursor.peek(-8), Ok(b'0'));
        assert_eq!(cursor.peek(6), Ok(b'6'));
        assert_eq!(cursor.position(), 8);
        assert_eq!(
            cursor.peek(7),
            Err(BufferError::CursorOutOfRange {
                position: 8,
                delta: 7,
                length: 15
            })
        );
        assert!(cursor.peek(-9).is_err());
    }

    #[test]
    fn advance_clamps_at_both_ends() {
        let chain = two_fragments();
        let mut cursor = chain.begin();
        cursor += 100;
        assert_eq!(cursor, chain.end());
        cursor -= 4;
        assert_eq!(cursor.get(), Ok(b'3'));
        cursor += -100;
        assert_eq!(cursor, chain.begin());
    }

    #[test]
    fn distance_walks_across_fragments() {
        let chain = two_fragments();
        let a = chain.begin().offset_by(3);
        let b = chain.begin().offset_by(12);
        assert_eq!(b.distance_from(&a), Ok(9));
        assert_eq!(a.distance_from(&b), Ok(-9));
        assert_eq!(chain.end().distance_from(&chain.begin()), Ok(15));
        assert_eq!(a + 9, b);
        assert_eq!(b - 9, a);
    }

    #[test]
    fn cross_chain_cursors_are_rejected() {
        let left = FragmentChain::from("abc");
        let right = FragmentChain::from("abc");
        let err = left.begin().distance_from(&right.begin()).unwrap_err();
        assert_eq!(err, BufferError::cross_chain("distance_from"));
        assert_eq!(left.begin().partial_cmp(&right.begin()), None);
        assert_ne!(left.begin(), right.begin());
    }

    #[test]
    fn ordering_follows_logical_position() {
        let chain = two_fragments();
        let a = chain.begin().offset_by(9);
        let b = chain.begin().offset_by(10);
        assert!(a < b);
        assert!(b < chain.end());
        assert!(chain.begin() <= a);
    }

    #[test]
    fn chain_bytes_iterates_from_both_ends() {
        let chain = two_fragments();
        let forward: Vec<u8> = chain.iter().collect();
        assert_eq!(forward, b"012345678923456");
        let backward: Vec<u8> = chain.iter().rev().collect();
        assert_eq!(backward, b"654329876543210");
        let mut iter = chain.iter();
        assert_eq!(iter.len(), 15);
        assert_eq!(iter.next(), Some(b'0'));
        assert_eq!(iter.next_back(), Some(b'6'));
        assert_eq!(iter.len(), 13);
    }

    #[traced_test]
    #[test]
    fn clamping_is_logged() {
        let chain = FragmentChain::from("abc");
        let mut cursor = chain.begin();
        cursor.advance(10);
        assert!(logs_contain("cursor advance clamped"));
    }
}
