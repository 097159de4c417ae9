use core::{
    fmt,
    ops::{Add, AddAssign},
    ptr,
};

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::{
    config::RenderConfig,
    cursor::{ChainBytes, ChainCursor},
    error::BufferError,
    fragment::Fragment,
    region::{MemoryRegion, SharedRegion, shared},
    render,
};

/// `FragmentChain` 是由有序分片组成的逻辑字节序列。
///
/// # 设计动机（Why）
/// - 文本处理、报文组装、增量解析等场景需要反复切割、重组大段字节；
///   若每次切片/拼接都复制数据，拷贝成本会主导整体开销。
/// - 分片链只维护分片描述符列表，切片与拼接均为 `O(分片数)` 的描述符操作，底层字节始终零拷贝。
///
/// # 架构关系（How）
/// - 每个 [`Fragment`] 指向一块共享 [`MemoryRegion`] 的裁剪窗口；
/// - 逻辑内容 = 按顺序拼接所有分片的内容，零长度分片合法且不贡献字节（不会被清理）；
/// - [`ChainCursor`] 在分片边界之间透明移动，供查找/比较算法使用。
///
/// # 契约说明（What）
/// - 构造期的范围越界一律静默裁剪（见 [`FragmentChain::sub_buffer`]）；
/// - 访问期越界（[`FragmentChain::byte_at`]、游标解引用）返回 [`BufferError`]；
/// - `len()` 每次重新累加，不做缓存，避免在每次变更时维护失效逻辑。
///
/// # 并发说明（Trade-offs）
/// - 区域不可变，因此多个链、多个线程共享同一区域无需加锁；
/// - 单个链实例的分片列表本身不带同步，跨线程时请按值克隆（只复制描述符）。
#[derive(Clone, Default)]
pub struct FragmentChain {
    fragments: Vec<Fragment>,
}

impl FragmentChain {
    /// 创建空链。
    pub fn new() -> Self {
        Self::default()
    }

    /// 以整块区域构造单分片链。
    pub fn from_region(region: SharedRegion) -> Self {
        Self {
            fragments: vec![Fragment::whole(region)],
        }
    }

    /// 接管任意区域实现并构造单分片链。
    pub fn from_provider<R: MemoryRegion>(region: R) -> Self {
        Self::from_region(shared(region))
    }

    /// 以既有分片列表构造链。
    pub fn from_fragments(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }

    /// 截取逻辑区间 `[offset, offset + length)`，返回共享底层区域的新链。
    ///
    /// # 执行逻辑（How）
    /// 1. `offset >= len()` 时直接返回空链；`offset + length` 超出末尾时静默截断；
    /// 2. 顺序遍历源分片并累加每个分片的逻辑起点；
    /// 3. 与目标区间相交的分片以 [`Fragment::sub_fragment`] 裁出交集，追加到结果并扣减剩余长度；
    /// 4. 剩余长度归零或源分片耗尽即停止。
    ///
    /// # 契约说明（What）
    /// - 结果的字节序与边界与源链对应区间完全一致，跨越多个分片边界时拆成对应的多个子分片；
    /// - 不发生任何字节拷贝。
    pub fn sub_buffer(&self, offset: usize, length: usize) -> FragmentChain {
        let source_len = self.len();
        if offset >= source_len {
            debug!(offset, length, source_len, "sub-range starts past end, empty chain");
            return FragmentChain::new();
        }
        let mut remaining = length.min(source_len - offset);
        if remaining != length {
            debug!(
                offset,
                length,
                source_len,
                truncated = remaining,
                "sub-range length truncated"
            );
        }

        let mut fragments = Vec::new();
        let mut copy_from = offset;
        let mut fragment_start = 0usize;
        for source in &self.fragments {
            if remaining == 0 {
                break;
            }
            let fragment_end = fragment_start + source.len();
            if fragment_end > copy_from {
                let piece = source.sub_fragment(copy_from - fragment_start, remaining);
                remaining -= piece.len();
                copy_from += piece.len();
                fragments.push(piece);
            }
            fragment_start = fragment_end;
        }

        debug!(
            offset,
            length,
            source_fragments = self.fragments.len(),
            fragments = fragments.len(),
            "sub-range extracted"
        );
        FragmentChain { fragments }
    }

    /// 截取从 `offset` 到末尾的部分。
    pub fn slice_from(&self, offset: usize) -> FragmentChain {
        self.sub_buffer(offset, self.len().saturating_sub(offset))
    }

    /// 以同一链上的两个游标界定区间 `[from, to)`。
    ///
    /// # Errors
    /// 游标不属于本链时返回 [`BufferError::InvalidOperation`]。`to` 位于 `from` 之前时得到空链。
    pub fn slice_between(
        &self,
        from: &ChainCursor<'_>,
        to: &ChainCursor<'_>,
    ) -> Result<FragmentChain, BufferError> {
        if !ptr::eq(from.chain(), self) || !ptr::eq(to.chain(), self) {
            return Err(BufferError::cross_chain("slice_between"));
        }
        let start = from.position();
        let end = to.position();
        Ok(self.sub_buffer(start, end.saturating_sub(start)))
    }

    /// 将 `other` 的分片追加到本链末尾。
    ///
    /// 先把 `other` 的分片列表快照到临时向量，再修改自身；
    /// 源与目标别名时，这一顺序保证不会读到正在增长的列表。
    pub fn append(&mut self, other: &FragmentChain) {
        let snapshot: Vec<Fragment> = other.fragments.clone();
        self.extend_fragments(snapshot);
    }

    /// 将自身内容再追加一遍（`b += b`）。
    ///
    /// 借用规则不允许 `b.append(&b)`，因此单独提供；同样遵循“先快照、后修改”。
    pub fn append_self(&mut self) {
        let snapshot: Vec<Fragment> = self.fragments.clone();
        self.extend_fragments(snapshot);
    }

    fn extend_fragments(&mut self, snapshot: Vec<Fragment>) {
        let before = self.fragments.len();
        self.fragments.reserve(snapshot.len());
        self.fragments.extend(snapshot);
        debug!(
            before,
            after = self.fragments.len(),
            "fragments appended"
        );
    }

    /// 逻辑长度（所有分片长度之和）。
    pub fn len(&self) -> usize {
        self.fragments.iter().map(Fragment::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.iter().all(Fragment::is_empty)
    }

    /// 分片数量（含零长度分片）。
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// 读取逻辑偏移 `offset` 处的字节。
    ///
    /// # Errors
    /// `offset >= len()` 时返回 [`BufferError::OutOfRange`]。
    pub fn byte_at(&self, offset: usize) -> Result<u8, BufferError> {
        let mut local = offset;
        for fragment in &self.fragments {
            if local < fragment.len() {
                return fragment.byte_at(local);
            }
            local -= fragment.len();
        }
        Err(BufferError::OutOfRange {
            offset,
            length: self.len(),
        })
    }

    /// 从逻辑偏移 `offset` 开始拷贝至多 `length` 字节到 `dest`，返回实际写入数量。
    ///
    /// 完全位于 `offset` 之前的分片被跳过；首个重叠分片从其内部残余偏移处拷贝，
    /// 之后的分片从 0 开始，直到写满 `length`（受 `dest.len()` 约束）或分片耗尽。
    pub fn copy_out(&self, offset: usize, length: usize, dest: &mut [u8]) -> usize {
        let wanted = length.min(dest.len());
        let mut local = offset;
        let mut written = 0usize;
        for fragment in &self.fragments {
            if written == wanted {
                break;
            }
            if local < fragment.len() {
                written += fragment.copy_out(local, wanted - written, &mut dest[written..]);
                local = 0;
            } else {
                local -= fragment.len();
            }
        }
        written
    }

    /// 将逻辑内容拷出为 `Vec<u8>`。
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.len()];
        let written = self.copy_out(0, out.len(), &mut out);
        out.truncate(written);
        out
    }

    /// 将逻辑内容扁平化为连续的 `Bytes`。
    pub fn to_bytes(&self) -> Bytes {
        let mut out = BytesMut::zeroed(self.len());
        let written = self.copy_out(0, out.len(), &mut out);
        out.truncate(written);
        out.freeze()
    }

    /// 指向首字节的游标。
    pub fn begin(&self) -> ChainCursor<'_> {
        ChainCursor::begin(self)
    }

    /// 指向末尾之后位置的游标。
    pub fn end(&self) -> ChainCursor<'_> {
        ChainCursor::end(self)
    }

    /// 按逻辑顺序逐字节迭代。
    pub fn iter(&self) -> ChainBytes<'_> {
        ChainBytes::over(self)
    }

    /// 以指定配置渲染诊断文本。
    pub fn render(&self, config: &RenderConfig) -> String {
        render::render_chain(self, config)
    }
}

impl fmt::Debug for FragmentChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentChain")
            .field("len", &self.len())
            .field("fragments", &self.fragments)
            .finish()
    }
}

impl fmt::Display for FragmentChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&RenderConfig::default()))
    }
}

impl<'a> IntoIterator for &'a FragmentChain {
    type Item = u8;
    type IntoIter = ChainBytes<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for FragmentChain {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for FragmentChain {}

impl PartialEq<[u8]> for FragmentChain {
    fn eq(&self, other: &[u8]) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter().copied())
    }
}

impl PartialEq<&[u8]> for FragmentChain {
    fn eq(&self, other: &&[u8]) -> bool {
        *self == **other
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for FragmentChain {
    fn eq(&self, other: &&[u8; N]) -> bool {
        *self == other[..]
    }
}

impl PartialEq<str> for FragmentChain {
    fn eq(&self, other: &str) -> bool {
        *self == *other.as_bytes()
    }
}

impl PartialEq<&str> for FragmentChain {
    fn eq(&self, other: &&str) -> bool {
        *self == *other.as_bytes()
    }
}

impl AddAssign<&FragmentChain> for FragmentChain {
    fn add_assign(&mut self, rhs: &FragmentChain) {
        self.append(rhs);
    }
}

impl AddAssign for FragmentChain {
    fn add_assign(&mut self, rhs: FragmentChain) {
        self.extend_fragments(rhs.fragments);
    }
}

impl Add<&FragmentChain> for &FragmentChain {
    type Output = FragmentChain;

    fn add(self, rhs: &FragmentChain) -> FragmentChain {
        let mut out = self.clone();
        out.append(rhs);
        out
    }
}

impl Add<&FragmentChain> for FragmentChain {
    type Output = FragmentChain;

    fn add(mut self, rhs: &FragmentChain) -> FragmentChain {
        self.append(rhs);
        self
    }
}

impl Add for FragmentChain {
    type Output = FragmentChain;

    fn add(mut self, rhs: FragmentChain) -> FragmentChain {
        self += rhs;
        self
    }
}

impl FromIterator<FragmentChain> for FragmentChain {
    fn from_iter<I: IntoIterator<Item = FragmentChain>>(iter: I) -> Self {
        let mut out = FragmentChain::new();
        for chain in iter {
            out += chain;
        }
        out
    }
}

impl From<SharedRegion> for FragmentChain {
    fn from(region: SharedRegion) -> Self {
        Self::from_region(region)
    }
}

impl From<Bytes> for FragmentChain {
    fn from(bytes: Bytes) -> Self {
        Self::from_provider(bytes)
    }
}

impl From<Vec<u8>> for FragmentChain {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_provider(bytes)
    }
}

impl From<String> for FragmentChain {
    fn from(text: String) -> Self {
        Self::from_provider(text)
    }
}

impl From<&'static [u8]> for FragmentChain {
    fn from(bytes: &'static [u8]) -> Self {
        Self::from_provider(bytes)
    }
}

impl From<&'static str> for FragmentChain {
    fn from(text: &'static str) -> Self {
        Self::from_provider(text)
    }
}
