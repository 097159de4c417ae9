//! `spark-chain-buffer` 提供基于分片链的零拷贝可组合字节缓冲。
//!
//! # 模块定位（Why）
//! - 文本处理、报文组装、增量解析等场景会反复切割、拼接大段字节；
//!   若每次操作都复制数据，拷贝成本将主导整体开销。
//! - 本 crate 用“分片链”表示逻辑字节序列：每个分片是共享内存区上的一段裁剪窗口，
//!   切片与拼接只复制分片描述符，底层字节始终不动。
//!
//! # 设计概要（How）
//! - [`region`]：外部内存区能力契约 [`MemoryRegion`] 及常用实现，以 `Arc` 共享；
//! - [`fragment`]：[`Fragment`] 负责窗口裁剪算术；
//! - [`chain`]：[`FragmentChain`] 负责子区间提取、拼接、随机读取与批量拷出；
//! - [`cursor`]：[`ChainCursor`] 在分片边界之间透明移动，实现 [`RandomAccessCursor`]；
//! - [`search`]：面向游标 trait 的泛型查找/比较算法；
//! - [`config`] 与渲染：诊断转储的可配置输出。
//!
//! # 错误策略（What）
//! - 构造期越界静默裁剪，不视为错误；
//! - 访问期越界返回 [`BufferError`]，绝不返回无效字节。
//!
//! # 并发说明（Trade-offs）
//! - 区域不可变，跨线程只读共享无需加锁；单个链实例不做内部同步，
//!   需要跨线程时按值克隆（仅复制描述符）。

pub mod chain;
pub mod config;
pub mod cursor;
pub mod error;
pub mod fragment;
pub mod region;
pub mod search;

mod render;

pub use chain::FragmentChain;
pub use config::RenderConfig;
pub use cursor::{ChainBytes, ChainCursor, RandomAccessCursor};
pub use error::{BufferError, ConfigError};
pub use fragment::Fragment;
pub use region::{MemoryRegion, SharedRegion, shared};
