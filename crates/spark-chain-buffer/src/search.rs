//! 基于 [`RandomAccessCursor`] 的泛型查找与比较算法。
//!
//! # 模块定位（Why）
//! - 分片链的典型用法是“查找 → 以命中点切分 → 重新拼接”；查找必须能跨越分片边界，
//!   且命中结果要以游标形式返回，才能继续参与距离计算与切片。
//! - 算法只依赖游标 trait，任何满足契约的游标实现都可复用。
//!
//! # 契约说明（What）
//! - 区间一律为左闭右开 `[first, last)`；未命中时返回 `last`；
//! - `first` 位于 `last` 之后时视为空区间；
//! - `first` 与 `last` 不属于同一序列时返回 [`BufferError::InvalidOperation`]，
//!   不会伪装成“未命中”。

use crate::{cursor::RandomAccessCursor, error::BufferError};

/// 查找第一个满足 `predicate` 的位置。
///
/// # Errors
/// `first` 与 `last` 不属于同一序列时返回 [`BufferError::InvalidOperation`]。
pub fn position_of<C, P>(first: C, last: C, mut predicate: P) -> Result<C, BufferError>
where
    C: RandomAccessCursor,
    P: FnMut(u8) -> bool,
{
    last.distance_from(&first)?;
    let mut cursor = first;
    while cursor < last {
        match cursor.get() {
            Ok(byte) if predicate(byte) => return Ok(cursor),
            Ok(_) => cursor.step_forward(),
            Err(_) => break,
        }
    }
    Ok(last)
}

/// 查找第一个属于 `set` 的字节。
///
/// # Errors
/// 同 [`position_of`]。
pub fn find_first_of<C: RandomAccessCursor>(
    first: C,
    last: C,
    set: &[u8],
) -> Result<C, BufferError> {
    position_of(first, last, |byte| set.contains(&byte))
}

/// 查找 `needle` 第一次出现的起点；`needle` 为空时返回 `first`。
///
/// # Errors
/// 同 [`position_of`]。
pub fn search<C: RandomAccessCursor>(first: C, last: C, needle: &[u8]) -> Result<C, BufferError> {
    let span = last.distance_from(&first)?;
    let Some((&head, tail)) = needle.split_first() else {
        return Ok(first);
    };
    let Ok(needle_len) = isize::try_from(needle.len()) else {
        return Ok(last);
    };
    let mut remaining = span;
    let mut cursor = first;
    while remaining >= needle_len {
        cursor = position_of(cursor, last.clone(), |byte| byte == head)?;
        remaining = last.distance_from(&cursor)?;
        if remaining < needle_len {
            break;
        }
        let matched = tail
            .iter()
            .zip(1isize..)
            .all(|(expected, delta)| cursor.peek(delta) == Ok(*expected));
        if matched {
            return Ok(cursor);
        }
        cursor.step_forward();
        remaining -= 1;
    }
    Ok(last)
}

/// 判断 `[first, last)` 的内容是否与 `expected` 完全一致。
///
/// # Errors
/// 同 [`position_of`]。
pub fn equal<C: RandomAccessCursor>(first: C, last: C, expected: &[u8]) -> Result<bool, BufferError> {
    let span = last.distance_from(&first)?;
    if usize::try_from(span).ok() != Some(expected.len()) {
        return Ok(false);
    }
    let mut cursor = first;
    for byte in expected {
        if cursor.get() != Ok(*byte) {
            return Ok(false);
        }
        cursor.step_forward();
    }
    Ok(true)
}
