//! 位图操作
//!
//! 第 `idx` 位位于第 `idx / 8` 字节的第 `idx % 8` 位，
//! 与小端 `unsigned long` 数组上的内核 `set_bit()` 布局一致。

use crate::{
    consts::*,
    error::{Error, ErrorKind, Result},
};

/// 容纳 `bits` 个位所需的字节数（按位图存储单元向上取整）
pub const fn bitmap_bytes(bits: u32) -> usize {
    let units = (bits as usize).div_ceil(BITMAP_UNIT_BITS as usize);
    units * BITMAP_UNIT_BYTES
}

/// 测试某一位是否置位
pub fn test_bit(bitmap: &[u8], idx: u32) -> bool {
    bitmap
        .get((idx / 8) as usize)
        .is_some_and(|byte| (byte >> (idx % 8)) & 1 == 1)
}

/// 置位
pub fn set_bit(bitmap: &mut [u8], idx: u32) -> Result<()> {
    let byte = bitmap
        .get_mut((idx / 8) as usize)
        .ok_or(Error::new(ErrorKind::OutOfBounds, "bit index outside bitmap"))?;
    *byte |= 1 << (idx % 8);
    Ok(())
}

/// 清除某一位
pub fn clear_bit(bitmap: &mut [u8], idx: u32) -> Result<()> {
    let byte = bitmap
        .get_mut((idx / 8) as usize)
        .ok_or(Error::new(ErrorKind::OutOfBounds, "bit index outside bitmap"))?;
    *byte &= !(1 << (idx % 8));
    Ok(())
}

/// 将 `[start, start + count)` 全部置位
pub fn set_range(bitmap: &mut [u8], start: u32, count: u32) -> Result<()> {
    let end = range_end(bitmap, start, count)?;
    (start..end).try_for_each(|idx| set_bit(bitmap, idx))
}

/// 将 `[start, start + count)` 全部清除
pub fn clear_range(bitmap: &mut [u8], start: u32, count: u32) -> Result<()> {
    let end = range_end(bitmap, start, count)?;
    (start..end).try_for_each(|idx| clear_bit(bitmap, idx))
}

/// 范围终点；整个范围必须落在位图内，保证不会只改了一半
fn range_end(bitmap: &[u8], start: u32, count: u32) -> Result<u32> {
    let end = start
        .checked_add(count)
        .ok_or(Error::new(ErrorKind::OutOfBounds, "bit range overflows"))?;
    if end as usize > bitmap.len() * 8 {
        return Err(Error::new(ErrorKind::OutOfBounds, "bit range outside bitmap"));
    }
    Ok(end)
}

/// 在 `[start, end)` 中查找第一个为 0 的位
pub fn find_first_zero(bitmap: &[u8], start: u32, end: u32) -> Option<u32> {
    let mut idx = start;
    while idx < end {
        // 整字节已满时直接跳过
        if idx % 8 == 0 && idx + 8 <= end && bitmap.get((idx / 8) as usize) == Some(&0xFF) {
            idx += 8;
            continue;
        }
        if !test_bit(bitmap, idx) {
            return Some(idx);
        }
        idx += 1;
    }
    None
}

/// 首次适配：在 `[start, end)` 中按升序查找第一段长度为 `needed` 的连续 0 位
///
/// 遇到已置位的位时游程长度归零，游程达到 `needed` 时返回其起点。
pub fn find_zero_run(bitmap: &[u8], start: u32, end: u32, needed: u32) -> Option<u32> {
    if needed == 0 {
        return None;
    }

    let mut run_start = start;
    let mut run_len = 0u32;

    for idx in start..end {
        if test_bit(bitmap, idx) {
            run_len = 0;
            continue;
        }
        if run_len == 0 {
            run_start = idx;
        }
        run_len += 1;
        if run_len == needed {
            return Some(run_start);
        }
    }

    None
}

/// 统计 `[0, end)` 中置位的数量
pub fn count_ones(bitmap: &[u8], end: u32) -> u32 {
    let full_bytes = (end / 8) as usize;
    let mut ones: u32 = bitmap
        .iter()
        .take(full_bytes)
        .map(|byte| byte.count_ones())
        .sum();

    for idx in (full_bytes as u32 * 8)..end {
        if test_bit(bitmap, idx) {
            ones += 1;
        }
    }

    ones
}
