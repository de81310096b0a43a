//! 区段释放

use log::debug;

use crate::{
    bitmap,
    error::{Error, ErrorKind, Result},
    extent::Extent,
    region::Region,
};

/// 释放一段 extent
///
/// 清除 extent 覆盖的每一位，并把空闲块计数加回 `block_count`。
/// 不校验这些块是否确实属于调用方。
///
/// # 错误
///
/// - `OutOfBounds`: extent 超出块位图范围
/// - `Corrupted`: 加回后空闲计数超过总块数
///
/// 出错时位图和计数都不变
pub fn free_extent(region: &mut Region, extent: &Extent) -> Result<()> {
    if extent.end_block() > region.header().block_count as u64 {
        return Err(Error::new(ErrorKind::OutOfBounds, "extent outside block bitmap"));
    }

    region.with_header_mut(|h| h.add_free_blocks(extent.block_count))?;
    bitmap::clear_range(region.block_bitmap_mut(), extent.start_block, extent.block_count)?;

    debug!(
        "extentfs: freed extent: start={}, count={}",
        extent.start_block, extent.block_count
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balloc::alloc_extent;

    #[test]
    fn test_free_restores_bits_and_count() {
        let mut region = Region::create(4, 16, None).unwrap();
        let keep = alloc_extent(&mut region, 2).unwrap();

        let before_bits = region.block_bitmap().to_vec();
        let before_free = region.header().free_block_count;

        let extent = alloc_extent(&mut region, 5).unwrap();
        assert_ne!(region.block_bitmap(), &before_bits[..]);

        free_extent(&mut region, &extent).unwrap();
        assert_eq!(region.block_bitmap(), &before_bits[..]);
        assert_eq!(region.header().free_block_count, before_free);
        assert!(bitmap::test_bit(region.block_bitmap(), keep.start_block));
    }

    #[test]
    fn test_out_of_range_extent_leaves_state_untouched() {
        let mut region = Region::create(4, 16, None).unwrap();
        let before_free = region.header().free_block_count;

        let err = free_extent(&mut region, &Extent::new(14, 4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
        assert_eq!(region.header().free_block_count, before_free);
    }
}
