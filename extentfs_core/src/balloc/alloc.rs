//! 区段分配

use log::{debug, error};

use crate::{
    bitmap,
    error::{Error, ErrorKind, Result},
    extent::Extent,
    region::Region,
};

/// 分配一段连续的数据块
///
/// 按块号升序扫描块位图，维护当前空闲游程长度，遇到已分配块时归零；
/// 游程达到 `needed_blocks` 即为结果。
///
/// # 参数
///
/// * `region` - 存储区域
/// * `needed_blocks` - 需要的块数
///
/// # 返回
///
/// 成功返回 `{start_block, block_count: needed_blocks}`，对应位已置位，
/// 空闲块计数已扣减
///
/// # 错误
///
/// - `InvalidInput`: `needed_blocks` 为 0 或大于总块数
/// - `NoSpace`: 空闲块不足，或找不到足够长的连续空闲区段
pub fn alloc_extent(region: &mut Region, needed_blocks: u32) -> Result<Extent> {
    let header = region.header();

    if needed_blocks == 0 || needed_blocks > header.block_count {
        error!("extentfs: invalid number of blocks requested: {}", needed_blocks);
        return Err(Error::new(ErrorKind::InvalidInput, "invalid block count requested"));
    }

    // 快速容量检查，不必扫描
    if needed_blocks > header.free_block_count {
        error!(
            "extentfs: not enough free blocks, needed: {}, available: {}",
            needed_blocks, header.free_block_count
        );
        return Err(Error::new(ErrorKind::NoSpace, "not enough free blocks"));
    }

    let start = bitmap::find_zero_run(region.block_bitmap(), 0, header.block_count, needed_blocks)
        .ok_or_else(|| {
            error!("extentfs: could not find {} contiguous free blocks", needed_blocks);
            Error::new(ErrorKind::NoSpace, "no contiguous free run")
        })?;

    region.with_header_mut(|h| h.sub_free_blocks(needed_blocks))?;
    bitmap::set_range(region.block_bitmap_mut(), start, needed_blocks)?;

    debug!("extentfs: allocated extent: start={}, count={}", start, needed_blocks);
    Ok(Extent::new(start, needed_blocks))
}
