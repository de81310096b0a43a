//! Inode 编号分配功能

use log::{debug, error};

use crate::{
    bitmap,
    error::{Error, ErrorKind, Result},
    region::Region,
};

/// 分配一个 inode 编号
///
/// 从 1 开始向上扫描（0 号保留），返回并置位第一个空闲位。
///
/// # 返回
///
/// 成功返回分配的 inode 编号（最低可用编号优先）
pub fn alloc_inode(region: &mut Region) -> Result<u32> {
    let header = region.header();

    // 检查是否还有空闲 inode
    if header.free_inode_count == 0 {
        error!("extentfs: no free inode available");
        return Err(Error::new(ErrorKind::NoSpace, "No free inodes"));
    }

    let ino = bitmap::find_first_zero(region.inode_bitmap(), 1, header.inode_count).ok_or_else(|| {
        error!("extentfs: no free inode available");
        Error::new(ErrorKind::NoSpace, "No free inodes available")
    })?;

    region.with_header_mut(|h| h.sub_free_inodes(1))?;
    bitmap::set_bit(region.inode_bitmap_mut(), ino)?;

    debug!("extentfs: allocated inode {}", ino);
    Ok(ino)
}
