//! Inode 编号释放功能

use log::debug;

use crate::{
    bitmap,
    error::{Error, ErrorKind, Result},
    region::Region,
};

/// 释放一个 inode 编号
///
/// 清除位图中的位并增加空闲 inode 计数。
///
/// # 错误
///
/// - `InvalidInode`: `ino` 为 0 或超出 inode 数量
/// - `Corrupted`: 空闲计数已经等于 inode 总数
pub fn free_inode(region: &mut Region, ino: u32) -> Result<()> {
    if ino == 0 || ino >= region.header().inode_count {
        return Err(Error::new(ErrorKind::InvalidInode, "inode number out of range"));
    }

    region.with_header_mut(|h| h.add_free_inodes(1))?;
    bitmap::clear_bit(region.inode_bitmap_mut(), ino)?;

    debug!("extentfs: freed inode {}", ino);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_inode_cannot_be_freed() {
        let mut region = Region::create(4, 1, None).unwrap();

        assert_eq!(free_inode(&mut region, 0).unwrap_err().kind(), ErrorKind::InvalidInode);
        assert_eq!(free_inode(&mut region, 4).unwrap_err().kind(), ErrorKind::InvalidInode);
        assert!(region.inode_allocated(0));
        assert_eq!(region.header().free_inode_count, 3);
    }
}
