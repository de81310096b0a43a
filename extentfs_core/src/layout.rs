//! 存储区域布局计算
//!
//! 一块连续区域按固定顺序划分为：
//!
//! ```text
//! [Header][InodeBitmap][BlockBitmap][InodeTable][DataArea]
//! ```
//!
//! 各子区域大小在创建时由 `inode_count` / `block_count` 一次算出，之后不再变化。

use core::ops::Range;

use crate::{
    bitmap::bitmap_bytes,
    consts::*,
    error::{Error, ErrorKind, Result},
};

/// 区域内的一段字节范围（偏移 + 长度）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// 紧接在本段之后、长度为 `len` 的下一段
    fn next(&self, len: usize) -> Result<Span> {
        self.end()
            .checked_add(len)
            .map(|_| Span::new(self.end(), len))
            .ok_or(Error::new(ErrorKind::NoMemory, "region size overflows usize"))
    }
}

/// 区域布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub inode_count: u32,
    pub block_count: u32,
    pub header: Span,
    pub inode_bitmap: Span,
    pub block_bitmap: Span,
    pub inode_table: Span,
    pub data: Span,
}

impl Layout {
    /// 根据容量计算布局
    ///
    /// # 错误
    ///
    /// - `InvalidInput`: `inode_count` 为 0（0 号 inode 必须有位可保留）
    /// - `NoMemory`: 总大小超出地址空间
    pub fn new(inode_count: u32, block_count: u32) -> Result<Self> {
        if inode_count == 0 {
            return Err(Error::new(ErrorKind::InvalidInput, "inode count must be non-zero"));
        }

        let table_len = (inode_count as usize)
            .checked_mul(INODE_RECORD_SIZE)
            .ok_or(Error::new(ErrorKind::NoMemory, "inode table size overflows usize"))?;
        let data_len = (block_count as usize)
            .checked_mul(BLOCK_SIZE as usize)
            .ok_or(Error::new(ErrorKind::NoMemory, "data area size overflows usize"))?;

        let header = Span::new(0, HEADER_SIZE);
        let inode_bitmap = header.next(bitmap_bytes(inode_count))?;
        let block_bitmap = inode_bitmap.next(bitmap_bytes(block_count))?;
        let inode_table = block_bitmap.next(table_len)?;
        let data = inode_table.next(data_len)?;

        Ok(Self {
            inode_count,
            block_count,
            header,
            inode_bitmap,
            block_bitmap,
            inode_table,
            data,
        })
    }

    /// 区域总字节数
    pub fn total_size(&self) -> usize {
        self.data.end()
    }

    /// inode 记录在区域中的位置
    ///
    /// 只做范围检查，不检查该 inode 是否已分配（位图才是权威）。
    pub fn inode_slot(&self, ino: u32) -> Result<Span> {
        if ino == 0 || ino >= self.inode_count {
            return Err(Error::new(ErrorKind::InvalidInode, "inode number out of range"));
        }
        let offset = self.inode_table.offset + ino as usize * INODE_RECORD_SIZE;
        Ok(Span::new(offset, INODE_RECORD_SIZE))
    }

    /// 数据区内的访问窗口
    ///
    /// # 参数
    ///
    /// * `start_block` - extent 的起始块
    /// * `offset_in_extent` - extent 内的字节偏移
    /// * `len` - 窗口长度
    ///
    /// # 错误
    ///
    /// - `InvalidBlock`: `start_block` 不在数据区内
    /// - `OutOfBounds`: 窗口越过数据区末尾
    pub fn data_window(&self, start_block: u32, offset_in_extent: u64, len: usize) -> Result<Span> {
        if start_block >= self.block_count {
            return Err(Error::new(ErrorKind::InvalidBlock, "extent start block outside data area"));
        }

        let start = start_block as u64 * BLOCK_SIZE as u64 + offset_in_extent;
        let end = start + len as u64;
        if end > self.data.len as u64 {
            return Err(Error::new(ErrorKind::OutOfBounds, "access window crosses data area end"));
        }

        Ok(Span::new(self.data.offset + start as usize, len))
    }
}
