//! 存储区域
//!
//! 整个文件系统只占用一块由本模块分配的字节缓冲区，头部、两张位图、
//! inode 表和数据区都是其中的子范围。所有访问都经过 [`Span`] 的范围检查，
//! 不存在裸指针运算。

use alloc::vec::Vec;
use core::fmt;

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, error};

use crate::{
    bitmap,
    consts::*,
    error::{Error, ErrorKind, Result},
    layout::{Layout, Span},
};

/// 区域头部
///
/// 容量与空闲计数，位于区域起始处
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub block_size: u32,
    pub inode_count: u32,
    pub block_count: u32,
    pub free_inode_count: u32,
    pub free_block_count: u32,
}

impl Header {
    fn new(inode_count: u32, block_count: u32) -> Self {
        Self {
            magic: EXTENTFS_MAGIC,
            block_size: BLOCK_SIZE,
            inode_count,
            block_count,
            free_inode_count: inode_count,
            free_block_count: block_count,
        }
    }

    /// 从字节解码（调用方保证长度至少为 `HEADER_SIZE`）
    fn decode(buf: &[u8]) -> Self {
        Self {
            magic: LittleEndian::read_u32(&buf[0..4]),
            block_size: LittleEndian::read_u32(&buf[4..8]),
            inode_count: LittleEndian::read_u32(&buf[8..12]),
            block_count: LittleEndian::read_u32(&buf[12..16]),
            free_inode_count: LittleEndian::read_u32(&buf[16..20]),
            free_block_count: LittleEndian::read_u32(&buf[20..24]),
        }
    }

    fn encode(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[0..4], self.magic);
        LittleEndian::write_u32(&mut buf[4..8], self.block_size);
        LittleEndian::write_u32(&mut buf[8..12], self.inode_count);
        LittleEndian::write_u32(&mut buf[12..16], self.block_count);
        LittleEndian::write_u32(&mut buf[16..20], self.free_inode_count);
        LittleEndian::write_u32(&mut buf[20..24], self.free_block_count);
    }

    /// 归还 `delta` 个数据块
    ///
    /// 计数超过总块数说明头部或位图已经损坏，返回 `Corrupted` 且不修改计数。
    pub fn add_free_blocks(&mut self, delta: u32) -> Result<()> {
        self.free_block_count = raise(self.free_block_count, delta, self.block_count)?;
        Ok(())
    }

    /// 扣减 `delta` 个空闲数据块，不足时返回 `Corrupted`
    pub fn sub_free_blocks(&mut self, delta: u32) -> Result<()> {
        self.free_block_count = lower(self.free_block_count, delta)?;
        Ok(())
    }

    pub fn add_free_inodes(&mut self, delta: u32) -> Result<()> {
        self.free_inode_count = raise(self.free_inode_count, delta, self.inode_count)?;
        Ok(())
    }

    pub fn sub_free_inodes(&mut self, delta: u32) -> Result<()> {
        self.free_inode_count = lower(self.free_inode_count, delta)?;
        Ok(())
    }
}

fn raise(count: u32, delta: u32, limit: u32) -> Result<u32> {
    count.checked_add(delta).filter(|n| *n <= limit).ok_or_else(|| {
        error!("extentfs: free count {} + {} exceeds capacity {}", count, delta, limit);
        Error::new(ErrorKind::Corrupted, "free count exceeds capacity")
    })
}

fn lower(count: u32, delta: u32) -> Result<u32> {
    count.checked_sub(delta).ok_or_else(|| {
        error!("extentfs: free count {} cannot drop by {}", count, delta);
        Error::new(ErrorKind::Corrupted, "free count underflow")
    })
}

/// 后备存储区域
pub struct Region {
    buf: Vec<u8>,
    layout: Layout,
}

impl Region {
    /// 分配并初始化一块新区域
    ///
    /// 区域全部清零，写入头部，并将 0 号 inode 标记为已占用。
    ///
    /// # 参数
    ///
    /// * `inode_count` - inode 数量（含保留的 0 号）
    /// * `block_count` - 数据块数量
    /// * `memory_limit` - 可用后备内存上限（字节），`None` 表示不设上限
    ///
    /// # 错误
    ///
    /// - `NoMemory`: 所需大小超过 `memory_limit` 或分配失败
    pub fn create(inode_count: u32, block_count: u32, memory_limit: Option<usize>) -> Result<Self> {
        let layout = Layout::new(inode_count, block_count)?;
        let total = layout.total_size();

        if memory_limit.is_some_and(|limit| total > limit) {
            error!("extentfs: region of {} bytes exceeds memory limit {:?}", total, memory_limit);
            return Err(Error::new(ErrorKind::NoMemory, "region exceeds memory limit"));
        }

        let mut buf = Vec::new();
        buf.try_reserve_exact(total).map_err(|_| {
            error!("extentfs: failed to reserve {} bytes for region", total);
            Error::new(ErrorKind::NoMemory, "cannot allocate backing region")
        })?;
        buf.resize(total, 0);

        let mut region = Self { buf, layout };
        region.with_header_mut(|h| *h = Header::new(inode_count, block_count));

        // 0 号 inode 永不分配
        region.with_header_mut(|h| h.sub_free_inodes(1))?;
        bitmap::set_bit(region.inode_bitmap_mut(), 0)?;

        debug!(
            "extentfs: region created, {} bytes ({} inodes, {} blocks)",
            total, inode_count, block_count
        );
        Ok(region)
    }

    /// 从已有镜像重新接管区域
    ///
    /// 校验魔数、块大小以及镜像长度是否与头部记录的容量一致。
    pub fn from_image(buf: Vec<u8>) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::new(ErrorKind::Corrupted, "image shorter than header"));
        }

        let header = Header::decode(&buf[..HEADER_SIZE]);
        if header.magic != EXTENTFS_MAGIC {
            return Err(Error::new(ErrorKind::Corrupted, "invalid magic number"));
        }
        if header.block_size != BLOCK_SIZE {
            return Err(Error::new(ErrorKind::Corrupted, "unsupported block size"));
        }

        let layout = Layout::new(header.inode_count, header.block_count)
            .map_err(|_| Error::new(ErrorKind::Corrupted, "header capacity is invalid"))?;
        if layout.total_size() != buf.len() {
            return Err(Error::new(ErrorKind::Corrupted, "image size does not match header"));
        }

        Ok(Self { buf, layout })
    }

    /// 交出整块区域的字节
    pub fn into_image(self) -> Vec<u8> {
        self.buf
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// 读取头部副本
    pub fn header(&self) -> Header {
        Header::decode(&self.buf[self.layout.header.range()])
    }

    /// 修改头部并写回
    pub fn with_header_mut<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Header) -> R,
    {
        let range = self.layout.header.range();
        let mut header = Header::decode(&self.buf[range.clone()]);
        let result = f(&mut header);
        header.encode(&mut self.buf[range]);
        result
    }

    /// 按 span 取得只读字节
    pub fn bytes(&self, span: Span) -> Result<&[u8]> {
        self.buf
            .get(span.range())
            .ok_or(Error::new(ErrorKind::OutOfBounds, "span outside region"))
    }

    /// 按 span 取得可写字节
    pub fn bytes_mut(&mut self, span: Span) -> Result<&mut [u8]> {
        self.buf
            .get_mut(span.range())
            .ok_or(Error::new(ErrorKind::OutOfBounds, "span outside region"))
    }

    pub fn inode_bitmap(&self) -> &[u8] {
        &self.buf[self.layout.inode_bitmap.range()]
    }

    pub fn inode_bitmap_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.layout.inode_bitmap.range()]
    }

    pub fn block_bitmap(&self) -> &[u8] {
        &self.buf[self.layout.block_bitmap.range()]
    }

    pub fn block_bitmap_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.layout.block_bitmap.range()]
    }

    /// 某个 inode 编号是否已分配
    pub fn inode_allocated(&self, ino: u32) -> bool {
        ino < self.layout.inode_count && bitmap::test_bit(self.inode_bitmap(), ino)
    }

    /// 将一段数据块清零
    pub fn zero_blocks(&mut self, start_block: u32, block_count: u32) -> Result<()> {
        let len = block_count as usize * BLOCK_SIZE as usize;
        let window = self.layout.data_window(start_block, 0, len)?;
        self.bytes_mut(window)?.fill(0);
        Ok(())
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("layout", &self.layout)
            .field("header", &self.header())
            .finish()
    }
}
