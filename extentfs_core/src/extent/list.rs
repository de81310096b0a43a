//! Extent 与有界 extent 列表

use byteorder::{ByteOrder, LittleEndian};

use crate::{
    consts::*,
    error::{Error, ErrorKind, Result},
};

/// 一段连续的数据块
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extent {
    pub start_block: u32,
    pub block_count: u32,
}

impl Extent {
    pub const fn new(start_block: u32, block_count: u32) -> Self {
        Self {
            start_block,
            block_count,
        }
    }

    /// 最后一个块之后的块号
    pub fn end_block(&self) -> u64 {
        self.start_block as u64 + self.block_count as u64
    }

    /// 该 extent 覆盖的逻辑字节数
    pub fn byte_len(&self) -> u64 {
        self.block_count as u64 * BLOCK_SIZE as u64
    }

    pub(crate) fn decode(buf: &[u8]) -> Self {
        Self {
            start_block: LittleEndian::read_u32(&buf[0..4]),
            block_count: LittleEndian::read_u32(&buf[4..8]),
        }
    }

    pub(crate) fn encode(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[0..4], self.start_block);
        LittleEndian::write_u32(&mut buf[4..8], self.block_count);
    }
}

/// 文件逻辑偏移在 extent 列表中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtentPos {
    /// extent 在列表中的下标
    pub index: usize,
    pub extent: Extent,
    /// extent 内的字节偏移
    pub offset_in_extent: u64,
}

/// 有界的有序 extent 列表
///
/// 只有 `[0, len)` 的槽位有效；超过 `MAX_EXTENTS` 的追加以 `NoSpace` 拒绝。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtentList {
    len: u32,
    slots: [Extent; MAX_EXTENTS],
}

impl ExtentList {
    pub const fn new() -> Self {
        Self {
            len: 0,
            slots: [Extent::new(0, 0); MAX_EXTENTS],
        }
    }

    /// 由记录中的原始字段构造
    ///
    /// `len` 超过上限说明记录已损坏。
    pub fn from_raw(len: u32, slots: [Extent; MAX_EXTENTS]) -> Result<Self> {
        if len as usize > MAX_EXTENTS {
            return Err(Error::new(ErrorKind::Corrupted, "extent count exceeds capacity"));
        }
        Ok(Self { len, slots })
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len as usize == MAX_EXTENTS
    }

    pub fn as_slice(&self) -> &[Extent] {
        &self.slots[..self.len as usize]
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Extent> {
        self.as_slice().iter()
    }

    /// 原始槽位（含无效部分），仅用于编码
    pub(crate) fn raw_slots(&self) -> &[Extent; MAX_EXTENTS] {
        &self.slots
    }

    /// 追加一个 extent
    pub fn push(&mut self, extent: Extent) -> Result<()> {
        if self.is_full() {
            return Err(Error::new(ErrorKind::NoSpace, "extent list is full"));
        }
        self.slots[self.len as usize] = extent;
        self.len += 1;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.slots = [Extent::default(); MAX_EXTENTS];
        self.len = 0;
    }

    /// 所有 extent 的块数之和
    pub fn total_blocks(&self) -> u64 {
        self.iter().map(|e| e.block_count as u64).sum()
    }

    /// 所有 extent 覆盖的逻辑字节数
    pub fn capacity_bytes(&self) -> u64 {
        self.iter().map(Extent::byte_len).sum()
    }

    /// 定位逻辑偏移所在的 extent
    ///
    /// 线性扫描，累加前面各 extent 的逻辑大小；与物理块号无关。
    pub fn locate(&self, offset: u64) -> Option<ExtentPos> {
        let mut accumulated = 0u64;

        for (index, extent) in self.iter().enumerate() {
            let size = extent.byte_len();
            if offset < accumulated + size {
                return Some(ExtentPos {
                    index,
                    extent: *extent,
                    offset_in_extent: offset - accumulated,
                });
            }
            accumulated += size;
        }

        None
    }
}

impl Default for ExtentList {
    fn default() -> Self {
        Self::new()
    }
}
