//! inode 记录的编解码与存取
//!
//! 记录以小端定长格式存放在 inode 表中：
//!
//! ```text
//! 0   ino            u32
//! 4   mode           u32
//! 8   uid            u32
//! 12  gid            u32
//! 16  size           u64
//! 24  block_count    u32
//! 28  links_count    u32
//! 32  extent_count   u32
//! 36  extents        [start_block u32, block_count u32; MAX_EXTENTS]
//! 100 generation     u32
//! ```
//!
//! `generation` 在每次销毁时加一，用来识别编号被复用前取得的旧句柄。

use byteorder::{ByteOrder, LittleEndian};
use log::error;

use crate::{
    consts::*,
    error::Result,
    extent::{Extent, ExtentList},
    region::Region,
};

use super::InodeKind;

const GENERATION_AT: usize = INODE_RECORD_FIXED_SIZE + MAX_EXTENTS * EXTENT_SIZE;
const _: () = assert!(GENERATION_AT + 4 <= INODE_RECORD_SIZE);

/// inode 表中的一条记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InodeRecord {
    pub ino: u32,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    /// 逻辑字节长度
    pub size: u64,
    /// 拥有的物理块数
    pub block_count: u32,
    pub links_count: u32,
    pub extents: ExtentList,
    /// 槽位被销毁的次数
    pub generation: u32,
}

impl InodeRecord {
    /// 新建空记录：没有 extent，大小为 0
    pub fn new(ino: u32, kind: InodeKind, mode: u32) -> Self {
        Self {
            ino,
            mode: kind.mode_with_perm(mode),
            uid: 0,
            gid: 0,
            size: 0,
            block_count: 0,
            links_count: kind.initial_links(),
            extents: ExtentList::new(),
            generation: 0,
        }
    }

    pub fn kind(&self) -> Result<InodeKind> {
        InodeKind::from_mode(self.mode)
    }

    /// 所有 extent 能容纳的字节数
    pub fn capacity(&self) -> u64 {
        self.extents.capacity_bytes()
    }

    /// 从 inode 表槽位解码
    ///
    /// # 错误
    ///
    /// - `Corrupted`: `extent_count` 超过 `MAX_EXTENTS`
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let extent_count = LittleEndian::read_u32(&buf[32..36]);

        let mut slots = [Extent::default(); MAX_EXTENTS];
        for (i, slot) in slots.iter_mut().enumerate() {
            let at = INODE_RECORD_FIXED_SIZE + i * EXTENT_SIZE;
            *slot = Extent::decode(&buf[at..at + EXTENT_SIZE]);
        }

        Ok(Self {
            ino: LittleEndian::read_u32(&buf[0..4]),
            mode: LittleEndian::read_u32(&buf[4..8]),
            uid: LittleEndian::read_u32(&buf[8..12]),
            gid: LittleEndian::read_u32(&buf[12..16]),
            size: LittleEndian::read_u64(&buf[16..24]),
            block_count: LittleEndian::read_u32(&buf[24..28]),
            links_count: LittleEndian::read_u32(&buf[28..32]),
            extents: ExtentList::from_raw(extent_count, slots)?,
            generation: LittleEndian::read_u32(&buf[GENERATION_AT..GENERATION_AT + 4]),
        })
    }

    pub fn encode(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[0..4], self.ino);
        LittleEndian::write_u32(&mut buf[4..8], self.mode);
        LittleEndian::write_u32(&mut buf[8..12], self.uid);
        LittleEndian::write_u32(&mut buf[12..16], self.gid);
        LittleEndian::write_u64(&mut buf[16..24], self.size);
        LittleEndian::write_u32(&mut buf[24..28], self.block_count);
        LittleEndian::write_u32(&mut buf[28..32], self.links_count);
        LittleEndian::write_u32(&mut buf[32..36], self.extents.len());

        for (i, extent) in self.extents.raw_slots().iter().enumerate() {
            let at = INODE_RECORD_FIXED_SIZE + i * EXTENT_SIZE;
            extent.encode(&mut buf[at..at + EXTENT_SIZE]);
        }
        LittleEndian::write_u32(&mut buf[GENERATION_AT..GENERATION_AT + 4], self.generation);
        buf[GENERATION_AT + 4..INODE_RECORD_SIZE].fill(0);
    }
}

impl Region {
    /// 读取 inode 表中的记录
    ///
    /// 只检查编号范围；范围内但未分配的槽位同样返回记录，
    /// 是否存在以 inode 位图为准。
    ///
    /// # 错误
    ///
    /// - `InvalidInode`: `ino` 为 0 或不小于 inode 数量
    /// - `Corrupted`: 记录中的 extent 数量非法
    pub fn record_at(&self, ino: u32) -> Result<InodeRecord> {
        let slot = self.layout().inode_slot(ino)?;
        InodeRecord::decode(self.bytes(slot)?).inspect_err(|_| {
            error!("extentfs: inode {} record is corrupted", ino);
        })
    }

    /// 把记录写回 `record.ino` 对应的槽位
    pub fn write_record(&mut self, record: &InodeRecord) -> Result<()> {
        let slot = self.layout().inode_slot(record.ino)?;
        record.encode(self.bytes_mut(slot)?);
        Ok(())
    }

    /// 读出记录、修改并写回
    pub fn with_record_mut<F, R>(&mut self, ino: u32, f: F) -> Result<R>
    where
        F: FnOnce(&mut InodeRecord) -> R,
    {
        let mut record = self.record_at(ino)?;
        let result = f(&mut record);
        record.ino = ino;
        self.write_record(&record)?;
        Ok(result)
    }
}
