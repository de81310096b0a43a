//! extentfs 文件系统核心结构

use alloc::{vec, vec::Vec};
use core::time::Duration;

use log::{error, info, warn};

use crate::{
    balloc, bitmap,
    consts::*,
    error::{Error, ErrorKind, Result},
    extent::Extent,
    ialloc,
    inode::{Capabilities, InodeKind, InodeRecord},
    region::Region,
    transfer::{CopyIn, CopyOut},
};

use super::{file, inode_ref::InodeRef};

/// 挂载参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsConfig {
    /// inode 数量（含保留的 0 号）
    pub inode_count: u32,
    /// 数据块数量
    pub block_count: u32,
    /// 后备区域字节上限
    pub memory_limit: Option<usize>,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            inode_count: INODE_COUNT,
            block_count: DATA_BLOCK_COUNT,
            memory_limit: None,
        }
    }
}

/// 文件系统统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatFs {
    pub magic: u32,
    pub block_size: u32,
    pub inodes_count: u32,
    pub free_inodes_count: u32,
    pub blocks_count: u32,
    pub free_blocks_count: u32,
}

/// extentfs 文件系统
///
/// 独占一块存储区域，所有修改都要求 `&mut self`，
/// 需要共享时由上层加锁。
///
/// # 示例
///
/// ```rust,ignore
/// use extentfs_core::{ExtentFs, FsConfig};
///
/// let mut fs = ExtentFs::mount(FsConfig::default())?;
/// let mut file = fs.alloc_file(0o644, now)?;
/// fs.write(&mut file, 0, &b"hello"[..], now)?;
///
/// let mut buf = [0u8; 5];
/// let n = fs.read(&file, 0, &mut buf[..])?;
/// ```
#[derive(Debug)]
pub struct ExtentFs {
    region: Region,
}

impl ExtentFs {
    /// 创建区域并初始化根目录
    ///
    /// 根目录初始化失败时按相反顺序回滚（释放 extent、释放 inode），
    /// 区域随之释放，调用方不会拿到半初始化的文件系统。
    ///
    /// # 错误
    ///
    /// - `NoMemory`: 区域超出 `memory_limit` 或分配失败
    /// - `NoSpace`: 没有可用于根目录的 inode 或数据块
    /// - `InvalidInput`: 数据块数量为 0
    pub fn mount(config: FsConfig) -> Result<Self> {
        let region = Region::create(config.inode_count, config.block_count, config.memory_limit)?;
        let mut fs = Self { region };

        fs.init_root().inspect_err(|e| {
            error!("extentfs: root initialization failed: {}", e);
        })?;

        info!(
            "extentfs: mounted, {} inodes, {} blocks of {} bytes",
            config.inode_count, config.block_count, BLOCK_SIZE
        );
        Ok(fs)
    }

    fn init_root(&mut self) -> Result<()> {
        let ino = ialloc::alloc_inode(&mut self.region)?;
        if ino != ROOT_INO {
            ialloc::free_inode(&mut self.region, ino)?;
            return Err(Error::new(ErrorKind::Corrupted, "root inode number already taken"));
        }

        let extent = match balloc::alloc_extent(&mut self.region, 1) {
            Ok(extent) => extent,
            Err(e) => {
                ialloc::free_inode(&mut self.region, ino)?;
                return Err(e);
            }
        };

        let mut record = InodeRecord::new(ino, InodeKind::Directory, ROOT_DIR_PERM);
        record.block_count = extent.block_count;
        let written = record
            .extents
            .push(extent)
            .and_then(|_| self.region.write_record(&record));

        if let Err(e) = written {
            balloc::free_extent(&mut self.region, &extent)?;
            ialloc::free_inode(&mut self.region, ino)?;
            return Err(e);
        }
        Ok(())
    }

    /// 从镜像重新挂载
    ///
    /// 不重建根目录；镜像必须通过一致性检查。
    pub fn attach(image: Vec<u8>) -> Result<Self> {
        let region = Region::from_image(image)?;
        if !region.inode_allocated(ROOT_INO) {
            error!("extentfs: image has no root inode");
            return Err(Error::new(ErrorKind::Corrupted, "root inode not allocated"));
        }

        let fs = Self { region };
        fs.check()?;

        info!("extentfs: attached existing image");
        Ok(fs)
    }

    /// 卸载并交出区域镜像
    pub fn unmount(self) -> Vec<u8> {
        info!("extentfs: unmounted");
        self.region.into_image()
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn region_mut(&mut self) -> &mut Region {
        &mut self.region
    }

    pub fn stat(&self) -> StatFs {
        let header = self.region.header();
        StatFs {
            magic: header.magic,
            block_size: header.block_size,
            inodes_count: header.inode_count,
            free_inodes_count: header.free_inode_count,
            blocks_count: header.block_count,
            free_blocks_count: header.free_block_count,
        }
    }

    // ===== 分配器 =====

    pub fn alloc_extent(&mut self, needed_blocks: u32) -> Result<Extent> {
        balloc::alloc_extent(&mut self.region, needed_blocks)
    }

    pub fn free_extent(&mut self, extent: &Extent) -> Result<()> {
        balloc::free_extent(&mut self.region, extent)
    }

    pub fn alloc_inode(&mut self) -> Result<u32> {
        ialloc::alloc_inode(&mut self.region)
    }

    pub fn free_inode(&mut self, ino: u32) -> Result<()> {
        ialloc::free_inode(&mut self.region, ino)
    }

    pub fn record_at(&self, ino: u32) -> Result<InodeRecord> {
        self.region.record_at(ino)
    }

    // ===== inode =====

    /// 根目录句柄
    pub fn root(&self, now: Duration) -> Result<InodeRef> {
        self.materialize(ROOT_INO, now)
    }

    /// 为已分配的 inode 生成句柄
    ///
    /// # 错误
    ///
    /// - `InvalidInode`: 编号越界或未分配
    /// - `Corrupted`: 记录的类型位未知
    pub fn materialize(&self, ino: u32, now: Duration) -> Result<InodeRef> {
        let record = self.region.record_at(ino)?;
        if !self.region.inode_allocated(ino) {
            return Err(Error::new(ErrorKind::InvalidInode, "inode is not allocated"));
        }

        let kind = record.kind().inspect_err(|_| {
            error!("extentfs: inode {} has unknown mode {:#x}", ino, record.mode);
        })?;
        Ok(InodeRef::from_record(&record, kind, now))
    }

    /// 新建普通文件
    ///
    /// `mode` 中只保留权限位，类型位强制为普通文件。
    pub fn alloc_file(&mut self, mode: u32, now: Duration) -> Result<InodeRef> {
        self.alloc_node(InodeKind::RegularFile, mode, now)
    }

    /// 新建目录
    pub fn alloc_dir(&mut self, mode: u32, now: Duration) -> Result<InodeRef> {
        self.alloc_node(InodeKind::Directory, mode, now)
    }

    fn alloc_node(&mut self, kind: InodeKind, mode: u32, now: Duration) -> Result<InodeRef> {
        let ino = ialloc::alloc_inode(&mut self.region)?;

        // 沿用槽位的代数，销毁前取得的旧句柄因此认不出新文件
        let generation = match self.region.record_at(ino) {
            Ok(old) => old.generation,
            Err(e) => {
                warn!("extentfs: free slot {} is unreadable ({}), resetting it", ino, e);
                0
            }
        };

        let mut record = InodeRecord::new(ino, kind, mode);
        record.generation = generation;
        if let Err(e) = self.region.write_record(&record) {
            ialloc::free_inode(&mut self.region, ino)?;
            return Err(e);
        }

        Ok(InodeRef::from_record(&record, kind, now))
    }

    /// 销毁 inode：释放全部 extent、清空记录并归还 inode 编号
    ///
    /// 这是释放数据块的唯一路径。释放前先校验全部 extent，
    /// 校验失败时什么都不改，句柄保持 attached。
    /// 成功后句柄 detach，槽位代数加一。
    ///
    /// # 错误
    ///
    /// - `InvalidInode`: 句柄已 detach、inode 未分配、编号已被复用或是根目录
    /// - `Corrupted`: 记录中的 extent 越界、重叠或指向未分配的块
    pub fn destroy(&mut self, handle: &mut InodeRef) -> Result<()> {
        let mut record = file::live_record(&self.region, handle, Capabilities::empty())?;
        let ino = record.ino;
        if ino == ROOT_INO {
            return Err(Error::new(ErrorKind::InvalidInode, "root inode cannot be destroyed"));
        }

        self.validate_owned_extents(&record)?;
        for extent in record.extents.iter() {
            balloc::free_extent(&mut self.region, extent)?;
        }
        record.extents.clear();
        record.block_count = 0;
        record.size = 0;
        record.generation = record.generation.wrapping_add(1);
        self.region.write_record(&record)?;

        ialloc::free_inode(&mut self.region, ino)?;
        handle.detach();

        info!("extentfs: destroyed inode {}", ino);
        Ok(())
    }

    /// 确认记录中的 extent 都可以安全释放：在范围内、互不重叠、对应位已置位
    fn validate_owned_extents(&self, record: &InodeRecord) -> Result<()> {
        let block_count = self.region.header().block_count;
        let extents = record.extents.as_slice();

        for (i, extent) in extents.iter().enumerate() {
            if extent.block_count == 0 || extent.end_block() > block_count as u64 {
                error!(
                    "extentfs: inode {} extent ({}, {}) is out of range",
                    record.ino, extent.start_block, extent.block_count
                );
                return Err(corrupted("extent outside data area"));
            }
            if extents[..i].iter().any(|other| overlaps(other, extent)) {
                error!("extentfs: inode {} has overlapping extents", record.ino);
                return Err(corrupted("extents overlap"));
            }
            let end = extent.start_block + extent.block_count;
            if !(extent.start_block..end).all(|b| bitmap::test_bit(self.region.block_bitmap(), b)) {
                error!(
                    "extentfs: inode {} extent ({}, {}) covers free blocks",
                    record.ino, extent.start_block, extent.block_count
                );
                return Err(corrupted("extent covers unallocated blocks"));
            }
        }
        Ok(())
    }

    // ===== 数据 =====

    /// 从 `offset` 读取到 `dst`，返回读取的字节数
    pub fn read<B>(&self, handle: &InodeRef, offset: u64, dst: &mut B) -> Result<usize>
    where
        B: CopyOut + ?Sized,
    {
        file::read(&self.region, handle, offset, dst)
    }

    /// 把 `src` 写到 `offset`，返回写入的字节数
    ///
    /// 写入了数据时句柄的修改时间更新为 `now`。
    pub fn write<B>(
        &mut self,
        handle: &mut InodeRef,
        offset: u64,
        src: &B,
        now: Duration,
    ) -> Result<usize>
    where
        B: CopyIn + ?Sized,
    {
        file::write(&mut self.region, handle, offset, src, now)
    }

    /// 记录中的当前文件大小
    ///
    /// 其他句柄写入后，本句柄缓存的大小可能已经过期，需要准确大小时用这个。
    pub fn size(&self, handle: &InodeRef) -> Result<u64> {
        let record = file::live_record(&self.region, handle, Capabilities::empty())?;
        Ok(record.size)
    }

    // ===== 一致性检查 =====

    /// 检查元数据一致性
    ///
    /// - 头部空闲计数与位图一致，0 号 inode 保留
    /// - 每个已分配 inode 的记录编号、类型和 extent 合法
    /// - 没有数据块被两个 inode 同时占用，位图中没有无主的块
    /// - 文件大小不超过 extent 容量
    pub fn check(&self) -> Result<()> {
        let header = self.region.header();
        let inode_count = header.inode_count;
        let block_count = header.block_count;

        let used_inodes = bitmap::count_ones(self.region.inode_bitmap(), inode_count);
        if header.free_inode_count.checked_add(used_inodes) != Some(inode_count) {
            error!(
                "extentfs: {} free inodes recorded, {} of {} marked",
                header.free_inode_count, used_inodes, inode_count
            );
            return Err(corrupted("free inode count does not match bitmap"));
        }
        let used_blocks = bitmap::count_ones(self.region.block_bitmap(), block_count);
        if header.free_block_count.checked_add(used_blocks) != Some(block_count) {
            error!(
                "extentfs: {} free blocks recorded, {} of {} marked",
                header.free_block_count, used_blocks, block_count
            );
            return Err(corrupted("free block count does not match bitmap"));
        }
        if !self.region.inode_allocated(0) {
            return Err(corrupted("reserved inode 0 is not marked"));
        }

        let mut claimed = vec![0u8; bitmap::bitmap_bytes(block_count)];
        let mut claimed_count = 0u32;

        for ino in 1..inode_count {
            if !self.region.inode_allocated(ino) {
                continue;
            }

            let record = self.region.record_at(ino)?;
            if record.ino != ino {
                error!("extentfs: slot {} holds record for inode {}", ino, record.ino);
                return Err(corrupted("inode record number mismatch"));
            }
            record.kind()?;

            for extent in record.extents.iter() {
                if extent.block_count == 0 || extent.end_block() > block_count as u64 {
                    error!(
                        "extentfs: inode {} extent ({}, {}) out of range",
                        ino, extent.start_block, extent.block_count
                    );
                    return Err(corrupted("extent outside data area"));
                }
                for block in extent.start_block..extent.start_block + extent.block_count {
                    if bitmap::test_bit(&claimed, block) {
                        error!("extentfs: block {} claimed twice (inode {})", block, ino);
                        return Err(corrupted("data block claimed by two inodes"));
                    }
                    if !bitmap::test_bit(self.region.block_bitmap(), block) {
                        return Err(corrupted("owned block not marked in bitmap"));
                    }
                    bitmap::set_bit(&mut claimed, block)?;
                    claimed_count += 1;
                }
            }

            if record.extents.total_blocks() != record.block_count as u64 {
                return Err(corrupted("block count does not match extents"));
            }
            if record.size > record.capacity() {
                return Err(corrupted("file size exceeds extent capacity"));
            }
        }

        if claimed_count != used_blocks {
            return Err(corrupted("blocks marked in bitmap without an owner"));
        }
        Ok(())
    }
}

fn corrupted(message: &'static str) -> Error {
    Error::new(ErrorKind::Corrupted, message)
}

fn overlaps(a: &Extent, b: &Extent) -> bool {
    (a.start_block as u64) < b.end_block() && (b.start_block as u64) < a.end_block()
}
