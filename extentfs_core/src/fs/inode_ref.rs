//! Inode 句柄
//!
//! 由 [`ExtentFs::materialize`](super::ExtentFs::materialize) 生成，缓存记录中的
//! 元数据并携带按文件种类选出的能力集。数据本身始终在区域里，
//! 句柄不持有区域的借用，因此可以在多次调用之间长期保存。

use core::time::Duration;

use crate::{
    error::{Error, ErrorKind, Result},
    inode::{Capabilities, InodeKind, InodeRecord},
};

/// 已实体化的 inode 句柄
///
/// # 生命周期
///
/// - `materialize` / `alloc_file` / `alloc_dir` 时创建，处于 attached 状态
/// - `destroy` 之后 detach，之后任何数据操作都返回 `InvalidInode`
/// - 另一个句柄销毁了同一个 inode 时，本句柄的代数过期，同样返回 `InvalidInode`
#[derive(Debug)]
pub struct InodeRef {
    ino: u32,
    kind: InodeKind,
    mode: u32,
    uid: u32,
    gid: u32,
    nlink: u32,
    size: u64,
    blocks: u32,
    atime: Duration,
    mtime: Duration,
    ctime: Duration,
    generation: u32,
    attached: bool,
    dirty: bool,
}

impl InodeRef {
    pub(crate) fn from_record(record: &InodeRecord, kind: InodeKind, now: Duration) -> Self {
        Self {
            ino: record.ino,
            kind,
            mode: record.mode,
            uid: record.uid,
            gid: record.gid,
            nlink: record.links_count,
            size: record.size,
            blocks: record.block_count,
            atime: now,
            mtime: now,
            ctime: now,
            generation: record.generation,
            attached: true,
            dirty: false,
        }
    }

    pub fn ino(&self) -> u32 {
        self.ino
    }

    pub fn kind(&self) -> InodeKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.kind.capabilities()
    }

    pub fn mode(&self) -> u32 {
        self.mode
    }

    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub fn gid(&self) -> u32 {
        self.gid
    }

    pub fn nlink(&self) -> u32 {
        self.nlink
    }

    /// 缓存的文件大小（字节）
    pub fn size(&self) -> u64 {
        self.size
    }

    /// 拥有的数据块数
    pub fn blocks(&self) -> u32 {
        self.blocks
    }

    pub fn atime(&self) -> Duration {
        self.atime
    }

    pub fn mtime(&self) -> Duration {
        self.mtime
    }

    pub fn ctime(&self) -> Duration {
        self.ctime
    }

    /// 实体化时记录槽位的代数，编号被复用后与记录不再相等
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// 设置全部时间戳
    pub fn set_times(&mut self, now: Duration) {
        self.atime = now;
        self.mtime = now;
        self.ctime = now;
    }

    /// 写入后刷新修改时间
    pub fn touch_modified(&mut self, now: Duration) {
        self.mtime = now;
        self.ctime = now;
    }

    /// 标记为脏，提示上层持久化元数据
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// 上层写回元数据后清除脏标记
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// 检查句柄是否支持 `caps` 中的全部操作
    ///
    /// # 错误
    ///
    /// - `InvalidInode`: 句柄已 detach
    /// - `IsDirectory`: 对目录请求文件数据读写
    /// - `NotDirectory`: 对普通文件请求目录操作
    pub fn require(&self, caps: Capabilities) -> Result<()> {
        if !self.attached {
            return Err(Error::new(ErrorKind::InvalidInode, "handle has been destroyed"));
        }

        let missing = caps - self.capabilities();
        if missing.intersects(Capabilities::READ | Capabilities::WRITE) {
            return Err(Error::new(ErrorKind::IsDirectory, "data access on a directory"));
        }
        if missing.contains(Capabilities::DIR_OPS) {
            return Err(Error::new(ErrorKind::NotDirectory, "directory operation on a file"));
        }
        Ok(())
    }

    pub(crate) fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    pub(crate) fn set_blocks(&mut self, blocks: u32) {
        self.blocks = blocks;
    }

    pub(crate) fn detach(&mut self) {
        self.size = 0;
        self.blocks = 0;
        self.nlink = 0;
        self.attached = false;
    }
}
