//! 文件系统核心逻辑模块，实现 extentfs 的挂载、inode 管理及文件读写。

use core::{marker::PhantomData, time::Duration};

use alloc::vec::Vec;
use spin::Mutex;

use extentfs_core::{CopyIn, CopyOut, ExtentFs, FsConfig, InodeRef, StatFs};

use crate::{error::Context, Result};

/// 系统硬件抽象层（HAL）接口，提供时间相关功能
pub trait SystemHal {
    /// 获取当前时间（可选，用于更新文件的访问/修改时间）
    fn now() -> Option<Duration>;
}

/// 默认的硬件抽象层实现（不提供时间）
pub struct DummyHal;
impl SystemHal for DummyHal {
    fn now() -> Option<Duration> {
        None
    }
}

/// 当前时间，HAL 不提供时间时为 0
fn now<Hal: SystemHal>() -> Duration {
    Hal::now().unwrap_or_default()
}

/// extentfs 文件系统实例
///
/// 泛型参数 Hal 提供时间戳。引擎放在自旋锁后面，
/// 所有操作都只需要 `&self`，可以用 `Arc` 在线程间共享。
pub struct Filesystem<Hal: SystemHal> {
    inner: Mutex<ExtentFs>,     // 存储引擎
    _phantom: PhantomData<Hal>, // 泛型标记
}

impl<Hal: SystemHal> Filesystem<Hal> {
    /// 创建新的存储区域并挂载
    pub fn new(config: FsConfig) -> Result<Self> {
        let fs = ExtentFs::mount(config).context("mount")?;
        Ok(Self::wrap(fs))
    }

    /// 从卸载时得到的镜像重新挂载
    pub fn attach(image: Vec<u8>) -> Result<Self> {
        let fs = ExtentFs::attach(image).context("attach")?;
        Ok(Self::wrap(fs))
    }

    fn wrap(fs: ExtentFs) -> Self {
        Self {
            inner: Mutex::new(fs),
            _phantom: PhantomData,
        }
    }

    /// 在持锁状态下直接操作引擎
    pub fn with_fs<R>(&self, f: impl FnOnce(&mut ExtentFs) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// 获取根目录句柄
    pub fn root(&self) -> Result<InodeRef> {
        self.inner.lock().root(now::<Hal>()).context("root")
    }

    /// 获取指定 inode 编号的句柄
    pub fn iget(&self, ino: u32) -> Result<InodeRef> {
        self.inner.lock().materialize(ino, now::<Hal>()).context("iget")
    }

    /// 创建普通文件
    pub fn alloc_file(&self, mode: u32) -> Result<InodeRef> {
        self.inner.lock().alloc_file(mode, now::<Hal>()).context("alloc_file")
    }

    /// 创建目录
    pub fn alloc_dir(&self, mode: u32) -> Result<InodeRef> {
        self.inner.lock().alloc_dir(mode, now::<Hal>()).context("alloc_dir")
    }

    /// 从 `offset` 读取数据到 `buf`
    pub fn read<B>(&self, handle: &InodeRef, offset: u64, buf: &mut B) -> Result<usize>
    where
        B: CopyOut + ?Sized,
    {
        self.inner.lock().read(handle, offset, buf).context("read")
    }

    /// 把 `buf` 写到 `offset`，写入了数据时刷新修改时间
    pub fn write<B>(&self, handle: &mut InodeRef, offset: u64, buf: &B) -> Result<usize>
    where
        B: CopyIn + ?Sized,
    {
        self.inner.lock().write(handle, offset, buf, now::<Hal>()).context("write")
    }

    /// 记录中的当前文件大小，包括其他句柄写入造成的增长
    pub fn size(&self, handle: &InodeRef) -> Result<u64> {
        self.inner.lock().size(handle).context("size")
    }

    /// 销毁 inode，释放其全部数据块
    pub fn destroy(&self, handle: &mut InodeRef) -> Result<()> {
        self.inner.lock().destroy(handle).context("destroy")
    }

    /// 获取文件系统状态信息
    pub fn statfs(&self) -> StatFs {
        self.inner.lock().stat()
    }

    /// 一致性检查
    pub fn check(&self) -> Result<()> {
        self.inner.lock().check().context("check")
    }

    /// 卸载并交出区域镜像
    pub fn unmount(self) -> Vec<u8> {
        self.inner.into_inner().unmount()
    }
}
