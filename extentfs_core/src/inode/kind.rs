//! 文件种类与能力集

use bitflags::bitflags;

use crate::{
    consts::*,
    error::{Error, ErrorKind, Result},
};

bitflags! {
    /// 句柄支持的操作集合
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        /// 读文件数据
        const READ = 1 << 0;
        /// 写文件数据
        const WRITE = 1 << 1;
        /// 目录项操作（由上层目录代码实现）
        const DIR_OPS = 1 << 2;
    }
}

/// 由 mode 类型位决定的文件种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeKind {
    Directory,
    RegularFile,
}

impl InodeKind {
    /// 从 mode 解析种类
    ///
    /// 未知类型位说明记录已损坏。
    pub fn from_mode(mode: u32) -> Result<Self> {
        match mode & INODE_MODE_TYPE_MASK {
            INODE_MODE_DIRECTORY => Ok(InodeKind::Directory),
            INODE_MODE_FILE => Ok(InodeKind::RegularFile),
            _ => Err(Error::new(ErrorKind::Corrupted, "unknown inode type in mode")),
        }
    }

    /// 该种类在 mode 中的类型位
    pub fn type_bits(self) -> u32 {
        match self {
            InodeKind::Directory => INODE_MODE_DIRECTORY,
            InodeKind::RegularFile => INODE_MODE_FILE,
        }
    }

    /// 以本种类的类型位替换 `mode` 中的类型位，保留权限位
    pub fn mode_with_perm(self, mode: u32) -> u32 {
        self.type_bits() | (mode & INODE_MODE_PERM_MASK)
    }

    /// 新建 inode 的初始链接数（目录含 `.`）
    pub fn initial_links(self) -> u32 {
        match self {
            InodeKind::Directory => 2,
            InodeKind::RegularFile => 1,
        }
    }

    pub fn capabilities(self) -> Capabilities {
        match self {
            InodeKind::Directory => Capabilities::DIR_OPS,
            InodeKind::RegularFile => Capabilities::READ | Capabilities::WRITE,
        }
    }

    pub fn is_dir(self) -> bool {
        self == InodeKind::Directory
    }
}
