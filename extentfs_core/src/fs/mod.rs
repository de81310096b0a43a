//! 文件系统高级 API
//!
//! [`ExtentFs`] 拥有存储区域，对上层提供挂载、inode 实体化、
//! 文件创建与销毁以及数据读写。

mod file;
mod filesystem;
mod inode_ref;

pub use filesystem::{ExtentFs, FsConfig, StatFs};
pub use inode_ref::InodeRef;
