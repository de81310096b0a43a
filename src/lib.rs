//! extentfs: 基于 extent 的内存文件系统存储引擎
//!
//! - [`engine`]: 区域布局、位图分配器、inode 记录与文件数据路径
//! - [`vfs`]: 面向上层 VFS 胶水代码的加锁接口

#![no_std]

pub use extentfs_core as engine;
pub use extentfs_vfs as vfs;
