//! extentfs-core: 基于 extent 的内存文件系统存储引擎
//!
//! 整个文件系统位于一块连续区域中：
//!
//! ```text
//! [Header][InodeBitmap][BlockBitmap][InodeTable][DataArea]
//! ```
//!
//! 数据块以连续区段（extent）首次适配分配，每个 inode 最多持有
//! `MAX_EXTENTS` 个 extent，文件数据按逻辑偏移依次铺在其上。

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

// 公共模块
pub mod consts;
pub mod error;
pub mod bitmap;
pub mod layout;
pub mod region;
pub mod balloc;
pub mod ialloc;
pub mod extent;
pub mod inode;
pub mod transfer;
pub mod fs;

// 重新导出常用类型
pub use consts::*;
pub use error::{Error, ErrorKind, Result};
pub use extent::{Extent, ExtentList};
pub use fs::{ExtentFs, FsConfig, InodeRef, StatFs};
pub use inode::{Capabilities, InodeKind, InodeRecord};
pub use region::{Header, Region};
pub use transfer::{CopyIn, CopyOut};
