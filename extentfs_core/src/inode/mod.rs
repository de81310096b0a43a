//! Inode 模块
//!
//! inode 表中的定长记录，以及由 mode 类型位推导出的文件种类。

mod kind;
mod record;

pub use kind::{Capabilities, InodeKind};
pub use record::InodeRecord;
