//! Extent 模块
//!
//! Extent 是一段连续的数据块 `[start_block, start_block + block_count)`。
//! 每个 inode 按顺序持有最多 `MAX_EXTENTS` 个 extent，文件的逻辑字节
//! 依次铺在这些 extent 上。

mod list;

pub use list::*;
