//! Inode 编号分配模块

mod alloc;
mod free;

pub use self::alloc::alloc_inode;
pub use self::free::free_inode;
