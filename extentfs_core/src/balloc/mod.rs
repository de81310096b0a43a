//! 数据块分配模块
//!
//! 基于块位图的连续区段分配，首次适配，不做碎片整理。

mod alloc;
mod free;

pub use self::alloc::alloc_extent;
pub use self::free::free_extent;
