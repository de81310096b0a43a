//! 该模块是 extentfs 面向上层 VFS 胶水代码的入口，定义了对外暴露的接口。
//!
//! 存储引擎本身要求 `&mut` 独占访问；这里把它放在一把锁后面，
//! 使位图修改和 extent 追加在并发调用下依然串行执行。

// 禁用标准库，适用于内核环境
#![no_std]

// 引入内存分配库
extern crate alloc;

// 引入日志宏
#[macro_use]
extern crate log;

// 错误处理模块
mod error;
// 带读写位置的文件句柄
mod file;
// 文件系统核心逻辑模块
mod fs;

// 对外暴露错误处理类型
pub use error::{Error, ErrorKind, Result};
// 对外暴露文件句柄
pub use file::{File, SeekFrom};
// 对外暴露文件系统相关类型和方法
pub use fs::*;

// 对外暴露引擎中的句柄与统计类型
pub use extentfs_core::{Capabilities, FsConfig, InodeKind, InodeRef, StatFs};
