//! 错误处理模块

use core::fmt;

use crate::consts::*;

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 请求的块数为 0 或超过总块数等非法参数
    InvalidInput,
    /// 没有足够的连续块、空闲 inode 或 extent 槽位
    NoSpace,
    /// inode 编号越界或句柄已失效
    InvalidInode,
    /// extent 的起始块超出数据区
    InvalidBlock,
    /// 访问窗口越过子区域边界
    OutOfBounds,
    /// 调用方提供的缓冲区拷贝失败
    CopyFailure,
    /// 无法获得存储区域
    NoMemory,
    /// 元数据损坏
    Corrupted,
    /// 对目录执行了文件数据读写
    IsDirectory,
    /// 对普通文件执行了目录操作
    NotDirectory,
}

impl ErrorKind {
    /// 映射为 errno（内核胶水层返回负值时使用）
    pub fn to_errno(self) -> i32 {
        match self {
            ErrorKind::InvalidInput => EINVAL,
            ErrorKind::NoSpace => ENOSPC,
            ErrorKind::InvalidInode => EINVAL,
            ErrorKind::InvalidBlock => EIO,
            ErrorKind::OutOfBounds => EIO,
            ErrorKind::CopyFailure => EFAULT,
            ErrorKind::NoMemory => ENOMEM,
            ErrorKind::Corrupted => EIO,
            ErrorKind::IsDirectory => EISDIR,
            ErrorKind::NotDirectory => ENOTDIR,
        }
    }
}

/// extentfs 错误类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

impl Error {
    pub fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    pub fn to_errno(&self) -> i32 {
        self.kind.to_errno()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl core::error::Error for Error {}

/// extentfs Result 类型
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(Error::new(ErrorKind::NoSpace, "full").to_errno(), ENOSPC);
        assert_eq!(Error::new(ErrorKind::InvalidInput, "zero").to_errno(), EINVAL);
        assert_eq!(Error::new(ErrorKind::CopyFailure, "fault").to_errno(), EFAULT);
        assert_eq!(Error::new(ErrorKind::NoMemory, "vmalloc").to_errno(), ENOMEM);
        assert_eq!(Error::new(ErrorKind::InvalidBlock, "block").to_errno(), EIO);
    }

    #[test]
    fn test_display_carries_message() {
        use alloc::string::ToString;

        let err = Error::new(ErrorKind::Corrupted, "bad magic");
        assert_eq!(err.to_string(), "Corrupted: bad magic");
    }
}
