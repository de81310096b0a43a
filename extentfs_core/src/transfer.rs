//! 调用方缓冲区传输
//!
//! 数据路径不直接接触调用方内存，而是通过这两个 trait 逐块拷贝。
//! 内核胶水层可以在此接入 `copy_to_user` / `copy_from_user`，
//! 任意一次拷贝失败都以 `CopyFailure` 报告。

use crate::error::{Error, ErrorKind, Result};

/// 读路径的目标缓冲区
pub trait CopyOut {
    /// 可写入的总字节数
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 把 `src` 拷贝到缓冲区的 `at` 处
    fn copy_out(&mut self, at: usize, src: &[u8]) -> Result<()>;
}

/// 写路径的源缓冲区
pub trait CopyIn {
    /// 可读取的总字节数
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 从缓冲区的 `at` 处取 `dst.len()` 字节填入 `dst`
    fn copy_in(&self, at: usize, dst: &mut [u8]) -> Result<()>;
}

impl CopyOut for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn copy_out(&mut self, at: usize, src: &[u8]) -> Result<()> {
        let end = at.checked_add(src.len());
        match end.and_then(|end| self.get_mut(at..end)) {
            Some(dst) => {
                dst.copy_from_slice(src);
                Ok(())
            }
            None => Err(Error::new(ErrorKind::CopyFailure, "destination buffer too small")),
        }
    }
}

impl CopyIn for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn copy_in(&self, at: usize, dst: &mut [u8]) -> Result<()> {
        let end = at.checked_add(dst.len());
        match end.and_then(|end| self.get(at..end)) {
            Some(src) => {
                dst.copy_from_slice(src);
                Ok(())
            }
            None => Err(Error::new(ErrorKind::CopyFailure, "source buffer too small")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_copy_out() {
        let mut buf = [0u8; 8];
        CopyOut::copy_out(&mut buf[..], 2, b"abc").unwrap();
        assert_eq!(&buf[2..5], b"abc");

        let err = CopyOut::copy_out(&mut buf[..], 6, b"abc").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CopyFailure);
    }

    #[test]
    fn test_slice_copy_in() {
        let src = *b"hello";
        let mut dst = [0u8; 3];
        CopyIn::copy_in(&src[..], 1, &mut dst).unwrap();
        assert_eq!(&dst, b"ell");

        let err = CopyIn::copy_in(&src[..], 4, &mut dst).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CopyFailure);
    }
}
