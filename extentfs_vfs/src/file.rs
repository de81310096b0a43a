//! 带读写位置的文件句柄

use core::marker::PhantomData;

use alloc::{vec, vec::Vec};

use extentfs_core::{Capabilities, InodeRef};

use crate::{Error, ErrorKind, Filesystem, Result, SystemHal};

/// 定位方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    /// 相对文件开头
    Start(u64),
    /// 相对文件末尾
    End(i64),
    /// 相对当前位置
    Current(i64),
}

/// 打开的普通文件
///
/// 持有 inode 句柄和当前位置，读写后位置前移实际搬运的字节数。
///
/// # 示例
///
/// ```rust,ignore
/// let handle = fs.alloc_file(0o644)?;
/// let mut file = File::open(handle)?;
/// file.write(&fs, b"hello")?;
/// file.rewind();
/// let content = file.read_to_end(&fs)?;
/// ```
pub struct File<Hal: SystemHal> {
    handle: InodeRef,
    pos: u64,
    _phantom: PhantomData<Hal>,
}

impl<Hal: SystemHal> File<Hal> {
    /// 打开文件，目录返回 `IsDirectory`
    pub fn open(handle: InodeRef) -> Result<Self> {
        handle.require(Capabilities::READ | Capabilities::WRITE)?;
        Ok(Self {
            handle,
            pos: 0,
            _phantom: PhantomData,
        })
    }

    /// 从当前位置读取
    ///
    /// # 返回
    ///
    /// 实际读取的字节数，到达文件末尾时为 0
    pub fn read(&mut self, fs: &Filesystem<Hal>, buf: &mut [u8]) -> Result<usize> {
        let n = fs.read(&self.handle, self.pos, buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    /// 在当前位置写入
    pub fn write(&mut self, fs: &Filesystem<Hal>, buf: &[u8]) -> Result<usize> {
        let n = fs.write(&mut self.handle, self.pos, buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    /// 从当前位置读到文件末尾
    ///
    /// 文件大小取自记录，其他句柄追加的数据也能读到。
    pub fn read_to_end(&mut self, fs: &Filesystem<Hal>) -> Result<Vec<u8>> {
        let remaining = fs.size(&self.handle)?.saturating_sub(self.pos);
        let remaining = usize::try_from(remaining)
            .map_err(|_| Error::new(ErrorKind::InvalidInput, "file too large to read into memory"))?;

        let mut buf = vec![0u8; remaining];
        let mut total_read = 0;

        while total_read < buf.len() {
            let n = self.read(fs, &mut buf[total_read..])?;
            if n == 0 {
                break; // EOF
            }
            total_read += n;
        }

        buf.truncate(total_read);
        Ok(buf)
    }

    /// 移动读写位置
    ///
    /// 允许定位到文件末尾之后，之后的写入会在中间留下全零数据。
    ///
    /// # 错误
    ///
    /// 目标位置为负或溢出时返回 `InvalidInput`
    pub fn seek(&mut self, fs: &Filesystem<Hal>, pos: SeekFrom) -> Result<u64> {
        let (base, delta) = match pos {
            SeekFrom::Start(offset) => {
                self.pos = offset;
                return Ok(offset);
            }
            SeekFrom::End(delta) => (fs.size(&self.handle)?, delta),
            SeekFrom::Current(delta) => (self.pos, delta),
        };

        self.pos = base
            .checked_add_signed(delta)
            .ok_or(Error::new(ErrorKind::InvalidInput, "invalid seek position"))?;
        Ok(self.pos)
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// 当前文件大小
    pub fn size(&self, fs: &Filesystem<Hal>) -> Result<u64> {
        fs.size(&self.handle)
    }

    pub fn handle(&self) -> &InodeRef {
        &self.handle
    }

    /// 交回 inode 句柄（例如用于销毁）
    pub fn into_handle(self) -> InodeRef {
        self.handle
    }
}
