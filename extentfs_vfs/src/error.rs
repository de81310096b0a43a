//! 错误处理模块，直接复用存储引擎的错误类型。

pub use extentfs_core::{Error, ErrorKind, Result};

/// 为结果类型添加上下文的 trait
///
/// 引擎的错误已经带有消息，这里只在出错时记录调用点，不改变错误本身。
pub(crate) trait Context<T> {
    /// 出错时以 `context` 为前缀记录日志
    fn context(self, context: &'static str) -> Result<T>;
}

impl<T> Context<T> for Result<T> {
    fn context(self, context: &'static str) -> Result<T> {
        self.inspect_err(|e| debug!("extentfs: {context}: {e} (errno {})", e.to_errno()))
    }
}
