//! extentfs 常量定义

/// 数据块大小（字节）
pub const BLOCK_SIZE: u32 = 4096;

/// 默认 inode 数量
pub const INODE_COUNT: u32 = 20;

/// 默认数据块数量
pub const DATA_BLOCK_COUNT: u32 = 20;

/// 每个 inode 记录可容纳的 extent 上限
pub const MAX_EXTENTS: usize = 8;

/// 根目录 inode 编号（0 号保留，永不分配）
pub const ROOT_INO: u32 = 1;

/// 文件系统魔数
pub const EXTENTFS_MAGIC: u32 = 0x051A_B520;

/// 位图存储单元（与内核 `unsigned long` 一致，64 位）
pub const BITMAP_UNIT_BITS: u32 = 64;
pub const BITMAP_UNIT_BYTES: usize = (BITMAP_UNIT_BITS / 8) as usize;

/// 头部大小：magic, block_size, inode_count, block_count,
/// free_inode_count, free_block_count 各 4 字节
pub const HEADER_SIZE: usize = 24;

/// Extent 编码大小：start_block + block_count
pub const EXTENT_SIZE: usize = 8;

/// inode 记录中 extent 数组之前的固定字段大小
pub const INODE_RECORD_FIXED_SIZE: usize = 36;

/// inode 记录大小，尾部填充到 8 字节对齐
pub const INODE_RECORD_SIZE: usize =
    (INODE_RECORD_FIXED_SIZE + EXTENT_SIZE * MAX_EXTENTS + 7) & !7;

/// 错误码（兼容 C errno）
pub const EOK: i32 = 0;
pub const EIO: i32 = 5;
pub const ENOMEM: i32 = 12;
pub const EFAULT: i32 = 14;
pub const ENOTDIR: i32 = 20;
pub const EISDIR: i32 = 21;
pub const EINVAL: i32 = 22;
pub const ENOSPC: i32 = 28;

/// Inode 模式位
pub const INODE_MODE_DIRECTORY: u32 = 0x4000;
pub const INODE_MODE_FILE: u32 = 0x8000;
pub const INODE_MODE_TYPE_MASK: u32 = 0xF000;
pub const INODE_MODE_PERM_MASK: u32 = 0x0FFF;

/// 根目录默认权限
pub const ROOT_DIR_PERM: u32 = 0o755;
