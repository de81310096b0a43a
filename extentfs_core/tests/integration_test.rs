//! 集成测试 - 测试 extentfs_core 的文件生命周期

use std::time::Duration;

use extentfs_core::{
    CopyIn, CopyOut, Error, ErrorKind, ExtentFs, FsConfig, InodeKind, Result, BLOCK_SIZE,
    DATA_BLOCK_COUNT, INODE_COUNT, INODE_MODE_DIRECTORY, ROOT_INO,
};

const NOW: Duration = Duration::from_secs(1_700_000_000);

fn mount() -> ExtentFs {
    ExtentFs::mount(FsConfig::default()).unwrap()
}

/// 在指定偏移之后拒绝拷贝的目标缓冲区
struct FaultyOut {
    buf: Vec<u8>,
    fail_from: usize,
}

impl CopyOut for FaultyOut {
    fn len(&self) -> usize {
        self.buf.len()
    }

    fn copy_out(&mut self, at: usize, src: &[u8]) -> Result<()> {
        if at >= self.fail_from {
            return Err(Error::new(ErrorKind::CopyFailure, "user page fault"));
        }
        self.buf[at..at + src.len()].copy_from_slice(src);
        Ok(())
    }
}

/// 在指定偏移之后拒绝拷贝的源缓冲区
struct FaultyIn {
    data: Vec<u8>,
    fail_from: usize,
}

impl CopyIn for FaultyIn {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn copy_in(&self, at: usize, dst: &mut [u8]) -> Result<()> {
        if at >= self.fail_from {
            return Err(Error::new(ErrorKind::CopyFailure, "user page fault"));
        }
        dst.copy_from_slice(&self.data[at..at + dst.len()]);
        Ok(())
    }
}

#[test]
fn test_mount_and_stat() {
    let fs = mount();
    let stat = fs.stat();

    assert_eq!(stat.block_size, BLOCK_SIZE);
    assert_eq!(stat.inodes_count, INODE_COUNT);
    assert_eq!(stat.blocks_count, DATA_BLOCK_COUNT);
    // 0 号保留 + 根目录
    assert_eq!(stat.free_inodes_count, INODE_COUNT - 2);
    assert_eq!(stat.free_blocks_count, DATA_BLOCK_COUNT - 1);

    let root = fs.root(NOW).unwrap();
    assert_eq!(root.ino(), ROOT_INO);
    assert_eq!(root.kind(), InodeKind::Directory);
    assert_eq!(root.mode() & INODE_MODE_DIRECTORY, INODE_MODE_DIRECTORY);
    assert_eq!(root.nlink(), 2);
}

#[test]
fn test_memory_limit() {
    let config = FsConfig {
        memory_limit: Some(1024),
        ..FsConfig::default()
    };
    assert_eq!(ExtentFs::mount(config).unwrap_err().kind(), ErrorKind::NoMemory);
}

#[test]
fn test_write_then_read() {
    let mut fs = mount();
    let mut file = fs.alloc_file(0o644, NOW).unwrap();

    let data: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
    assert_eq!(fs.write(&mut file, 0, &data[..], NOW).unwrap(), 5000);
    assert_eq!(file.size(), 5000);
    assert_eq!(file.blocks(), 2);
    assert!(file.is_dirty());

    let record = fs.record_at(file.ino()).unwrap();
    assert_eq!(record.size, 5000);
    assert_eq!(record.extents.len(), 1);
    assert_eq!(record.extents.as_slice()[0].block_count, 2);

    let mut buf = vec![0u8; 5000];
    assert_eq!(fs.read(&file, 0, &mut buf[..]).unwrap(), 5000);
    assert_eq!(buf, data);

    fs.check().unwrap();
}

#[test]
fn test_read_clamps_to_size() {
    let mut fs = mount();
    let mut file = fs.alloc_file(0o644, NOW).unwrap();

    let mut buf = [0u8; 16];
    assert_eq!(fs.read(&file, 0, &mut buf[..]).unwrap(), 0);

    fs.write(&mut file, 0, &b"hello world"[..], NOW).unwrap();
    assert_eq!(fs.read(&file, 6, &mut buf[..]).unwrap(), 5);
    assert_eq!(&buf[..5], b"world");
    assert_eq!(fs.read(&file, 11, &mut buf[..]).unwrap(), 0);
    assert_eq!(fs.read(&file, 100, &mut buf[..]).unwrap(), 0);
}

#[test]
fn test_overwrite_keeps_size() {
    let mut fs = mount();
    let mut file = fs.alloc_file(0o644, NOW).unwrap();

    fs.write(&mut file, 0, &b"abcdefgh"[..], NOW).unwrap();
    assert_eq!(fs.write(&mut file, 2, &b"XY"[..], NOW).unwrap(), 2);
    assert_eq!(file.size(), 8);

    let mut buf = [0u8; 8];
    fs.read(&file, 0, &mut buf[..]).unwrap();
    assert_eq!(&buf, b"abXYefgh");
}

#[test]
fn test_empty_write_is_noop() {
    let mut fs = mount();
    let mut file = fs.alloc_file(0o644, NOW).unwrap();
    let free = fs.stat().free_blocks_count;

    assert_eq!(fs.write(&mut file, 0, &[0u8; 0][..], NOW).unwrap(), 0);
    assert_eq!(fs.stat().free_blocks_count, free);
    assert!(!file.is_dirty());
}

#[test]
fn test_directory_rejects_data_access() {
    let mut fs = mount();
    let mut dir = fs.alloc_dir(0o700, NOW).unwrap();
    assert_eq!(dir.nlink(), 2);

    let err = fs.write(&mut dir, 0, &b"x"[..], NOW).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IsDirectory);

    let mut buf = [0u8; 1];
    let err = fs.read(&dir, 0, &mut buf[..]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IsDirectory);
}

#[test]
fn test_destroy_releases_everything() {
    let mut fs = mount();
    let before = fs.stat();

    let mut file = fs.alloc_file(0o644, NOW).unwrap();
    fs.write(&mut file, 0, &vec![7u8; 3 * 4096][..], NOW).unwrap();
    fs.write(&mut file, 3 * 4096, &vec![8u8; 100][..], NOW).unwrap();
    assert_eq!(fs.record_at(file.ino()).unwrap().extents.len(), 2);

    let ino = file.ino();
    fs.destroy(&mut file).unwrap();
    assert!(!file.is_attached());
    assert_eq!(fs.stat(), before);
    assert!(!fs.region().inode_allocated(ino));

    let record = fs.record_at(ino).unwrap();
    assert!(record.extents.is_empty());
    assert_eq!(record.size, 0);

    // 已销毁的句柄不可再用
    let mut buf = [0u8; 1];
    assert_eq!(fs.read(&file, 0, &mut buf[..]).unwrap_err().kind(), ErrorKind::InvalidInode);
    assert_eq!(fs.destroy(&mut file).unwrap_err().kind(), ErrorKind::InvalidInode);

    fs.check().unwrap();
}

#[test]
fn test_destroyed_blocks_are_zeroed_on_reuse() {
    let mut fs = mount();

    let mut old = fs.alloc_file(0o644, NOW).unwrap();
    fs.write(&mut old, 0, &vec![0xEEu8; 4096][..], NOW).unwrap();
    fs.destroy(&mut old).unwrap();

    // 从 100 开始写，前 100 字节来自新分配的块
    let mut new = fs.alloc_file(0o644, NOW).unwrap();
    fs.write(&mut new, 100, &b"tail"[..], NOW).unwrap();
    assert_eq!(new.size(), 104);

    let mut buf = [0xFFu8; 104];
    fs.read(&new, 0, &mut buf[..]).unwrap();
    assert!(buf[..100].iter().all(|b| *b == 0));
    assert_eq!(&buf[100..], b"tail");
}

#[test]
fn test_inode_exhaustion_leaves_nothing_claimed() {
    let config = FsConfig {
        inode_count: 4,
        ..FsConfig::default()
    };
    let mut fs = ExtentFs::mount(config).unwrap();

    let a = fs.alloc_file(0o644, NOW).unwrap();
    let b = fs.alloc_dir(0o755, NOW).unwrap();
    assert_eq!((a.ino(), b.ino()), (2, 3));

    let before = fs.stat();
    assert_eq!(fs.alloc_file(0o644, NOW).unwrap_err().kind(), ErrorKind::NoSpace);
    assert_eq!(fs.stat(), before);
}

#[test]
fn test_out_of_blocks_on_first_write() {
    let config = FsConfig {
        block_count: 3,
        ..FsConfig::default()
    };
    let mut fs = ExtentFs::mount(config).unwrap();
    let mut file = fs.alloc_file(0o644, NOW).unwrap();

    // 根目录占 1 块，剩 2 块
    let err = fs.write(&mut file, 0, &vec![1u8; 4 * 4096][..], NOW).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = fs.write(&mut file, 0, &vec![1u8; 2 * 4096 + 1][..], NOW).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoSpace);
    assert_eq!(file.size(), 0);
    assert_eq!(fs.stat().free_blocks_count, 2);
}

#[test]
fn test_partial_read_on_copy_failure() {
    let mut fs = mount();
    let mut file = fs.alloc_file(0o644, NOW).unwrap();
    // 两个单块 extent，读路径按 extent 分两次拷贝
    fs.write(&mut file, 0, &vec![3u8; 4096][..], NOW).unwrap();
    fs.write(&mut file, 4096, &vec![4u8; 4096][..], NOW).unwrap();
    assert_eq!(fs.record_at(file.ino()).unwrap().extents.len(), 2);

    let mut out = FaultyOut {
        buf: vec![0u8; 2 * 4096],
        fail_from: 4096,
    };
    assert_eq!(fs.read(&file, 0, &mut out).unwrap(), 4096);
    assert!(out.buf[..4096].iter().all(|b| *b == 3));

    let mut out = FaultyOut {
        buf: vec![0u8; 10],
        fail_from: 0,
    };
    assert_eq!(fs.read(&file, 0, &mut out).unwrap_err().kind(), ErrorKind::CopyFailure);
}

#[test]
fn test_partial_write_on_copy_failure() {
    let mut fs = mount();
    let mut file = fs.alloc_file(0o644, NOW).unwrap();

    let src = FaultyIn {
        data: vec![9u8; 10_000],
        fail_from: 4096,
    };
    assert_eq!(fs.write(&mut file, 0, &src, NOW).unwrap(), 4096);
    assert_eq!(file.size(), 4096);
    assert!(file.is_dirty());

    let src = FaultyIn {
        data: vec![9u8; 10],
        fail_from: 0,
    };
    let mut other = fs.alloc_file(0o644, NOW).unwrap();
    let err = fs.write(&mut other, 0, &src, NOW).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CopyFailure);
    assert_eq!(other.size(), 0);
    // 已分配的 extent 仍归该 inode 所有
    assert_eq!(other.blocks(), 1);
    fs.check().unwrap();
}

#[test]
fn test_unmount_and_attach() {
    let mut fs = mount();
    let mut file = fs.alloc_file(0o600, NOW).unwrap();
    fs.write(&mut file, 0, &b"persisted"[..], NOW).unwrap();
    let ino = file.ino();
    let stat = fs.stat();

    let image = fs.unmount();
    let fs = ExtentFs::attach(image).unwrap();
    assert_eq!(fs.stat(), stat);

    let file = fs.materialize(ino, NOW).unwrap();
    let mut buf = [0u8; 9];
    assert_eq!(fs.read(&file, 0, &mut buf[..]).unwrap(), 9);
    assert_eq!(&buf, b"persisted");
}

#[test]
fn test_attach_rejects_inconsistent_image() {
    let fs = mount();
    let mut image = fs.unmount();
    // 篡改空闲块计数
    image[20] = image[20].wrapping_add(1);

    assert_eq!(ExtentFs::attach(image).unwrap_err().kind(), ErrorKind::Corrupted);
}

#[test]
fn test_attach_rejects_overflowing_free_count() {
    let image = mount().unmount();

    // 空闲计数加上位图中的数量会溢出 u32
    let mut inodes = image.clone();
    inodes[16..20].copy_from_slice(&u32::MAX.to_le_bytes());
    assert_eq!(ExtentFs::attach(inodes).unwrap_err().kind(), ErrorKind::Corrupted);

    let mut blocks = image;
    blocks[20..24].copy_from_slice(&u32::MAX.to_le_bytes());
    assert_eq!(ExtentFs::attach(blocks).unwrap_err().kind(), ErrorKind::Corrupted);
}

#[test]
fn test_old_handle_rejected_after_inode_reuse() {
    let mut fs = mount();

    let mut first = fs.alloc_file(0o644, NOW).unwrap();
    let mut stale = fs.materialize(first.ino(), NOW).unwrap();
    fs.destroy(&mut first).unwrap();

    // 新文件拿到同一个编号
    let mut second = fs.alloc_file(0o644, NOW).unwrap();
    assert_eq!(second.ino(), stale.ino());
    assert!(stale.is_attached());
    fs.write(&mut second, 0, &b"fresh"[..], NOW).unwrap();

    let mut buf = [0u8; 5];
    assert_eq!(fs.read(&stale, 0, &mut buf[..]).unwrap_err().kind(), ErrorKind::InvalidInode);
    let err = fs.write(&mut stale, 0, &b"stale"[..], NOW).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInode);
    assert_eq!(fs.destroy(&mut stale).unwrap_err().kind(), ErrorKind::InvalidInode);
    assert_eq!(fs.size(&stale).unwrap_err().kind(), ErrorKind::InvalidInode);

    // 新文件不受影响
    assert_eq!(fs.read(&second, 0, &mut buf[..]).unwrap(), 5);
    assert_eq!(&buf, b"fresh");
    assert_eq!(fs.materialize(second.ino(), NOW).unwrap().generation(), second.generation());
    fs.check().unwrap();
}

#[test]
fn test_write_refreshes_mtime() {
    let mut fs = mount();
    let mut file = fs.alloc_file(0o644, NOW).unwrap();
    let later = NOW + Duration::from_secs(30);

    // 空写入不算修改
    fs.write(&mut file, 0, &[0u8; 0][..], later).unwrap();
    assert_eq!(file.mtime(), NOW);
    assert!(!file.is_dirty());

    fs.write(&mut file, 0, &b"data"[..], later).unwrap();
    assert_eq!(file.mtime(), later);
    assert_eq!(file.ctime(), later);
    assert_eq!(file.atime(), NOW);
    assert!(file.is_dirty());
}
