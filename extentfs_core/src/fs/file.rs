//! 文件数据路径
//!
//! 读写都按逻辑偏移在 extent 列表中定位：第 i 个 extent 覆盖的逻辑范围是
//! 前 i 个 extent 的字节数之和起、长度为自身字节数的一段，与物理块号无关。
//!
//! 两个方向都遵循部分成功语义：已经搬运了字节后遇到错误，返回已搬运的
//! 字节数；一个字节都没搬运时才返回错误。

use core::time::Duration;

use log::{debug, error, warn};

use crate::{
    balloc::{alloc_extent, free_extent},
    consts::*,
    error::{Error, ErrorKind, Result},
    inode::{Capabilities, InodeRecord},
    region::Region,
    transfer::{CopyIn, CopyOut},
};

use super::inode_ref::InodeRef;

/// 容纳 `bytes` 字节所需的块数
fn blocks_for(bytes: u64) -> Result<u32> {
    u32::try_from(bytes.div_ceil(BLOCK_SIZE as u64))
        .map_err(|_| Error::new(ErrorKind::InvalidInput, "request exceeds block range"))
}

/// 统一部分成功语义
fn settle(result: Result<()>, moved: usize, op: &str, ino: u32) -> Result<usize> {
    match result {
        Ok(()) => Ok(moved),
        Err(e) if moved > 0 => {
            warn!("extentfs: {} on inode {} stopped after {} bytes: {}", op, ino, moved, e);
            Ok(moved)
        }
        Err(e) => Err(e),
    }
}

/// 确认句柄仍指向当前这个 inode，返回其记录
///
/// inode 已释放，或者释放后编号又被分配给新文件（代数不同），都返回 `InvalidInode`。
pub(super) fn live_record(
    region: &Region,
    handle: &InodeRef,
    caps: Capabilities,
) -> Result<InodeRecord> {
    handle.require(caps)?;
    if !region.inode_allocated(handle.ino()) {
        return Err(Error::new(ErrorKind::InvalidInode, "inode is no longer allocated"));
    }
    let record = region.record_at(handle.ino())?;
    if record.generation != handle.generation() {
        debug!(
            "extentfs: stale handle for inode {} (generation {}, now {})",
            handle.ino(),
            handle.generation(),
            record.generation
        );
        return Err(Error::new(ErrorKind::InvalidInode, "inode has been reused"));
    }
    Ok(record)
}

/// 从 `offset` 起读取，最多填满 `dst`
///
/// 没有 extent 或 `offset` 不小于文件大小时返回 0；读取长度被截断到文件末尾。
pub(super) fn read<B>(region: &Region, handle: &InodeRef, offset: u64, dst: &mut B) -> Result<usize>
where
    B: CopyOut + ?Sized,
{
    let record = live_record(region, handle, Capabilities::READ)?;
    if record.extents.is_empty() || offset >= record.size {
        return Ok(0);
    }

    let len = (dst.len() as u64).min(record.size - offset) as usize;
    let mut done = 0usize;
    let result = read_chunks(region, &record, offset, len, dst, &mut done);
    settle(result, done, "read", record.ino)
}

fn read_chunks<B>(
    region: &Region,
    record: &InodeRecord,
    offset: u64,
    len: usize,
    dst: &mut B,
    done: &mut usize,
) -> Result<()>
where
    B: CopyOut + ?Sized,
{
    while *done < len {
        let pos = offset + *done as u64;
        let at = record.extents.locate(pos).ok_or_else(|| {
            error!("extentfs: inode {} size {} exceeds its extents", record.ino, record.size);
            Error::new(ErrorKind::Corrupted, "file size exceeds extent capacity")
        })?;

        let left_in_extent = at.extent.byte_len() - at.offset_in_extent;
        let chunk = ((len - *done) as u64).min(left_in_extent) as usize;

        let window = region
            .layout()
            .data_window(at.extent.start_block, at.offset_in_extent, chunk)
            .inspect_err(|e| {
                error!(
                    "extentfs: inode {} extent {} ({}, {}) unreadable: {}",
                    record.ino, at.index, at.extent.start_block, at.extent.block_count, e
                );
            })?;
        dst.copy_out(*done, region.bytes(window)?)?;

        debug!("extentfs: read {} bytes of inode {} at {}", chunk, record.ino, pos);
        *done += chunk;
    }
    Ok(())
}

/// 从 `offset` 起写入 `src` 的全部字节
///
/// 文件没有 extent 时先分配一个能容纳整个写入的 extent；写到容量之外时
/// 追加新 extent。extent 列表已满时停止，已写入的字节仍然计数。
/// 写入了数据时用 `now` 刷新句柄的修改时间。
pub(super) fn write<B>(
    region: &mut Region,
    handle: &mut InodeRef,
    offset: u64,
    src: &B,
    now: Duration,
) -> Result<usize>
where
    B: CopyIn + ?Sized,
{
    let mut record = live_record(region, handle, Capabilities::WRITE)?;

    let len = src.len();
    if len == 0 {
        return Ok(0);
    }
    if offset.checked_add(len as u64).is_none() {
        return Err(Error::new(ErrorKind::InvalidInput, "write end overflows file offset"));
    }

    let mut done = 0usize;
    let result = write_chunks(region, &mut record, offset, src, &mut done);

    let end = offset + done as u64;
    if done > 0 && end > record.size {
        record.size = end;
        region.write_record(&record)?;
    }
    // 其他句柄造成的增长也一并带回
    handle.set_size(record.size);
    handle.set_blocks(record.block_count);
    if done > 0 {
        handle.touch_modified(now);
        handle.mark_dirty();
    }

    settle(result, done, "write", record.ino)
}

fn write_chunks<B>(
    region: &mut Region,
    record: &mut InodeRecord,
    offset: u64,
    src: &B,
    done: &mut usize,
) -> Result<()>
where
    B: CopyIn + ?Sized,
{
    let len = src.len();

    if record.extents.is_empty() {
        grow(region, record, blocks_for(len as u64)?)?;
    }

    while *done < len {
        let pos = offset + *done as u64;
        let remaining = len - *done;

        let Some(at) = record.extents.locate(pos) else {
            if record.extents.is_full() {
                error!("extentfs: inode {} has no free extent slot", record.ino);
                return Err(Error::new(ErrorKind::NoSpace, "extent list is full"));
            }
            let needed = pos + remaining as u64 - record.capacity();
            grow(region, record, blocks_for(needed)?)?;
            continue;
        };

        let in_block = (at.offset_in_extent % BLOCK_SIZE as u64) as usize;
        let chunk = remaining.min(BLOCK_SIZE as usize - in_block);

        let window = region
            .layout()
            .data_window(at.extent.start_block, at.offset_in_extent, chunk)?;
        src.copy_in(*done, region.bytes_mut(window)?)?;

        debug!("extentfs: wrote {} bytes of inode {} at {}", chunk, record.ino, pos);
        *done += chunk;
    }
    Ok(())
}

/// 分配一个新 extent、清零并追加到记录
///
/// 记录立刻写回，保证之后的任何失败都不会让已分配的块脱离记录。
fn grow(region: &mut Region, record: &mut InodeRecord, blocks: u32) -> Result<()> {
    let extent = alloc_extent(region, blocks)?;

    let attached = region
        .zero_blocks(extent.start_block, extent.block_count)
        .and_then(|_| record.extents.push(extent));
    if let Err(e) = attached {
        free_extent(region, &extent)?;
        return Err(e);
    }

    record.block_count += extent.block_count;
    region.write_record(record)?;

    debug!(
        "extentfs: inode {} grew by extent ({}, {}), {} extents",
        record.ino,
        extent.start_block,
        extent.block_count,
        record.extents.len()
    );
    Ok(())
}
