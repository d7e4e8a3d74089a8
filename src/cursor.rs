use crate::datatypes::{FixedWidth, Offset, Position};
use std::io::{self, Read, Seek, SeekFrom};
use thiserror::Error;

/// 流层面的读取/定位失败
#[derive(Error, Debug)]
pub enum StreamFault {
    #[error("read of {wanted} bytes at {at} ran past end of stream")]
    Truncated { at: Position, wanted: u64 },

    #[error("seek from {from} by {offset} leaves the stream")]
    SeekOutOfRange { from: Position, offset: Offset },

    #[error("IO error at {at}: {source}")]
    Io { at: Position, source: io::Error },
}

impl StreamFault {
    /// 出错时游标所在位置
    pub fn position(&self) -> Position {
        match self {
            StreamFault::Truncated { at, .. } | StreamFault::Io { at, .. } => *at,
            StreamFault::SeekOutOfRange { from, .. } => *from,
        }
    }
}

/// 字节流上的定位游标
///
/// 自行记录位置与流长度，所有越界读取/定位都在触碰底层流之前被拒绝，
/// 失败后位置保持不变。
#[derive(Debug)]
pub struct TesCursor<R> {
    inner: R,
    position: Position,
    len: u64,
}

impl<'a> TesCursor<io::Cursor<&'a [u8]>> {
    /// 内存切片上的游标（记录数据区、测试数据）
    pub fn from_slice(data: &'a [u8]) -> Self {
        TesCursor {
            inner: io::Cursor::new(data),
            position: Position::START,
            len: data.len() as u64,
        }
    }
}

impl<R: Read + Seek> TesCursor<R> {
    pub fn new(mut inner: R) -> Result<Self, StreamFault> {
        let io_fault = |source: io::Error| StreamFault::Io {
            at: Position::START,
            source,
        };
        let len = inner.seek(SeekFrom::End(0)).map_err(io_fault)?;
        inner.seek(SeekFrom::Start(0)).map_err(io_fault)?;
        Ok(TesCursor {
            inner,
            position: Position::START,
            len,
        })
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn end(&self) -> Position {
        Position(self.len)
    }

    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.position.0)
    }

    pub fn at_end(&self) -> bool {
        self.position.0 >= self.len
    }

    /// 跳到绝对位置（允许恰好停在流末尾）
    pub fn seek(&mut self, target: Position) -> Result<(), StreamFault> {
        if target.0 > self.len {
            return Err(StreamFault::SeekOutOfRange {
                from: self.position,
                offset: target - self.position,
            });
        }
        self.inner
            .seek(SeekFrom::Start(target.0))
            .map_err(|source| StreamFault::Io {
                at: self.position,
                source,
            })?;
        self.position = target;
        Ok(())
    }

    /// 相对跳转，负偏移用于预读后回退
    pub fn seek_by(&mut self, offset: Offset) -> Result<(), StreamFault> {
        match self.position.checked_add(offset) {
            Some(target) if target.0 <= self.len => self.seek(target),
            _ => Err(StreamFault::SeekOutOfRange {
                from: self.position,
                offset,
            }),
        }
    }

    pub fn read_fixed<T: FixedWidth>(&mut self) -> Result<T, StreamFault> {
        self.ensure_available(T::WIDTH)?;
        let value = T::read_from(&mut self.inner).map_err(|source| StreamFault::Io {
            at: self.position,
            source,
        })?;
        self.position.0 += T::WIDTH;
        Ok(value)
    }

    pub fn read_tag(&mut self) -> Result<[u8; 4], StreamFault> {
        self.read_fixed::<[u8; 4]>()
    }

    /// 读取4字节类型标识后回退，位置不变
    pub fn peek_tag(&mut self) -> Result<[u8; 4], StreamFault> {
        let tag = self.read_tag()?;
        self.seek_by(Offset(-4))?;
        Ok(tag)
    }

    pub fn read_bytes(&mut self, count: u64) -> Result<Vec<u8>, StreamFault> {
        self.ensure_available(count)?;
        let mut buffer = vec![0u8; count as usize];
        self.inner
            .read_exact(&mut buffer)
            .map_err(|source| StreamFault::Io {
                at: self.position,
                source,
            })?;
        self.position.0 += count;
        Ok(buffer)
    }

    fn ensure_available(&self, wanted: u64) -> Result<(), StreamFault> {
        if self.remaining() < wanted {
            return Err(StreamFault::Truncated {
                at: self.position,
                wanted,
            });
        }
        Ok(())
    }
}
