use crate::cursor::{StreamFault, TesCursor};
use crate::datatypes::{FixedWidth, FormId, Offset, Position, RecordFlags};
use crate::tags::{decode_tag, RecordType};
use flate2::read::ZlibDecoder;
use std::io::{Cursor, Read, Seek};

/// 记录头部长度（类型4 + 大小4 + 标志4 + FormID4 + 其余8）
pub const RECORD_HEADER_SIZE: u64 = 24;

// 解压后数据的上限，超过视为损坏
const MAX_DECOMPRESSED_SIZE: u32 = 50_000_000;

/// 记录头部
#[derive(Debug, Clone, PartialEq)]
pub struct RecordHeader {
    /// 记录类型（原始4字节）
    pub tag: [u8; 4],
    pub record_type: RecordType,
    /// 数据大小（不含头部）
    pub data_size: u32,
    pub flags: RecordFlags,
    pub form_id: FormId,
    pub timestamp: u16,
    pub version_control_info: u16,
    pub internal_version: u16,
    pub unknown: u16,
}

impl RecordHeader {
    /// 解析24字节记录头部，游标停在数据区开头
    pub fn parse<R: Read + Seek>(cursor: &mut TesCursor<R>) -> Result<Self, StreamFault> {
        if cursor.remaining() < RECORD_HEADER_SIZE {
            return Err(StreamFault::Truncated {
                at: cursor.position(),
                wanted: RECORD_HEADER_SIZE,
            });
        }

        let tag = cursor.read_tag()?;
        let data_size = cursor.read_fixed::<u32>()?;
        let flags = RecordFlags::from_bits_retain(cursor.read_fixed::<u32>()?);
        let form_id = FormId(cursor.read_fixed::<u32>()?);
        let timestamp = cursor.read_fixed::<u16>()?;
        let version_control_info = cursor.read_fixed::<u16>()?;
        let internal_version = cursor.read_fixed::<u16>()?;
        let unknown = cursor.read_fixed::<u16>()?;

        Ok(RecordHeader {
            tag,
            record_type: decode_tag(&tag),
            data_size,
            flags,
            form_id,
            timestamp,
            version_control_info,
            internal_version,
            unknown,
        })
    }

    /// 头部之后数据区的结束位置
    pub fn data_end(&self, data_start: Position) -> Position {
        data_start + Offset::from(self.data_size)
    }

    pub fn is_compressed(&self) -> bool {
        self.flags.contains(RecordFlags::COMPRESSED)
    }

    pub fn is_deleted(&self) -> bool {
        self.flags.contains(RecordFlags::DELETED)
    }
}

/// 解压缩记录数据
///
/// 压缩记录的数据区为：解压后大小(u32) + zlib流。
pub fn decompress_data(data: &[u8]) -> Result<Vec<u8>, String> {
    if data.len() < 4 {
        return Err("压缩数据太短，无法包含解压大小".into());
    }

    let mut data_cursor = Cursor::new(data);
    let decompressed_size = u32::read_from(&mut data_cursor).map_err(|e| e.to_string())?;

    if decompressed_size == 0 {
        return Err("解压大小为0".into());
    }
    if decompressed_size > MAX_DECOMPRESSED_SIZE {
        return Err(format!("解压大小过大: {} bytes (可能数据损坏)", decompressed_size));
    }

    let compressed_data = &data[4..];
    if compressed_data.is_empty() {
        return Err("没有压缩数据".into());
    }

    let mut decoder = ZlibDecoder::new(compressed_data);
    let mut decompressed = Vec::with_capacity(decompressed_size as usize);
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| e.to_string())?;

    if decompressed.len() != decompressed_size as usize {
        return Err(format!(
            "解压大小不匹配: 期望 {} bytes，实际 {} bytes",
            decompressed_size,
            decompressed.len()
        ));
    }

    Ok(decompressed)
}
