//! 单个插件的流式解码
//!
//! 状态机：头部 → 扫描组 → 组内记录 → ... → 文件末尾。
//! 只有注册了提取器的记录类型会被读取，其余按声明的大小整段跳过。

use crate::cursor::{StreamFault, TesCursor};
use crate::datatypes::{Offset, Position, RecordFlags};
use crate::extractors::ExtractorRegistry;
use crate::group::{GroupDescriptor, GroupHeader, GROUP_HEADER_SIZE};
use crate::merge::{ClaimCheck, PluginRecords};
use crate::record::{decompress_data, RecordHeader};
use crate::subrecord::FieldReader;
use crate::tags::{decode_tag, tag_to_string, RecordType};
use crate::utils::{ErrorOffset, EspError, Result};
use log::{debug, trace};
use std::io::{Read, Seek};

/// 解码器所处阶段
///
/// 头部阶段在 [`PluginDecoder::open`] 内完成，组内记录阶段即一次
/// [`PluginDecoder::decode_group`] 调用，两者都不会在调用之间保留，因此只记录这两个状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// 头部已校验，正在逐个读取顶级组
    Scanning,
    /// 已到达文件末尾
    Terminal,
}

/// 打开的插件流及其解析状态
///
/// 拥有底层流；按值在流水线各阶段之间传递。
#[derive(Debug)]
pub struct PluginDecoder<R> {
    name: String,
    cursor: TesCursor<R>,
    header: RecordHeader,
    state: DecoderState,
}

impl<R: Read + Seek> PluginDecoder<R> {
    /// 校验并跳过 TES4 头部记录
    pub fn open(name: impl Into<String>, reader: R) -> Result<Self> {
        let name = name.into();
        // 流长度尚未知，错误位置按文件开头记录
        let mut cursor =
            TesCursor::new(reader).map_err(|fault| EspError::from_stream(&name, fault, u64::MAX))?;
        let len = cursor.len();

        let found = match cursor.peek_tag() {
            Ok(tag) => tag,
            Err(_) => {
                return Err(EspError::InvalidHeader {
                    plugin: name,
                    offset: ErrorOffset::At(Position::START),
                    found: "end of file".into(),
                })
            }
        };
        if decode_tag(&found) != RecordType::Tes4 {
            return Err(EspError::InvalidHeader {
                plugin: name,
                offset: ErrorOffset::At(Position::START),
                found: tag_to_string(&found),
            });
        }

        let header = RecordHeader::parse(&mut cursor)
            .map_err(|fault| EspError::from_stream(&name, fault, len))?;
        cursor
            .seek_by(Offset::from(header.data_size))
            .map_err(|fault| EspError::from_stream(&name, fault, len))?;

        debug!(
            "{}: TES4 头部 {} bytes，标志 0x{:08X}",
            name,
            header.data_size,
            header.flags.bits()
        );

        Ok(PluginDecoder {
            name,
            cursor,
            header,
            state: DecoderState::Scanning,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &RecordHeader {
        &self.header
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn position(&self) -> Position {
        self.cursor.position()
    }

    /// 本地化插件的字符串字段为 STRING 文件ID
    pub fn is_localized(&self) -> bool {
        self.header.flags.contains(RecordFlags::LOCALIZED)
    }

    /// 打开下一个顶级组
    ///
    /// 文件正常结束时返回 None。仅有头部的组返回 `is_header_only()` 的描述，
    /// 此时游标已位于下一个组的开头。
    pub fn next_group(&mut self) -> Result<Option<GroupDescriptor>> {
        if self.state == DecoderState::Terminal {
            return Ok(None);
        }
        if self.cursor.at_end() {
            trace!("{}: 到达文件末尾", self.name);
            self.state = DecoderState::Terminal;
            return Ok(None);
        }

        let group_start = self.cursor.position();
        let tag = self.cursor.peek_tag().map_err(|fault| self.stream_error(fault))?;
        if decode_tag(&tag) != RecordType::Grup {
            return Err(self.malformed(
                group_start,
                format!("expected GRUP, found {}", tag_to_string(&tag)),
            ));
        }

        let group = GroupHeader::parse(&mut self.cursor).map_err(|fault| self.stream_error(fault))?;
        let data_start = self.cursor.position();
        let Some(data_size) = group.data_size() else {
            return Err(self.malformed(
                group_start,
                format!("group size {} is smaller than its {} byte header", group.size, GROUP_HEADER_SIZE),
            ));
        };

        if data_size == 0 {
            trace!("{}: 空组 {} 位于 {}", self.name, group.get_label_string(), group_start);
            return Ok(Some(GroupDescriptor::header_only(data_start)));
        }

        if u64::from(data_size) > self.cursor.remaining() {
            return Err(EspError::TruncatedInput {
                plugin: self.name.clone(),
                offset: ErrorOffset::At(group_start),
            });
        }
        if data_size < 4 {
            return Err(self.malformed(
                data_start,
                format!("group data of {} bytes cannot hold a record", data_size),
            ));
        }

        let contained_tag = self.cursor.peek_tag().map_err(|fault| self.stream_error(fault))?;
        let record_type = decode_tag(&contained_tag);
        match record_type {
            RecordType::Tes4 => {
                return Err(self.malformed(data_start, "TES4 record inside a group".into()));
            }
            RecordType::None => {
                return Err(self.malformed(
                    data_start,
                    format!("unknown record type {} inside a group", tag_to_string(&contained_tag)),
                ));
            }
            _ => {}
        }

        Ok(Some(GroupDescriptor {
            record_type,
            data_size,
            start: data_start,
        }))
    }

    /// 解码组内记录，结束时游标恰好位于组末尾
    pub fn decode_group(
        &mut self,
        group: &GroupDescriptor,
        registry: &ExtractorRegistry,
        claims: &dyn ClaimCheck,
        out: &mut PluginRecords,
    ) -> Result<()> {
        if group.is_header_only() {
            return Ok(());
        }

        let group_end = group.end();
        if !registry.contains(group.record_type) {
            self.cursor.seek(group_end).map_err(|fault| self.stream_error(fault))?;
            return Ok(());
        }

        trace!("{}: 解码 {} 组 {}..{}", self.name, group.record_type, group.start, group_end);
        let localized = self.is_localized();

        while self.cursor.position() < group_end {
            let record_start = self.cursor.position();
            let header = RecordHeader::parse(&mut self.cursor).map_err(|fault| self.stream_error(fault))?;

            // 组内嵌套的组：其大小包含自身头部
            let record_end = if header.record_type == RecordType::Grup {
                if u64::from(header.data_size) < GROUP_HEADER_SIZE {
                    return Err(self.malformed(record_start, "nested group smaller than its header".into()));
                }
                record_start + Offset::from(header.data_size)
            } else {
                header.data_end(self.cursor.position())
            };
            if record_end > group_end {
                return Err(EspError::SizeMismatch {
                    plugin: self.name.clone(),
                    expected: group_end,
                    actual: record_end,
                });
            }

            match registry.get(header.record_type) {
                None => {}
                Some(_) if claims.is_claimed(header.record_type, header.form_id)
                    || out.contains(header.record_type, header.form_id) =>
                {
                    trace!("{}: {} {} 已被占有，跳过", self.name, header.record_type, header.form_id);
                    out.superseded += 1;
                }
                Some(extract) => {
                    let raw = self
                        .cursor
                        .read_bytes(u64::from(header.data_size))
                        .map_err(|fault| self.stream_error(fault))?;
                    let data = if header.is_compressed() {
                        match decompress_data(&raw) {
                            Ok(data) => Some(data),
                            Err(reason) => {
                                debug!("{}: {} {} 解压失败: {}", self.name, header.record_type, header.form_id, reason);
                                None
                            }
                        }
                    } else {
                        Some(raw)
                    };

                    let parsed = data.and_then(|data| {
                        let mut reader = FieldReader::new(&data, localized);
                        extract(&header, &mut reader)
                    });
                    match parsed {
                        Some(record) => {
                            out.insert(record);
                        }
                        None => {
                            debug!("{}: 丢弃记录 {} {}（位于 {}）", self.name, header.record_type, header.form_id, record_start);
                            out.dropped += 1;
                        }
                    }
                }
            }

            // 无论提取器读了多少，都回到记录末尾
            self.cursor.seek(record_end).map_err(|fault| self.stream_error(fault))?;
        }

        Ok(())
    }

    /// 解码到文件末尾并关闭
    pub fn decode_to_end(
        mut self,
        registry: &ExtractorRegistry,
        claims: &dyn ClaimCheck,
    ) -> Result<PluginRecords> {
        let mut records = PluginRecords::new();
        while let Some(group) = self.next_group()? {
            self.decode_group(&group, registry, claims, &mut records)?;
        }
        self.close()?;
        Ok(records)
    }

    /// 关闭插件；未到达文件末尾视为错误
    pub fn close(self) -> Result<()> {
        if self.state != DecoderState::Terminal {
            return Err(EspError::UnexpectedEarlyClose {
                offset: ErrorOffset::within(self.cursor.position(), self.cursor.len()),
                plugin: self.name,
            });
        }
        Ok(())
    }

    fn stream_error(&self, fault: StreamFault) -> EspError {
        EspError::from_stream(&self.name, fault, self.cursor.len())
    }

    fn malformed(&self, at: Position, reason: String) -> EspError {
        EspError::MalformedStream {
            plugin: self.name.clone(),
            offset: ErrorOffset::within(at, self.cursor.len()),
            reason,
        }
    }
}
