use crate::cursor::TesCursor;
use crate::datatypes::{FixedWidth, Offset, Position, RawString};
use crate::tags::{decode_field_tag, FieldType};
use std::io::Cursor;

/// 字段头部长度（类型4 + 大小2）
pub const FIELD_HEADER_SIZE: u64 = 6;

/// 字段头部
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
    pub tag: [u8; 4],
    pub field_type: FieldType,
    /// 数据大小
    pub size: u16,
}

/// 记录数据区内的字段读取器
///
/// 所有方法在失败时返回 None 而非错误：字段顺序不符合预期是常见情况，
/// 由提取器决定放弃整条记录还是跳过该字段。游标不会越过数据区末尾。
pub struct FieldReader<'a> {
    cursor: TesCursor<Cursor<&'a [u8]>>,
    /// 记录所属插件是否为本地化插件（字符串字段为ID）
    localized: bool,
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a [u8], localized: bool) -> Self {
        FieldReader {
            cursor: TesCursor::from_slice(data),
            localized,
        }
    }

    pub fn is_localized(&self) -> bool {
        self.localized
    }

    pub fn position(&self) -> Position {
        self.cursor.position()
    }

    /// 剩余数据不足一个字段头部（包括末尾的NULL填充）
    pub fn is_exhausted(&self) -> bool {
        self.cursor.remaining() < FIELD_HEADER_SIZE
    }

    /// 读取下一个字段头部，数据超出数据区时视为不存在并回退
    pub fn next_header(&mut self) -> Option<FieldHeader> {
        let start = self.cursor.position();
        let tag = self.cursor.read_tag().ok()?;
        let header = match self.cursor.read_fixed::<u16>() {
            Ok(size) => FieldHeader {
                tag,
                field_type: decode_field_tag(&tag),
                size,
            },
            Err(_) => {
                self.rewind_to(start);
                return None;
            }
        };
        if self.cursor.remaining() < u64::from(header.size) {
            self.rewind_to(start);
            return None;
        }
        Some(header)
    }

    /// 下一个字段是 `expected` 时消费其头部并返回数据大小，否则回退到字段开头
    pub fn expect(&mut self, expected: FieldType) -> Option<u16> {
        let start = self.cursor.position();
        match self.next_header() {
            Some(header) if header.field_type == expected => Some(header.size),
            Some(_) => {
                self.rewind_to(start);
                None
            }
            None => None,
        }
    }

    /// 跳过下一个 `expected` 字段；不存在时返回 false 且位置不变
    pub fn skip_field(&mut self, expected: FieldType) -> bool {
        match self.expect(expected) {
            Some(size) => self.skip(size).is_some(),
            None => false,
        }
    }

    pub fn skip(&mut self, size: u16) -> Option<()> {
        self.cursor.seek_by(Offset::from(size)).ok()
    }

    /// 读取字段数据中的字符串（本地化插件中为4字节字符串ID）
    pub fn read_text(&mut self, size: u16) -> Option<PluginText> {
        if self.localized && size == 4 {
            return self.read_value::<u32>(size).map(PluginText::StringId);
        }
        let bytes = self.cursor.read_bytes(u64::from(size)).ok()?;
        Some(PluginText::Text(RawString::parse_zstring(&bytes).content))
    }

    /// 读取字段数据开头的定长值，字段剩余部分跳过
    pub fn read_value<T: FixedWidth>(&mut self, size: u16) -> Option<T> {
        if u64::from(size) < T::WIDTH {
            self.skip(size)?;
            return None;
        }
        let value = self.cursor.read_fixed::<T>().ok()?;
        let rest = u64::from(size) - T::WIDTH;
        self.cursor.seek_by(Offset(rest as i64)).ok()?;
        Some(value)
    }

    fn rewind_to(&mut self, position: Position) {
        // 目标位置必然在已读范围内
        let rewound = self.cursor.seek(position).is_ok();
        debug_assert!(rewound, "rewind to {} outside field data", position);
    }
}

/// 插件中的显示文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginText {
    /// 内嵌字符串
    Text(String),
    /// 本地化插件中指向 STRING 文件的ID
    StringId(u32),
}

impl PluginText {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PluginText::Text(text) => Some(text),
            PluginText::StringId(_) => None,
        }
    }
}

impl std::fmt::Display for PluginText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginText::Text(text) => f.write_str(text),
            PluginText::StringId(id) => write!(f, "<string {:08X}>", id),
        }
    }
}
