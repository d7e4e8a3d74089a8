use crate::cursor::{StreamFault, TesCursor};
use crate::datatypes::{Offset, Position};
use crate::tags::RecordType;
use std::io::{Read, Seek};

/// 组头部长度（大小字段包含这24字节）
pub const GROUP_HEADER_SIZE: u64 = 24;

/// 组类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupType {
    /// 顶级组，标签为所含记录类型
    Top,
    WorldChildren,
    InteriorCellBlock,
    InteriorCellSubBlock,
    ExteriorCellBlock,
    ExteriorCellSubBlock,
    CellChildren,
    TopicChildren,
    CellPersistentChildren,
    CellTemporaryChildren,
    /// 未知类型
    Unknown(i32),
}

impl GroupType {
    /// 转换为i32值
    pub fn to_i32(&self) -> i32 {
        match self {
            GroupType::Top => 0,
            GroupType::WorldChildren => 1,
            GroupType::InteriorCellBlock => 2,
            GroupType::InteriorCellSubBlock => 3,
            GroupType::ExteriorCellBlock => 4,
            GroupType::ExteriorCellSubBlock => 5,
            GroupType::CellChildren => 6,
            GroupType::TopicChildren => 7,
            GroupType::CellPersistentChildren => 8,
            GroupType::CellTemporaryChildren => 9,
            GroupType::Unknown(value) => *value,
        }
    }
}

impl From<i32> for GroupType {
    fn from(value: i32) -> Self {
        match value {
            0 => GroupType::Top,
            1 => GroupType::WorldChildren,
            2 => GroupType::InteriorCellBlock,
            3 => GroupType::InteriorCellSubBlock,
            4 => GroupType::ExteriorCellBlock,
            5 => GroupType::ExteriorCellSubBlock,
            6 => GroupType::CellChildren,
            7 => GroupType::TopicChildren,
            8 => GroupType::CellPersistentChildren,
            9 => GroupType::CellTemporaryChildren,
            _ => GroupType::Unknown(value),
        }
    }
}

/// 组头部（24字节）
#[derive(Debug, Clone, PartialEq)]
pub struct GroupHeader {
    /// 组大小(包含头部24字节)
    pub size: u32,
    pub label: [u8; 4],
    pub group_type: GroupType,
    pub timestamp: u16,
    pub version_control_info: u16,
    pub unknown: u32,
}

impl GroupHeader {
    /// 解析组头部，游标须位于 `GRUP` 标识处；调用方负责先确认标识
    pub fn parse<R: Read + Seek>(cursor: &mut TesCursor<R>) -> Result<Self, StreamFault> {
        if cursor.remaining() < GROUP_HEADER_SIZE {
            return Err(StreamFault::Truncated {
                at: cursor.position(),
                wanted: GROUP_HEADER_SIZE,
            });
        }

        cursor.seek_by(Offset(4))?;
        let size = cursor.read_fixed::<u32>()?;
        let label = cursor.read_tag()?;
        let group_type = GroupType::from(cursor.read_fixed::<i32>()?);
        let timestamp = cursor.read_fixed::<u16>()?;
        let version_control_info = cursor.read_fixed::<u16>()?;
        let unknown = cursor.read_fixed::<u32>()?;

        Ok(GroupHeader {
            size,
            label,
            group_type,
            timestamp,
            version_control_info,
            unknown,
        })
    }

    /// 数据区长度；大小小于头部长度时返回 None
    pub fn data_size(&self) -> Option<u32> {
        u64::from(self.size)
            .checked_sub(GROUP_HEADER_SIZE)
            .map(|size| size as u32)
    }

    /// 获取组标签字符串
    pub fn get_label_string(&self) -> String {
        String::from_utf8_lossy(&self.label).into_owned()
    }
}

/// 已打开的组：所含记录类型与数据区范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupDescriptor {
    /// 首条记录的类型；仅有头部的组为 [`RecordType::None`]
    pub record_type: RecordType,
    /// 数据区长度（不含组头部）
    pub data_size: u32,
    /// 数据区起始位置
    pub start: Position,
}

impl GroupDescriptor {
    pub fn header_only(start: Position) -> Self {
        GroupDescriptor {
            record_type: RecordType::None,
            data_size: 0,
            start,
        }
    }

    pub fn is_header_only(&self) -> bool {
        self.data_size == 0
    }

    pub fn end(&self) -> Position {
        self.start + Offset::from(self.data_size)
    }
}
