//! AVIF（技能树）记录
//!
//! 字段顺序：EDID、FULL、DESC、[ANAM]、CNAM、[AVSK]，之后是以 PNAM 开头的
//! 技能树节点序列。节点之间的连线（CNAM/INAM/SNAM）不做解析。

use super::ParsedRecord;
use crate::datatypes::FormId;
use crate::record::RecordHeader;
use crate::subrecord::{FieldReader, PluginText};
use crate::tags::FieldType;

/// 技能类别（CNAM）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkillCategory {
    Other = 0,
    Combat = 1,
    Magic = 2,
    Stealth = 3,
}

impl TryFrom<u32> for SkillCategory {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SkillCategory::Other),
            1 => Ok(SkillCategory::Combat),
            2 => Ok(SkillCategory::Magic),
            3 => Ok(SkillCategory::Stealth),
            other => Err(other),
        }
    }
}

/// 技能树中的一个技能节点
#[derive(Debug, Clone, PartialEq)]
pub struct PerkTreeNode {
    /// PNAM：节点引用的PERK
    pub perk_id: FormId,
    /// HNAM：水平位置
    pub x_pos: Option<f32>,
    /// VNAM：垂直位置
    pub y_pos: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillTreeRecord {
    pub form_id: FormId,
    pub name: PluginText,
    pub description: PluginText,
    pub category: SkillCategory,
    /// 按文件顺序排列的节点
    pub perks: Vec<PerkTreeNode>,
}

pub fn extract(header: &RecordHeader, reader: &mut FieldReader<'_>) -> Option<ParsedRecord> {
    if !reader.skip_field(FieldType::Edid) {
        return None;
    }

    let size = reader.expect(FieldType::Full)?;
    let name = reader.read_text(size)?;

    let size = reader.expect(FieldType::Desc)?;
    let description = reader.read_text(size)?;

    // 魔法类技能才有缩写
    reader.skip_field(FieldType::Anam);

    let size = reader.expect(FieldType::Cnam)?;
    let category = SkillCategory::try_from(reader.read_value::<u32>(size)?).ok()?;

    reader.skip_field(FieldType::Avsk);

    Some(ParsedRecord::SkillTree(SkillTreeRecord {
        form_id: header.form_id,
        name,
        description,
        category,
        perks: read_perk_tree(reader),
    }))
}

/// 节点以 PNAM 开始，直到下一个 PNAM 或数据区结束
fn read_perk_tree(reader: &mut FieldReader<'_>) -> Vec<PerkTreeNode> {
    let mut nodes: Vec<PerkTreeNode> = Vec::new();

    while !reader.is_exhausted() {
        let Some(field) = reader.next_header() else {
            break;
        };

        let consumed = match field.field_type {
            FieldType::Pnam => reader.read_value::<u32>(field.size).map(|perk_id| {
                nodes.push(PerkTreeNode {
                    perk_id: FormId(perk_id),
                    x_pos: None,
                    y_pos: None,
                });
            }),
            FieldType::Hnam => reader.read_value::<f32>(field.size).map(|x| {
                if let Some(node) = nodes.last_mut() {
                    node.x_pos = Some(x);
                }
            }),
            FieldType::Vnam => reader.read_value::<f32>(field.size).map(|y| {
                if let Some(node) = nodes.last_mut() {
                    node.y_pos = Some(y);
                }
            }),
            _ => reader.skip(field.size),
        };

        if consumed.is_none() {
            break;
        }
    }

    nodes
}
