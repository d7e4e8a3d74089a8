use super::ParsedRecord;
use crate::datatypes::FormId;
use crate::record::RecordHeader;
use crate::subrecord::{FieldReader, PluginText};
use crate::tags::FieldType;

/// PERK 记录
///
/// 条件（CTDA）中的前置技能与技能等级需求不解析。
#[derive(Debug, Clone, PartialEq)]
pub struct PerkRecord {
    pub form_id: FormId,
    pub name: PluginText,
    pub description: PluginText,
    /// NNAM：同一节点的下一级技能
    pub next_perk: Option<FormId>,
}

pub fn extract(header: &RecordHeader, reader: &mut FieldReader<'_>) -> Option<ParsedRecord> {
    if !reader.skip_field(FieldType::Edid) {
        return None;
    }
    reader.skip_field(FieldType::Vmad);

    let size = reader.expect(FieldType::Full)?;
    let name = reader.read_text(size)?;

    let size = reader.expect(FieldType::Desc)?;
    let description = reader.read_text(size)?;

    let mut next_perk = None;
    while let Some(field) = reader.next_header() {
        if field.field_type == FieldType::Nnam && next_perk.is_none() {
            next_perk = reader.read_value::<u32>(field.size).map(FormId);
        } else {
            reader.skip(field.size)?;
        }
    }

    Some(ParsedRecord::Perk(PerkRecord {
        form_id: header.form_id,
        name,
        description,
        next_perk,
    }))
}
