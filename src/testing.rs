//! 单元测试用的插件字节构造函数

use crate::datatypes::{FormId, RecordFlags};
use crate::extractors::{ParsedRecord, PerkRecord, SkillCategory, SkillTreeRecord};
use crate::record::RecordHeader;
use crate::subrecord::PluginText;
use crate::tags::decode_tag;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

pub fn field(tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut bytes = tag.to_vec();
    bytes.extend_from_slice(&(data.len() as u16).to_le_bytes());
    bytes.extend_from_slice(data);
    bytes
}

pub fn record(tag: &[u8; 4], form_id: u32, flags: u32, data: &[u8]) -> Vec<u8> {
    let mut bytes = tag.to_vec();
    bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&flags.to_le_bytes());
    bytes.extend_from_slice(&form_id.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 8]);
    bytes.extend_from_slice(data);
    bytes
}

pub fn group(label: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut bytes = b"GRUP".to_vec();
    bytes.extend_from_slice(&(body.len() as u32 + 24).to_le_bytes());
    bytes.extend_from_slice(label);
    bytes.extend_from_slice(&0i32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 8]);
    bytes.extend_from_slice(body);
    bytes
}

pub fn plugin_with_flags(flags: u32, groups: &[Vec<u8>]) -> Vec<u8> {
    let mut hedr = 1.7f32.to_le_bytes().to_vec();
    hedr.extend_from_slice(&0i32.to_le_bytes());
    hedr.extend_from_slice(&0x800u32.to_le_bytes());
    let header_data = [field(b"HEDR", &hedr), field(b"CNAM", b"tester\0")].concat();

    let mut bytes = record(b"TES4", 0, flags, &header_data);
    for group in groups {
        bytes.extend_from_slice(group);
    }
    bytes
}

pub fn plugin(groups: &[Vec<u8>]) -> Vec<u8> {
    plugin_with_flags(0, groups)
}

pub fn skill_tree_data(name: &str, description: &str, category: u32) -> Vec<u8> {
    [
        field(b"EDID", format!("AV{}\0", name.replace(' ', "")).as_bytes()),
        field(b"FULL", format!("{}\0", name).as_bytes()),
        field(b"DESC", format!("{}\0", description).as_bytes()),
        field(b"CNAM", &category.to_le_bytes()),
    ]
    .concat()
}

pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    let mut bytes = (data.len() as u32).to_le_bytes().to_vec();
    bytes.extend(encoder.finish().unwrap());
    bytes
}

pub fn record_header(tag: &[u8; 4], form_id: u32) -> RecordHeader {
    RecordHeader {
        tag: *tag,
        record_type: decode_tag(tag),
        data_size: 0,
        flags: RecordFlags::empty(),
        form_id: FormId(form_id),
        timestamp: 0,
        version_control_info: 0,
        internal_version: 0,
        unknown: 0,
    }
}

pub fn parsed_skill_tree(form_id: u32, name: &str) -> ParsedRecord {
    ParsedRecord::SkillTree(SkillTreeRecord {
        form_id: FormId(form_id),
        name: PluginText::Text(name.to_string()),
        description: PluginText::Text(String::new()),
        category: SkillCategory::Other,
        perks: Vec::new(),
    })
}

pub fn parsed_perk(form_id: u32, name: &str) -> ParsedRecord {
    ParsedRecord::Perk(PerkRecord {
        form_id: FormId(form_id),
        name: PluginText::Text(name.to_string()),
        description: PluginText::Text(String::new()),
        next_perk: None,
    })
}
