//! 集成测试用的插件文件构造工具

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub fn field(tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut bytes = tag.to_vec();
    bytes.extend_from_slice(&(data.len() as u16).to_le_bytes());
    bytes.extend_from_slice(data);
    bytes
}

pub fn zstring(tag: &[u8; 4], text: &str) -> Vec<u8> {
    field(tag, format!("{}\0", text).as_bytes())
}

pub fn record(tag: &[u8; 4], form_id: u32, data: &[u8]) -> Vec<u8> {
    let mut bytes = tag.to_vec();
    bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&form_id.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 8]);
    bytes.extend_from_slice(data);
    bytes
}

pub fn group(label: &[u8; 4], records: &[Vec<u8>]) -> Vec<u8> {
    let body = records.concat();
    let mut bytes = b"GRUP".to_vec();
    bytes.extend_from_slice(&(body.len() as u32 + 24).to_le_bytes());
    bytes.extend_from_slice(label);
    bytes.extend_from_slice(&0i32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 8]);
    bytes.extend_from_slice(&body);
    bytes
}

pub fn plugin(groups: &[Vec<u8>]) -> Vec<u8> {
    let mut hedr = 1.7f32.to_le_bytes().to_vec();
    hedr.extend_from_slice(&0i32.to_le_bytes());
    hedr.extend_from_slice(&0x800u32.to_le_bytes());
    let mut bytes = record(b"TES4", 0, &field(b"HEDR", &hedr));
    for group in groups {
        bytes.extend_from_slice(group);
    }
    bytes
}

/// 最小的技能树记录：EDID FULL DESC CNAM 以及若干 PNAM 节点
pub fn skill_tree(form_id: u32, name: &str, perks: &[u32]) -> Vec<u8> {
    let mut data = [
        zstring(b"EDID", &format!("AV{}", name)),
        zstring(b"FULL", name),
        zstring(b"DESC", &format!("{} skill", name)),
        field(b"CNAM", &1u32.to_le_bytes()),
    ]
    .concat();
    for perk in perks {
        data.extend(field(b"PNAM", &perk.to_le_bytes()));
        data.extend(field(b"HNAM", &1.5f32.to_le_bytes()));
        data.extend(field(b"VNAM", &2.5f32.to_le_bytes()));
    }
    record(b"AVIF", form_id, &data)
}

pub fn perk(form_id: u32, name: &str, next: Option<u32>) -> Vec<u8> {
    let mut data = [
        zstring(b"EDID", &format!("Perk{}", form_id)),
        zstring(b"FULL", name),
        zstring(b"DESC", ""),
    ]
    .concat();
    if let Some(next) = next {
        data.extend(field(b"NNAM", &next.to_le_bytes()));
    }
    record(b"PERK", form_id, &data)
}

pub fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
