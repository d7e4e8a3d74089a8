//! 按记录类型分派的字段提取器
//!
//! 每种解析的记录类型注册一个提取函数；注册表中没有的类型只按大小跳过。
//! 提取函数返回 None 表示记录被丢弃（必需字段缺失或值越界），
//! 这不是错误，解码继续进行。

pub mod perk;
pub mod skill_tree;

pub use perk::PerkRecord;
pub use skill_tree::{PerkTreeNode, SkillCategory, SkillTreeRecord};

use crate::datatypes::FormId;
use crate::record::RecordHeader;
use crate::subrecord::{FieldReader, PluginText};
use crate::tags::RecordType;
use std::collections::HashMap;

/// 提取函数：读取器已限定在记录数据区内
pub type ExtractFn = fn(&RecordHeader, &mut FieldReader<'_>) -> Option<ParsedRecord>;

/// 解析成功的记录
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRecord {
    SkillTree(SkillTreeRecord),
    Perk(PerkRecord),
}

impl ParsedRecord {
    pub fn form_id(&self) -> FormId {
        match self {
            ParsedRecord::SkillTree(record) => record.form_id,
            ParsedRecord::Perk(record) => record.form_id,
        }
    }

    pub fn record_type(&self) -> RecordType {
        match self {
            ParsedRecord::SkillTree(_) => RecordType::Avif,
            ParsedRecord::Perk(_) => RecordType::Perk,
        }
    }

    pub fn name(&self) -> &PluginText {
        match self {
            ParsedRecord::SkillTree(record) => &record.name,
            ParsedRecord::Perk(record) => &record.name,
        }
    }

    pub fn as_skill_tree(&self) -> Option<&SkillTreeRecord> {
        match self {
            ParsedRecord::SkillTree(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_perk(&self) -> Option<&PerkRecord> {
        match self {
            ParsedRecord::Perk(record) => Some(record),
            _ => None,
        }
    }
}

/// 记录类型到提取函数的映射
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<RecordType, ExtractFn>,
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.record_types()).finish()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(RecordType::Avif, skill_tree::extract);
        registry.register(RecordType::Perk, perk::extract);
        registry
    }
}

impl ExtractorRegistry {
    pub fn empty() -> Self {
        ExtractorRegistry {
            extractors: HashMap::new(),
        }
    }

    pub fn register(&mut self, record_type: RecordType, extract: ExtractFn) {
        self.extractors.insert(record_type, extract);
    }

    /// 只保留指定的记录类型
    pub fn restricted_to(mut self, record_types: &[RecordType]) -> Self {
        self.extractors
            .retain(|record_type, _| record_types.contains(record_type));
        self
    }

    pub fn get(&self, record_type: RecordType) -> Option<ExtractFn> {
        self.extractors.get(&record_type).copied()
    }

    pub fn contains(&self, record_type: RecordType) -> bool {
        self.extractors.contains_key(&record_type)
    }

    /// 已注册的记录类型（按标识排序）
    pub fn record_types(&self) -> Vec<RecordType> {
        let mut types: Vec<_> = self.extractors.keys().copied().collect();
        types.sort();
        types
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = ExtractorRegistry::default();
        assert!(registry.contains(RecordType::Avif));
        assert!(registry.contains(RecordType::Perk));
        assert!(!registry.contains(RecordType::Weap));
        assert_eq!(registry.record_types(), vec![RecordType::Avif, RecordType::Perk]);
    }

    #[test]
    fn test_restricted_registry() {
        let registry = ExtractorRegistry::default().restricted_to(&[RecordType::Avif]);
        assert!(registry.get(RecordType::Avif).is_some());
        assert!(registry.get(RecordType::Perk).is_none());

        let empty = ExtractorRegistry::default().restricted_to(&[]);
        assert!(empty.is_empty());
    }
}
