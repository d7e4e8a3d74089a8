//! 跨插件合并
//!
//! 插件按优先级从高到低依次合并，每个 (记录类型, FormID) 只保留第一次出现的记录。
//! 已写入的记录不再修改。

use crate::datatypes::{FormId, Priority};
use crate::extractors::ParsedRecord;
use crate::tags::RecordType;
use crate::utils::{EspError, Result};
use log::trace;
use std::collections::HashMap;

pub type RecordKey = (RecordType, FormId);

/// 解码时查询某条记录是否已被更高优先级的插件占有
pub trait ClaimCheck {
    fn is_claimed(&self, record_type: RecordType, form_id: FormId) -> bool;
}

/// 不占有任何记录（并行解码时使用）
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClaims;

impl ClaimCheck for NoClaims {
    fn is_claimed(&self, _record_type: RecordType, _form_id: FormId) -> bool {
        false
    }
}

/// 单个插件解码出的记录
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PluginRecords {
    records: HashMap<RecordKey, ParsedRecord>,
    /// 因已被占有而跳过的记录数
    pub superseded: usize,
    /// 必需字段缺失、值越界或解压失败而丢弃的记录数
    pub dropped: usize,
}

impl PluginRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插件内重复的 FormID 保留第一条，返回是否插入
    pub fn insert(&mut self, record: ParsedRecord) -> bool {
        let key = (record.record_type(), record.form_id());
        if self.records.contains_key(&key) {
            return false;
        }
        self.records.insert(key, record);
        true
    }

    pub fn contains(&self, record_type: RecordType, form_id: FormId) -> bool {
        self.records.contains_key(&(record_type, form_id))
    }

    pub fn get(&self, record_type: RecordType, form_id: FormId) -> Option<&ParsedRecord> {
        self.records.get(&(record_type, form_id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &ParsedRecord> {
        self.records.values()
    }
}

/// 合并结果中的一条记录及其来源
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRecord {
    pub record: ParsedRecord,
    pub plugin: String,
    pub priority: Priority,
}

/// 合并一个插件的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub inserted: usize,
    pub superseded: usize,
}

/// 去重、按优先级裁决后的记录集合
#[derive(Debug, Default)]
pub struct ResolvedRecordStore {
    records: HashMap<RecordType, HashMap<FormId, ResolvedRecord>>,
    last_priority: Option<Priority>,
}

impl ResolvedRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并一个插件的记录；优先级必须严格低于上一次合并的插件
    pub fn merge(
        &mut self,
        plugin: &str,
        priority: Priority,
        records: PluginRecords,
    ) -> Result<MergeOutcome> {
        if let Some(previous) = self.last_priority {
            if priority >= previous {
                return Err(EspError::OutOfOrderMerge {
                    plugin: plugin.to_string(),
                    priority,
                    previous,
                });
            }
        }
        self.last_priority = Some(priority);

        let mut outcome = MergeOutcome::default();
        for ((record_type, form_id), record) in records.records {
            let group = self.records.entry(record_type).or_default();
            if group.contains_key(&form_id) {
                trace!("{} {} {} 已由更高优先级插件提供", plugin, record_type, form_id);
                outcome.superseded += 1;
                continue;
            }
            group.insert(
                form_id,
                ResolvedRecord {
                    record,
                    plugin: plugin.to_string(),
                    priority,
                },
            );
            outcome.inserted += 1;
        }

        Ok(outcome)
    }

    pub fn get(&self, record_type: RecordType, form_id: FormId) -> Option<&ResolvedRecord> {
        self.records.get(&record_type)?.get(&form_id)
    }

    pub fn contains(&self, record_type: RecordType, form_id: FormId) -> bool {
        self.get(record_type, form_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 某类型的记录数
    pub fn count(&self, record_type: RecordType) -> usize {
        self.records.get(&record_type).map_or(0, HashMap::len)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedRecord> {
        self.records.values().flat_map(HashMap::values)
    }

    /// 按 (记录类型, FormID) 排序，用于稳定输出
    pub fn sorted(&self) -> Vec<&ResolvedRecord> {
        let mut records: Vec<_> = self.iter().collect();
        records.sort_by_key(|resolved| (resolved.record.record_type(), resolved.record.form_id()));
        records
    }

    /// 最近一次合并的插件优先级
    pub fn last_priority(&self) -> Option<Priority> {
        self.last_priority
    }
}

impl ClaimCheck for ResolvedRecordStore {
    fn is_claimed(&self, record_type: RecordType, form_id: FormId) -> bool {
        self.contains(record_type, form_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn records_of(entries: &[(u32, &str)]) -> PluginRecords {
        let mut records = PluginRecords::new();
        for (form_id, name) in entries {
            records.insert(testing::parsed_skill_tree(*form_id, name));
        }
        records
    }

    fn name_of(store: &ResolvedRecordStore, form_id: u32) -> Option<String> {
        store
            .get(RecordType::Avif, FormId(form_id))
            .and_then(|resolved| resolved.record.name().as_text().map(str::to_string))
    }

    #[test]
    fn test_first_merged_wins() {
        let mut store = ResolvedRecordStore::new();
        let high = store
            .merge("A.esp", Priority(5), records_of(&[(0x0100_0000, "A"), (2, "only A")]))
            .unwrap();
        let low = store
            .merge("B.esp", Priority(3), records_of(&[(0x0100_0000, "B"), (3, "only B")]))
            .unwrap();

        assert_eq!(high, MergeOutcome { inserted: 2, superseded: 0 });
        assert_eq!(low, MergeOutcome { inserted: 1, superseded: 1 });
        assert_eq!(name_of(&store, 0x0100_0000).as_deref(), Some("A"));
        assert_eq!(store.get(RecordType::Avif, FormId(0x0100_0000)).unwrap().plugin, "A.esp");
        assert_eq!(store.len(), 3);
        assert_eq!(store.count(RecordType::Avif), 3);
        assert_eq!(store.count(RecordType::Perk), 0);
    }

    #[test]
    fn test_ascending_merge_is_rejected() {
        let mut store = ResolvedRecordStore::new();
        store.merge("B.esp", Priority(3), records_of(&[(1, "B")])).unwrap();

        let err = store
            .merge("A.esp", Priority(5), records_of(&[(1, "A")]))
            .unwrap_err();
        assert!(matches!(err, EspError::OutOfOrderMerge { .. }));
        assert_eq!(name_of(&store, 1).as_deref(), Some("B"));
        assert_eq!(store.last_priority(), Some(Priority(3)));
    }

    #[test]
    fn test_same_form_id_different_type_coexist() {
        let mut records = records_of(&[(7, "tree")]);
        assert!(records.insert(testing::parsed_perk(7, "perk")));
        assert!(!records.insert(testing::parsed_perk(7, "again")));

        let mut store = ResolvedRecordStore::new();
        store.merge("A.esp", Priority(1), records).unwrap();
        assert!(store.contains(RecordType::Avif, FormId(7)));
        assert!(store.contains(RecordType::Perk, FormId(7)));
        assert!(store.is_claimed(RecordType::Perk, FormId(7)));
        assert!(!store.is_claimed(RecordType::Perk, FormId(8)));
    }

    #[test]
    fn test_sorted_output() {
        let mut store = ResolvedRecordStore::new();
        store
            .merge("A.esp", Priority(1), records_of(&[(3, "c"), (1, "a"), (2, "b")]))
            .unwrap();

        let ids: Vec<_> = store.sorted().iter().map(|r| r.record.form_id().0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
