use crate::datatypes::Priority;
use crate::utils::{EspError, Result};
use std::collections::HashMap;
use std::path::Path;

/// 插件名到优先级的映射
///
/// 以 `#` 开头的行和空行被忽略，其余每行按出现顺序获得从1开始的优先级。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOrder {
    priorities: HashMap<String, Priority>,
}

impl LoadOrder {
    pub fn parse(text: &str) -> Self {
        let mut priorities = HashMap::new();
        let mut position = 0u32;

        for line in text.lines() {
            let name = line.trim_end_matches('\r');
            if name.is_empty() || name.starts_with('#') {
                continue;
            }
            position += 1;
            // 重复出现的插件以最后一次为准
            priorities.insert(name.to_string(), Priority(position));
        }

        LoadOrder { priorities }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| EspError::LoadOrder {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn priority(&self, name: &str) -> Option<Priority> {
        self.priorities.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.priorities.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.priorities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.priorities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Priority)> {
        self.priorities
            .iter()
            .map(|(name, priority)| (name.as_str(), *priority))
    }

    /// 按优先级从高到低排列的插件名
    pub fn names_by_priority(&self) -> Vec<&str> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.into_iter().map(|(name, _)| name).collect()
    }
}
