use crate::extractors::ExtractorRegistry;
use crate::tags::{decode_tag, RecordType};
use crate::utils::{EspError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 合并配置
///
/// 从 JSON 文件读取，缺失的字段使用默认值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// 数据目录中的基础插件文件名
    pub base_plugin: String,
    /// 模组目录的最大搜索深度
    pub max_search_depth: usize,
    /// 是否并行解码插件
    pub parallel: bool,
    /// 专用线程池大小（`None` 使用全局线程池）
    pub worker_threads: Option<usize>,
    /// 需要提取的记录类型
    pub record_types: Vec<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        MergeConfig {
            base_plugin: "Skyrim.esm".to_string(),
            max_search_depth: 2,
            parallel: true,
            worker_threads: None,
            record_types: vec!["AVIF".to_string(), "PERK".to_string()],
        }
    }
}

impl MergeConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: MergeConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.worker_threads == Some(0) {
            return Err(EspError::Config("worker_threads must be at least 1".into()));
        }
        self.record_types().map(|_| ())
    }

    /// 解析 `record_types` 中的四字符标识
    pub fn record_types(&self) -> Result<Vec<RecordType>> {
        self.record_types
            .iter()
            .map(|tag| {
                let record_type = match tag.as_bytes() {
                    bytes if bytes.len() == 4 => decode_tag(bytes),
                    _ => RecordType::None,
                };
                if record_type == RecordType::None {
                    Err(EspError::Config(format!("unknown record type '{}'", tag)))
                } else {
                    Ok(record_type)
                }
            })
            .collect()
    }

    /// 只包含配置中记录类型的提取器表
    pub fn registry(&self) -> Result<ExtractorRegistry> {
        let types = self.record_types()?;
        let registry = ExtractorRegistry::default().restricted_to(&types);
        for record_type in &types {
            if !registry.contains(*record_type) {
                log::warn!("记录类型 {} 没有对应的提取器，将被跳过", record_type);
            }
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MergeConfig::default();
        assert_eq!(config.base_plugin, "Skyrim.esm");
        assert_eq!(config.max_search_depth, 2);
        assert!(config.parallel);
        assert_eq!(
            config.registry().unwrap().record_types(),
            vec![RecordType::Avif, RecordType::Perk]
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MergeConfig::from_json(r#"{ "parallel": false, "record_types": ["AVIF"] }"#).unwrap();
        assert!(!config.parallel);
        assert_eq!(config.base_plugin, "Skyrim.esm");
        assert_eq!(config.registry().unwrap().record_types(), vec![RecordType::Avif]);
    }

    #[test]
    fn test_unknown_record_type() {
        let err = MergeConfig::from_json(r#"{ "record_types": ["AVIF", "ZZZZ"] }"#).unwrap_err();
        assert!(matches!(err, EspError::Config(ref message) if message.contains("ZZZZ")));

        let err = MergeConfig::from_json(r#"{ "record_types": ["AV"] }"#).unwrap_err();
        assert!(matches!(err, EspError::Config(_)));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let err = MergeConfig::from_json(r#"{ "worker_threads": 0 }"#).unwrap_err();
        assert!(matches!(err, EspError::Config(_)));
    }

    #[test]
    fn test_invalid_json() {
        let err = MergeConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, EspError::JsonError(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merge.json");
        std::fs::write(&path, r#"{ "base_plugin": "Enderal.esm", "max_search_depth": 4 }"#).unwrap();

        let config = MergeConfig::from_json_file(&path).unwrap();
        assert_eq!(config.base_plugin, "Enderal.esm");
        assert_eq!(config.max_search_depth, 4);
    }
}
