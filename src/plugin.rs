use crate::datatypes::{Position, Priority};
use crate::decoder::PluginDecoder;
use crate::extractors::ExtractorRegistry;
use crate::merge::{ClaimCheck, PluginRecords};
use crate::utils::{ErrorOffset, EspError, Result};
use log::debug;
use memmap2::Mmap;
use std::io::Cursor;
use std::path::PathBuf;

/// 加载顺序中的一个插件文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    /// 文件名（与加载顺序中的条目一致）
    pub name: String,
    pub priority: Priority,
    pub path: PathBuf,
}

impl Plugin {
    pub fn new(name: impl Into<String>, priority: Priority, path: impl Into<PathBuf>) -> Self {
        Plugin {
            name: name.into(),
            priority,
            path: path.into(),
        }
    }

    /// 打开插件并校验头部
    pub fn open(&self) -> Result<PluginDecoder<Cursor<Mmap>>> {
        let io_error = |source: std::io::Error| EspError::plugin_io(&self.name, ErrorOffset::At(Position::START), source);

        let file = std::fs::File::open(&self.path).map_err(io_error)?;
        if file.metadata().map_err(io_error)?.len() == 0 {
            return Err(EspError::InvalidHeader {
                plugin: self.name.clone(),
                offset: ErrorOffset::At(Position::START),
                found: "empty file".into(),
            });
        }

        // 使用内存映射文件（零拷贝，按需分页）
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_error)?;
        PluginDecoder::open(self.name.clone(), Cursor::new(mmap))
    }

    /// 解码整个插件，跳过 `claims` 中已占有的记录
    pub fn decode(&self, registry: &ExtractorRegistry, claims: &dyn ClaimCheck) -> Result<PluginRecords> {
        debug!("解码 {} (优先级 {})", self.name, self.priority);
        self.open()?.decode_to_end(registry, claims)
    }
}
