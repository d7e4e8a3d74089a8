//! 加载顺序到合并结果的驱动流程
//!
//! 顺序模式在解码时查询已合并的记录，跳过被占有的记录；
//! 并行模式先用 rayon 独立解码所有插件，再按优先级从高到低单线程合并。
//! 两种模式得到的记录集合相同。

use crate::config::MergeConfig;
use crate::discovery::find_plugins;
use crate::extractors::ExtractorRegistry;
use crate::load_order::LoadOrder;
use crate::merge::{NoClaims, PluginRecords, ResolvedRecordStore};
use crate::plugin::Plugin;
use crate::utils::{EspError, Result};
use log::{debug, info};
use rayon::prelude::*;
use std::path::Path;

/// 合并统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// 处理的插件数
    pub plugins: usize,
    /// 成功提取的记录数
    pub decoded: usize,
    /// 被更高优先级插件覆盖的记录数
    pub superseded: usize,
    /// 因字段缺失或数据无效而丢弃的记录数
    pub dropped: usize,
    /// 合并后的记录数
    pub resolved: usize,
}

impl MergeStats {
    fn absorb(&mut self, records: &PluginRecords) {
        self.plugins += 1;
        self.decoded += records.len();
        self.superseded += records.superseded;
        self.dropped += records.dropped;
    }
}

impl std::fmt::Display for MergeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== 合并统计信息 ===")?;
        writeln!(f, "插件数: {}", self.plugins)?;
        writeln!(f, "提取记录数: {}", self.decoded)?;
        writeln!(f, "被覆盖记录数: {}", self.superseded)?;
        writeln!(f, "丢弃记录数: {}", self.dropped)?;
        writeln!(f, "合并后记录数: {}", self.resolved)?;
        Ok(())
    }
}

fn by_priority(plugins: &[Plugin]) -> Vec<&Plugin> {
    let mut ordered: Vec<_> = plugins.iter().collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));
    ordered
}

/// 按优先级从高到低依次解码并合并
pub fn merge_sequential(
    plugins: &[Plugin],
    registry: &ExtractorRegistry,
) -> Result<(ResolvedRecordStore, MergeStats)> {
    let mut store = ResolvedRecordStore::new();
    let mut stats = MergeStats::default();

    for plugin in by_priority(plugins) {
        let records = plugin.decode(registry, &store)?;
        stats.absorb(&records);
        let outcome = store.merge(&plugin.name, plugin.priority, records)?;
        stats.superseded += outcome.superseded;
        debug!("{}: 新增 {} 条记录", plugin.name, outcome.inserted);
    }

    stats.resolved = store.len();
    Ok((store, stats))
}

/// 并行解码所有插件，再按优先级从高到低合并
///
/// 有多个插件失败时返回优先级最高的那个错误。
pub fn merge_parallel(
    plugins: &[Plugin],
    registry: &ExtractorRegistry,
    pool: Option<&rayon::ThreadPool>,
) -> Result<(ResolvedRecordStore, MergeStats)> {
    let ordered = by_priority(plugins);

    let decode_all = || -> Vec<Result<PluginRecords>> {
        ordered
            .par_iter()
            .map(|plugin| plugin.decode(registry, &NoClaims))
            .collect()
    };
    let decoded = match pool {
        Some(pool) => pool.install(decode_all),
        None => decode_all(),
    };

    let mut store = ResolvedRecordStore::new();
    let mut stats = MergeStats::default();

    for (plugin, records) in ordered.into_iter().zip(decoded) {
        let records = records?;
        stats.absorb(&records);
        let outcome = store.merge(&plugin.name, plugin.priority, records)?;
        stats.superseded += outcome.superseded;
        debug!("{}: 新增 {} 条记录", plugin.name, outcome.inserted);
    }

    stats.resolved = store.len();
    Ok((store, stats))
}

/// 读取加载顺序、查找插件并合并
pub fn run(
    config: &MergeConfig,
    load_order_path: &Path,
    data_dir: &Path,
    mods_dir: &Path,
) -> Result<(ResolvedRecordStore, MergeStats)> {
    let registry = config.registry()?;
    let load_order = LoadOrder::from_file(load_order_path)?;
    info!("加载顺序包含 {} 个插件", load_order.len());

    let plugins = find_plugins(
        data_dir,
        mods_dir,
        &config.base_plugin,
        config.max_search_depth,
        &load_order,
    )?;

    let (store, stats) = if config.parallel {
        let pool = match config.worker_threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| EspError::Config(format!("无法创建线程池: {}", e)))?,
            ),
            None => None,
        };
        info!("并行解码 {} 个插件", plugins.len());
        merge_parallel(&plugins, &registry, pool.as_ref())?
    } else {
        info!("顺序解码 {} 个插件", plugins.len());
        merge_sequential(&plugins, &registry)?
    };

    info!("合并完成，共 {} 条记录", store.len());
    Ok((store, stats))
}
