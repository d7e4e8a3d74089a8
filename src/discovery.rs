use crate::datatypes::Priority;
use crate::load_order::LoadOrder;
use crate::plugin::Plugin;
use crate::utils::{EspError, Result};
use log::{debug, trace};
use std::collections::HashMap;
use std::path::Path;

/// 在数据目录与模组目录中查找加载顺序列出的插件
///
/// 数据目录只检查 `base_plugin`；模组目录递归查找，深度不超过 `max_depth`
/// （模组目录的直接子项深度为0）。文件名必须与加载顺序中的条目完全一致，
/// 同名文件只取第一个。任何条目找不到时返回列出所有缺失插件的错误。
///
/// 返回结果按优先级从高到低排列。
pub fn find_plugins(
    data_dir: &Path,
    mods_dir: &Path,
    base_plugin: &str,
    max_depth: usize,
    load_order: &LoadOrder,
) -> Result<Vec<Plugin>> {
    let mut remaining: HashMap<String, Priority> = load_order
        .iter()
        .map(|(name, priority)| (name.to_string(), priority))
        .collect();
    let mut found = Vec::with_capacity(remaining.len());

    claim_file(&data_dir.join(base_plugin), &mut remaining, &mut found);
    walk(mods_dir, 0, max_depth, &mut remaining, &mut found)?;

    if !remaining.is_empty() {
        let mut missing: Vec<String> = remaining.into_keys().collect();
        missing.sort();
        return Err(EspError::UnresolvedLoadOrderEntries { missing });
    }

    found.sort_by(|a, b| b.priority.cmp(&a.priority));
    debug!("找到 {} 个插件", found.len());
    Ok(found)
}

fn walk(
    dir: &Path,
    depth: usize,
    max_depth: usize,
    remaining: &mut HashMap<String, Priority>,
    found: &mut Vec<Plugin>,
) -> Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    for path in entries {
        if remaining.is_empty() {
            break;
        }
        if path.is_dir() {
            if depth <= max_depth {
                walk(&path, depth + 1, max_depth, remaining, found)?;
            } else {
                trace!("超出搜索深度，跳过 {}", path.display());
            }
        } else {
            claim_file(&path, remaining, found);
        }
    }
    Ok(())
}

fn claim_file(path: &Path, remaining: &mut HashMap<String, Priority>, found: &mut Vec<Plugin>) {
    if !path.is_file() {
        return;
    }
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return;
    };
    if let Some(priority) = remaining.remove(name) {
        trace!("{} -> {}", name, path.display());
        found.push(Plugin::new(name, priority, path));
    }
}
